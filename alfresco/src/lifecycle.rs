//! Lifecycle bookkeeping shared by the fixtures: the state machine, the
//! handle owning a started container, and the stop cascade.

use crate::runtime::{ContainerRuntime, RunningContainer};
use crate::spec::ContainerSpec;
use errors::{FixtureError, FixtureResult};
use std::fmt;

/// Linear lifecycle of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unconfigured,
    Configured,
    Started,
    Stopped
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::Started => "started",
            Self::Stopped => "stopped"
        };
        f.write_str(name)
    }
}

impl LifecycleState {
    /// Error for an operation that is not allowed in this state.
    pub(crate) fn reject(self, operation: &str) -> FixtureError {
        FixtureError::InvalidState {
            operation: operation.to_string(),
            state: self.to_string()
        }
    }
}

/// Owns at most one running container for a fixture.
#[derive(Debug)]
pub(crate) struct ContainerHandle {
    name: String,
    running: Option<Box<dyn RunningContainer>>
}

impl ContainerHandle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            running: None
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Starts the container unless this handle already runs one.
    pub(crate) async fn start(
        &mut self,
        runtime: &dyn ContainerRuntime,
        spec: &ContainerSpec
    ) -> FixtureResult<()> {
        if self.running.is_some() {
            tracing::debug!(container = %self.name, "Container already running");
            return Ok(());
        }
        let running = runtime.start(spec).await?;
        tracing::info!(container = %self.name, id = running.id(), "Container started");
        self.running = Some(running);
        Ok(())
    }

    /// Stops the container if one is running. The handle is released even
    /// when the runtime reports a failure.
    pub(crate) async fn stop(&mut self) -> FixtureResult<()> {
        match self.running.take() {
            Some(mut running) => running.stop().await,
            None => Ok(())
        }
    }

    pub(crate) fn running(&self) -> FixtureResult<&dyn RunningContainer> {
        self.running
            .as_deref()
            .ok_or_else(|| FixtureError::NotStarted {
                container: self.name.clone()
            })
    }

    pub(crate) fn id(&self) -> Option<&str> {
        self.running.as_deref().map(|running| running.id())
    }

    pub(crate) async fn host(&self) -> FixtureResult<String> {
        self.running()?.host().await
    }

    pub(crate) async fn mapped_port(&self, port: u16) -> FixtureResult<u16> {
        self.running()?.mapped_port(port).await
    }
}

/// Collects the outcome of every stop attempt and reports them together.
///
/// Each container is recorded exactly once; a failure never prevents the
/// next attempt.
#[derive(Debug, Default)]
pub(crate) struct StopCascade {
    failures: Vec<String>
}

impl StopCascade {
    pub(crate) fn record(&mut self, container: &str, outcome: FixtureResult<()>) {
        if let Err(e) = outcome {
            tracing::warn!(container, error = %e, "Failed to stop container");
            self.failures.push(format!("{container}: {e}"));
        }
    }

    pub(crate) fn finish(self) -> FixtureResult<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(FixtureError::StopFailure {
                failures: self.failures
            })
        }
    }
}
