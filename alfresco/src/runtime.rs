//! The seam between the fixtures and whatever actually runs containers.
//!
//! [`DockerRuntime`](crate::docker::DockerRuntime) is the production
//! implementation; tests substitute an in-memory one.

use crate::spec::ContainerSpec;
use async_trait::async_trait;
use errors::FixtureResult;
use std::fmt::Debug;

/// Starts containers from a [`ContainerSpec`].
#[async_trait]
pub trait ContainerRuntime: Debug + Send + Sync {
    /// Creates and starts a container, returning once its readiness probe
    /// passed. Fails with `StartupTimeout` when the probe timeout elapses.
    async fn start(&self, spec: &ContainerSpec) -> FixtureResult<Box<dyn RunningContainer>>;
}

/// A started container.
#[async_trait]
pub trait RunningContainer: Debug + Send + Sync {
    fn id(&self) -> &str;

    /// Host address the mapped ports are published on.
    async fn host(&self) -> FixtureResult<String>;

    /// Host port bound to an exposed container port.
    async fn mapped_port(&self, port: u16) -> FixtureResult<u16>;

    /// Stops and removes the container. Calling it twice is a no-op.
    async fn stop(&mut self) -> FixtureResult<()>;
}
