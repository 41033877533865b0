//! ActiveMQ Classic dependent, created only when messaging is enabled.

use crate::image::ImageReference;
use crate::lifecycle::ContainerHandle;
use crate::network::SharedNetwork;
use crate::probe::{LogStream, ReadinessProbe};
use crate::runtime::ContainerRuntime;
use crate::spec::ContainerSpec;
use config::ActiveMqSettings;
use errors::FixtureResult;
use std::time::Duration;

/// Logged once the OpenWire transport connector accepts connections.
const OPENWIRE_READY_MESSAGE: &str = "Connector openwire started";

/// Logged once the web console on the console port is up.
const CONSOLE_READY_MESSAGE: &str = "ActiveMQ WebConsole available at";

#[derive(Debug)]
pub struct ActiveMqContainer {
    settings: ActiveMqSettings,
    network: Option<SharedNetwork>,
    handle: ContainerHandle
}

impl Default for ActiveMqContainer {
    fn default() -> Self {
        Self::from_settings(ActiveMqSettings::default())
    }
}

impl ActiveMqContainer {
    pub const NAME: &'static str = "activemq";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_settings(settings: ActiveMqSettings) -> Self {
        Self {
            settings,
            network: None,
            handle: ContainerHandle::new(Self::NAME)
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.settings.image = image.into();
        self
    }

    #[must_use]
    pub fn with_network_alias(mut self, alias: impl Into<String>) -> Self {
        self.settings.network_alias = alias.into();
        self
    }

    #[must_use]
    pub fn with_network(mut self, network: SharedNetwork) -> Self {
        self.network = Some(network);
        self
    }

    #[must_use]
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.settings.startup_timeout_secs = timeout.as_secs();
        self
    }

    pub(crate) fn attach_network(&mut self, network: &SharedNetwork) {
        self.network.get_or_insert_with(|| network.clone());
    }

    pub fn settings(&self) -> &ActiveMqSettings {
        &self.settings
    }

    pub fn network_alias(&self) -> &str {
        &self.settings.network_alias
    }

    pub fn network(&self) -> Option<&SharedNetwork> {
        self.network.as_ref()
    }

    pub fn openwire_port(&self) -> u16 {
        self.settings.openwire_port
    }

    pub fn console_port(&self) -> u16 {
        self.settings.console_port
    }

    /// Failover URL the repository uses to reach this broker.
    pub fn failover_url(&self) -> String {
        self.settings.failover_url()
    }

    pub fn image(&self) -> FixtureResult<ImageReference> {
        ImageReference::parse(&self.settings.image)
    }

    pub fn spec(&self) -> FixtureResult<ContainerSpec> {
        let image = self.image()?;
        let mut spec = ContainerSpec::new(Self::NAME, image)
            .with_exposed_port(self.settings.openwire_port)
            .with_exposed_port(self.settings.console_port)
            .with_readiness(ReadinessProbe::log_messages(
                [
                    (LogStream::Either, OPENWIRE_READY_MESSAGE),
                    (LogStream::Either, CONSOLE_READY_MESSAGE)
                ],
                Duration::from_secs(self.settings.startup_timeout_secs)
            ));
        if let Some(network) = &self.network {
            spec = spec.with_network(network.clone(), &self.settings.network_alias);
        }
        Ok(spec)
    }

    pub async fn start(&mut self, runtime: &dyn ContainerRuntime) -> FixtureResult<()> {
        let spec = self.spec()?;
        self.handle.start(runtime, &spec).await
    }

    pub async fn stop(&mut self) -> FixtureResult<()> {
        self.handle.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    pub fn container_id(&self) -> Option<&str> {
        self.handle.id()
    }

    pub async fn host(&self) -> FixtureResult<String> {
        self.handle.host().await
    }

    pub async fn mapped_port(&self, port: u16) -> FixtureResult<u16> {
        self.handle.mapped_port(port).await
    }

    /// `tcp://` OpenWire URL reachable from the test process.
    pub async fn broker_url(&self) -> FixtureResult<String> {
        let host = self.host().await?;
        let port = self.mapped_port(self.settings.openwire_port).await?;
        Ok(format!("tcp://{host}:{port}"))
    }
}
