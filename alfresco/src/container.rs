//! The Alfresco repository fixture.
//!
//! Owns the shared network and its dependents: a PostgreSQL container
//! (always, created on first start unless supplied) and an ActiveMQ
//! container (only when messaging is enabled). Start order is database,
//! broker, repository; stop runs in reverse and always reaches every
//! container.

use crate::activemq::ActiveMqContainer;
use crate::client::{self, ServerInfo};
use crate::docker::DockerRuntime;
use crate::image::ImageReference;
use crate::lifecycle::{ContainerHandle, LifecycleState, StopCascade};
use crate::network::SharedNetwork;
use crate::postgres::PostgresContainer;
use crate::probe::ReadinessProbe;
use crate::runtime::ContainerRuntime;
use crate::spec::{ContainerSpec, EnvVars};
use config::{
    AlfrescoSettings, BROKER_URL_KEY, DB_PASSWORD_KEY, DB_URL_KEY, DB_USERNAME_KEY,
    EVENT2_ENABLED_KEY, JvmOptions, MESSAGING_AUTOSTART_KEY, Validate,
};
use errors::{FixtureError, FixtureResult};
use std::sync::Arc;
use std::time::Duration;

pub const JAVA_TOOL_OPTIONS: &str = "JAVA_TOOL_OPTIONS";
pub const JAVA_OPTS: &str = "JAVA_OPTS";

/// Alfresco Community repository running in Docker, exposing port 8080.
///
/// ## Usage
/// ```rust,no_run
/// use alfresco_testcontainers::AlfrescoContainer;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let mut alfresco = AlfrescoContainer::new("23.2.1")?;
/// alfresco.enable_messaging()?;
/// alfresco.start().await?;
///
/// let url = alfresco.repository_url().await?;
/// println!("Repository at {url}");
///
/// alfresco.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AlfrescoContainer {
    runtime: Arc<dyn ContainerRuntime>,
    settings: AlfrescoSettings,
    image: ImageReference,
    network: SharedNetwork,
    postgres: Option<PostgresContainer>,
    activemq: Option<ActiveMqContainer>,
    spec: Option<ContainerSpec>,
    handle: ContainerHandle,
    state: LifecycleState
}

impl AlfrescoContainer {
    pub const NAME: &'static str = "alfresco";

    /// Default image at the given version, e.g. `"7.4.1"` or `"23.2.1"`.
    pub fn new(version: &str) -> FixtureResult<Self> {
        Self::builder().version(version).build()
    }

    /// Full image reference, which must belong to the
    /// `alfresco/alfresco-content-repository-community` repository.
    pub fn from_image(reference: &str) -> FixtureResult<Self> {
        Self::builder().image(reference).build()
    }

    #[must_use]
    pub fn builder() -> AlfrescoContainerBuilder {
        AlfrescoContainerBuilder::default()
    }

    /// Adds the default ActiveMQ broker. Calling it again keeps the broker
    /// already attached.
    pub fn enable_messaging(&mut self) -> FixtureResult<&mut Self> {
        self.require_unconfigured("enable messaging")?;
        if self.activemq.is_none() {
            self.activemq = Some(ActiveMqContainer::from_settings(
                self.settings.activemq.clone()
            ));
        }
        Ok(self)
    }

    /// Replaces the database dependent. Only allowed before the first start.
    pub fn set_postgres_container(&mut self, postgres: PostgresContainer) -> FixtureResult<()> {
        self.require_unconfigured("replace the database")?;
        postgres.image()?;
        self.postgres = Some(postgres);
        Ok(())
    }

    /// Replaces the broker dependent, enabling messaging. Only allowed
    /// before the first start.
    pub fn set_activemq_container(&mut self, activemq: ActiveMqContainer) -> FixtureResult<()> {
        self.require_unconfigured("replace the broker")?;
        activemq.image()?;
        self.activemq = Some(activemq);
        Ok(())
    }

    /// Assembles the repository container description. Runs automatically
    /// on start; later calls return the same description.
    pub fn configure(&mut self) -> FixtureResult<&ContainerSpec> {
        match self.state {
            LifecycleState::Unconfigured => {}
            LifecycleState::Configured | LifecycleState::Started => {
                return self
                    .spec
                    .as_ref()
                    .ok_or_else(|| self.state.reject("read the configuration"));
            }
            LifecycleState::Stopped => return Err(self.state.reject("configure")),
        }

        let network = self.network.clone();
        let postgres_settings = &self.settings.postgres;
        self.postgres
            .get_or_insert_with(|| PostgresContainer::from_settings(postgres_settings.clone()))
            .attach_network(&network);
        if let Some(activemq) = self.activemq.as_mut() {
            activemq.attach_network(&network);
        }

        let env: EnvVars = [
            (JAVA_TOOL_OPTIONS, self.settings.java_tool_options.render()),
            (JAVA_OPTS, self.java_opts().render()),
        ]
        .into_iter()
        .collect();

        let mut spec = ContainerSpec::new(Self::NAME, self.image.clone())
            .with_network(network, &self.settings.network_alias)
            .with_exposed_port(self.settings.http_port)
            .with_readiness(ReadinessProbe::http_ok(
                self.settings.http_port,
                &self.settings.readiness_path,
                Duration::from_secs(self.settings.startup_timeout_secs)
            ));
        for (key, value) in env.iter() {
            spec = spec.with_env_var(key, value);
        }

        tracing::debug!(
            image = %self.image,
            network = %self.network,
            messaging = self.activemq.is_some(),
            java_opts = env.get(JAVA_OPTS).unwrap_or_default(),
            "Configured Alfresco container"
        );

        self.state = LifecycleState::Configured;
        Ok(self.spec.insert(spec))
    }

    /// Starts the database, the broker when present, then the repository,
    /// returning once the repository readiness probe answers 200.
    ///
    /// A failure leaves already started dependents running; call
    /// [`stop`](Self::stop) to release them.
    pub async fn start(&mut self) -> FixtureResult<()> {
        if matches!(self.state, LifecycleState::Started | LifecycleState::Stopped) {
            return Err(self.state.reject("start"));
        }
        let spec = self.configure()?.clone();
        let runtime = Arc::clone(&self.runtime);

        tracing::info!(image = %self.image, network = %self.network, "Starting Alfresco stack");

        if let Some(postgres) = self.postgres.as_mut() {
            postgres.start(runtime.as_ref()).await?;
        }
        if let Some(activemq) = self.activemq.as_mut() {
            activemq.start(runtime.as_ref()).await?;
        }
        self.handle.start(runtime.as_ref(), &spec).await?;

        self.state = LifecycleState::Started;
        tracing::info!(id = self.handle.id().unwrap_or_default(), "Alfresco stack started");
        Ok(())
    }

    /// Stops the repository, then the broker, then the database. Every stop
    /// is attempted; failures are reported together as `StopFailure`.
    pub async fn stop(&mut self) -> FixtureResult<()> {
        let mut cascade = StopCascade::default();

        let outcome = self.handle.stop().await;
        cascade.record(Self::NAME, outcome);
        if let Some(activemq) = self.activemq.as_mut() {
            cascade.record(ActiveMqContainer::NAME, activemq.stop().await);
        }
        if let Some(postgres) = self.postgres.as_mut() {
            cascade.record(PostgresContainer::NAME, postgres.stop().await);
        }

        if self.state != LifecycleState::Unconfigured {
            self.state = LifecycleState::Stopped;
        }
        tracing::info!(network = %self.network, "Alfresco stack stopped");
        cascade.finish()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn image(&self) -> &ImageReference {
        &self.image
    }

    pub fn settings(&self) -> &AlfrescoSettings {
        &self.settings
    }

    pub fn network(&self) -> &SharedNetwork {
        &self.network
    }

    /// The database dependent; `None` until configured unless supplied.
    pub fn postgres_container(&self) -> Option<&PostgresContainer> {
        self.postgres.as_ref()
    }

    /// The broker dependent; `None` unless messaging is enabled.
    pub fn activemq_container(&self) -> Option<&ActiveMqContainer> {
        self.activemq.as_ref()
    }

    pub fn is_messaging_enabled(&self) -> bool {
        self.activemq.is_some()
    }

    /// Environment of the repository container; `None` until configured.
    pub fn env(&self) -> Option<&EnvVars> {
        self.spec.as_ref().map(ContainerSpec::env)
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

    /// `http://host:port` of the repository HTTP port.
    pub async fn repository_url(&self) -> FixtureResult<String> {
        let host = self.host().await?;
        let port = self.mapped_port(self.settings.http_port).await?;
        Ok(format!("http://{host}:{port}"))
    }

    /// Server edition and version reported by the running repository.
    pub async fn server_info(&self) -> FixtureResult<ServerInfo> {
        client::fetch_server_info(&self.repository_url().await?).await
    }

    fn java_opts(&self) -> JvmOptions {
        let mut options = self.settings.java_opts.clone();
        if let Some(postgres) = &self.postgres {
            options
                .set(DB_USERNAME_KEY, postgres.username())
                .set(DB_PASSWORD_KEY, postgres.password())
                .set(DB_URL_KEY, postgres.jdbc_url());
        }
        if let Some(activemq) = &self.activemq {
            options.remove(EVENT2_ENABLED_KEY);
            options.remove(MESSAGING_AUTOSTART_KEY);
            options.set(BROKER_URL_KEY, activemq.failover_url());
        }
        options
    }

    fn require_unconfigured(&self, operation: &str) -> FixtureResult<()> {
        if self.state == LifecycleState::Unconfigured {
            Ok(())
        } else {
            Err(self.state.reject(operation))
        }
    }
}

#[derive(Debug, Clone)]
enum ImageSource {
    Version(String),
    Reference(String)
}

/// Builder for [`AlfrescoContainer`] with injectable settings, runtime and
/// dependents.
#[derive(Debug, Default)]
pub struct AlfrescoContainerBuilder {
    image: Option<ImageSource>,
    settings: Option<AlfrescoSettings>,
    runtime: Option<Arc<dyn ContainerRuntime>>,
    network: Option<SharedNetwork>,
    postgres: Option<PostgresContainer>,
    activemq: Option<ActiveMqContainer>,
    messaging: bool
}

impl AlfrescoContainerBuilder {
    /// Version tag of the default repository image.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.image = Some(ImageSource::Version(version.into()));
        self
    }

    /// Full image reference; must stay within the configured repository.
    #[must_use]
    pub fn image(mut self, reference: impl Into<String>) -> Self {
        self.image = Some(ImageSource::Reference(reference.into()));
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: AlfrescoSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    #[must_use]
    pub fn runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    #[must_use]
    pub fn network(mut self, network: SharedNetwork) -> Self {
        self.network = Some(network);
        self
    }

    #[must_use]
    pub fn postgres(mut self, postgres: PostgresContainer) -> Self {
        self.postgres = Some(postgres);
        self
    }

    #[must_use]
    pub fn activemq(mut self, activemq: ActiveMqContainer) -> Self {
        self.activemq = Some(activemq);
        self
    }

    #[must_use]
    pub fn messaging(mut self, enabled: bool) -> Self {
        self.messaging = enabled;
        self
    }

    /// Validates settings and every image reference, dependents included.
    /// Never touches Docker.
    pub fn build(self) -> FixtureResult<AlfrescoContainer> {
        let settings = self.settings.unwrap_or_default();
        settings
            .validate()
            .map_err(|e| FixtureError::InvalidSettings {
                reason: e.to_string()
            })?;

        let family = ImageReference::parse(&settings.repository_image)?;
        let image = match self.image {
            Some(ImageSource::Version(version)) => {
                ImageReference::versioned(&settings.repository_image, &version)?
            }
            Some(ImageSource::Reference(reference)) => ImageReference::parse(&reference)?,
            None => {
                return Err(FixtureError::InvalidSettings {
                    reason: format!("no version or image of {} given", family.unversioned())
                });
            }
        };
        image.assert_compatible_with(&family)?;

        ImageReference::parse(&settings.postgres.image)?;
        ImageReference::parse(&settings.activemq.image)?;
        if let Some(postgres) = &self.postgres {
            postgres.image()?;
        }
        if let Some(activemq) = &self.activemq {
            activemq.image()?;
        }

        let activemq = match (self.activemq, self.messaging) {
            (Some(activemq), _) => Some(activemq),
            (None, true) => Some(ActiveMqContainer::from_settings(settings.activemq.clone())),
            (None, false) => None
        };

        Ok(AlfrescoContainer {
            runtime: self
                .runtime
                .unwrap_or_else(|| Arc::new(DockerRuntime::new())),
            image,
            network: self.network.unwrap_or_default(),
            postgres: self.postgres,
            activemq,
            spec: None,
            handle: ContainerHandle::new(AlfrescoContainer::NAME),
            state: LifecycleState::Unconfigured,
            settings
        })
    }
}
