//! PostgreSQL dependent of the Alfresco fixture.

use crate::image::ImageReference;
use crate::lifecycle::ContainerHandle;
use crate::network::SharedNetwork;
use crate::probe::{LogStream, ReadinessProbe};
use crate::runtime::ContainerRuntime;
use crate::spec::ContainerSpec;
use config::PostgresSettings;
use errors::FixtureResult;
use std::time::Duration;

/// Logged by the init server on stdout and by the final server on stderr.
const READY_MESSAGE: &str = "database system is ready to accept connections";

/// A PostgreSQL container holding the repository database.
///
/// The default instance uses `alfresco`/`alfresco` credentials, database
/// `alfresco` and network alias `postgres`; builder methods override them
/// for caller-supplied instances.
#[derive(Debug)]
pub struct PostgresContainer {
    settings: PostgresSettings,
    network: Option<SharedNetwork>,
    handle: ContainerHandle
}

impl Default for PostgresContainer {
    fn default() -> Self {
        Self::from_settings(PostgresSettings::default())
    }
}

impl PostgresContainer {
    pub const NAME: &'static str = "postgres";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_settings(settings: PostgresSettings) -> Self {
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
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.settings.username = username.into();
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.settings.password = password.into();
        self
    }

    #[must_use]
    pub fn with_database_name(mut self, database: impl Into<String>) -> Self {
        self.settings.database = database.into();
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

    /// Joins `network` unless a network was set explicitly.
    pub(crate) fn attach_network(&mut self, network: &SharedNetwork) {
        self.network.get_or_insert_with(|| network.clone());
    }

    pub fn settings(&self) -> &PostgresSettings {
        &self.settings
    }

    pub fn username(&self) -> &str {
        &self.settings.username
    }

    pub fn password(&self) -> &str {
        &self.settings.password
    }

    pub fn database_name(&self) -> &str {
        &self.settings.database
    }

    pub fn network_alias(&self) -> &str {
        &self.settings.network_alias
    }

    pub fn network(&self) -> Option<&SharedNetwork> {
        self.network.as_ref()
    }

    /// JDBC URL as seen from other containers on the shared network.
    pub fn jdbc_url(&self) -> String {
        self.settings.jdbc_url()
    }

    /// Parses the configured image reference.
    pub fn image(&self) -> FixtureResult<ImageReference> {
        ImageReference::parse(&self.settings.image)
    }

    /// Container description for the runtime.
    pub fn spec(&self) -> FixtureResult<ContainerSpec> {
        let image = self.image()?;
        let mut spec = ContainerSpec::new(Self::NAME, image)
            .with_exposed_port(self.settings.port)
            .with_env_var("POSTGRES_USER", &self.settings.username)
            .with_env_var("POSTGRES_PASSWORD", &self.settings.password)
            .with_env_var("POSTGRES_DB", &self.settings.database)
            .with_readiness(ReadinessProbe::log_messages(
                [
                    (LogStream::Stderr, READY_MESSAGE),
                    (LogStream::Stdout, READY_MESSAGE)
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

    /// `postgres://` URL reachable from the test process.
    pub async fn connection_url(&self) -> FixtureResult<String> {
        let host = self.host().await?;
        let port = self.mapped_port(self.settings.port).await?;
        Ok(format!(
            "postgres://{}:{}@{host}:{port}/{}",
            self.settings.username, self.settings.password, self.settings.database
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec() {
        let network = SharedNetwork::named("stack");
        let mut postgres = PostgresContainer::new();
        postgres.attach_network(&network);

        let spec = postgres.spec().unwrap();
        assert_eq!(spec.name(), "postgres");
        assert_eq!(spec.image().to_string(), "postgres:15.6");
        assert_eq!(spec.env().get("POSTGRES_USER"), Some("alfresco"));
        assert_eq!(spec.env().get("POSTGRES_PASSWORD"), Some("alfresco"));
        assert_eq!(spec.env().get("POSTGRES_DB"), Some("alfresco"));
        assert_eq!(spec.network(), Some(&network));
        assert_eq!(spec.network_aliases(), &["postgres".to_string()]);
        assert_eq!(spec.exposed_ports(), &[5432]);
        assert_eq!(
            spec.readiness(),
            Some(&ReadinessProbe::log_messages(
                [
                    (LogStream::Stderr, READY_MESSAGE),
                    (LogStream::Stdout, READY_MESSAGE)
                ],
                Duration::from_secs(120)
            ))
        );
    }

    #[test]
    fn test_explicit_network_is_kept() {
        let own = SharedNetwork::named("own");
        let mut postgres = PostgresContainer::new().with_network(own.clone());
        postgres.attach_network(&SharedNetwork::named("stack"));
        assert_eq!(postgres.network(), Some(&own));
    }

    #[test]
    fn test_builder_overrides() {
        let postgres = PostgresContainer::new()
            .with_username("repo")
            .with_password("secret")
            .with_database_name("content")
            .with_network_alias("db");
        assert_eq!(postgres.jdbc_url(), "jdbc:postgresql://db:5432/content");
        assert_eq!(postgres.username(), "repo");
        assert_eq!(postgres.password(), "secret");

        let spec = postgres.spec().unwrap();
        assert!(spec.network().is_none());
        assert_eq!(spec.env().get("POSTGRES_DB"), Some("content"));
    }

    #[test]
    fn test_bad_image_is_rejected() {
        let postgres = PostgresContainer::new().with_image("postgres 15");
        assert!(postgres.image().is_err());
        assert!(postgres.spec().is_err());
        assert_eq!(PostgresContainer::new().image().unwrap().tag(), "15.6");
    }
}
