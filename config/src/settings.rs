//! # Fixture Settings
//!
//! Configuration template for the Alfresco container stack.
//!
//! All settings structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Default to the values the Alfresco Community images expect out of the box

use crate::jvm_options::JvmOptions;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Repository family every Alfresco image must belong to.
pub const DEFAULT_REPOSITORY_IMAGE: &str = "alfresco/alfresco-content-repository-community";

/// PostgreSQL image used when the caller does not supply a database.
pub const DEFAULT_POSTGRES_IMAGE: &str = "postgres:15.6";

/// ActiveMQ image used when messaging is enabled.
pub const DEFAULT_ACTIVEMQ_IMAGE: &str = "apache/activemq-classic:5.18.3";

/// Readiness endpoint of the repository REST API.
pub const DEFAULT_READINESS_PATH: &str =
    "/alfresco/api/-default-/public/alfresco/versions/1/probes/-ready-";

/// Property that toggles the event2 producer.
pub const EVENT2_ENABLED_KEY: &str = "repo.event2.enabled";

/// Property that toggles the messaging subsystem.
pub const MESSAGING_AUTOSTART_KEY: &str = "messaging.subsystem.autoStart";

/// Property holding the broker connection string.
pub const BROKER_URL_KEY: &str = "messaging.broker.url";

pub const DB_DRIVER_KEY: &str = "db.driver";
pub const DB_USERNAME_KEY: &str = "db.username";
pub const DB_PASSWORD_KEY: &str = "db.password";
pub const DB_URL_KEY: &str = "db.url";

/// Top-level settings for an Alfresco fixture.
///
/// ## Usage
/// ```rust
/// use config::AlfrescoSettings;
///
/// let settings = AlfrescoSettings::default();
/// assert_eq!(settings.http_port, 8080);
/// assert_eq!(settings.postgres.network_alias, "postgres");
/// ```
///
/// ## Validation
/// Timeouts are 1-3600 seconds, ports are non-zero and every string that
/// names an image, alias or path is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct AlfrescoSettings {
    /// Unversioned repository of the Alfresco image
    #[validate(length(min = 1))]
    pub repository_image: String,

    /// Options exported as `JAVA_TOOL_OPTIONS` (keystore and encryption)
    pub java_tool_options: JvmOptions,

    /// Options exported as `JAVA_OPTS` (database, subsystems, messaging)
    pub java_opts: JvmOptions,

    /// Time allowed for the readiness probe to return 200
    #[validate(range(min = 1, max = 3600))]
    pub startup_timeout_secs: u64,

    /// HTTP port of the repository inside the container
    #[validate(range(min = 1))]
    pub http_port: u16,

    #[validate(length(min = 1))]
    pub readiness_path: String,

    #[validate(length(min = 1))]
    pub network_alias: String,

    #[validate(nested)]
    pub postgres: PostgresSettings,

    #[validate(nested)]
    pub activemq: ActiveMqSettings
}

impl Default for AlfrescoSettings {
    fn default() -> Self {
        Self {
            repository_image: DEFAULT_REPOSITORY_IMAGE.to_string(),
            java_tool_options: default_java_tool_options(),
            java_opts: default_java_opts(),
            startup_timeout_secs: 180,
            http_port: 8080,
            readiness_path: DEFAULT_READINESS_PATH.to_string(),
            network_alias: "alfresco".to_string(),
            postgres: PostgresSettings::default(),
            activemq: ActiveMqSettings::default()
        }
    }
}

/// Keystore and encryption options the repository needs to boot.
#[must_use]
pub fn default_java_tool_options() -> JvmOptions {
    JvmOptions::from_properties([
        ("encryption.keystore.type", "JCEKS"),
        ("encryption.cipherAlgorithm", "DESede/CBC/PKCS5Padding"),
        ("encryption.keyAlgorithm", "DESede"),
        (
            "encryption.keystore.location",
            "/usr/local/tomcat/shared/classes/alfresco/extension/keystore/keystore"
        ),
        ("metadata-keystore.password", "mp6yc0UD9e"),
        ("metadata-keystore.aliases", "metadata"),
        ("metadata-keystore.metadata.password", "oKIWzVdEdA"),
        ("metadata-keystore.metadata.algorithm", "DESede")
    ])
}

/// Runtime options for a repository backed by the default database, with
/// search, transforms, eventing and CSRF filtering switched off.
#[must_use]
pub fn default_java_opts() -> JvmOptions {
    JvmOptions::from_properties([
        (DB_DRIVER_KEY, "org.postgresql.Driver"),
        (DB_USERNAME_KEY, "alfresco"),
        (DB_PASSWORD_KEY, "alfresco"),
        (DB_URL_KEY, "jdbc:postgresql://postgres:5432/alfresco"),
        ("index.subsystem.name", "noindex"),
        ("local.transform.service.enabled", "false"),
        (EVENT2_ENABLED_KEY, "false"),
        (MESSAGING_AUTOSTART_KEY, "false"),
        ("csrf.filter.enabled", "false")
    ])
}

/// Settings for the PostgreSQL dependent.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct PostgresSettings {
    /// Full image reference, `repository:tag`
    #[validate(length(min = 1))]
    pub image: String,

    #[validate(length(min = 1, max = 63))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,

    #[validate(length(min = 1, max = 63))]
    pub database: String,

    #[validate(length(min = 1))]
    pub network_alias: String,

    #[validate(range(min = 1))]
    pub port: u16,

    #[validate(range(min = 1, max = 3600))]
    pub startup_timeout_secs: u64
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            image: DEFAULT_POSTGRES_IMAGE.to_string(),
            username: "alfresco".to_string(),
            password: "alfresco".to_string(),
            database: "alfresco".to_string(),
            network_alias: "postgres".to_string(),
            port: 5432,
            startup_timeout_secs: 120
        }
    }
}

impl PostgresSettings {
    /// JDBC URL of the database as seen from inside the shared network.
    #[must_use]
    pub fn jdbc_url(&self) -> String {
        format!(
            "jdbc:postgresql://{}:{}/{}",
            self.network_alias, self.port, self.database
        )
    }
}

/// Settings for the ActiveMQ dependent.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct ActiveMqSettings {
    #[validate(length(min = 1))]
    pub image: String,

    #[validate(length(min = 1))]
    pub network_alias: String,

    /// OpenWire protocol port
    #[validate(range(min = 1))]
    pub openwire_port: u16,

    /// Web console port
    #[validate(range(min = 1))]
    pub console_port: u16,

    #[validate(range(min = 1, max = 3600))]
    pub startup_timeout_secs: u64,

    /// Failover transport timeout in milliseconds
    #[validate(range(min = 1))]
    pub transport_timeout_ms: u64,

    pub use_compression: bool
}

impl Default for ActiveMqSettings {
    fn default() -> Self {
        Self {
            image: DEFAULT_ACTIVEMQ_IMAGE.to_string(),
            network_alias: "activemq".to_string(),
            openwire_port: 61616,
            console_port: 8161,
            startup_timeout_secs: 120,
            transport_timeout_ms: 3000,
            use_compression: true
        }
    }
}

impl ActiveMqSettings {
    /// Quoted failover broker URL as the repository expects it in `JAVA_OPTS`.
    #[must_use]
    pub fn failover_url(&self) -> String {
        format!(
            "\"failover:(nio://{}:{})?timeout={}&jms.useCompression={}\"",
            self.network_alias, self.openwire_port, self.transport_timeout_ms, self.use_compression
        )
    }
}
