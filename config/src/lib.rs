//! # Fixture Configuration
//!
//! Configuration template for the Alfresco container stack.
//!
//! This crate provides:
//! - Settings structures for the repository, database and broker containers
//! - Key-addressable JVM option lists for `JAVA_OPTS` / `JAVA_TOOL_OPTIONS`
//! - Environment variable overrides (`ALFRESCO_TC_*`)
//! - Settings file loading (TOML/YAML)
//!
//! Uses the `validator` crate for input validation.

pub mod file_loader;
pub mod jvm_options;
pub mod loader;
pub mod settings;

pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use jvm_options::{JvmOption, JvmOptions, JvmOptionsParseError};
pub use loader::load_from_env;
pub use settings::{
    ActiveMqSettings, AlfrescoSettings, BROKER_URL_KEY, DB_DRIVER_KEY, DB_PASSWORD_KEY,
    DB_URL_KEY, DB_USERNAME_KEY, DEFAULT_ACTIVEMQ_IMAGE, DEFAULT_POSTGRES_IMAGE,
    DEFAULT_READINESS_PATH, DEFAULT_REPOSITORY_IMAGE, EVENT2_ENABLED_KEY,
    MESSAGING_AUTOSTART_KEY, PostgresSettings, default_java_opts, default_java_tool_options,
};
pub use validator::Validate;
