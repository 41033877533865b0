//! # Environment Variable Loader
//!
//! Overrides the default fixture settings from `ALFRESCO_TC_*` environment
//! variables, so CI pipelines can pin images or stretch timeouts without
//! touching test code.

use crate::jvm_options::JvmOptions;
use crate::settings::AlfrescoSettings;
use std::env;

/// Load settings from environment variables over the defaults.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let settings = load_from_env()?;
///     println!("Repository image: {}", settings.repository_image);
///     Ok(())
/// }
/// ```
///
/// ## Environment Variables
/// - `ALFRESCO_TC_REPOSITORY_IMAGE`: unversioned Alfresco repository
/// - `ALFRESCO_TC_STARTUP_TIMEOUT_SECS`: readiness timeout (default: 180)
/// - `ALFRESCO_TC_JAVA_OPTS`: replaces the `JAVA_OPTS` template
/// - `ALFRESCO_TC_JAVA_TOOL_OPTIONS`: replaces the `JAVA_TOOL_OPTIONS` template
/// - `ALFRESCO_TC_POSTGRES_IMAGE`: database image (default: "postgres:15.6")
/// - `ALFRESCO_TC_POSTGRES_STARTUP_TIMEOUT_SECS`: database timeout (default: 120)
/// - `ALFRESCO_TC_ACTIVEMQ_IMAGE`: broker image (default:
///   "apache/activemq-classic:5.18.3")
/// - `ALFRESCO_TC_ACTIVEMQ_STARTUP_TIMEOUT_SECS`: broker timeout (default: 120)
///
/// Unset variables keep their defaults; malformed values are errors. The
/// option variables are split on whitespace outside double quotes, so
/// `-Dname="a b"` is one option.
pub fn load_from_env() -> Result<AlfrescoSettings, Box<dyn std::error::Error>> {
    let mut settings = AlfrescoSettings::default();

    if let Ok(image) = env::var("ALFRESCO_TC_REPOSITORY_IMAGE") {
        settings.repository_image = image;
    }
    if let Some(timeout) = parse_env("ALFRESCO_TC_STARTUP_TIMEOUT_SECS")? {
        settings.startup_timeout_secs = timeout;
    }
    if let Some(java_opts) = parse_env::<JvmOptions>("ALFRESCO_TC_JAVA_OPTS")? {
        settings.java_opts = java_opts;
    }
    if let Some(tool_options) = parse_env::<JvmOptions>("ALFRESCO_TC_JAVA_TOOL_OPTIONS")? {
        settings.java_tool_options = tool_options;
    }

    if let Ok(image) = env::var("ALFRESCO_TC_POSTGRES_IMAGE") {
        settings.postgres.image = image;
    }
    if let Some(timeout) = parse_env("ALFRESCO_TC_POSTGRES_STARTUP_TIMEOUT_SECS")? {
        settings.postgres.startup_timeout_secs = timeout;
    }

    if let Ok(image) = env::var("ALFRESCO_TC_ACTIVEMQ_IMAGE") {
        settings.activemq.image = image;
    }
    if let Some(timeout) = parse_env("ALFRESCO_TC_ACTIVEMQ_STARTUP_TIMEOUT_SECS")? {
        settings.activemq.startup_timeout_secs = timeout;
    }

    Ok(settings)
}

fn parse_env<T>(key: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("{key}: {e}").into()),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>),
    }
}
