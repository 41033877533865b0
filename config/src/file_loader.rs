//! # Settings File Loading
//!
//! Loads fixture settings from TOML or YAML files.
//!
//! Supports automatic format detection based on file extension. Missing
//! fields fall back to their defaults.

use crate::settings::AlfrescoSettings;
use std::path::Path;
use validator::Validate;

/// Settings file loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(String),

    #[error("Config file has no extension")]
    NoExtension,

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid settings: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Load settings from a TOML file.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_toml;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let settings = load_from_toml(Path::new("alfresco.toml"))?;
///     println!("Startup timeout: {}s", settings.startup_timeout_secs);
///     Ok(())
/// }
/// ```
pub fn load_from_toml(path: &Path) -> Result<AlfrescoSettings, ConfigFileError> {
    let contents = read_file(path)?;

    let settings: AlfrescoSettings =
        toml::from_str(&contents).map_err(|e| ConfigFileError::TomlParse(e.to_string()))?;
    settings.validate()?;

    Ok(settings)
}

/// Load settings from a YAML file.
pub fn load_from_yaml(path: &Path) -> Result<AlfrescoSettings, ConfigFileError> {
    let contents = read_file(path)?;

    let settings: AlfrescoSettings =
        serde_yaml::from_str(&contents).map_err(|e| ConfigFileError::YamlParse(e.to_string()))?;
    settings.validate()?;

    Ok(settings)
}

fn read_file(path: &Path) -> Result<String, ConfigFileError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigFileError::FileNotFound(path.display().to_string()),
        _ => ConfigFileError::Io(e)
    })
}

/// Load settings from file with auto-detection.
///
/// ## Supported Formats
/// - `.toml`: TOML format
/// - `.yaml`: YAML format
/// - `.yml`: YAML format
pub fn load_from_file(path: &Path) -> Result<AlfrescoSettings, ConfigFileError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or(ConfigFileError::NoExtension)?;

    match extension.to_lowercase().as_str() {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        other => Err(ConfigFileError::UnsupportedFormat(other.to_string())),
    }
}
