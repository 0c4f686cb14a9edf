//! Config file loader and serialization.

use super::validator::validate_config;
use super::ValidityConfig;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// Supported configuration encodings, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

/// Get the per-user configuration path: ~/.config/session-validity/validity.toml
pub fn get_global_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine configuration directory".to_string())
    })?;

    Ok(config_dir.join("session-validity").join("validity.toml"))
}

/// Load and validate a config from a `.toml` or `.json` file.
pub fn load_config_from_file(path: &Path) -> Result<ValidityConfig, ConfigError> {
    let format = validate_config_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.display().to_string())
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let config = parse_config(&content, format)?;
    validate_config(&config)?;

    log::debug!("Loaded validity configuration from {}", path.display());
    Ok(config)
}

/// Parse config text in the given format (no validation).
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<ValidityConfig, ConfigError> {
    let config: ValidityConfig = match format {
        ConfigFormat::Toml => toml::from_str(content)?,
        ConfigFormat::Json => serde_json::from_str(content)?,
    };
    Ok(config)
}

/// Save config; the encoding follows the file extension.
pub fn save_config_to_file(config: &ValidityConfig, path: &Path) -> Result<(), ConfigError> {
    let format = validate_config_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = match format {
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
    };

    fs::write(path, content)?;
    Ok(())
}

/// Validate config path (.toml or .json extension required).
pub fn validate_config_path(path: &Path) -> Result<ConfigFormat, ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(ConfigFormat::Toml),
        Some("json") => Ok(ConfigFormat::Json),
        Some(ext) => Err(ConfigError::ValidationFailed(format!(
            "Configuration file must have .toml or .json extension, got .{}",
            ext
        ))),
        None => Err(ConfigError::ValidationFailed(
            "Configuration file must have .toml or .json extension".to_string(),
        )),
    }
}
