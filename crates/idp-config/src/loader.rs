//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "idp-settings.toml",
    "config.toml",
    "./config/idp-settings.toml",
    "/etc/idp-settings/config.toml",
];

/// Configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Explicit config file not found, searching defaults");
        }

        if let Ok(path) = env::var("IDP_SETTINGS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

/// Apply `IDP_*` overrides using `lookup` to read variables.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Gateway
    if let Some(val) = lookup("IDP_GATEWAY_BASE_URL") {
        config.gateway.base_url = val;
    }
    if let Some(val) = lookup("IDP_GATEWAY_TIMEOUT_SECS") {
        match val.parse() {
            Ok(secs) => config.gateway.timeout_secs = secs,
            Err(_) => warn!(value = %val, "Ignoring non-numeric IDP_GATEWAY_TIMEOUT_SECS"),
        }
    }
    if let Some(val) = lookup("IDP_GATEWAY_API_TOKEN") {
        config.gateway.api_token = if val.is_empty() { None } else { Some(val) };
    }

    // Session
    if let Some(val) = lookup("IDP_SESSION_APP_URL") {
        config.session.app_url = val;
    }

    // Validation
    if let Some(val) = lookup("IDP_VALIDATION_REQUIRE_OAUTH2_SCOPE") {
        config.validation.require_oauth2_scope = val.parse().unwrap_or(false);
    }

    // Logging
    if let Some(val) = lookup("IDP_LOG_FORMAT") {
        config.logging.format = val;
    }
    if let Some(val) = lookup("IDP_LOG_LEVEL") {
        config.logging.level = val;
    }
}
