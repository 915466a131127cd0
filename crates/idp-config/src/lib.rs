//! IdP Settings Configuration System
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub session: SessionConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

/// Backend endpoints used for persistence, sync and LDAP preview
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub auth_path: String,
    pub sync_keycloak_path: String,
    pub sync_oauth2_path: String,
    pub sync_ldap_path: String,
    pub ldap_preview_path: String,
    pub timeout_secs: u64,
    /// Bearer token sent with every gateway request
    pub api_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001/api".to_string(),
            auth_path: "global/auth".to_string(),
            sync_keycloak_path: "global/sync/keycloak".to_string(),
            sync_oauth2_path: "global/sync/oauth2".to_string(),
            sync_ldap_path: "global/sync/ldap".to_string(),
            ldap_preview_path: "global/ldap/preview".to_string(),
            timeout_secs: 30,
            api_token: None,
        }
    }
}

impl GatewayConfig {
    /// Join the base URL and a relative endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Delegated login settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Application base URL the IdP redirects back to
    pub app_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:5001".to_string(),
        }
    }
}

impl SessionConfig {
    /// Redirect target for the delegated login flow
    pub fn login_redirect_url(&self) -> String {
        format!("{}/auth/oauth2?mode=login", self.app_url.trim_end_matches('/'))
    }
}

/// Field validation switches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Flag an empty OAuth2 scope as invalid
    pub require_oauth2_scope: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// "text" or "json"
    pub format: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Reject configurations no gateway client can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gateway.base_url must not be empty".to_string(),
            ));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# IdP Settings Configuration
# Environment variables (IDP_*) override these settings

[gateway]
base_url = "http://localhost:5001/api"
auth_path = "global/auth"
sync_keycloak_path = "global/sync/keycloak"
sync_oauth2_path = "global/sync/oauth2"
sync_ldap_path = "global/sync/ldap"
ldap_preview_path = "global/ldap/preview"
timeout_secs = 30
# api_token = ""

[session]
app_url = "http://localhost:5001"

[validation]
require_oauth2_scope = false

[logging]
format = "text"  # text or json
level = "info"
"#
        .to_string()
    }
}
