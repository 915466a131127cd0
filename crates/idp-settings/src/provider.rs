//! Auth Provider Entities
//!
//! Persisted shapes of the per-provider configuration and the records
//! exchanged with the settings backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity provider backend governing authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Built-in password authentication, the safe fallback
    #[default]
    Native,
    Keycloak,
    #[serde(rename = "oauth2")]
    OAuth2,
    Ldap,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Native => "native",
            ProviderKind::Keycloak => "keycloak",
            ProviderKind::OAuth2 => "oauth2",
            ProviderKind::Ldap => "ldap",
        }
    }

    /// Native has no remote side to confirm.
    pub fn requires_sync(&self) -> bool {
        !matches!(self, ProviderKind::Native)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "native" => Some(ProviderKind::Native),
            "keycloak" => Some(ProviderKind::Keycloak),
            "oauth2" => Some(ProviderKind::OAuth2),
            "ldap" => Some(ProviderKind::Ldap),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keycloak settings as persisted; `public_key` holds the transport encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakConfig {
    pub url: String,
    pub realm: String,
    pub client_id: String,
    pub public_key: String,
    pub admin_user: String,
    pub admin_password: String,
    pub group: String,
    pub disable_logout: bool,
    pub default_permission_add_space: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Config {
    pub auth_url: String,
    pub token_url: String,
    pub client_id: String,
    pub secret: String,
    pub scope: String,
}

/// Transport security for the LDAP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionType {
    #[default]
    None,
    #[serde(rename = "starttls")]
    StartTls,
    Ldaps,
}

impl EncryptionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(EncryptionType::None),
            "starttls" => Some(EncryptionType::StartTls),
            "ldaps" => Some(EncryptionType::Ldaps),
            _ => None,
        }
    }
}

/// LDAP settings as persisted; `server_port` is always an integer here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdapConfig {
    pub server_host: String,
    pub server_port: u16,
    #[serde(rename = "bindDN")]
    pub bind_dn: String,
    pub bind_password: String,
    pub user_filter: String,
    pub group_filter: String,
    #[serde(rename = "attributeUserRDN")]
    pub attribute_user_rdn: String,
    pub attribute_user_firstname: String,
    pub attribute_user_lastname: String,
    pub attribute_user_email: String,
    pub attribute_group_member: String,
    pub encryption_type: EncryptionType,
    pub disable_logout: bool,
    pub allow_forms_auth: bool,
    pub default_permission_add_space: bool,
}

/// Fully-formed configuration, one shape per provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    Native,
    Keycloak(KeycloakConfig),
    OAuth2(OAuth2Config),
    Ldap(LdapConfig),
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::Native => ProviderKind::Native,
            ProviderConfig::Keycloak(_) => ProviderKind::Keycloak,
            ProviderConfig::OAuth2(_) => ProviderKind::OAuth2,
            ProviderConfig::Ldap(_) => ProviderKind::Ldap,
        }
    }

    /// Serialize to the opaque blob stored server-side. Native is `{}`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            ProviderConfig::Native => Ok("{}".to_string()),
            ProviderConfig::Keycloak(config) => serde_json::to_string(config),
            ProviderConfig::OAuth2(config) => serde_json::to_string(config),
            ProviderConfig::Ldap(config) => serde_json::to_string(config),
        }
    }

    /// Build the persistence record for this configuration.
    pub fn to_settings(&self) -> serde_json::Result<AuthSettings> {
        Ok(AuthSettings {
            auth_provider: self.kind(),
            auth_config: self.to_json()?,
        })
    }
}

/// Persistence record: provider tag plus its serialized configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    pub auth_provider: ProviderKind,
    #[serde(default)]
    pub auth_config: String,
}

impl AuthSettings {
    pub fn new(auth_provider: ProviderKind, auth_config: impl Into<String>) -> Self {
        Self {
            auth_provider,
            auth_config: auth_config.into(),
        }
    }

    /// The rollback target
    pub fn native() -> Self {
        Self::new(ProviderKind::Native, "{}")
    }

    /// Persisted payload for `kind`, if these settings belong to it and carry one.
    pub fn payload_for(&self, kind: ProviderKind) -> Option<&str> {
        if self.auth_provider != kind {
            return None;
        }
        let payload = self.auth_config.trim();
        if payload.is_empty() || payload == "null" {
            None
        } else {
            Some(payload)
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self::native()
    }
}

/// Result of a provider synchronization call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub is_error: bool,
    #[serde(default)]
    pub message: String,
}

impl SyncOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            is_error: false,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            message: message.into(),
        }
    }
}

/// Result of an LDAP "test connection" call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdapPreview {
    pub is_error: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub users: Vec<serde_json::Value>,
    #[serde(default)]
    pub groups: Vec<serde_json::Value>,
}

impl LdapPreview {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            message: message.into(),
            users: vec![],
            groups: vec![],
        }
    }

    /// Shown until a preview runs for the current provider selection
    pub fn unable_to_connect() -> Self {
        Self::failed("Unable to connect")
    }
}

impl Default for LdapPreview {
    fn default() -> Self {
        Self::unable_to_connect()
    }
}
