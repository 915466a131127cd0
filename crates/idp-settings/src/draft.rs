//! Provider Drafts
//!
//! Editable, unpersisted working copies of a provider's configuration.
//! Optional booleans stay `None` until a load-time or save-time default
//! is applied, so the two defaults never blur together.

use serde::{Deserialize, Deserializer, Serialize};

use crate::provider::{EncryptionType, LdapConfig, ProviderKind};

/// Keycloak draft; `public_key` is held decoded (plain text)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeycloakDraft {
    pub url: String,
    pub realm: String,
    pub client_id: String,
    pub public_key: String,
    pub admin_user: String,
    pub admin_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_logout: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_permission_add_space: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OAuth2Draft {
    pub auth_url: String,
    pub token_url: String,
    pub client_id: String,
    pub secret: String,
    pub scope: String,
}

/// LDAP draft; `server_port` is raw user input until save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LdapDraft {
    pub server_host: String,
    #[serde(deserialize_with = "port_from_string_or_number")]
    pub server_port: String,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_logout: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_forms_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_permission_add_space: Option<bool>,
}

/// Persisted payloads carry an integer port, form input carries text.
fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortInput {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<PortInput>::deserialize(deserializer)? {
        Some(PortInput::Number(n)) => n.to_string(),
        Some(PortInput::Text(s)) => s,
        None => String::new(),
    })
}

/// Integer-parse a port the same way for validation, preview and save.
pub fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse().ok()
}

impl KeycloakDraft {
    /// Copy with every string field trimmed
    pub fn trimmed(&self) -> Self {
        Self {
            url: self.url.trim().to_string(),
            realm: self.realm.trim().to_string(),
            client_id: self.client_id.trim().to_string(),
            public_key: self.public_key.trim().to_string(),
            admin_user: self.admin_user.trim().to_string(),
            admin_password: self.admin_password.trim().to_string(),
            group: self.group.as_deref().map(|g| g.trim().to_string()),
            ..self.clone()
        }
    }
}

impl OAuth2Draft {
    pub fn trimmed(&self) -> Self {
        Self {
            auth_url: self.auth_url.trim().to_string(),
            token_url: self.token_url.trim().to_string(),
            client_id: self.client_id.trim().to_string(),
            secret: self.secret.trim().to_string(),
            scope: self.scope.trim().to_string(),
        }
    }
}

impl LdapDraft {
    /// Copy with every string field trimmed
    pub fn trimmed(&self) -> Self {
        Self {
            server_host: self.server_host.trim().to_string(),
            server_port: self.server_port.trim().to_string(),
            bind_dn: self.bind_dn.trim().to_string(),
            bind_password: self.bind_password.trim().to_string(),
            user_filter: self.user_filter.trim().to_string(),
            group_filter: self.group_filter.trim().to_string(),
            attribute_user_rdn: self.attribute_user_rdn.trim().to_string(),
            attribute_user_firstname: self.attribute_user_firstname.trim().to_string(),
            attribute_user_lastname: self.attribute_user_lastname.trim().to_string(),
            attribute_user_email: self.attribute_user_email.trim().to_string(),
            attribute_group_member: self.attribute_group_member.trim().to_string(),
            ..self.clone()
        }
    }

    /// Fully-formed config with the port parsed; `None` if the port is not an integer.
    ///
    /// Absent booleans take their load-time defaults.
    pub fn to_config(&self) -> Option<LdapConfig> {
        let server_port = parse_port(&self.server_port)?;
        Some(LdapConfig {
            server_host: self.server_host.clone(),
            server_port,
            bind_dn: self.bind_dn.clone(),
            bind_password: self.bind_password.clone(),
            user_filter: self.user_filter.clone(),
            group_filter: self.group_filter.clone(),
            attribute_user_rdn: self.attribute_user_rdn.clone(),
            attribute_user_firstname: self.attribute_user_firstname.clone(),
            attribute_user_lastname: self.attribute_user_lastname.clone(),
            attribute_user_email: self.attribute_user_email.clone(),
            attribute_group_member: self.attribute_group_member.clone(),
            encryption_type: self.encryption_type,
            disable_logout: self.disable_logout.unwrap_or(true),
            allow_forms_auth: self.allow_forms_auth.unwrap_or(false),
            default_permission_add_space: self.default_permission_add_space.unwrap_or(false),
        })
    }

    /// A group filter needs the member attribute to resolve memberships.
    pub fn missing_group_member(&self) -> bool {
        !self.group_filter.is_empty() && self.attribute_group_member.is_empty()
    }
}

/// Draft for whichever provider is currently selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderDraft {
    Native,
    Keycloak(KeycloakDraft),
    #[serde(rename = "oauth2")]
    OAuth2(OAuth2Draft),
    Ldap(LdapDraft),
}

impl ProviderDraft {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderDraft::Native => ProviderKind::Native,
            ProviderDraft::Keycloak(_) => ProviderKind::Keycloak,
            ProviderDraft::OAuth2(_) => ProviderKind::OAuth2,
            ProviderDraft::Ldap(_) => ProviderKind::Ldap,
        }
    }

    /// Same provider with every string field trimmed
    pub fn trimmed(&self) -> Self {
        match self {
            ProviderDraft::Native => ProviderDraft::Native,
            ProviderDraft::Keycloak(d) => ProviderDraft::Keycloak(d.trimmed()),
            ProviderDraft::OAuth2(d) => ProviderDraft::OAuth2(d.trimmed()),
            ProviderDraft::Ldap(d) => ProviderDraft::Ldap(d.trimmed()),
        }
    }

    /// Fresh draft with no persisted payload behind it
    pub fn empty(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Native => ProviderDraft::Native,
            ProviderKind::Keycloak => ProviderDraft::Keycloak(KeycloakDraft::default()),
            ProviderKind::OAuth2 => ProviderDraft::OAuth2(OAuth2Draft::default()),
            ProviderKind::Ldap => ProviderDraft::Ldap(LdapDraft::default()),
        }
    }
}
