//! Config Normalizer
//!
//! Turns a persisted, provider-tagged payload into the in-memory draft,
//! applying load-time defaults once. An absent or `null` payload yields a fresh draft;
//! a malformed one is an error, never silently replaced by defaults.

use tracing::debug;

use crate::draft::{KeycloakDraft, LdapDraft, ProviderDraft};
use crate::encoding;
use crate::error::{Result, SettingsError};
use crate::provider::ProviderKind;

/// Load-time default for `defaultPermissionAddSpace` (save-time default differs)
pub const LOAD_DEFAULT_PERMISSION_ADD_SPACE: bool = false;
pub const DEFAULT_DISABLE_LOGOUT: bool = true;
pub const DEFAULT_ALLOW_FORMS_AUTH: bool = false;

/// Produce the draft for `kind` from an optional persisted payload.
///
/// Native and OAuth2 always start from fresh defaults.
pub fn normalize(kind: ProviderKind, payload: Option<&str>) -> Result<ProviderDraft> {
    let payload = payload
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "null");

    let draft = match (kind, payload) {
        (ProviderKind::Keycloak, Some(payload)) => {
            ProviderDraft::Keycloak(normalize_keycloak(payload)?)
        }
        (ProviderKind::Ldap, Some(payload)) => ProviderDraft::Ldap(normalize_ldap(payload)?),
        (kind, _) => ProviderDraft::empty(kind),
    };

    debug!(provider = %kind, from_payload = payload.is_some(), "Draft normalized");
    Ok(draft)
}

fn normalize_keycloak(payload: &str) -> Result<KeycloakDraft> {
    let mut draft: KeycloakDraft = serde_json::from_str(payload)
        .map_err(|e| SettingsError::malformed(ProviderKind::Keycloak, e))?;

    draft.public_key = encoding::decode_text(&draft.public_key)?;
    draft.default_permission_add_space = draft
        .default_permission_add_space
        .or(Some(LOAD_DEFAULT_PERMISSION_ADD_SPACE));
    draft.disable_logout = draft.disable_logout.or(Some(DEFAULT_DISABLE_LOGOUT));

    Ok(draft)
}

fn normalize_ldap(payload: &str) -> Result<LdapDraft> {
    let mut draft: LdapDraft = serde_json::from_str(payload)
        .map_err(|e| SettingsError::malformed(ProviderKind::Ldap, e))?;

    draft.default_permission_add_space = draft
        .default_permission_add_space
        .or(Some(LOAD_DEFAULT_PERMISSION_ADD_SPACE));
    draft.disable_logout = draft.disable_logout.or(Some(DEFAULT_DISABLE_LOGOUT));
    draft.allow_forms_auth = draft.allow_forms_auth.or(Some(DEFAULT_ALLOW_FORMS_AUTH));

    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keycloak(draft: ProviderDraft) -> KeycloakDraft {
        match draft {
            ProviderDraft::Keycloak(d) => d,
            other => panic!("expected keycloak draft, got {:?}", other),
        }
    }

    fn ldap(draft: ProviderDraft) -> LdapDraft {
        match draft {
            ProviderDraft::Ldap(d) => d,
            other => panic!("expected ldap draft, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_payload_gives_fresh_draft() {
        let draft = keycloak(normalize(ProviderKind::Keycloak, None).unwrap());
        assert_eq!(draft, KeycloakDraft::default());
        // no defaults applied without a payload
        assert!(draft.disable_logout.is_none());
        assert!(draft.default_permission_add_space.is_none());

        let draft = ldap(normalize(ProviderKind::Ldap, Some("   ")).unwrap());
        assert!(draft.allow_forms_auth.is_none());

        let draft = keycloak(normalize(ProviderKind::Keycloak, Some("null")).unwrap());
        assert_eq!(draft, KeycloakDraft::default());

        let draft = ldap(normalize(ProviderKind::Ldap, Some(" null ")).unwrap());
        assert_eq!(draft, LdapDraft::default());
    }

    #[test]
    fn test_keycloak_payload_decoded_and_backfilled() {
        let payload = format!(
            r#"{{"url":"https://idp.example","realm":"r","clientId":"c","publicKey":"{}"}}"#,
            encoding::encode_text("pk")
        );

        let draft = keycloak(normalize(ProviderKind::Keycloak, Some(&payload)).unwrap());
        assert_eq!(draft.public_key, "pk");
        assert_eq!(draft.realm, "r");
        assert_eq!(draft.default_permission_add_space, Some(false));
        assert_eq!(draft.disable_logout, Some(true));
    }

    #[test]
    fn test_keycloak_present_flags_are_kept() {
        let payload = r#"{"publicKey":"","disableLogout":false,"defaultPermissionAddSpace":true}"#;

        let draft = keycloak(normalize(ProviderKind::Keycloak, Some(payload)).unwrap());
        assert_eq!(draft.disable_logout, Some(false));
        assert_eq!(draft.default_permission_add_space, Some(true));
    }

    #[test]
    fn test_ldap_payload_backfilled() {
        let payload = r#"{"serverHost":"ldap.example","serverPort":389,"allowFormsAuth":true}"#;

        let draft = ldap(normalize(ProviderKind::Ldap, Some(payload)).unwrap());
        assert_eq!(draft.server_port, "389");
        assert_eq!(draft.allow_forms_auth, Some(true));
        assert_eq!(draft.disable_logout, Some(true));
        assert_eq!(draft.default_permission_add_space, Some(false));
    }

    #[test]
    fn test_malformed_payload_propagates() {
        let err = normalize(ProviderKind::Ldap, Some("{not json")).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::MalformedConfig { provider: ProviderKind::Ldap, .. }
        ));

        let err = normalize(ProviderKind::Keycloak, Some(r#"{"publicKey":"%%%"}"#)).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidEncoding(_)));
    }

    #[test]
    fn test_oauth2_and_native_ignore_payload() {
        let draft = normalize(ProviderKind::OAuth2, Some(r#"{"authUrl":"x"}"#)).unwrap();
        assert_eq!(draft, ProviderDraft::empty(ProviderKind::OAuth2));

        let draft = normalize(ProviderKind::Native, Some("{}")).unwrap();
        assert_eq!(draft, ProviderDraft::Native);
    }
}
