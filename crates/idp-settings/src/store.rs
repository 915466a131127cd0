//! Config Draft Store
//!
//! Holds the draft for the selected provider, the last persisted settings,
//! the LDAP preview shown to the operator and per-provider sync failures.

use std::collections::HashMap;

use tracing::debug;

use crate::draft::ProviderDraft;
use crate::error::Result;
use crate::normalizer::normalize;
use crate::provider::{AuthSettings, LdapPreview, ProviderKind};
use crate::validator::{validate, ValidationPolicy, ValidationReport};

#[derive(Debug, Clone)]
pub struct DraftStore {
    persisted: AuthSettings,
    draft: ProviderDraft,
    preview: LdapPreview,
    failures: HashMap<ProviderKind, String>,
}

impl DraftStore {
    /// Start with the persisted provider selected.
    pub fn new(persisted: AuthSettings) -> Result<Self> {
        let kind = persisted.auth_provider;
        let draft = normalize(kind, persisted.payload_for(kind))?;
        Ok(Self {
            persisted,
            draft,
            preview: LdapPreview::unable_to_connect(),
            failures: HashMap::new(),
        })
    }

    /// Provider whose draft is being edited
    pub fn selected(&self) -> ProviderKind {
        self.draft.kind()
    }

    /// Switch provider: replaces the draft and resets the preview.
    ///
    /// Reselecting the active provider keeps the current edits. On a
    /// malformed payload the store is left untouched.
    pub fn select_provider(&mut self, kind: ProviderKind) -> Result<()> {
        if kind == self.selected() {
            return Ok(());
        }

        let draft = normalize(kind, self.persisted.payload_for(kind))?;
        debug!(from = %self.selected(), to = %kind, "Provider selection changed");

        self.draft = draft;
        self.preview = LdapPreview::unable_to_connect();
        Ok(())
    }

    pub fn draft(&self) -> &ProviderDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ProviderDraft {
        &mut self.draft
    }

    pub fn validation(&self, policy: ValidationPolicy) -> ValidationReport {
        validate(&self.draft, policy)
    }

    pub fn persisted(&self) -> &AuthSettings {
        &self.persisted
    }

    /// Record what the backend now holds.
    pub fn mark_persisted(&mut self, settings: AuthSettings) {
        self.persisted = settings;
    }

    pub fn preview(&self) -> &LdapPreview {
        &self.preview
    }

    pub fn set_preview(&mut self, preview: LdapPreview) {
        self.preview = preview;
    }

    pub fn failure_for(&self, kind: ProviderKind) -> Option<&str> {
        self.failures.get(&kind).map(String::as_str)
    }

    pub fn record_failure(&mut self, kind: ProviderKind, message: impl Into<String>) {
        self.failures.insert(kind, message.into());
    }

    pub fn clear_failure(&mut self, kind: ProviderKind) {
        self.failures.remove(&kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{KeycloakDraft, LdapDraft};
    use crate::encoding;

    fn persisted_keycloak() -> AuthSettings {
        let payload = format!(
            r#"{{"url":"https://idp.example","realm":"r","clientId":"c","publicKey":"{}","adminUser":"a","adminPassword":"p"}}"#,
            encoding::encode_text("pk")
        );
        AuthSettings::new(ProviderKind::Keycloak, payload)
    }

    #[test]
    fn test_new_selects_persisted_provider() {
        let store = DraftStore::new(persisted_keycloak()).unwrap();
        assert_eq!(store.selected(), ProviderKind::Keycloak);
        match store.draft() {
            ProviderDraft::Keycloak(d) => assert_eq!(d.public_key, "pk"),
            other => panic!("unexpected draft {:?}", other),
        }
        assert!(store.preview().is_error);
    }

    #[test]
    fn test_every_transition_resets_preview_and_discards_draft() {
        let kinds = [
            ProviderKind::Native,
            ProviderKind::Keycloak,
            ProviderKind::OAuth2,
            ProviderKind::Ldap,
        ];

        for from in kinds {
            for to in kinds.iter().copied().filter(|k| *k != from) {
                let mut store = DraftStore::new(AuthSettings::native()).unwrap();
                store.select_provider(from).unwrap();
                if let ProviderDraft::Ldap(d) = store.draft_mut() {
                    d.server_host = "edited".to_string();
                }
                store.set_preview(LdapPreview {
                    is_error: false,
                    message: "ok".to_string(),
                    users: vec![],
                    groups: vec![],
                });

                store.select_provider(to).unwrap();

                assert_eq!(store.selected(), to);
                assert_eq!(store.preview(), &LdapPreview::unable_to_connect());
                assert_eq!(store.draft(), &ProviderDraft::empty(to));
            }
        }
    }

    #[test]
    fn test_switch_back_reloads_persisted_payload() {
        let mut store = DraftStore::new(persisted_keycloak()).unwrap();
        if let ProviderDraft::Keycloak(d) = store.draft_mut() {
            d.realm = "edited".to_string();
        }

        store.select_provider(ProviderKind::Ldap).unwrap();
        assert_eq!(store.draft(), &ProviderDraft::Ldap(LdapDraft::default()));

        store.select_provider(ProviderKind::Keycloak).unwrap();
        match store.draft() {
            ProviderDraft::Keycloak(d) => {
                assert_eq!(d.realm, "r");
                assert_eq!(d.disable_logout, Some(true));
            }
            other => panic!("unexpected draft {:?}", other),
        }
    }

    #[test]
    fn test_reselect_keeps_edits() {
        let mut store = DraftStore::new(persisted_keycloak()).unwrap();
        if let ProviderDraft::Keycloak(d) = store.draft_mut() {
            d.realm = "edited".to_string();
        }
        store.select_provider(ProviderKind::Keycloak).unwrap();
        match store.draft() {
            ProviderDraft::Keycloak(KeycloakDraft { realm, .. }) => assert_eq!(realm, "edited"),
            other => panic!("unexpected draft {:?}", other),
        }
    }

    #[test]
    fn test_malformed_payload_leaves_store_untouched() {
        let mut store = DraftStore::new(AuthSettings::native()).unwrap();
        store.mark_persisted(AuthSettings::new(ProviderKind::Ldap, "{broken"));

        assert!(store.select_provider(ProviderKind::Ldap).is_err());
        assert_eq!(store.selected(), ProviderKind::Native);
    }

    #[test]
    fn test_failures_are_per_provider() {
        let mut store = DraftStore::new(AuthSettings::native()).unwrap();
        store.record_failure(ProviderKind::Ldap, "bind failed");

        assert_eq!(store.failure_for(ProviderKind::Ldap), Some("bind failed"));
        assert_eq!(store.failure_for(ProviderKind::Keycloak), None);

        store.clear_failure(ProviderKind::Ldap);
        assert_eq!(store.failure_for(ProviderKind::Ldap), None);
    }
}
