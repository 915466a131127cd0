//! Auth Settings Service
//!
//! Ties the draft store, the save orchestrator and the LDAP preview gateway
//! to the presentation capabilities. This is what an admin screen or the
//! CLI drives.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::draft::ProviderDraft;
use crate::error::{Result, SettingsError};
use crate::gateway::{
    AuthConfigStore, LdapPreviewClient, LoggingObserver, Modal, Notifier, ProviderChangeObserver,
    SyncGateway, TracingModal, TracingNotifier,
};
use crate::http::HttpSettingsGateway;
use crate::orchestrator::{SaveOrchestrator, SaveOutcome, SavePhase};
use crate::preview::LdapPreviewGateway;
use crate::provider::{AuthSettings, EncryptionType, LdapPreview, ProviderKind};
use crate::store::DraftStore;
use crate::validator::{ValidationPolicy, ValidationReport};

pub const SAVED_MESSAGE: &str = "Saved";
pub const LDAP_PREVIEW_MODAL: &str = "ldap-preview-modal";

/// Everything the service talks to
#[derive(Clone)]
pub struct SettingsCollaborators {
    pub store: Arc<dyn AuthConfigStore>,
    pub sync: Arc<dyn SyncGateway>,
    pub preview: Arc<dyn LdapPreviewClient>,
    pub observer: Arc<dyn ProviderChangeObserver>,
    pub notifier: Arc<dyn Notifier>,
    pub modal: Arc<dyn Modal>,
}

impl SettingsCollaborators {
    /// Backend over HTTP, user-facing effects as log events
    pub fn http(gateway: Arc<HttpSettingsGateway>) -> Self {
        Self {
            store: gateway.clone(),
            sync: gateway.clone(),
            preview: gateway,
            observer: Arc::new(LoggingObserver),
            notifier: Arc::new(TracingNotifier),
            modal: Arc::new(TracingModal),
        }
    }
}

pub struct AuthSettingsService {
    drafts: RwLock<DraftStore>,
    orchestrator: SaveOrchestrator,
    preview: LdapPreviewGateway,
    config_store: Arc<dyn AuthConfigStore>,
    notifier: Arc<dyn Notifier>,
    modal: Arc<dyn Modal>,
}

impl AuthSettingsService {
    /// Build around settings already fetched from the backend.
    pub fn new(
        collaborators: SettingsCollaborators,
        policy: ValidationPolicy,
        persisted: AuthSettings,
    ) -> Result<Self> {
        let applied = persisted.auth_provider;
        let drafts = DraftStore::new(persisted)?;

        Ok(Self {
            drafts: RwLock::new(drafts),
            orchestrator: SaveOrchestrator::new(
                collaborators.store.clone(),
                collaborators.sync,
                collaborators.observer,
                policy,
                applied,
            ),
            preview: LdapPreviewGateway::new(collaborators.preview),
            config_store: collaborators.store,
            notifier: collaborators.notifier,
            modal: collaborators.modal,
        })
    }

    /// Fetch the persisted settings and seed the drafts from them.
    pub async fn load(collaborators: SettingsCollaborators, policy: ValidationPolicy) -> Result<Self> {
        let persisted = collaborators.store.fetch().await?;
        info!(provider = %persisted.auth_provider, "Loaded authentication settings");
        Self::new(collaborators, policy, persisted)
    }

    /// Re-read the backend, discarding unsaved edits.
    pub async fn reload(&self) -> Result<()> {
        let persisted = self.config_store.fetch().await?;
        let fresh = DraftStore::new(persisted)?;
        *self.drafts.write().await = fresh;
        Ok(())
    }

    /// Provider the backend holds; after a rollback this is Native.
    pub async fn active(&self) -> ProviderKind {
        self.drafts.read().await.persisted().auth_provider
    }

    /// Provider whose draft is being edited
    pub async fn selected(&self) -> ProviderKind {
        self.drafts.read().await.selected()
    }

    pub async fn select_provider(&self, kind: ProviderKind) -> Result<()> {
        self.drafts.write().await.select_provider(kind)
    }

    pub async fn draft(&self) -> ProviderDraft {
        self.drafts.read().await.draft().clone()
    }

    /// Replace the whole draft; switches provider first if needed.
    pub async fn set_draft(&self, draft: ProviderDraft) -> Result<()> {
        let mut drafts = self.drafts.write().await;
        drafts.select_provider(draft.kind())?;
        *drafts.draft_mut() = draft;
        Ok(())
    }

    /// Mutate the selected draft in place.
    pub async fn edit<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ProviderDraft) -> R,
    {
        f(self.drafts.write().await.draft_mut())
    }

    /// Set the LDAP encryption type; a no-op unless LDAP is selected.
    pub async fn set_ldap_encryption(&self, encryption: EncryptionType) {
        self.edit(|draft| {
            if let ProviderDraft::Ldap(d) = draft {
                d.encryption_type = encryption;
            }
        })
        .await
    }

    pub async fn validation(&self) -> ValidationReport {
        self.drafts
            .read()
            .await
            .validation(self.orchestrator.policy())
    }

    pub async fn persisted(&self) -> AuthSettings {
        self.drafts.read().await.persisted().clone()
    }

    pub async fn preview(&self) -> LdapPreview {
        self.drafts.read().await.preview().clone()
    }

    pub async fn failure_for(&self, kind: ProviderKind) -> Option<String> {
        self.drafts.read().await.failure_for(kind).map(str::to_string)
    }

    pub fn phase(&self) -> SavePhase {
        self.orchestrator.phase()
    }

    pub fn orchestrator(&self) -> &SaveOrchestrator {
        &self.orchestrator
    }

    /// Save the selected draft.
    ///
    /// An invalid draft returns silently with the field to focus. Any
    /// persisted outcome, rollback included, ends with one "Saved".
    pub async fn save(&self) -> Result<SaveOutcome> {
        let draft = {
            let mut drafts = self.drafts.write().await;
            let kind = drafts.selected();
            drafts.clear_failure(kind);
            drafts.draft().clone()
        };

        let outcome = self.orchestrator.save(&draft).await?;

        match &outcome {
            SaveOutcome::Invalid { .. } => return Ok(outcome),
            SaveOutcome::Settled { settings, .. } => {
                self.drafts.write().await.mark_persisted(settings.clone());
            }
            SaveOutcome::RolledBack {
                attempted,
                message,
                settings,
            } => {
                let mut drafts = self.drafts.write().await;
                drafts.record_failure(*attempted, message.clone());
                drafts.mark_persisted(settings.clone());
            }
        }

        self.notifier.notify_success(SAVED_MESSAGE);
        Ok(outcome)
    }

    /// Test the LDAP draft against the directory without saving it.
    pub async fn preview_ldap(&self) -> Result<LdapPreview> {
        let draft = match self.draft().await {
            ProviderDraft::Ldap(d) => d,
            other => {
                return Err(SettingsError::ProviderMismatch {
                    expected: ProviderKind::Ldap,
                    actual: other.kind(),
                })
            }
        };

        let preview = self.preview.preview_draft(&draft).await?;

        {
            let mut drafts = self.drafts.write().await;
            // selection may have moved on while the preview ran
            if drafts.selected() == ProviderKind::Ldap {
                drafts.set_preview(preview.clone());
            } else {
                warn!("Provider changed during LDAP preview, result discarded");
            }
        }

        self.modal.open(LDAP_PREVIEW_MODAL);
        self.notifier.notify_success(SAVED_MESSAGE);
        Ok(preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{KeycloakDraft, LdapDraft, OAuth2Draft};
    use crate::encoding;
    use crate::provider::{KeycloakConfig, SyncOutcome};
    use crate::testing::{
        CallLog, MockConfigStore, MockModal, MockNotifier, MockObserver, MockPreview, MockSync,
    };
    use crate::validator::tests::{valid_keycloak, valid_ldap, valid_oauth2};
    use crate::validator::Field;

    struct Harness {
        log: Arc<CallLog>,
        store: Arc<MockConfigStore>,
        sync: Arc<MockSync>,
        preview: Arc<MockPreview>,
        observer: Arc<MockObserver>,
        notifier: Arc<MockNotifier>,
        modal: Arc<MockModal>,
    }

    impl Harness {
        fn new() -> Self {
            let log = Arc::new(CallLog::default());
            Self {
                store: Arc::new(MockConfigStore::new(log.clone())),
                sync: Arc::new(MockSync::new(log.clone())),
                preview: Arc::new(MockPreview::default()),
                observer: Arc::new(MockObserver::default()),
                notifier: Arc::new(MockNotifier::default()),
                modal: Arc::new(MockModal::default()),
                log,
            }
        }

        fn collaborators(&self) -> SettingsCollaborators {
            SettingsCollaborators {
                store: self.store.clone(),
                sync: self.sync.clone(),
                preview: self.preview.clone(),
                observer: self.observer.clone(),
                notifier: self.notifier.clone(),
                modal: self.modal.clone(),
            }
        }

        async fn service(&self) -> AuthSettingsService {
            AuthSettingsService::load(self.collaborators(), ValidationPolicy::default())
                .await
                .unwrap()
        }

        fn notifications(&self) -> Vec<String> {
            self.notifier.messages.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_load_seeds_from_backend() {
        let h = Harness::new();
        let payload = format!(
            r#"{{"url":"https://idp.example","realm":"r","clientId":"c","publicKey":"{}","adminUser":"a","adminPassword":"p"}}"#,
            encoding::encode_text("pk")
        );
        *h.store.current.lock().unwrap() = AuthSettings::new(ProviderKind::Keycloak, payload);

        let service = h.service().await;

        assert_eq!(service.active().await, ProviderKind::Keycloak);
        assert_eq!(service.selected().await, ProviderKind::Keycloak);
        assert_eq!(service.orchestrator().applied().await, ProviderKind::Keycloak);
        match service.draft().await {
            ProviderDraft::Keycloak(d) => assert_eq!(d.public_key, "pk"),
            other => panic!("unexpected draft {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_payload() {
        let h = Harness::new();
        *h.store.current.lock().unwrap() = AuthSettings::new(ProviderKind::Ldap, "{oops");

        let result =
            AuthSettingsService::load(h.collaborators(), ValidationPolicy::default()).await;

        assert!(matches!(result, Err(SettingsError::MalformedConfig { .. })));
    }

    #[tokio::test]
    async fn test_keycloak_save_end_to_end() {
        let h = Harness::new();
        let service = h.service().await;

        service
            .set_draft(ProviderDraft::Keycloak(valid_keycloak()))
            .await
            .unwrap();
        let outcome = service.save().await.unwrap();

        assert!(matches!(outcome, SaveOutcome::Settled { changed: true, .. }));
        let persisted = service.persisted().await;
        assert_eq!(persisted.auth_provider, ProviderKind::Keycloak);
        let config: KeycloakConfig = serde_json::from_str(&persisted.auth_config).unwrap();
        assert_eq!(config.url, "https://idp.example");
        assert_eq!(config.public_key, encoding::encode_text("pk"));
        assert_eq!(h.observer.changes(), vec![ProviderKind::Keycloak]);
        assert_eq!(h.notifications(), vec!["Saved"]);
    }

    #[tokio::test]
    async fn test_rollback_records_failure_and_still_notifies() {
        let h = Harness::new();
        h.sync.respond_with(Some(SyncOutcome::failed("unreachable")));
        let service = h.service().await;

        service
            .set_draft(ProviderDraft::Keycloak(valid_keycloak()))
            .await
            .unwrap();
        let outcome = service.save().await.unwrap();

        assert!(matches!(outcome, SaveOutcome::RolledBack { .. }));
        assert_eq!(
            service.failure_for(ProviderKind::Keycloak).await.as_deref(),
            Some("unreachable")
        );
        assert_eq!(service.failure_for(ProviderKind::Ldap).await, None);
        assert_eq!(service.persisted().await, AuthSettings::native());
        assert_eq!(
            h.log.calls(),
            vec!["fetch", "save:keycloak", "sync:keycloak", "save:native"]
        );
        assert_eq!(h.notifications(), vec!["Saved"]);
        assert_eq!(service.active().await, ProviderKind::Native);
        assert_eq!(service.orchestrator().applied().await, ProviderKind::Native);
        // draft stays on the attempted provider so it can be fixed
        assert_eq!(service.selected().await, ProviderKind::Keycloak);
    }

    #[tokio::test]
    async fn test_next_save_clears_previous_failure() {
        let h = Harness::new();
        h.sync.respond_with(Some(SyncOutcome::failed("bind failed")));
        let service = h.service().await;
        service
            .set_draft(ProviderDraft::Ldap(valid_ldap()))
            .await
            .unwrap();
        service.save().await.unwrap();
        assert!(service.failure_for(ProviderKind::Ldap).await.is_some());

        h.sync.respond_with(Some(SyncOutcome::ok("")));
        service.save().await.unwrap();

        assert_eq!(service.failure_for(ProviderKind::Ldap).await, None);
        assert_eq!(service.persisted().await.auth_provider, ProviderKind::Ldap);
    }

    #[tokio::test]
    async fn test_invalid_save_is_silent() {
        let h = Harness::new();
        let service = h.service().await;
        service
            .set_draft(ProviderDraft::OAuth2(OAuth2Draft {
                secret: String::new(),
                ..valid_oauth2()
            }))
            .await
            .unwrap();

        let outcome = service.save().await.unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::Invalid {
                field: Field::OAuth2Secret
            }
        );
        assert!(h.store.saved().is_empty());
        assert!(h.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_edit_and_validation_stay_in_step() {
        let h = Harness::new();
        let service = h.service().await;
        service.select_provider(ProviderKind::Keycloak).await.unwrap();
        assert_eq!(
            service.validation().await.first_invalid(),
            Some(Field::KeycloakUrl)
        );

        service
            .edit(|draft| {
                if let ProviderDraft::Keycloak(d) = draft {
                    *d = KeycloakDraft {
                        admin_password: String::new(),
                        ..valid_keycloak()
                    };
                }
            })
            .await;

        assert_eq!(
            service.validation().await.first_invalid(),
            Some(Field::KeycloakAdminPassword)
        );
    }

    #[tokio::test]
    async fn test_preview_ldap_opens_modal_without_persisting() {
        let h = Harness::new();
        let service = h.service().await;
        service
            .set_draft(ProviderDraft::Ldap(valid_ldap()))
            .await
            .unwrap();
        service.set_ldap_encryption(EncryptionType::Ldaps).await;

        let preview = service.preview_ldap().await.unwrap();

        assert!(!preview.is_error);
        assert_eq!(service.preview().await, preview);
        assert_eq!(
            *h.modal.opened.lock().unwrap(),
            vec![LDAP_PREVIEW_MODAL.to_string()]
        );
        assert_eq!(h.notifications(), vec!["Saved"]);
        assert_eq!(
            h.preview.requests.lock().unwrap()[0].encryption_type,
            EncryptionType::Ldaps
        );
        assert!(h.store.saved().is_empty());
        assert_eq!(service.persisted().await, AuthSettings::native());
    }

    #[tokio::test]
    async fn test_preview_requires_ldap_draft() {
        let h = Harness::new();
        let service = h.service().await;

        let err = service.preview_ldap().await.unwrap_err();

        assert!(matches!(
            err,
            SettingsError::ProviderMismatch {
                expected: ProviderKind::Ldap,
                actual: ProviderKind::Native,
            }
        ));
        assert!(h.modal.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_switch_resets_preview() {
        let h = Harness::new();
        let service = h.service().await;
        service
            .set_draft(ProviderDraft::Ldap(LdapDraft {
                server_port: "389".to_string(),
                ..valid_ldap()
            }))
            .await
            .unwrap();
        service.preview_ldap().await.unwrap();
        assert!(!service.preview().await.is_error);

        service.select_provider(ProviderKind::OAuth2).await.unwrap();

        assert_eq!(service.preview().await, LdapPreview::unable_to_connect());
    }

    #[tokio::test]
    async fn test_reload_discards_edits() {
        let h = Harness::new();
        let service = h.service().await;
        service.select_provider(ProviderKind::Ldap).await.unwrap();

        assert_eq!(service.selected().await, ProviderKind::Ldap);
        assert_eq!(service.active().await, ProviderKind::Native);

        service.reload().await.unwrap();

        assert_eq!(service.selected().await, ProviderKind::Native);
    }
}
