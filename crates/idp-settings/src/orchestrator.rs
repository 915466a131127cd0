//! Save/Sync Orchestrator
//!
//! Sequences one save: validate, normalize for storage, persist, then sync
//! the delegated provider. A failed sync rolls the active provider back to
//! Native and persists that, so the backend is never left pointing at a
//! provider nobody could reach.
//!
//! Saves are serialized: the sequence holds `applied` for its whole
//! duration, and `applied` is also the provider the rest of the application
//! currently believes is active.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::draft::{KeycloakDraft, LdapDraft, OAuth2Draft, ProviderDraft};
use crate::encoding;
use crate::error::Result;
use crate::gateway::{sync_provider, AuthConfigStore, ProviderChangeObserver, SyncGateway};
use crate::provider::{
    AuthSettings, KeycloakConfig, LdapConfig, OAuth2Config, ProviderConfig, ProviderKind,
    SyncOutcome,
};
use crate::validator::{validate, Field, ValidationPolicy};

/// Save-time default for `defaultPermissionAddSpace` (load-time default differs)
pub const SAVE_DEFAULT_PERMISSION_ADD_SPACE: bool = true;
pub const SAVE_DEFAULT_DISABLE_LOGOUT: bool = true;

/// Where the current save sequence is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SavePhase {
    #[default]
    Editing,
    Validating,
    Persisting,
    Syncing,
    Settled,
    RolledBack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was persisted; `field` is the first one needing attention
    Invalid { field: Field },
    /// The attempted provider is now active. `changed` is true when
    /// observers were told about a new provider.
    Settled { settings: AuthSettings, changed: bool },
    /// Sync failed and Native was persisted in its place
    RolledBack {
        attempted: ProviderKind,
        message: String,
        settings: AuthSettings,
    },
}

impl SaveOutcome {
    /// Settings the backend holds after this save, if anything was persisted
    pub fn persisted(&self) -> Option<&AuthSettings> {
        match self {
            SaveOutcome::Invalid { .. } => None,
            SaveOutcome::Settled { settings, .. } | SaveOutcome::RolledBack { settings, .. } => {
                Some(settings)
            }
        }
    }
}

pub struct SaveOrchestrator {
    store: Arc<dyn AuthConfigStore>,
    sync: Arc<dyn SyncGateway>,
    observer: Arc<dyn ProviderChangeObserver>,
    policy: ValidationPolicy,
    applied: Mutex<ProviderKind>,
    phase: watch::Sender<SavePhase>,
}

impl SaveOrchestrator {
    /// `applied` is the provider the application is running with right now.
    pub fn new(
        store: Arc<dyn AuthConfigStore>,
        sync: Arc<dyn SyncGateway>,
        observer: Arc<dyn ProviderChangeObserver>,
        policy: ValidationPolicy,
        applied: ProviderKind,
    ) -> Self {
        let (phase, _) = watch::channel(SavePhase::Editing);
        Self {
            store,
            sync,
            observer,
            policy,
            applied: Mutex::new(applied),
            phase,
        }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn subscribe(&self) -> watch::Receiver<SavePhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> SavePhase {
        *self.phase.borrow()
    }

    /// Provider the application believes is active
    pub async fn applied(&self) -> ProviderKind {
        *self.applied.lock().await
    }

    /// Run one save sequence for `draft`.
    ///
    /// Validation failures and sync failures are outcomes. Persistence
    /// failures, including a failed rollback write, are errors.
    pub async fn save(&self, draft: &ProviderDraft) -> Result<SaveOutcome> {
        let span = info_span!("auth_settings_save", provider = %draft.kind());
        self.run(draft).instrument(span).await
    }

    async fn run(&self, draft: &ProviderDraft) -> Result<SaveOutcome> {
        let mut applied = self.applied.lock().await;
        let kind = draft.kind();

        self.set_phase(SavePhase::Validating);
        if let Some(field) = validate(draft, self.policy).first_invalid() {
            debug!(field = %field, "Save aborted by validation");
            self.set_phase(SavePhase::Editing);
            return Ok(SaveOutcome::Invalid { field });
        }

        let config = match prepare(draft, self.policy) {
            Ok(config) => config,
            Err(field) => {
                debug!(field = %field, "Save aborted while normalizing");
                self.set_phase(SavePhase::Editing);
                return Ok(SaveOutcome::Invalid { field });
            }
        };
        let settings = config.to_settings()?;

        self.set_phase(SavePhase::Persisting);
        if let Err(e) = self.store.save(&settings).await {
            self.set_phase(SavePhase::Editing);
            return Err(e);
        }
        debug!("Settings persisted");

        if !kind.requires_sync() {
            return Ok(self.settle(&mut applied, settings));
        }

        self.set_phase(SavePhase::Syncing);
        let outcome = match sync_provider(self.sync.as_ref(), kind).await {
            Ok(outcome) => outcome,
            Err(e) => SyncOutcome::failed(e.to_string()),
        };

        if !outcome.is_error {
            return Ok(self.settle(&mut applied, settings));
        }

        warn!(message = %outcome.message, "Provider sync failed, rolling back to native");
        let fallback = AuthSettings::native();
        if let Err(e) = self.store.save(&fallback).await {
            self.set_phase(SavePhase::Editing);
            return Err(e);
        }

        if *applied != ProviderKind::Native {
            self.observer.on_change(&fallback);
            *applied = ProviderKind::Native;
        }

        self.set_phase(SavePhase::RolledBack);
        Ok(SaveOutcome::RolledBack {
            attempted: kind,
            message: outcome.message,
            settings: fallback,
        })
    }

    fn settle(&self, applied: &mut ProviderKind, settings: AuthSettings) -> SaveOutcome {
        let changed = *applied != settings.auth_provider;
        if changed {
            self.observer.on_change(&settings);
            *applied = settings.auth_provider;
        }
        info!(changed, "Authentication settings saved");
        self.set_phase(SavePhase::Settled);
        SaveOutcome::Settled { settings, changed }
    }

    fn set_phase(&self, phase: SavePhase) {
        self.phase.send_replace(phase);
    }
}

/// Normalize a validated draft into its persisted shape.
///
/// The trimmed draft is validated again; returns the field to focus when
/// that final gate fails.
pub fn prepare(
    draft: &ProviderDraft,
    policy: ValidationPolicy,
) -> std::result::Result<ProviderConfig, Field> {
    let trimmed = draft.trimmed();
    if let Some(field) = validate(&trimmed, policy).first_invalid() {
        return Err(field);
    }
    Ok(match &trimmed {
        ProviderDraft::Native => ProviderConfig::Native,
        ProviderDraft::Keycloak(d) => ProviderConfig::Keycloak(prepare_keycloak(d)?),
        ProviderDraft::OAuth2(d) => ProviderConfig::OAuth2(prepare_oauth2(d)),
        ProviderDraft::Ldap(d) => ProviderConfig::Ldap(prepare_ldap(d)?),
    })
}

fn prepare_keycloak(d: &KeycloakDraft) -> std::result::Result<KeycloakConfig, Field> {
    let url = d.url.strip_suffix('/').unwrap_or(&d.url);
    if url.is_empty() {
        return Err(Field::KeycloakUrl);
    }
    Ok(KeycloakConfig {
        url: url.to_string(),
        realm: d.realm.clone(),
        client_id: d.client_id.clone(),
        public_key: encoding::encode_text(&d.public_key),
        admin_user: d.admin_user.clone(),
        admin_password: d.admin_password.clone(),
        group: d.group.clone().unwrap_or_default(),
        disable_logout: d.disable_logout.unwrap_or(SAVE_DEFAULT_DISABLE_LOGOUT),
        default_permission_add_space: d
            .default_permission_add_space
            .unwrap_or(SAVE_DEFAULT_PERMISSION_ADD_SPACE),
    })
}

fn prepare_oauth2(d: &OAuth2Draft) -> OAuth2Config {
    OAuth2Config {
        auth_url: d.auth_url.clone(),
        token_url: d.token_url.clone(),
        client_id: d.client_id.clone(),
        secret: d.secret.clone(),
        scope: d.scope.clone(),
    }
}

fn prepare_ldap(d: &LdapDraft) -> std::result::Result<LdapConfig, Field> {
    d.to_config().ok_or(Field::LdapServerPort)
}
