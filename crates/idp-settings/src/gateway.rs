//! Collaborator seams for the settings workflow
//!
//! The backend is reached through [`AuthConfigStore`], [`SyncGateway`] and
//! [`LdapPreviewClient`]; user-facing side effects go through [`Notifier`],
//! [`Modal`] and [`ProviderChangeObserver`].

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::provider::{AuthSettings, LdapConfig, LdapPreview, ProviderKind, SyncOutcome};

/// Persists the active provider record.
#[async_trait]
pub trait AuthConfigStore: Send + Sync {
    async fn save(&self, settings: &AuthSettings) -> Result<()>;

    async fn fetch(&self) -> Result<AuthSettings>;
}

/// Asks the backend to reconcile users and groups with a delegated provider.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    async fn sync_keycloak(&self) -> Result<SyncOutcome>;

    async fn sync_oauth2(&self) -> Result<SyncOutcome>;

    async fn sync_ldap(&self) -> Result<SyncOutcome>;
}

/// Dispatch a sync by provider. Native has nothing to reconcile.
pub async fn sync_provider(gateway: &dyn SyncGateway, kind: ProviderKind) -> Result<SyncOutcome> {
    match kind {
        ProviderKind::Native => Ok(SyncOutcome::ok("")),
        ProviderKind::Keycloak => gateway.sync_keycloak().await,
        ProviderKind::OAuth2 => gateway.sync_oauth2().await,
        ProviderKind::Ldap => gateway.sync_ldap().await,
    }
}

/// Runs a non-persisting LDAP connection test.
#[async_trait]
pub trait LdapPreviewClient: Send + Sync {
    async fn preview_ldap(&self, config: &LdapConfig) -> Result<LdapPreview>;
}

/// Told when the effective provider changes (settled save or rollback).
pub trait ProviderChangeObserver: Send + Sync {
    fn on_change(&self, settings: &AuthSettings);
}

pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
}

pub trait Modal: Send + Sync {
    fn open(&self, id: &str);
}

/// Emits notifications as log events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, message: &str) {
        info!(message, "Notification");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingModal;

impl Modal for TracingModal {
    fn open(&self, id: &str) {
        info!(modal = id, "Modal opened");
    }
}

/// Logs provider changes; the configuration blob is never logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl ProviderChangeObserver for LoggingObserver {
    fn on_change(&self, settings: &AuthSettings) {
        info!(provider = %settings.auth_provider, "Active authentication provider changed");
    }
}
