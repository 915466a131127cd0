//! Recording collaborators shared by the unit tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Result, SettingsError};
use crate::gateway::{
    AuthConfigStore, LdapPreviewClient, Modal, Notifier, ProviderChangeObserver, SyncGateway,
};
use crate::provider::{AuthSettings, LdapConfig, LdapPreview, ProviderKind, SyncOutcome};

/// Ordered record of backend calls, shared across mocks
#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub struct MockConfigStore {
    pub saved: Mutex<Vec<AuthSettings>>,
    pub current: Mutex<AuthSettings>,
    /// Fail the nth save (1-based), 0 never fails
    pub fail_on_save: AtomicU32,
    pub log: Arc<CallLog>,
}

impl MockConfigStore {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            saved: Mutex::new(vec![]),
            current: Mutex::new(AuthSettings::native()),
            fail_on_save: AtomicU32::new(0),
            log,
        }
    }

    pub fn saved(&self) -> Vec<AuthSettings> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthConfigStore for MockConfigStore {
    async fn save(&self, settings: &AuthSettings) -> Result<()> {
        self.log.push(format!("save:{}", settings.auth_provider));
        let attempt = self.saved.lock().unwrap().len() as u32 + 1;
        if self.fail_on_save.load(Ordering::SeqCst) == attempt {
            return Err(SettingsError::persistence("store unavailable"));
        }
        self.saved.lock().unwrap().push(settings.clone());
        *self.current.lock().unwrap() = settings.clone();
        Ok(())
    }

    async fn fetch(&self) -> Result<AuthSettings> {
        self.log.push("fetch");
        Ok(self.current.lock().unwrap().clone())
    }
}

pub struct MockSync {
    pub outcome: Mutex<Option<SyncOutcome>>,
    pub log: Arc<CallLog>,
}

impl MockSync {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            outcome: Mutex::new(Some(SyncOutcome::ok("synced"))),
            log,
        }
    }

    /// `None` makes the sync call itself fail
    pub fn respond_with(&self, outcome: Option<SyncOutcome>) {
        *self.outcome.lock().unwrap() = outcome;
    }

    fn respond(&self, kind: ProviderKind) -> Result<SyncOutcome> {
        self.log.push(format!("sync:{}", kind));
        self.outcome.lock().unwrap().clone().ok_or(SettingsError::Gateway {
            status: 502,
            message: "bad gateway".to_string(),
        })
    }
}

#[async_trait]
impl SyncGateway for MockSync {
    async fn sync_keycloak(&self) -> Result<SyncOutcome> {
        self.respond(ProviderKind::Keycloak)
    }

    async fn sync_oauth2(&self) -> Result<SyncOutcome> {
        self.respond(ProviderKind::OAuth2)
    }

    async fn sync_ldap(&self) -> Result<SyncOutcome> {
        self.respond(ProviderKind::Ldap)
    }
}

pub struct MockPreview {
    pub requests: Mutex<Vec<LdapConfig>>,
    pub response: Mutex<LdapPreview>,
}

impl Default for MockPreview {
    fn default() -> Self {
        Self {
            requests: Mutex::new(vec![]),
            response: Mutex::new(LdapPreview {
                is_error: false,
                message: "Connected".to_string(),
                users: vec![serde_json::json!({"username": "jdoe"})],
                groups: vec![],
            }),
        }
    }
}

#[async_trait]
impl LdapPreviewClient for MockPreview {
    async fn preview_ldap(&self, config: &LdapConfig) -> Result<LdapPreview> {
        self.requests.lock().unwrap().push(config.clone());
        Ok(self.response.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MockObserver {
    pub changes: Mutex<Vec<AuthSettings>>,
}

impl MockObserver {
    pub fn changes(&self) -> Vec<ProviderKind> {
        self.changes
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.auth_provider)
            .collect()
    }
}

impl ProviderChangeObserver for MockObserver {
    fn on_change(&self, settings: &AuthSettings) {
        self.changes.lock().unwrap().push(settings.clone());
    }
}

#[derive(Default)]
pub struct MockNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl Notifier for MockNotifier {
    fn notify_success(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct MockModal {
    pub opened: Mutex<Vec<String>>,
}

impl Modal for MockModal {
    fn open(&self, id: &str) {
        self.opened.lock().unwrap().push(id.to_string());
    }
}
