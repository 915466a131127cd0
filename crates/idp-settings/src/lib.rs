//! Authentication provider settings
//!
//! Drafting, validation, save/sync orchestration with rollback, and LDAP
//! connection preview for the identity provider that governs sign-in.
//!
//! - [`normalizer`]: persisted payload to editable draft
//! - [`validator`]: per-provider required-field checks
//! - [`store`]: the draft being edited and what the backend holds
//! - [`orchestrator`]: validate, persist, sync, roll back
//! - [`preview`]: LDAP "test connection"
//! - [`http`]: backend REST implementation of the collaborator traits
//! - [`service`]: everything above behind one facade

pub mod draft;
pub mod encoding;
pub mod error;
pub mod gateway;
pub mod http;
pub mod normalizer;
pub mod orchestrator;
pub mod preview;
pub mod provider;
pub mod service;
pub mod store;
pub mod validator;

#[cfg(test)]
mod testing;

pub use draft::{KeycloakDraft, LdapDraft, OAuth2Draft, ProviderDraft};
pub use error::{Result, SettingsError};
pub use gateway::{
    AuthConfigStore, LdapPreviewClient, LoggingObserver, Modal, Notifier, ProviderChangeObserver,
    SyncGateway, TracingModal, TracingNotifier,
};
pub use http::HttpSettingsGateway;
pub use normalizer::normalize;
pub use orchestrator::{SaveOrchestrator, SaveOutcome, SavePhase};
pub use preview::LdapPreviewGateway;
pub use provider::{
    AuthSettings, EncryptionType, KeycloakConfig, LdapConfig, LdapPreview, OAuth2Config,
    ProviderConfig, ProviderKind, SyncOutcome,
};
pub use service::{AuthSettingsService, SettingsCollaborators};
pub use store::DraftStore;
pub use validator::{validate, Field, ValidationPolicy, ValidationReport};
