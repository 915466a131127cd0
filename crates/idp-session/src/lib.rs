//! Delegated login session lifecycle
//!
//! [`SessionService`] holds the process-wide IdP client: boot, login,
//! logout and profile retrieval. [`KeycloakHttpClient`] is the HTTP-backed
//! client used in production.

pub mod client;
pub mod error;
pub mod keycloak;
pub mod profile;
pub mod service;

pub use client::{DelegatedIdpClient, IdpClientFactory, LoginRedirect};
pub use error::{Result, SessionError};
pub use keycloak::{KeycloakClientConfig, KeycloakClientFactory, KeycloakHttpClient};
pub use profile::{map_profile, RawProfile, UserProfile};
pub use service::SessionService;
