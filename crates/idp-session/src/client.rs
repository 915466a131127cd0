//! Delegated IdP client seam

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::profile::RawProfile;

/// Where the browser should go to sign in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub url: String,
}

/// Browser-delegated identity provider client
#[async_trait]
pub trait DelegatedIdpClient: Send + Sync {
    /// Prepare the client (endpoint discovery and the like).
    async fn init(&self) -> Result<()>;

    async fn login(&self, redirect_uri: &str) -> Result<LoginRedirect>;

    /// Trade an authorization code for tokens held by the client.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<()>;

    async fn logout(&self, auth_config: &Value) -> Result<()>;

    async fn load_user_profile(&self) -> Result<RawProfile>;

    async fn token(&self) -> Option<String>;

    async fn clear_token(&self);
}

/// Builds a client from the persisted auth-config blob.
pub trait IdpClientFactory: Send + Sync {
    fn create(&self, auth_config: &Value) -> Result<Arc<dyn DelegatedIdpClient>>;
}
