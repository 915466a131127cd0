//! Session Lifecycle Service
//!
//! Owns the one delegated IdP client for the process. The client is built
//! lazily from the persisted auth configuration and memoized once its
//! initialization succeeds.

use std::sync::Arc;

use idp_config::SessionConfig;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::{DelegatedIdpClient, IdpClientFactory, LoginRedirect};
use crate::error::{Result, SessionError};
use crate::profile::{self, RawProfile, UserProfile};

pub struct SessionService {
    factory: Arc<dyn IdpClientFactory>,
    auth_config: String,
    redirect_url: String,
    client: RwLock<Option<Arc<dyn DelegatedIdpClient>>>,
}

impl SessionService {
    /// `auth_config` is the persisted JSON blob the client is built from.
    pub fn new(
        factory: Arc<dyn IdpClientFactory>,
        auth_config: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            auth_config: auth_config.into(),
            redirect_url: redirect_url.into(),
            client: RwLock::new(None),
        }
    }

    pub fn from_config(
        factory: Arc<dyn IdpClientFactory>,
        auth_config: impl Into<String>,
        config: &SessionConfig,
    ) -> Self {
        Self::new(factory, auth_config, config.login_redirect_url())
    }

    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    fn parsed_config(&self) -> Result<Value> {
        serde_json::from_str(&self.auth_config)
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))
    }

    /// Get the client, building and initializing it on first use.
    ///
    /// Concurrent callers share one initialization. A failed init is not
    /// memoized, so the next call starts over.
    pub async fn boot(&self) -> Result<Arc<dyn DelegatedIdpClient>> {
        {
            let client = self.client.read().await;
            if let Some(ref client) = *client {
                return Ok(client.clone());
            }
        }

        let mut slot = self.client.write().await;

        // Another caller may have finished init while we waited
        if let Some(ref client) = *slot {
            return Ok(client.clone());
        }

        let client = self.factory.create(&self.parsed_config()?)?;
        client.init().await?;
        info!("Identity provider client initialized");

        *slot = Some(client.clone());
        Ok(client)
    }

    /// Start the redirect login flow back to the application.
    pub async fn login(&self) -> Result<LoginRedirect> {
        let client = self.boot().await?;
        client.login(&self.redirect_url).await.map_err(|e| {
            warn!(error = %e, "Login request failed");
            SessionError::LoginFailed
        })
    }

    /// Finish a login: exchange the returned code and map the profile.
    pub async fn complete_login(&self, code: &str) -> Result<UserProfile> {
        let client = self.boot().await?;
        client.exchange_code(code, &self.redirect_url).await?;
        let raw = client.load_user_profile().await?;
        let token = client.token().await.unwrap_or_default();
        Ok(profile::map_profile(&raw, token))
    }

    /// Log out at the IdP. The local token is cleared whatever the outcome.
    pub async fn logout(&self) -> Result<()> {
        let client = self.boot().await?;
        let result = match self.parsed_config() {
            Ok(config) => client.logout(&config).await,
            Err(e) => Err(e),
        };
        client.clear_token().await;

        match &result {
            Ok(()) => debug!("Logged out"),
            Err(e) => warn!(error = %e, "Logout failed, local token cleared"),
        }
        result
    }

    pub async fn fetch_profile(&self) -> Result<RawProfile> {
        let client = self.boot().await?;
        client.load_user_profile().await
    }

    /// Canonical profile with the token of the live client, empty before boot.
    pub async fn map_profile(&self, raw: &RawProfile) -> UserProfile {
        let client = self.client.read().await.clone();
        let token = match client {
            Some(client) => client.token().await.unwrap_or_default(),
            None => String::new(),
        };
        profile::map_profile(raw, token)
    }
}
