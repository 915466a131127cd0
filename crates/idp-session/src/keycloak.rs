//! Keycloak client over HTTP
//!
//! Authorization-code flow against a Keycloak realm. Endpoints come from
//! the realm's OpenID discovery document.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::{DelegatedIdpClient, IdpClientFactory, LoginRedirect};
use crate::error::{Result, SessionError};
use crate::profile::RawProfile;

/// Fields of the auth-config blob the client needs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakClientConfig {
    pub url: String,
    pub realm: String,
    pub client_id: String,
}

impl KeycloakClientConfig {
    pub fn from_value(value: &Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value.clone())
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;

        if config.url.trim().is_empty() || config.realm.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "url and realm are required".to_string(),
            ));
        }
        Ok(config)
    }

    fn realm_url(&self) -> String {
        format!("{}/realms/{}", self.url.trim_end_matches('/'), self.realm)
    }

    pub fn discovery_url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.realm_url())
    }

    pub fn account_url(&self) -> String {
        format!("{}/account", self.realm_url())
    }

    fn default_logout_url(&self) -> String {
        format!("{}/protocol/openid-connect/logout", self.realm_url())
    }
}

/// Subset of the OpenID provider metadata
#[derive(Debug, Clone, Deserialize)]
struct OpenIdConfiguration {
    authorization_endpoint: String,
    token_endpoint: String,
    #[serde(default)]
    end_session_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
struct SessionTokens {
    access_token: String,
    refresh_token: Option<String>,
}

pub struct KeycloakHttpClient {
    config: KeycloakClientConfig,
    http_client: reqwest::Client,
    discovery: RwLock<Option<OpenIdConfiguration>>,
    tokens: RwLock<Option<SessionTokens>>,
}

impl KeycloakHttpClient {
    pub fn new(config: KeycloakClientConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
            discovery: RwLock::new(None),
            tokens: RwLock::new(None),
        }
    }

    async fn discovery(&self) -> Result<OpenIdConfiguration> {
        self.discovery
            .read()
            .await
            .clone()
            .ok_or(SessionError::NotInitialized)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(SessionError::Idp {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DelegatedIdpClient for KeycloakHttpClient {
    async fn init(&self) -> Result<()> {
        let url = self.config.discovery_url();
        debug!(%url, "Fetching OpenID discovery document");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| SessionError::InitFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::InitFailed(format!(
                "discovery returned {}",
                status
            )));
        }

        let discovery: OpenIdConfiguration = response
            .json()
            .await
            .map_err(|e| SessionError::InitFailed(e.to_string()))?;

        *self.discovery.write().await = Some(discovery);
        info!(realm = %self.config.realm, "Keycloak client ready");
        Ok(())
    }

    async fn login(&self, redirect_uri: &str) -> Result<LoginRedirect> {
        let discovery = self.discovery().await?;
        let mut url = Url::parse(&discovery.authorization_endpoint)
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid");

        Ok(LoginRedirect {
            url: url.to_string(),
        })
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<()> {
        let discovery = self.discovery().await?;
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http_client
            .post(&discovery.token_endpoint)
            .form(&form)
            .send()
            .await?;
        let tokens: TokenResponse = check_status(response).await?.json().await?;

        *self.tokens.write().await = Some(SessionTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        });
        debug!("Authorization code exchanged");
        Ok(())
    }

    async fn logout(&self, auth_config: &Value) -> Result<()> {
        // disableLogout keeps the Keycloak session alive
        if auth_config
            .get("disableLogout")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            debug!("Remote logout disabled, skipping end-session call");
            return Ok(());
        }

        let discovery = self.discovery().await?;
        let url = discovery
            .end_session_endpoint
            .unwrap_or_else(|| self.config.default_logout_url());

        let refresh_token = self
            .tokens
            .read()
            .await
            .as_ref()
            .and_then(|t| t.refresh_token.clone());

        let mut form = vec![("client_id", self.config.client_id.clone())];
        if let Some(token) = refresh_token {
            form.push(("refresh_token", token));
        }

        let response = self.http_client.post(&url).form(&form).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn load_user_profile(&self) -> Result<RawProfile> {
        let token = self.token().await.ok_or(SessionError::NotAuthenticated)?;

        let response = self
            .http_client
            .get(self.config.account_url())
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    async fn token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    async fn clear_token(&self) {
        *self.tokens.write().await = None;
    }
}

/// Builds [`KeycloakHttpClient`]s sharing one HTTP connection pool
#[derive(Debug, Clone)]
pub struct KeycloakClientFactory {
    http_client: reqwest::Client,
}

impl KeycloakClientFactory {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }
}

impl IdpClientFactory for KeycloakClientFactory {
    fn create(&self, auth_config: &Value) -> Result<Arc<dyn DelegatedIdpClient>> {
        let config = KeycloakClientConfig::from_value(auth_config)?;
        Ok(Arc::new(KeycloakHttpClient::new(
            config,
            self.http_client.clone(),
        )))
    }
}
