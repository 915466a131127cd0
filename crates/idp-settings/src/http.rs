//! HTTP client for the settings backend

use std::time::Duration;

use async_trait::async_trait;
use idp_config::GatewayConfig;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Result, SettingsError};
use crate::gateway::{AuthConfigStore, LdapPreviewClient, SyncGateway};
use crate::provider::{AuthSettings, LdapConfig, LdapPreview, SyncOutcome};

/// Persistence, sync and LDAP preview over the backend REST API
#[derive(Debug, Clone)]
pub struct HttpSettingsGateway {
    config: GatewayConfig,
    http_client: reqwest::Client,
}

impl HttpSettingsGateway {
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("idp-settings/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config: config.clone(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.endpoint(path);
        debug!(%method, %url, "Settings gateway request");
        let builder = self.http_client.request(method, url);
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn sync(&self, path: &str) -> Result<SyncOutcome> {
        let response = self.request(Method::GET, path).send().await?;
        json_body(response).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(SettingsError::Gateway {
        status: status.as_u16(),
        message,
    })
}

async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_status(response).await?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl AuthConfigStore for HttpSettingsGateway {
    async fn save(&self, settings: &AuthSettings) -> Result<()> {
        let response = self
            .request(Method::PUT, &self.config.auth_path)
            .json(settings)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn fetch(&self) -> Result<AuthSettings> {
        let response = self
            .request(Method::GET, &self.config.auth_path)
            .send()
            .await?;
        json_body(response).await
    }
}

#[async_trait]
impl SyncGateway for HttpSettingsGateway {
    async fn sync_keycloak(&self) -> Result<SyncOutcome> {
        self.sync(&self.config.sync_keycloak_path).await
    }

    async fn sync_oauth2(&self) -> Result<SyncOutcome> {
        self.sync(&self.config.sync_oauth2_path).await
    }

    async fn sync_ldap(&self) -> Result<SyncOutcome> {
        self.sync(&self.config.sync_ldap_path).await
    }
}

#[async_trait]
impl LdapPreviewClient for HttpSettingsGateway {
    async fn preview_ldap(&self, config: &LdapConfig) -> Result<LdapPreview> {
        let response = self
            .request(Method::POST, &self.config.ldap_preview_path)
            .json(config)
            .send()
            .await?;
        json_body(response).await
    }
}
