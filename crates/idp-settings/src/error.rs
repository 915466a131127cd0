//! Settings Error Types

use thiserror::Error;

use crate::provider::ProviderKind;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Malformed {provider} configuration: {source}")]
    MalformedConfig {
        provider: ProviderKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid public key encoding: {0}")]
    InvalidEncoding(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Gateway returned {status}: {message}")]
    Gateway { status: u16, message: String },

    #[error("Expected {expected} draft, found {actual}")]
    ProviderMismatch {
        expected: ProviderKind,
        actual: ProviderKind,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SettingsError {
    pub fn malformed(provider: ProviderKind, source: serde_json::Error) -> Self {
        Self::MalformedConfig { provider, source }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SettingsError>;
