//! Session Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfig(String),

    #[error("Identity provider initialization failed: {0}")]
    InitFailed(String),

    #[error("login failed")]
    LoginFailed,

    #[error("Identity provider client not initialized")]
    NotInitialized,

    #[error("No active session")]
    NotAuthenticated,

    #[error("Identity provider returned {status}: {message}")]
    Idp { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
