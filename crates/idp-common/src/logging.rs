//! Structured Logging Configuration
//!
//! Provides configurable logging with:
//! - JSON output for log aggregation (`LOG_FORMAT=json` or `format = "json"`)
//! - Human-readable output for operators (default)
//!
//! # Usage
//!
//! ```rust,ignore
//! use idp_common::logging::{init_logging, LogFormat};
//!
//! fn main() {
//!     init_logging("idp-admin", LogFormat::Text, "info");
//!
//!     tracing::info!(provider = %kind, "Auth provider saved");
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: "json" forces JSON output regardless of the configured format
//! - `RUST_LOG`: standard filter, takes precedence over the configured level
//!   (e.g. `RUST_LOG=idp_settings=debug,reqwest=warn`)

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse a format name, falling back to text for anything unrecognised
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    /// `LOG_FORMAT=json` wins over the configured format.
    fn resolve(self) -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => self,
        }
    }
}

/// Build the level filter: `RUST_LOG` if set and valid, otherwise `default_level`.
pub fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging for a binary.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_logging(service_name: &str, format: LogFormat, default_level: &str) {
    let env_filter = build_filter(default_level);

    let installed = match format.resolve() {
        LogFormat::Json => init_json_logging(env_filter),
        LogFormat::Text => init_text_logging(env_filter),
    };

    if installed {
        tracing::debug!(service = service_name, "Logging initialized");
    }
}

fn init_json_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE),
        )
        .try_init()
        .is_ok()
}

fn init_text_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(true),
        )
        .try_init()
        .is_ok()
}
