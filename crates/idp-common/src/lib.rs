//! Shared infrastructure for the IdP settings workspace.

pub mod logging;

pub use logging::{init_logging, LogFormat};
