//! Transport encoding for the Keycloak public key
//!
//! The key is held as plain text while editing and stored base64-encoded.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::{Result, SettingsError};

pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(encoded.trim())
        .map_err(|e| SettingsError::InvalidEncoding(e.to_string()))
}

pub fn encode_text(text: &str) -> String {
    encode(text.as_bytes())
}

/// Decode to text; the payload must be UTF-8.
pub fn decode_text(encoded: &str) -> Result<String> {
    let bytes = decode(encoded)?;
    String::from_utf8(bytes).map_err(|e| SettingsError::InvalidEncoding(e.to_string()))
}
