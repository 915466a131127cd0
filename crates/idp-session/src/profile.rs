//! Profile normalization
//!
//! Providers disagree on which profile fields they send. [`map_profile`]
//! folds whatever arrived into one canonical shape.

use serde::{Deserialize, Deserializer, Serialize};

/// Profile as returned by the identity provider; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProfile {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub enabled: Option<bool>,
}

/// Some providers send numeric user ids.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdInput {
        Number(i64),
        Text(String),
    }

    Ok(Option::<IdInput>::deserialize(deserializer)?.map(|id| match id {
        IdInput::Number(n) => n.to_string(),
        IdInput::Text(s) => s,
    }))
}

/// Canonical user profile handed to the application's sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub domain: String,
    pub token: String,
    pub remote_id: String,
    pub email: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub enabled: bool,
}

/// Map a raw profile. `token` comes from the live client, not the profile.
pub fn map_profile(profile: &RawProfile, token: impl Into<String>) -> UserProfile {
    let username = profile.username.clone().unwrap_or_default();

    UserProfile {
        domain: String::new(),
        token: token.into(),
        remote_id: profile
            .id
            .clone()
            .or_else(|| profile.email.clone())
            .unwrap_or_default(),
        email: profile.email.clone().unwrap_or_default(),
        firstname: profile
            .first_name
            .clone()
            .unwrap_or_else(|| username.clone()),
        lastname: profile
            .last_name
            .clone()
            .unwrap_or_else(|| username.clone()),
        username,
        enabled: profile.enabled.unwrap_or(true),
    }
}
