//! Admin and public API payloads of the authorization server.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Client-metadata key naming the user store that authenticates the client's users.
pub const STORE_KEY: &str = "store";
/// Client-metadata and context key carrying the remember intention.
pub const REMEMBER_KEY: &str = "remember";

/// The authorization server sends `null` for empty lists.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuth2Client {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl OAuth2Client {
    fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref()?.as_object()?.get(key)
    }

    /// The `store` entry of the client metadata. Blank strings count as absent;
    /// non-string scalars are rendered to their textual form.
    pub fn store(&self) -> Option<String> {
        let store = match self.metadata_value(STORE_KEY)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!store.is_empty()).then_some(store)
    }

    /// The `remember` entry of the client metadata: a boolean or the strings
    /// `"true"`/`"false"`. Anything else reads as false.
    pub fn remember(&self) -> bool {
        match self.metadata_value(REMEMBER_KEY) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub skip: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client: OAuth2Client,
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requested_scope: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requested_access_token_audience: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsentRequest {
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub skip: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client: OAuth2Client,
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requested_scope: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requested_access_token_audience: Vec<String>,
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub login_session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub request_url: Option<String>,
    #[serde(default)]
    pub rp_initiated: bool,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptLoginRequest {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember_for: Option<i64>,
    pub context: Value,
}

/// Claims handed to the authorization server for the issued tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsentSession {
    pub access_token: BTreeMap<String, String>,
    pub id_token: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptConsentRequest {
    pub grant_scope: Vec<String>,
    pub grant_access_token_audience: Vec<String>,
    /// RFC 3339 timestamp.
    pub handled_at: String,
    pub remember: bool,
    pub remember_for: i64,
    pub session: ConsentSession,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectRequest {
    pub status_code: u16,
    pub error: String,
    pub error_description: String,
    pub error_hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_debug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedRequest {
    pub redirect_to: String,
}

/// Subset of the OpenID provider metadata used here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub jwks_uri: String,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
}
