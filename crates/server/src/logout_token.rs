//! Back-channel logout token validation (OpenID Connect Back-Channel Logout 1.0).

use crate::error::LogoutTokenError;
use crate::hydra::AuthorizationServer;
use crate::revocation::SessionIdentity;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Member of the `events` claim identifying a logout token.
pub const BACKCHANNEL_LOGOUT_EVENT: &str = "http://schemas.openid.net/event/backchannel-logout";

/// Verified content of a logout token.
#[derive(Debug, Clone, Deserialize)]
pub struct LogoutClaims {
    pub iss: String,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub events: Option<Value>,
    /// `Some` whenever the claim is present, even as `null`.
    #[serde(default, deserialize_with = "present")]
    pub nonce: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl LogoutClaims {
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity::new(self.sub.clone(), self.sid.clone())
    }
}

fn is_asymmetric(alg: Algorithm) -> bool {
    !matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

/// Whether `events` is an object, or a string holding a JSON object, with the logout member.
fn has_logout_event(events: Option<&Value>) -> bool {
    match events {
        Some(Value::Object(map)) => map.contains_key(BACKCHANNEL_LOGOUT_EVENT),
        Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|parsed| {
                parsed
                    .as_object()
                    .map(|map| map.contains_key(BACKCHANNEL_LOGOUT_EVENT))
            })
            .unwrap_or(false),
        _ => false,
    }
}

fn check_logout_claims(claims: LogoutClaims) -> Result<LogoutClaims, LogoutTokenError> {
    if claims.identity().is_empty() {
        return Err(LogoutTokenError::MissingIdentity);
    }
    if claims.nonce.is_some() {
        return Err(LogoutTokenError::NoncePresent);
    }
    if !has_logout_event(claims.events.as_ref()) {
        return Err(LogoutTokenError::MissingLogoutEvent);
    }
    Ok(claims)
}

/// Issuer and signing keys, fetched live. Any failure yields no keys so that
/// verification fails closed.
async fn signing_keys(server: &dyn AuthorizationServer) -> Option<(String, Vec<Jwk>)> {
    let discovery = match server.discover().await {
        Ok(discovery) => discovery,
        Err(e) => {
            debug!("Discovery failed while validating a logout token: {e}");
            return None;
        }
    };
    match server.fetch_jwks(&discovery.jwks_uri).await {
        Ok(set) => Some((discovery.issuer, set.keys)),
        Err(e) => {
            debug!("Fetching signing keys failed: {e}");
            Some((discovery.issuer, Vec::new()))
        }
    }
}

/// Verifies `token` against the authorization server's current keys.
///
/// The signature, `exp`, `iss` (the discovered issuer) and `aud` (`audience`)
/// are checked first, then the logout-specific rules: `sub` or `sid` present,
/// no `nonce`, and an `events` claim naming the back-channel logout event.
pub async fn validate_logout_token(
    token: &str,
    server: &dyn AuthorizationServer,
    audience: &str,
) -> Result<LogoutClaims, LogoutTokenError> {
    let header = decode_header(token).map_err(|e| LogoutTokenError::Malformed(e.to_string()))?;
    if !is_asymmetric(header.alg) {
        return Err(LogoutTokenError::UnsupportedAlgorithm(header.alg));
    }

    let Some((issuer, keys)) = signing_keys(server).await else {
        return Err(LogoutTokenError::UnknownKey);
    };
    let candidates: Vec<&Jwk> = match header.kid.as_deref() {
        Some(kid) => keys
            .iter()
            .filter(|jwk| jwk.common.key_id.as_deref() == Some(kid))
            .collect(),
        None => keys.iter().collect(),
    };
    if candidates.is_empty() {
        return Err(LogoutTokenError::UnknownKey);
    }

    let mut validation = Validation::new(header.alg);
    validation.set_audience(&[audience]);
    validation.set_issuer(&[issuer.as_str()]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);

    let mut last_error = None;
    for jwk in candidates {
        let key = match DecodingKey::from_jwk(jwk) {
            Ok(key) => key,
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        };
        match decode::<LogoutClaims>(token, &key, &validation) {
            Ok(data) => return check_logout_claims(data.claims),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error
        .map(LogoutTokenError::Verification)
        .unwrap_or(LogoutTokenError::UnknownKey))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> LogoutClaims {
        serde_json::from_value(value).unwrap()
    }

    fn logout_events() -> Value {
        let mut events = serde_json::Map::new();
        events.insert(BACKCHANNEL_LOGOUT_EVENT.to_string(), json!({}));
        Value::Object(events)
    }

    #[test]
    fn events_may_be_an_object_or_an_encoded_object() {
        let object = logout_events();
        assert!(has_logout_event(Some(&object)));
        let encoded = Value::String(object.to_string());
        assert!(has_logout_event(Some(&encoded)));
        assert!(!has_logout_event(Some(&json!({"other": {}}))));
        assert!(!has_logout_event(Some(&Value::String("not json".into()))));
        assert!(!has_logout_event(Some(&json!([BACKCHANNEL_LOGOUT_EVENT]))));
        assert!(!has_logout_event(None));
    }

    #[test]
    fn logout_rules_are_applied_in_order() {
        let events = logout_events();

        let err = check_logout_claims(claims(json!({"iss": "i", "events": events.clone()}))).unwrap_err();
        assert!(matches!(err, LogoutTokenError::MissingIdentity));

        let err = check_logout_claims(claims(
            json!({"iss": "i", "sub": "alice", "nonce": "n", "events": events.clone()}),
        ))
        .unwrap_err();
        assert!(matches!(err, LogoutTokenError::NoncePresent));

        let err = check_logout_claims(claims(
            json!({"iss": "i", "sub": "alice", "nonce": null, "events": events.clone()}),
        ))
        .unwrap_err();
        assert!(matches!(err, LogoutTokenError::NoncePresent));

        let err = check_logout_claims(claims(json!({"iss": "i", "sid": "s1"}))).unwrap_err();
        assert!(matches!(err, LogoutTokenError::MissingLogoutEvent));

        let ok = check_logout_claims(claims(json!({"iss": "i", "sid": "s1", "events": events})))
            .unwrap();
        assert_eq!(ok.identity().session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn symmetric_algorithms_are_refused() {
        assert!(!is_asymmetric(Algorithm::HS256));
        assert!(is_asymmetric(Algorithm::RS256));
        assert!(is_asymmetric(Algorithm::EdDSA));
    }
}
