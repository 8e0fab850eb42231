//! Shared fixtures: hand-written collaborators and a test server factory.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::SigningKey;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use login_consent_provider::config::{
    AppConfig, AuthConfig, BackchannelConfig, HydraConfig, MessagesConfig, RevocationConfig,
    ServerConfig, SharedConfig, UserClientConfig, UsersConfig,
};
use login_consent_provider::error::{AdminApiError, ProviderError, RevocationError, UserStoreError};
use login_consent_provider::hydra::{
    AcceptConsentRequest, AcceptLoginRequest, AuthorizationServer, CompletedRequest,
    ConsentRequest, DiscoveryDocument, LoginRequest, LogoutRequest, OAuth2Client, RejectRequest,
};
use login_consent_provider::revocation::{
    MemoryRevocationStore, RevocationStore, SessionIdentity,
};
use login_consent_provider::users::{
    AuthReply, AuthRequest, ClaimsReply, ClaimsRequest, UserStore, UserStoreProvider,
};
use login_consent_provider::{AppState, Clock, api};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use time::macros::datetime;

pub const ISSUER: &str = "https://as.example/";
pub const JWKS_URI: &str = "https://as.example/.well-known/jwks.json";
pub const END_SESSION: &str = "https://as.example/oauth2/sessions/logout";
pub const CLIENT_ID: &str = "relying-party";
pub const KEY_ID: &str = "test-key";
pub const NOW: OffsetDateTime = datetime!(2026-10-16 12:00:00 UTC);

// =============================================================================
// Configuration
// =============================================================================

pub fn test_config(show_debug: bool) -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        hydra: HydraConfig {
            admin_url: "http://hydra-admin.test".into(),
            public_url: "http://hydra-public.test".into(),
            admin_api_key: None,
            ca_certificate_path: None,
            timeout_secs: 5,
        },
        users: UsersConfig {
            clients: HashMap::from([(
                "ldap".to_string(),
                UserClientConfig {
                    address: "http://ldap-store.test".into(),
                    ca_certificate_path: None,
                    timeout_secs: 5,
                },
            )]),
        },
        auth: AuthConfig {
            show_debug,
            remember_for_seconds: 3600,
            scopes: HashMap::from([
                (
                    "scope1".to_string(),
                    vec!["claim1".to_string(), "claim2".to_string()],
                ),
                ("scope2".to_string(), vec!["claim3".to_string()]),
            ]),
        },
        backchannel: BackchannelConfig {
            client_id: CLIENT_ID.into(),
        },
        revocation: RevocationConfig::default(),
        messages: MessagesConfig {
            authentication_failure: "Authentication failed.".into(),
            stores: HashMap::from([(
                "ldap".to_string(),
                HashMap::from([(
                    "invalid_credentials".to_string(),
                    "Wrong username or password.".to_string(),
                )]),
            )]),
        },
    }
}

// =============================================================================
// Authorization server
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetLogin(String),
    AcceptLogin(String, AcceptLoginRequest),
    RejectLogin(String, RejectRequest),
    GetConsent(String),
    AcceptConsent(String, AcceptConsentRequest),
    RejectConsent(String, RejectRequest),
    GetLogout(String),
    AcceptLogout(String),
    RejectLogout(String),
    Discover,
    FetchJwks(String),
}

/// Answers from canned requests; unknown challenges get a 404.
#[derive(Default)]
pub struct MockAuthorizationServer {
    pub login: Option<LoginRequest>,
    pub consent: Option<ConsentRequest>,
    pub logout: Option<LogoutRequest>,
    pub discovery: Option<DiscoveryDocument>,
    pub jwks: Option<JwkSet>,
    /// Every accept and reject call fails with 500.
    pub fail_submit: bool,
    pub calls: Mutex<Vec<Call>>,
}

fn not_found() -> AdminApiError {
    AdminApiError::Http {
        status: StatusCode::NOT_FOUND,
        payload: r#"{"error":"Not Found"}"#.into(),
    }
}

impl MockAuthorizationServer {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn completed(&self, kind: &str, action: &str) -> Result<CompletedRequest, AdminApiError> {
        if self.fail_submit {
            return Err(AdminApiError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                payload: "boom".into(),
            });
        }
        Ok(CompletedRequest {
            redirect_to: format!("https://as.example/{kind}/{action}"),
        })
    }

    fn lookup<T: Clone>(stored: &Option<T>, challenge: &str) -> Result<T, AdminApiError> {
        match stored {
            Some(request) if challenge == "valid" => Ok(request.clone()),
            _ => Err(not_found()),
        }
    }
}

#[async_trait]
impl AuthorizationServer for MockAuthorizationServer {
    async fn get_login_request(&self, challenge: &str) -> Result<LoginRequest, AdminApiError> {
        self.record(Call::GetLogin(challenge.into()));
        Self::lookup(&self.login, challenge)
    }

    async fn accept_login_request(
        &self,
        challenge: &str,
        body: &AcceptLoginRequest,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.record(Call::AcceptLogin(challenge.into(), body.clone()));
        self.completed("login", "accept")
    }

    async fn reject_login_request(
        &self,
        challenge: &str,
        body: &RejectRequest,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.record(Call::RejectLogin(challenge.into(), body.clone()));
        self.completed("login", "reject")
    }

    async fn get_consent_request(
        &self,
        challenge: &str,
    ) -> Result<ConsentRequest, AdminApiError> {
        self.record(Call::GetConsent(challenge.into()));
        Self::lookup(&self.consent, challenge)
    }

    async fn accept_consent_request(
        &self,
        challenge: &str,
        body: &AcceptConsentRequest,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.record(Call::AcceptConsent(challenge.into(), body.clone()));
        self.completed("consent", "accept")
    }

    async fn reject_consent_request(
        &self,
        challenge: &str,
        body: &RejectRequest,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.record(Call::RejectConsent(challenge.into(), body.clone()));
        self.completed("consent", "reject")
    }

    async fn get_logout_request(&self, challenge: &str) -> Result<LogoutRequest, AdminApiError> {
        self.record(Call::GetLogout(challenge.into()));
        Self::lookup(&self.logout, challenge)
    }

    async fn accept_logout_request(
        &self,
        challenge: &str,
    ) -> Result<CompletedRequest, AdminApiError> {
        self.record(Call::AcceptLogout(challenge.into()));
        self.completed("logout", "accept")
    }

    async fn reject_logout_request(&self, challenge: &str) -> Result<(), AdminApiError> {
        self.record(Call::RejectLogout(challenge.into()));
        self.completed("logout", "reject").map(|_| ())
    }

    async fn discover(&self) -> Result<DiscoveryDocument, AdminApiError> {
        self.record(Call::Discover);
        self.discovery.clone().ok_or_else(|| AdminApiError::Http {
            status: StatusCode::SERVICE_UNAVAILABLE,
            payload: "unavailable".into(),
        })
    }

    async fn fetch_jwks(&self, jwks_uri: &str) -> Result<JwkSet, AdminApiError> {
        self.record(Call::FetchJwks(jwks_uri.into()));
        self.jwks.clone().ok_or_else(not_found)
    }
}

pub fn discovery() -> DiscoveryDocument {
    DiscoveryDocument {
        issuer: ISSUER.into(),
        jwks_uri: JWKS_URI.into(),
        end_session_endpoint: Some(END_SESSION.into()),
    }
}

pub fn client_with_metadata(metadata: Value) -> OAuth2Client {
    OAuth2Client {
        client_id: "client-1".into(),
        client_name: Some("Client".into()),
        metadata: Some(metadata),
    }
}

pub fn login_request(skip: bool, metadata: Value) -> LoginRequest {
    LoginRequest {
        challenge: "valid".into(),
        skip,
        subject: if skip { "subject-1".into() } else { String::new() },
        client: client_with_metadata(metadata),
        request_url: "https://as.example/oauth2/auth?client_id=client-1".into(),
        requested_scope: vec!["openid".into(), "scope1".into()],
        requested_access_token_audience: vec![],
        session_id: None,
    }
}

pub fn consent_request(skip: bool, metadata: Value) -> ConsentRequest {
    ConsentRequest {
        challenge: "valid".into(),
        skip,
        subject: "subject-1".into(),
        client: client_with_metadata(metadata),
        request_url: "https://as.example/oauth2/auth?client_id=client-1".into(),
        requested_scope: vec!["openid".into(), "scope1".into()],
        requested_access_token_audience: vec!["api".into()],
        context: None,
        login_session_id: None,
    }
}

// =============================================================================
// User stores
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Authenticate(String),
    FindClaims(ClaimsRequest),
}

pub struct MockUserStore {
    options: UserClientConfig,
    /// `None` simulates a transport failure.
    pub auth: Option<AuthReply>,
    pub claims: Option<ClaimsReply>,
    pub calls: Mutex<Vec<StoreCall>>,
}

impl MockUserStore {
    pub fn new(auth: Option<AuthReply>, claims: Option<ClaimsReply>) -> Self {
        Self {
            options: UserClientConfig {
                address: "http://ldap-store.test".into(),
                ca_certificate_path: None,
                timeout_secs: 5,
            },
            auth,
            claims,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }
}

fn unreachable_store() -> UserStoreError {
    UserStoreError::Transport(login_consent_provider::error::TransportError::Network(
        "connection refused".into(),
    ))
}

#[async_trait]
impl UserStore for MockUserStore {
    fn options(&self) -> &UserClientConfig {
        &self.options
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthReply, UserStoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Authenticate(request.username.clone()));
        self.auth.clone().ok_or_else(unreachable_store)
    }

    async fn find_claims(&self, request: &ClaimsRequest) -> Result<ClaimsReply, UserStoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::FindClaims(request.clone()));
        self.claims.clone().ok_or_else(unreachable_store)
    }
}

/// Serves the single store `ldap`.
pub struct MockProvider {
    pub store: Arc<MockUserStore>,
    pub created: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(store: MockUserStore) -> Self {
        Self {
            store: Arc::new(store),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

impl UserStoreProvider for MockProvider {
    fn create_client(&self, store: &str) -> Result<Arc<dyn UserStore>, ProviderError> {
        self.created.lock().unwrap().push(store.to_string());
        match store.trim() {
            "" => Err(ProviderError::MissingStore),
            "ldap" => Ok(self.store.clone()),
            other => Err(ProviderError::UnsupportedStore(other.to_string())),
        }
    }
}

pub fn authenticated(subject: &str) -> AuthReply {
    AuthReply {
        succeeded: true,
        subject: subject.into(),
        error: String::new(),
    }
}

pub fn refused(error: &str) -> AuthReply {
    AuthReply {
        succeeded: false,
        subject: String::new(),
        error: error.into(),
    }
}

pub fn claims(pairs: &[(&str, &str)]) -> ClaimsReply {
    ClaimsReply {
        succeeded: true,
        claims: pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        error: String::new(),
    }
}

// =============================================================================
// Revocation, clock and server
// =============================================================================

/// Every write fails.
pub struct FailingRevocationStore;

#[async_trait]
impl RevocationStore for FailingRevocationStore {
    async fn record(&self, _identity: &SessionIdentity) -> Result<(), RevocationError> {
        Err(RevocationError::Storage(sea_orm::DbErr::Custom(
            "disk full".into(),
        )))
    }

    async fn is_revoked(&self, _identity: &SessionIdentity) -> Result<bool, RevocationError> {
        Ok(false)
    }
}

pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        NOW
    }
}

pub struct Harness {
    pub server: TestServer,
    pub hydra: Arc<MockAuthorizationServer>,
    pub provider: Arc<MockProvider>,
    pub revocations: Arc<dyn RevocationStore>,
}

pub fn harness_with(
    config: AppConfig,
    hydra: MockAuthorizationServer,
    store: MockUserStore,
    revocations: Arc<dyn RevocationStore>,
) -> Harness {
    let hydra = Arc::new(hydra);
    let provider = Arc::new(MockProvider::new(store));
    let state = AppState {
        config: SharedConfig::new(config),
        hydra: hydra.clone(),
        stores: provider.clone(),
        revocations: revocations.clone(),
        clock: Arc::new(FixedClock),
    };
    let server = TestServer::new(api::build_router(state)).expect("test server");
    Harness {
        server,
        hydra,
        provider,
        revocations,
    }
}

pub fn harness(show_debug: bool, hydra: MockAuthorizationServer, store: MockUserStore) -> Harness {
    harness_with(
        test_config(show_debug),
        hydra,
        store,
        Arc::new(MemoryRevocationStore::default()),
    )
}

/// Location header of a redirect response.
pub fn location(response: &axum_test::TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("location header")
        .to_string()
}

/// Query parameters of the error page a redirect points at.
pub fn error_params(location: &str) -> HashMap<String, String> {
    let query = location
        .strip_prefix("/error?")
        .expect("redirect to the error page");
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

// =============================================================================
// Logout tokens
// =============================================================================

/// Ed25519 key pair signing test logout tokens.
pub struct TestSigner {
    encoding: EncodingKey,
    pub jwk: Value,
}

impl TestSigner {
    pub fn new(seed: u8, kid: &str) -> Self {
        let signing = SigningKey::from_bytes(&[seed; 32]);
        // PKCS#8 v1 wrapper around the raw Ed25519 seed.
        let mut der = vec![
            0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22,
            0x04, 0x20,
        ];
        der.extend_from_slice(signing.as_bytes());
        let jwk = json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": URL_SAFE_NO_PAD.encode(signing.verifying_key().as_bytes()),
            "kid": kid,
            "alg": "EdDSA",
            "use": "sig",
        });
        Self {
            encoding: EncodingKey::from_ed_der(&der),
            jwk,
        }
    }

    pub fn jwks(&self) -> JwkSet {
        serde_json::from_value(json!({ "keys": [self.jwk.clone()] })).expect("jwks")
    }

    pub fn sign(&self, kid: Option<&str>, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = kid.map(str::to_string);
        jsonwebtoken::encode(&header, claims, &self.encoding).expect("sign")
    }
}

pub fn logout_event() -> Value {
    let mut events = serde_json::Map::new();
    events.insert(
        login_consent_provider::logout_token::BACKCHANNEL_LOGOUT_EVENT.to_string(),
        json!({}),
    );
    Value::Object(events)
}

/// Claims of a well-formed logout token, valid for an hour.
pub fn logout_claims() -> Value {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    json!({
        "iss": ISSUER,
        "aud": CLIENT_ID,
        "iat": now,
        "exp": now + 3600,
        "jti": "jti-1",
        "sub": "alice",
        "sid": "session-1",
        "events": logout_event(),
    })
}
