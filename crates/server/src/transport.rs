//! Outbound HTTP shared by the authorization-server and user-store clients.

use crate::error::{TlsSetupError, TransportError};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use hyper::http::request::Builder;
use hyper::{Method, Request, StatusCode};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use once_cell::sync::OnceCell;
use rustls::{ClientConfig, RootCertStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::time::{Duration, timeout};

pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

const USER_AGENT_VALUE: &str = "login-consent-provider/0.1";

static TLS_CONFIG: OnceCell<Arc<ClientConfig>> = OnceCell::new();

fn webpki_roots() -> RootCertStore {
    let mut root_cert_store = RootCertStore::empty();
    root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    root_cert_store
}

fn client_config(roots: RootCertStore) -> Result<ClientConfig, rustls::Error> {
    Ok(
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

/// Shared TLS configuration trusting the webpki roots only.
pub fn get_shared_tls_config() -> Result<Arc<ClientConfig>, TlsSetupError> {
    TLS_CONFIG
        .get_or_try_init(|| Ok(Arc::new(client_config(webpki_roots())?)))
        .cloned()
}

/// TLS configuration for one upstream. Without a bundle this is the shared
/// configuration; with one, every certificate in the PEM file is trusted in
/// addition to the webpki roots.
pub fn tls_config(ca_bundle: Option<&Path>) -> Result<Arc<ClientConfig>, TlsSetupError> {
    let Some(path) = ca_bundle else {
        return get_shared_tls_config();
    };
    let io_error = |source| TlsSetupError::Io {
        path: path.display().to_string(),
        source,
    };
    let pem = std::fs::read(path).map_err(io_error)?;

    let mut roots = webpki_roots();
    let mut added = 0usize;
    let mut reader = pem.as_slice();
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert.map_err(io_error)?)?;
        added += 1;
    }
    if added == 0 {
        return Err(TlsSetupError::NoCertificates(path.display().to_string()));
    }
    Ok(Arc::new(client_config(roots)?))
}

/// Pooled client speaking plain HTTP or HTTPS depending on the URI scheme.
pub fn build_client(tls: Arc<ClientConfig>) -> HttpsClient {
    let connector = HttpsConnectorBuilder::new()
        .with_tls_config((*tls).clone())
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new()).build(connector)
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

pub fn request(method: Method, uri: &str) -> Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_AGENT, USER_AGENT_VALUE)
        .header(ACCEPT, "application/json")
}

pub fn with_json<T: Serialize>(
    builder: Builder,
    body: &T,
) -> Result<Request<Full<Bytes>>, TransportError> {
    let bytes = serde_json::to_vec(body).map_err(|e| TransportError::Request(e.to_string()))?;
    builder
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(bytes)))
        .map_err(|e| TransportError::Request(e.to_string()))
}

pub fn without_body(builder: Builder) -> Result<Request<Full<Bytes>>, TransportError> {
    builder
        .body(Full::new(Bytes::new()))
        .map_err(|e| TransportError::Request(e.to_string()))
}

/// Sends `request` and reads the whole body, bounded by `limit` end to end.
/// Dropping the returned future aborts the exchange.
pub async fn send(
    client: &HttpsClient,
    request: Request<Full<Bytes>>,
    limit: Duration,
) -> Result<RawResponse, TransportError> {
    let exchange = async {
        let response = client
            .request(request)
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?
            .to_bytes();
        Ok::<_, TransportError>(RawResponse { status, body })
    };
    timeout(limit, exchange)
        .await
        .map_err(|_| TransportError::Timeout(limit))?
}
