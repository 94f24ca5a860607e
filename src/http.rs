//! HTTP transport for lock calls. Maps each lock method to a REST request.
//!
//! Requires the `http` feature. Uses reqwest's blocking client, one client
//! (and connection pool) per peer.
//!
//! ## Requests
//!
//! - `POST {scheme}://{peer}{service_endpoint}/{method}?{values}` with an
//!   optional `Authorization: Bearer` header.
//! - `200 OK` is success. Any other status is an error whose text is the
//!   `"error"` field of a JSON body (`{ "error": "lock conflict" }`) or the
//!   raw body.
//!
//! ## Example
//!
//! ```ignore
//! use netlock::{HttpTransport, LockClientConfig, LockRestClient, PeerIdentity};
//!
//! let config = LockClientConfig::default();
//! let peer = PeerIdentity::new("10.0.0.2:9000")?;
//! let transport = HttpTransport::new(&peer, &config)?
//!     .with_token_provider(|| issue_token());
//! let client = LockRestClient::with_transport(peer, transport, &config);
//! ```

use std::error::Error as _;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::LockClientConfig;
use crate::lock::{LockMethod, PeerIdentity, ResponseBody, Transport, TransportError, Values};

/// Produces the bearer token sent with each request.
pub type TokenProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// reqwest-backed [`Transport`] for one peer.
pub struct HttpTransport {
    client: Mutex<Option<Client>>,
    base_url: String,
    token: Option<TokenProvider>,
}

impl HttpTransport {
    /// Build a transport for `peer`.
    ///
    /// In secure mode the configured PEM roots are trusted, and when the
    /// peer has a name the connection goes to the peer's host while the
    /// certificate is verified against the name. A DNS host is resolved
    /// once, here; failing to resolve it fails construction.
    pub fn new(peer: &PeerIdentity, config: &LockClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().timeout(config.timeout).http1_only();
        let mut authority = peer.host().to_string();

        if config.secure {
            builder = builder.use_rustls_tls();
            for pem in &config.root_certs_pem {
                let cert = reqwest::Certificate::from_pem(pem.as_bytes()).map_err(|e| {
                    TransportError::other(format!("invalid root certificate: {}", e))
                })?;
                builder = builder.add_root_certificate(cert);
            }
            if let Some(name) = peer.name() {
                let addrs = resolve_host(peer.host())?;
                builder = builder.resolve_to_addrs(name, &addrs);
                authority = format!("{}:{}", name, peer.port());
            }
        }

        let base_url = format!("{}://{}{}", config.scheme(), authority, peer.service_endpoint());
        reqwest::Url::parse(&base_url)
            .map_err(|e| TransportError::other(format!("invalid peer url {}: {}", base_url, e)))?;

        let client = builder
            .build()
            .map_err(|e| TransportError::other(format!("building http client: {}", e)))?;

        let token = config.auth_token.clone().map(|token| {
            let provider: TokenProvider = Arc::new(move || token.clone());
            provider
        });

        Ok(Self {
            client: Mutex::new(Some(client)),
            base_url,
            token,
        })
    }

    /// Attach a bearer token produced fresh for every request.
    pub fn with_token_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.token = Some(Arc::new(provider));
        self
    }

    /// URL of the peer's lock service, without the method segment.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client(&self) -> Option<Client> {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for HttpTransport {
    fn call(
        &self,
        method: LockMethod,
        values: &Values,
        body: Option<Vec<u8>>,
        _length: i64,
    ) -> Result<ResponseBody, TransportError> {
        let client = self
            .client()
            .ok_or_else(|| TransportError::other("http transport closed"))?;

        let mut request = client.post(format!("{}/{}", self.base_url, method));
        if !values.is_empty() {
            request = request.query(values);
        }
        if let Some(provider) = &self.token {
            request = request.bearer_auth(provider());
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().map_err(classify)?;
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(Box::new(response));
        }
        let text = response.text().map_err(classify)?;
        Err(TransportError::remote(error_text(status, &text)))
    }

    fn close(&self) {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Addresses behind `host` (`address:port`), for pinning a TLS name to them.
fn resolve_host(host: &str) -> Result<Vec<SocketAddr>, TransportError> {
    let addrs: Vec<SocketAddr> = host
        .to_socket_addrs()
        .map_err(|e| TransportError::other(format!("resolving peer {}: {}", host, e)))?
        .collect();
    if addrs.is_empty() {
        return Err(TransportError::other(format!("resolving peer {}: no addresses", host)));
    }
    Ok(addrs)
}

/// Error text carried by a failed response.
fn error_text(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(msg)) = map.get("error") {
            return msg.clone();
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if is_network_error(&err) {
        TransportError::network(err.to_string())
    } else {
        TransportError::other(err.to_string())
    }
}

fn is_network_error(err: &reqwest::Error) -> bool {
    if err.is_connect() || err.is_timeout() {
        return true;
    }
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::UnexpectedEof
            );
        }
        source = cause.source();
    }
    false
}
