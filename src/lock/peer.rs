use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::LockError;

/// Path of the lock service on a peer when none is given.
pub const DEFAULT_SERVICE_ENDPOINT: &str = "/lock/v1";

/// Network identity of a peer running a lock coordinator.
///
/// `host` is `address:port`. `name`, when set, is the name the peer's TLS
/// certificate is verified against. Displays as `host` alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerIdentity {
    host: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_service_endpoint")]
    service_endpoint: String,
}

fn default_service_endpoint() -> String {
    DEFAULT_SERVICE_ENDPOINT.to_string()
}

impl PeerIdentity {
    /// Parse `host` (`address:port`) with the default service endpoint.
    pub fn new(host: impl Into<String>) -> Result<Self, LockError> {
        let host = host.into();
        let port = match host.rsplit_once(':') {
            Some((addr, port)) if !addr.is_empty() => port,
            _ => {
                return Err(LockError::InvalidPeer(
                    host.clone(),
                    "expected address:port".into(),
                ))
            }
        };
        port.parse::<u16>()
            .map_err(|e| LockError::InvalidPeer(host.clone(), format!("bad port: {}", e)))?;
        Ok(Self {
            host,
            name: None,
            service_endpoint: default_service_endpoint(),
        })
    }

    /// Pin TLS verification to `name`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_service_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.service_endpoint = if endpoint.starts_with('/') {
            endpoint
        } else {
            format!("/{}", endpoint)
        };
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn service_endpoint(&self) -> &str {
        &self.service_endpoint
    }

    /// Port component of `host`.
    pub fn port(&self) -> u16 {
        self.host
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for PeerIdentity {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PeerIdentity::new(s)
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}
