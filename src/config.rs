//! Lock client configuration.
//!
//! Everything a client needs from the node's process-wide settings is passed
//! in here at construction; nothing is read from globals or the environment.

use std::time::Duration;

use serde::Deserialize;

/// Default request timeout enforced by the transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Base retry unit; the down window is a multiple of it.
pub const DEFAULT_RETRY_UNIT: Duration = Duration::from_secs(1);

/// Down window = `DEFAULT_BACKOFF_MULTIPLIER × retry_unit`.
pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 5;

/// Settings shared by every lock client on a node.
///
/// ```ignore
/// let config = LockClientConfig::default()
///     .with_secure(true)
///     .with_root_cert_pem(std::fs::read_to_string("ca.pem")?)
///     .with_retry_unit(Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LockClientConfig {
    /// Talk to peers over TLS.
    pub secure: bool,
    /// Extra PEM-encoded trust roots for peer certificates.
    pub root_certs_pem: Vec<String>,
    /// Per-request timeout enforced by the transport.
    pub timeout: Duration,
    pub retry_unit: Duration,
    pub backoff_multiplier: u32,
    /// Static bearer token attached to every request.
    pub auth_token: Option<String>,
}

impl Default for LockClientConfig {
    fn default() -> Self {
        Self {
            secure: false,
            root_certs_pem: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            retry_unit: DEFAULT_RETRY_UNIT,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            auth_token: None,
        }
    }
}

impl LockClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_root_cert_pem(mut self, pem: impl Into<String>) -> Self {
        self.root_certs_pem.push(pem.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_unit(mut self, unit: Duration) -> Self {
        self.retry_unit = unit;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// How long a peer stays down after a network failure.
    pub fn backoff(&self) -> Duration {
        self.retry_unit
            .checked_mul(self.backoff_multiplier)
            .unwrap_or(Duration::MAX)
    }

    /// URL scheme for peer requests.
    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }
}
