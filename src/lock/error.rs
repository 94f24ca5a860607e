//! Error taxonomy for peer lock calls.
//!
//! Two layers: [`TransportError`] is what a [`Transport`](super::Transport)
//! reports, [`LockError`] is what callers of the lock client see. The
//! mapping between them ([`LockError::from_transport`]) decides whether a
//! failure is lock contention, a dead peer, or something opaque.

use std::fmt;

use super::LockMethod;

/// Legacy wire text for a lock held by another owner.
pub const LOCK_CONFLICT_TEXT: &str = "lock conflict";

/// Legacy wire text for a forced release attempted before lease expiry.
pub const LOCK_NOT_EXPIRED_TEXT: &str = "lock not expired";

/// Coarse classification of a [`LockError`].
///
/// Callers and peers compare errors by kind; the legacy text is only used
/// at the wire boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The peer is marked down and its retry deadline has not passed.
    HostDown,
    /// Transport-level failure: refused, reset, timed out, unresolvable.
    Network,
    /// The requested lock is held by another owner.
    LockConflict,
    /// A forced release was attempted before the lease expired.
    LockNotExpired,
    /// The client was closed.
    Closed,
    /// The peer address could not be parsed.
    InvalidPeer,
    /// Request fields could not be decoded.
    Decode,
    /// Anything else reported by the peer or the transport.
    Other,
}

impl ErrorKind {
    /// Text sent on the wire for protocol-level kinds.
    pub fn wire_text(self) -> Option<&'static str> {
        match self {
            ErrorKind::LockConflict => Some(LOCK_CONFLICT_TEXT),
            ErrorKind::LockNotExpired => Some(LOCK_NOT_EXPIRED_TEXT),
            _ => None,
        }
    }

    /// Recognize a protocol-level kind from the legacy error text.
    pub fn from_wire_text(text: &str) -> Option<ErrorKind> {
        match text.trim() {
            LOCK_CONFLICT_TEXT => Some(ErrorKind::LockConflict),
            LOCK_NOT_EXPIRED_TEXT => Some(ErrorKind::LockNotExpired),
            _ => None,
        }
    }
}

/// How a transport failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused/reset, timeout, DNS failure.
    Network,
    /// The peer answered, but with an error.
    Remote,
    /// The caller gave up on the request.
    Cancelled,
    /// Anything else (bad URL, TLS setup, body decoding).
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Network => write!(f, "network"),
            TransportErrorKind::Remote => write!(f, "remote"),
            TransportErrorKind::Cancelled => write!(f, "cancelled"),
            TransportErrorKind::Other => write!(f, "other"),
        }
    }
}

/// Error reported by a [`Transport`](super::Transport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    /// An error returned by the peer; `message` is the peer's error text.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Remote, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Cancelled, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Other, message)
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_network(&self) -> bool {
        self.kind == TransportErrorKind::Network
    }
}

/// Error type for peer lock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// Circuit open: the peer was skipped without a network attempt.
    #[error("Lock rest server node is down: {0}")]
    HostDown(String),
    /// The transport failed to reach the peer.
    #[error("network error calling {method} on {peer}: {source}")]
    Network {
        peer: String,
        method: LockMethod,
        #[source]
        source: TransportError,
    },
    /// The requested lock is held by another owner.
    #[error("lock conflict")]
    LockConflict,
    /// Forced release attempted before the lease expired.
    #[error("lock not expired")]
    LockNotExpired,
    /// The client has been closed and must not be reused.
    #[error("lock client for {0} is closed")]
    Closed(String),
    /// The peer address is malformed.
    #[error("invalid peer address {0:?}: {1}")]
    InvalidPeer(String, String),
    /// Lock request fields could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),
    /// Opaque failure from the peer or transport, passed through.
    #[error(transparent)]
    Transport(TransportError),
}

impl LockError {
    /// Classify a transport failure for a call to `method` on `peer`.
    ///
    /// Protocol texts win over the transport's own classification: a peer
    /// saying "lock conflict" was reachable.
    pub fn from_transport(peer: &str, method: LockMethod, err: TransportError) -> LockError {
        match ErrorKind::from_wire_text(err.message()) {
            Some(ErrorKind::LockConflict) => return LockError::LockConflict,
            Some(ErrorKind::LockNotExpired) => return LockError::LockNotExpired,
            _ => {}
        }
        if err.is_network() {
            LockError::Network {
                peer: peer.to_string(),
                method,
                source: err,
            }
        } else {
            LockError::Transport(err)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LockError::HostDown(_) => ErrorKind::HostDown,
            LockError::Network { .. } => ErrorKind::Network,
            LockError::LockConflict => ErrorKind::LockConflict,
            LockError::LockNotExpired => ErrorKind::LockNotExpired,
            LockError::Closed(_) => ErrorKind::Closed,
            LockError::InvalidPeer(..) => ErrorKind::InvalidPeer,
            LockError::Decode(_) => ErrorKind::Decode,
            LockError::Transport(_) => ErrorKind::Other,
        }
    }

    /// True for the expected contention outcomes that map to a denial.
    pub fn is_denial(&self) -> bool {
        matches!(self.kind(), ErrorKind::LockConflict | ErrorKind::LockNotExpired)
    }

    pub fn is_network(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}
