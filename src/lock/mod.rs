//! Per-peer client for the distributed lock protocol.
//!
//! The quorum layer talks to every peer's lock coordinator through a
//! [`NetLocker`]. [`LockRestClient`] is the network implementation: it wraps a
//! [`Transport`], guards it with a [`HealthTracker`], and maps peer replies to
//! grant / deny / error.

mod args;
mod client;
mod error;
mod health;
mod locker;
mod method;
mod peer;
mod transport;

pub use args::{
    LockArgs, LockArgsBuilder, Values, RESOURCE_KEY, SERVER_ADDR_KEY, SERVICE_ENDPOINT_KEY,
    SOURCE_KEY, UID_KEY,
};
pub use client::LockRestClient;
pub use error::{
    ErrorKind, LockError, TransportError, TransportErrorKind, LOCK_CONFLICT_TEXT,
    LOCK_NOT_EXPIRED_TEXT,
};
pub use health::{Admission, HealthState, HealthTracker, MAX_BACKOFF};
pub use locker::{LockOutcome, NetLocker};
pub use method::LockMethod;
pub use peer::{PeerIdentity, DEFAULT_SERVICE_ENDPOINT};
pub use transport::{empty_body, ResponseBody, Transport};
