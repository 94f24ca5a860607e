//! netlock: per-peer client for a distributed lock protocol.
//!
//! Every node of a storage cluster runs a lock coordinator. To take a
//! cluster-wide lock, a node asks each peer's coordinator and counts the
//! votes. This crate is the per-peer half of that: one [`LockRestClient`]
//! per peer, shared by every lock attempt on the node.
//!
//! ## Quick Start
//!
//! ```ignore
//! use netlock::{LockArgs, LockClientConfig, LockRestClient, NetLocker, PeerIdentity};
//!
//! let config = LockClientConfig::default();
//! let client = LockRestClient::new(PeerIdentity::new("10.0.0.2:9000")?, &config);
//!
//! let args = LockArgs::builder("bucket/obj")
//!     .uid("5f0c6f3e")
//!     .source("handlers.rs:88")
//!     .server_addr("10.0.0.1:9000")
//!     .service_endpoint("/lock/v1")
//!     .build();
//!
//! match client.lock(&args) {
//!     Ok(true) => { /* granted */ }
//!     Ok(false) => { /* held by someone else */ }
//!     Err(e) => { /* peer down or failing */ }
//! }
//! ```

pub mod config;
pub mod lock;

#[cfg(feature = "http")]
pub mod http;

pub use config::LockClientConfig;
pub use lock::{
    ErrorKind, HealthState, HealthTracker, LockArgs, LockError, LockMethod, LockOutcome,
    LockRestClient, NetLocker, PeerIdentity, ResponseBody, Transport, TransportError,
    TransportErrorKind, Values,
};

#[cfg(feature = "http")]
pub use http::{HttpTransport, TokenProvider};
