//! Lock client for a single peer.
//!
//! One [`LockRestClient`] exists per peer and is shared by every lock
//! attempt on the node. Each call:
//!
//! 1. asks the [`HealthTracker`] whether the peer is worth contacting; a
//!    peer that is down fails fast with [`LockError::HostDown`],
//! 2. encodes the [`LockArgs`] into flat values and invokes the transport,
//! 3. drains the response body,
//! 4. maps the outcome: success is a grant, lock contention is a denial,
//!    a network failure marks the peer down, anything else is passed back.
//!
//! The client never retries. Recovery is lazy: the first call after the
//! down window probes the peer alone and either restores it or starts a
//! new window; concurrent calls keep failing fast meanwhile.

use std::fmt;

use tracing::{debug, warn};

use super::health::{Admission, HealthState, HealthTracker};
use super::transport::drain_body;
use super::{
    LockArgs, LockError, LockMethod, LockOutcome, NetLocker, PeerIdentity, Transport,
    TransportError, TransportErrorKind, Values,
};
use crate::config::LockClientConfig;

/// Per-peer lock client.
pub struct LockRestClient {
    peer: PeerIdentity,
    transport: Result<Box<dyn Transport>, TransportError>,
    health: HealthTracker,
}

impl LockRestClient {
    /// Client for `peer` over HTTP(S), configured from `config`.
    ///
    /// If the transport cannot be built the client is still returned, but
    /// starts down; see [`LockRestClient::unavailable`].
    #[cfg(feature = "http")]
    pub fn new(peer: PeerIdentity, config: &LockClientConfig) -> Self {
        match crate::http::HttpTransport::new(&peer, config) {
            Ok(transport) => Self::with_transport(peer, transport, config),
            Err(err) => Self::unavailable(peer, err, config),
        }
    }

    /// Client for `peer` calling through `transport`. Starts up.
    pub fn with_transport<T>(peer: PeerIdentity, transport: T, config: &LockClientConfig) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            peer,
            transport: Ok(Box::new(transport)),
            health: HealthTracker::new(config.backoff()),
        }
    }

    /// Client for a peer whose transport could not be built.
    ///
    /// The client starts down. Once the down window passes, a call fails
    /// with a network error and starts another window, so an unresolvable
    /// peer never blocks callers or cluster start-up.
    pub fn unavailable(peer: PeerIdentity, err: TransportError, config: &LockClientConfig) -> Self {
        warn!(peer = %peer, error = %err, "lock client transport unavailable, starting down");
        Self {
            peer,
            transport: Err(err),
            health: HealthTracker::new_down(config.backoff()),
        }
    }

    pub fn peer(&self) -> &PeerIdentity {
        &self.peer
    }

    /// Current health, without applying a pending recovery.
    pub fn health(&self) -> HealthState {
        self.health.state()
    }

    /// Force the peer back up, e.g. after cluster membership re-verified it.
    /// Has no effect on a closed client.
    pub fn mark_up(&self) {
        if self.health.mark_up() {
            debug!(peer = %self.peer, "lock peer marked up");
        }
    }

    fn mark_down(&self, method: LockMethod, err: &LockError) {
        if self.health.mark_down() {
            warn!(
                peer = %self.peer,
                method = %method,
                error = %err,
                retry_in = ?self.health.backoff(),
                "lock peer unreachable, marking down"
            );
        }
    }

    /// Run `method` against the peer. `Ok(())` means the peer granted it.
    fn call(&self, method: LockMethod, values: &Values) -> Result<(), LockError> {
        let probing = match self.health.check() {
            Admission::Allowed => false,
            Admission::Recovered => {
                debug!(peer = %self.peer, method = %method, "lock peer retry window passed, probing");
                true
            }
            Admission::Rejected => return Err(LockError::HostDown(self.peer.to_string())),
            Admission::Closed => return Err(LockError::Closed(self.peer.to_string())),
        };

        let transport = match &self.transport {
            Ok(transport) => transport,
            Err(err) => {
                let err = LockError::Network {
                    peer: self.peer.to_string(),
                    method,
                    source: TransportError::network(format!("transport unavailable: {}", err)),
                };
                self.mark_down(method, &err);
                return Err(err);
            }
        };

        match transport.call(method, values, None, -1) {
            Ok(body) => {
                drain_body(body);
                if probing {
                    self.probe_succeeded();
                }
                Ok(())
            }
            Err(err) => {
                let cancelled = err.kind() == TransportErrorKind::Cancelled;
                let err = LockError::from_transport(self.peer.host(), method, err);
                if err.is_network() {
                    self.mark_down(method, &err);
                } else if probing && cancelled {
                    self.health.probe_abandoned();
                } else if probing {
                    // The peer answered, even if only with an error.
                    self.probe_succeeded();
                }
                Err(err)
            }
        }
    }

    fn probe_succeeded(&self) {
        if self.health.probe_succeeded() {
            debug!(peer = %self.peer, "lock peer reachable again");
        }
    }

    fn rest_call(&self, method: LockMethod, args: &LockArgs) -> LockOutcome {
        match self.call(method, &args.to_values()) {
            Ok(()) => Ok(true),
            Err(err) if err.is_denial() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl NetLocker for LockRestClient {
    fn rlock(&self, args: &LockArgs) -> LockOutcome {
        self.rest_call(LockMethod::AcquireShared, args)
    }

    fn lock(&self, args: &LockArgs) -> LockOutcome {
        self.rest_call(LockMethod::AcquireExclusive, args)
    }

    fn runlock(&self, args: &LockArgs) -> LockOutcome {
        self.rest_call(LockMethod::ReleaseShared, args)
    }

    fn unlock(&self, args: &LockArgs) -> LockOutcome {
        self.rest_call(LockMethod::ReleaseExclusive, args)
    }

    fn force_unlock(&self, args: &LockArgs) -> LockOutcome {
        self.rest_call(LockMethod::ForceRelease, args)
    }

    fn expired(&self, args: &LockArgs) -> LockOutcome {
        self.rest_call(LockMethod::CheckExpired, args)
    }

    fn server_addr(&self) -> &str {
        self.peer.host()
    }

    fn service_endpoint(&self) -> &str {
        self.peer.service_endpoint()
    }

    fn is_online(&self) -> bool {
        self.health.is_up()
    }

    fn close(&self) {
        if self.health.close() {
            if let Ok(transport) = &self.transport {
                transport.close();
            }
            debug!(peer = %self.peer, "lock client closed");
        }
    }
}

impl fmt::Display for LockRestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.peer, f)
    }
}

impl fmt::Debug for LockRestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockRestClient")
            .field("peer", &self.peer)
            .field("transport", &self.transport.as_ref().map(|_| "..").map_err(|e| e.message()))
            .field("health", &self.health.state())
            .finish()
    }
}
