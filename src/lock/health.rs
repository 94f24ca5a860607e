//! Per-peer health tracking for the lock client.
//!
//! A peer is `Up`, `Down` until a retry deadline, `Probing`, or `Closed`.
//! There is no background prober: the first call that finds the deadline
//! passed moves the peer to `Probing` and goes through alone. Every other
//! call keeps failing fast until that probe settles. A reachable answer
//! brings the peer back `Up`; a network failure starts another window.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Longest down window a tracker will use.
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Snapshot of a peer's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Up,
    /// Calls short-circuit until `retry_at`.
    Down { retry_at: Instant },
    /// One call is testing the peer; others short-circuit until it settles.
    Probing,
    /// Terminal; the client was closed.
    Closed,
}

/// Result of a health check made at the start of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Go ahead and call the peer.
    Allowed,
    /// The retry deadline just passed; this call probes the peer and must
    /// settle the probe when it finishes.
    Recovered,
    /// Peer is down; do not call it.
    Rejected,
    /// Client is closed.
    Closed,
}

/// Circuit breaker guarding one peer.
///
/// The mutex is held only for the check or transition itself, never while
/// a call to the peer is in flight.
#[derive(Debug)]
pub struct HealthTracker {
    state: Mutex<HealthState>,
    backoff: Duration,
}

impl HealthTracker {
    /// Tracker starting `Up`.
    pub fn new(backoff: Duration) -> Self {
        Self {
            state: Mutex::new(HealthState::Up),
            backoff: backoff.min(MAX_BACKOFF),
        }
    }

    /// Tracker starting `Down`, eligible for retry after one backoff window.
    pub fn new_down(backoff: Duration) -> Self {
        let backoff = backoff.min(MAX_BACKOFF);
        Self {
            state: Mutex::new(HealthState::Down {
                retry_at: Instant::now() + backoff,
            }),
            backoff,
        }
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    // The state is Copy and every write leaves it well-formed, so a panic in
    // another holder cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, HealthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide whether a call may proceed. Once the retry deadline has
    /// passed, exactly one caller is admitted as the probe.
    pub fn check(&self) -> Admission {
        self.check_at(Instant::now())
    }

    pub(crate) fn check_at(&self, now: Instant) -> Admission {
        let mut state = self.lock();
        match *state {
            HealthState::Up => Admission::Allowed,
            HealthState::Closed => Admission::Closed,
            HealthState::Down { retry_at } if now >= retry_at => {
                *state = HealthState::Probing;
                Admission::Recovered
            }
            HealthState::Down { .. } | HealthState::Probing => Admission::Rejected,
        }
    }

    /// Record a network failure. Returns `true` if this call moved the peer
    /// to `Down` from `Up` or `Probing`; an already-down peer keeps its
    /// deadline.
    pub fn mark_down(&self) -> bool {
        self.mark_down_at(Instant::now())
    }

    pub(crate) fn mark_down_at(&self, now: Instant) -> bool {
        let mut state = self.lock();
        match *state {
            HealthState::Up | HealthState::Probing => {
                *state = HealthState::Down {
                    retry_at: now + self.backoff,
                };
                true
            }
            HealthState::Down { .. } | HealthState::Closed => false,
        }
    }

    /// The probe got an answer from the peer. Returns `true` if this moved
    /// the peer from `Probing` to `Up`.
    pub fn probe_succeeded(&self) -> bool {
        let mut state = self.lock();
        if *state == HealthState::Probing {
            *state = HealthState::Up;
            true
        } else {
            false
        }
    }

    /// The probe ended without learning anything (e.g. cancelled). The next
    /// call becomes the probe.
    pub fn probe_abandoned(&self) {
        self.probe_abandoned_at(Instant::now())
    }

    pub(crate) fn probe_abandoned_at(&self, now: Instant) {
        let mut state = self.lock();
        if *state == HealthState::Probing {
            *state = HealthState::Down { retry_at: now };
        }
    }

    /// Force the peer back to `Up`. Returns `false` if closed.
    pub fn mark_up(&self) -> bool {
        let mut state = self.lock();
        match *state {
            HealthState::Closed => false,
            _ => {
                *state = HealthState::Up;
                true
            }
        }
    }

    /// Move to `Closed`. Returns `true` the first time.
    pub fn close(&self) -> bool {
        let mut state = self.lock();
        let was_open = *state != HealthState::Closed;
        *state = HealthState::Closed;
        was_open
    }

    /// Current state, without applying any pending transition.
    pub fn state(&self) -> HealthState {
        *self.lock()
    }

    pub fn is_up(&self) -> bool {
        self.state() == HealthState::Up
    }
}
