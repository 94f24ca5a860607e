use super::{LockArgs, LockError};

/// Outcome of one lock call against one peer.
///
/// `Ok(true)`: granted. `Ok(false)`: denied, the lock is held elsewhere or
/// the lease has not expired yet. `Err(_)`: the call failed.
pub type LockOutcome = Result<bool, LockError>;

/// Trait for a lock endpoint on one peer.
///
/// The quorum layer holds one `NetLocker` per peer and fans each lock
/// attempt out across all of them. Implementations must be callable from
/// many threads at once.
pub trait NetLocker: Send + Sync {
    /// Acquire a shared (read) lock.
    fn rlock(&self, args: &LockArgs) -> LockOutcome;

    /// Acquire an exclusive (write) lock.
    fn lock(&self, args: &LockArgs) -> LockOutcome;

    /// Release a shared lock.
    fn runlock(&self, args: &LockArgs) -> LockOutcome;

    /// Release an exclusive lock.
    fn unlock(&self, args: &LockArgs) -> LockOutcome;

    /// Release a lock regardless of owner, once its lease has lapsed.
    fn force_unlock(&self, args: &LockArgs) -> LockOutcome;

    /// Ask whether the lock's lease has expired on the peer.
    fn expired(&self, args: &LockArgs) -> LockOutcome;

    /// `address:port` of the peer.
    fn server_addr(&self) -> &str;

    /// Path of the lock service on the peer.
    fn service_endpoint(&self) -> &str;

    /// Whether the peer is currently considered reachable.
    fn is_online(&self) -> bool;

    /// Release resources. The locker must not be used afterwards.
    fn close(&self);
}
