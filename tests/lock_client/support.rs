//! Test peers: a scripted transport and an in-process lock coordinator.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netlock::lock::{empty_body, LOCK_CONFLICT_TEXT, LOCK_NOT_EXPIRED_TEXT};
use netlock::{
    LockArgs, LockClientConfig, LockMethod, LockRestClient, PeerIdentity, ResponseBody,
    Transport, TransportError, Values,
};

/// Retry unit used by tests that wait out the down window.
pub const RETRY_UNIT: Duration = Duration::from_millis(40);

/// Down window for [`RETRY_UNIT`] with the default multiplier.
pub const BACKOFF: Duration = Duration::from_millis(200);

pub fn config() -> LockClientConfig {
    LockClientConfig::new().with_retry_unit(RETRY_UNIT)
}

pub fn peer() -> PeerIdentity {
    PeerIdentity::new("10.0.0.2:9000").unwrap()
}

pub fn args(resource: &str, uid: &str) -> LockArgs {
    LockArgs::builder(resource)
        .uid(uid)
        .source("tests/lock_client")
        .server_addr("10.0.0.1:9000")
        .service_endpoint("/lock/v1")
        .build()
}

/// Route client logs to the test harness; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Sleep past the down window.
pub fn wait_out_backoff() {
    std::thread::sleep(BACKOFF + Duration::from_millis(30));
}

// ============================================================================
// Scripted transport
// ============================================================================

/// Transport whose replies are queued up front; once the queue is empty it
/// answers with the fallback (success unless the peer is set down).
#[derive(Default)]
pub struct ScriptedPeer {
    replies: Mutex<VecDeque<Result<(), TransportError>>>,
    down: AtomicBool,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
    methods: Mutex<Vec<LockMethod>>,
}

impl ScriptedPeer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: Result<(), TransportError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// While down, every unscripted call fails with a network error.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Every call sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn methods(&self) -> Vec<LockMethod> {
        self.methods.lock().unwrap().clone()
    }
}

/// Handle passed to the client; the test keeps the `Arc` to inspect calls.
pub struct ScriptedTransport(pub Arc<ScriptedPeer>);

impl Transport for ScriptedTransport {
    fn call(
        &self,
        method: LockMethod,
        _values: &Values,
        _body: Option<Vec<u8>>,
        _length: i64,
    ) -> Result<ResponseBody, TransportError> {
        let peer = &self.0;
        peer.calls.fetch_add(1, Ordering::SeqCst);
        peer.methods.lock().unwrap().push(method);
        let delay = *peer.delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let scripted = peer.replies.lock().unwrap().pop_front();
        let reply = match scripted {
            Some(reply) => reply,
            None if peer.down.load(Ordering::SeqCst) => {
                Err(TransportError::network("connection refused"))
            }
            None => Ok(()),
        };
        reply.map(|()| empty_body())
    }
}

pub fn scripted_client() -> (LockRestClient, Arc<ScriptedPeer>) {
    init_tracing();
    let scripted = ScriptedPeer::new();
    let client =
        LockRestClient::with_transport(peer(), ScriptedTransport(scripted.clone()), &config());
    (client, scripted)
}

// ============================================================================
// In-process coordinator
// ============================================================================

#[derive(Default)]
struct Entry {
    writer: Option<String>,
    readers: HashSet<String>,
    expired: bool,
}

/// Minimal lock table answering like a peer's coordinator: grants with
/// success, contention with the legacy protocol texts.
#[derive(Default)]
pub struct Coordinator {
    table: Mutex<HashMap<String, Entry>>,
}

impl Coordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark the lease on `resource` as lapsed.
    pub fn expire(&self, resource: &str) {
        self.table
            .lock()
            .unwrap()
            .entry(resource.to_string())
            .or_default()
            .expired = true;
    }

    pub fn handle(&self, method: LockMethod, args: &LockArgs) -> Result<(), &'static str> {
        let mut table = self.table.lock().unwrap();
        let entry = table.entry(args.resource().to_string()).or_default();
        let ok = match method {
            LockMethod::AcquireExclusive => {
                let free = entry.writer.is_none() && entry.readers.is_empty();
                if free {
                    entry.writer = Some(args.uid().to_string());
                    entry.expired = false;
                }
                free
            }
            LockMethod::AcquireShared => {
                let free = entry.writer.is_none();
                if free {
                    entry.readers.insert(args.uid().to_string());
                }
                free
            }
            LockMethod::ReleaseExclusive => {
                let owned = entry.writer.as_deref() == Some(args.uid());
                if owned {
                    entry.writer = None;
                }
                owned
            }
            LockMethod::ReleaseShared => entry.readers.remove(args.uid()),
            LockMethod::ForceRelease => {
                if !entry.expired {
                    return Err(LOCK_NOT_EXPIRED_TEXT);
                }
                entry.writer = None;
                entry.readers.clear();
                true
            }
            LockMethod::CheckExpired => entry.expired,
        };
        if ok {
            Ok(())
        } else {
            Err(LOCK_CONFLICT_TEXT)
        }
    }
}

pub struct CoordinatorTransport(pub Arc<Coordinator>);

impl Transport for CoordinatorTransport {
    fn call(
        &self,
        method: LockMethod,
        values: &Values,
        _body: Option<Vec<u8>>,
        _length: i64,
    ) -> Result<ResponseBody, TransportError> {
        let args = LockArgs::from_values(values.iter())
            .map_err(|e| TransportError::remote(e.to_string()))?;
        self.0
            .handle(method, &args)
            .map(|()| empty_body())
            .map_err(TransportError::remote)
    }
}

pub fn coordinator_client() -> (Arc<LockRestClient>, Arc<Coordinator>) {
    init_tracing();
    let coordinator = Coordinator::new();
    let client =
        LockRestClient::with_transport(peer(), CoordinatorTransport(coordinator.clone()), &config());
    (Arc::new(client), coordinator)
}
