//! One client shared by many threads.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use netlock::{ErrorKind, HealthState, NetLocker, TransportError};

use crate::support::{args, coordinator_client, scripted_client, wait_out_backoff};

#[test]
fn contended_exclusive_lock_grants_exactly_one() {
    let (client, _) = coordinator_client();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["uid-a", "uid-b"]
        .into_iter()
        .map(|uid| {
            let client = client.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                client.lock(&args("bucket/obj", uid))
            })
        })
        .collect();

    let mut outcomes: Vec<bool> = handles
        .into_iter()
        .map(|h| h.join().unwrap().expect("denial must not be a failure"))
        .collect();
    outcomes.sort();
    assert_eq!(outcomes, vec![false, true]);
}

#[test]
fn short_circuited_callers_do_not_reach_a_down_peer() {
    let (client, scripted) = scripted_client();
    let client = Arc::new(client);
    scripted.push(Err(TransportError::network("connection refused")));
    assert!(client.lock(&args("r", "first")).is_err());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let client = client.clone();
            thread::spawn(move || client.rlock(&args("r", &format!("uid-{i}"))))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap_err().kind(), ErrorKind::HostDown);
    }
    assert_eq!(scripted.calls(), 1);

    wait_out_backoff();
    assert_eq!(client.expired(&args("r", "probe")), Ok(true));
    assert_eq!(scripted.calls(), 2);
}

#[test]
fn only_one_caller_probes_a_recovering_peer() {
    let (client, scripted) = scripted_client();
    let client = Arc::new(client);
    scripted.set_down(true);
    assert!(client.lock(&args("r", "first")).unwrap_err().is_network());

    wait_out_backoff();
    scripted.set_delay(Duration::from_millis(300));
    let barrier = Arc::new(Barrier::new(16));
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let client = client.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                client.lock(&args("r", &format!("uid-{i}")))
            })
        })
        .collect();

    let kinds: Vec<ErrorKind> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap_err().kind())
        .collect();
    assert_eq!(kinds.iter().filter(|k| **k == ErrorKind::Network).count(), 1);
    assert_eq!(kinds.iter().filter(|k| **k == ErrorKind::HostDown).count(), 15);
    assert_eq!(scripted.calls(), 2);
    assert!(matches!(client.health(), HealthState::Down { .. }));
}

#[test]
fn concurrent_probe_success_restores_peer_for_everyone() {
    let (client, scripted) = scripted_client();
    let client = Arc::new(client);
    scripted.push(Err(TransportError::network("connection refused")));
    assert!(client.lock(&args("r", "first")).is_err());

    wait_out_backoff();
    scripted.set_delay(Duration::from_millis(300));
    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                client.rlock(&args("r", &format!("uid-{i}")))
            })
        })
        .collect();
    let granted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|outcome| *outcome == Ok(true))
        .count();
    assert_eq!(granted, 1);
    assert_eq!(scripted.calls(), 2);

    assert_eq!(client.health(), HealthState::Up);
    assert_eq!(client.rlock(&args("r", "after")), Ok(true));
}

#[test]
fn concurrent_calls_never_see_a_torn_state() {
    let (client, scripted) = scripted_client();
    let client = Arc::new(client);
    for i in 0..200 {
        if i % 3 == 0 {
            scripted.push(Err(TransportError::network("connection reset")));
        } else {
            scripted.push(Ok(()));
        }
    }

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let client = client.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let outcome = client.lock(&args("r", &format!("{t}-{i}")));
                    if i % 10 == 0 {
                        client.mark_up();
                    }
                    match outcome {
                        Ok(granted) => assert!(granted),
                        Err(e) => assert!(matches!(
                            e.kind(),
                            ErrorKind::Network | ErrorKind::HostDown
                        )),
                    }
                    match client.health() {
                        HealthState::Up | HealthState::Down { .. } | HealthState::Probing => {}
                        HealthState::Closed => panic!("client was never closed"),
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
