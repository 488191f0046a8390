//! Network Tests
//!
//! End-to-end tests: a real TCP session talking to the simulated module.
//!
//! These tests verify:
//! - Switching relays over fresh connections
//! - Retry after a silent module (read timeout) and a corrupted reply
//! - ExhaustedRetries when the module never answers
//! - Connection failures propagating without retry

use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use relaykit::network::{Simulator, SimulatorHandle, TcpTransport, Transport};
use relaykit::protocol::{build_get_status, build_turn_on, decode_frame, Action, MessageType};
use relaykit::{Config, RelayError, Session, SharedSession};

// =============================================================================
// Helper Functions
// =============================================================================

fn start_simulator() -> SimulatorHandle {
    Simulator::bind("127.0.0.1:0", 1, 16)
        .unwrap()
        .spawn()
        .unwrap()
}

fn config_for(sim: &SimulatorHandle) -> Config {
    Config::builder()
        .host("127.0.0.1")
        .port(sim.local_addr().port())
        .timeout_ms(200)
        .build()
}

/// Port with nothing listening on it
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Shut the simulator down on another thread; false if it did not finish in time
fn shuts_down_promptly(sim: SimulatorHandle) -> bool {
    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        sim.shutdown();
        let _ = done_tx.send(());
    });
    done_rx.recv_timeout(Duration::from_secs(5)).is_ok()
}

// =============================================================================
// Simulator lifecycle
// =============================================================================

#[test]
fn test_simulator_shutdown_on_ipv4_wildcard() {
    let sim = Simulator::bind("0.0.0.0:0", 1, 16).unwrap().spawn().unwrap();
    assert!(shuts_down_promptly(sim));
}

#[test]
fn test_simulator_shutdown_on_ipv6_wildcard() {
    // Hosts without IPv6 cannot bind here; nothing to check then
    let Ok(sim) = Simulator::bind("[::]:0", 1, 16) else {
        return;
    };
    let sim = sim.spawn().unwrap();
    assert!(sim.local_addr().is_ipv6());
    assert!(shuts_down_promptly(sim));
}

#[test]
fn test_simulator_shutdown_on_loopback() {
    let sim = start_simulator();
    assert!(shuts_down_promptly(sim));
}

// =============================================================================
// Transport
// =============================================================================

#[test]
fn test_transport_status_exchange() {
    let sim = start_simulator();
    sim.set_mask(0x0005);

    let mut transport = TcpTransport::new(&config_for(&sim));
    let raw = transport
        .exchange(&build_get_status(1), true)
        .unwrap()
        .unwrap();

    let frame = decode_frame(&raw).unwrap();
    assert_eq!(frame.message_type, MessageType::Response);
    assert_eq!(frame.action, Action::GetStatus);
    assert_eq!(frame.data, 0x0005);
}

#[test]
fn test_transport_command_without_response() {
    let sim = start_simulator();

    let mut transport = TcpTransport::new(&config_for(&sim));
    let reply = transport.exchange(&build_turn_on(4, 1), false).unwrap();
    assert!(reply.is_none());

    // Status query goes through the sequential simulator after the command
    let raw = transport
        .exchange(&build_get_status(1), true)
        .unwrap()
        .unwrap();
    assert_eq!(decode_frame(&raw).unwrap().data, 0b1000);
}

#[test]
fn test_transport_timeout_on_silence() {
    let sim = start_simulator();
    sim.silence_next(1);

    let mut transport = TcpTransport::new(&config_for(&sim));
    let result = transport.exchange(&build_get_status(1), true);
    assert!(matches!(result, Err(RelayError::Timeout(_))));
}

#[test]
fn test_transport_wrong_module_closes_without_reply() {
    let sim = start_simulator();

    let mut transport = TcpTransport::new(&config_for(&sim));
    let result = transport.exchange(&build_get_status(2), true);
    assert!(matches!(result, Err(RelayError::MalformedFrame(_))));
}

#[test]
fn test_transport_connection_refused() {
    let config = Config::builder()
        .host("127.0.0.1")
        .port(closed_port())
        .timeout_ms(200)
        .build();

    let mut transport = TcpTransport::new(&config);
    let result = transport.exchange(&build_get_status(1), true);
    assert!(matches!(result, Err(RelayError::Io(_))));
}

// =============================================================================
// Session over TCP
// =============================================================================

#[test]
fn test_session_reads_initial_state() {
    let sim = start_simulator();
    sim.set_mask(0x8001);

    let session = Session::connect(config_for(&sim)).unwrap();
    assert_eq!(session.relay_states().active(), vec![1, 16]);
}

#[test]
fn test_session_turn_on_and_off() {
    let sim = start_simulator();
    let mut session = Session::connect(config_for(&sim)).unwrap();

    session.turn_on(1).unwrap();
    assert!(session.is_on(1).unwrap());
    assert_eq!(sim.mask(), 0x0001);

    session.turn_on(16).unwrap();
    assert!(session.is_on(16).unwrap());
    assert_eq!(sim.mask(), 0x8001);

    session.turn_off(1).unwrap();
    assert!(!session.is_on(1).unwrap());
    assert!(session.is_on(16).unwrap());

    session.turn_off(16).unwrap();
    assert!(session.relay_states().active().is_empty());
    assert_eq!(sim.mask(), 0);
}

#[test]
fn test_session_sweep_every_relay() {
    let sim = start_simulator();
    let mut session = Session::connect(config_for(&sim)).unwrap();

    for relay in 1..=16 {
        session.turn_on(relay).unwrap();
        assert_eq!(session.relay_states().active(), vec![relay]);
        session.turn_off(relay).unwrap();
    }

    assert_eq!(sim.mask(), 0);
}

#[test]
fn test_session_sees_external_changes_on_refresh() {
    let sim = start_simulator();
    let mut session = Session::connect(config_for(&sim)).unwrap();
    assert!(!session.is_on(5).unwrap());

    sim.set_mask(1 << 4);
    // Cache is untouched until the next query
    assert!(!session.is_on(5).unwrap());

    session.refresh().unwrap();
    assert!(session.is_on(5).unwrap());
}

#[test]
fn test_session_retries_after_silence() {
    let sim = start_simulator();
    let mut session = Session::connect(config_for(&sim)).unwrap();

    sim.set_mask(0b10);
    sim.silence_next(1);
    session.refresh().unwrap();
    assert!(session.is_on(2).unwrap());
}

#[test]
fn test_session_retries_after_corrupted_reply() {
    let sim = start_simulator();
    let mut session = Session::connect(config_for(&sim)).unwrap();

    sim.set_mask(0b100);
    sim.corrupt_next(1);
    session.refresh().unwrap();
    assert!(session.is_on(3).unwrap());
}

#[test]
fn test_session_exhausts_retries_on_silent_module() {
    let sim = start_simulator();
    let mut session = Session::connect(config_for(&sim)).unwrap();

    sim.silence_next(2);
    match session.refresh() {
        Err(RelayError::ExhaustedRetries { attempts, last }) => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, RelayError::Timeout(_)));
        }
        other => panic!("Expected ExhaustedRetries, got {:?}", other),
    }

    // The module recovers; so does the session
    session.refresh().unwrap();
}

#[test]
fn test_session_exhausts_retries_on_corrupted_replies() {
    let sim = start_simulator();
    sim.corrupt_next(2);

    let result = Session::connect(config_for(&sim));
    match result {
        Err(RelayError::ExhaustedRetries { last, .. }) => {
            assert!(matches!(*last, RelayError::InvalidChecksum { .. }));
        }
        Err(e) => panic!("Expected ExhaustedRetries, got {:?}", e),
        Ok(_) => panic!("Expected ExhaustedRetries, got a session"),
    }
}

#[test]
fn test_session_connect_refused() {
    let config = Config::builder()
        .host("127.0.0.1")
        .port(closed_port())
        .timeout_ms(200)
        .build();

    assert!(matches!(Session::connect(config), Err(RelayError::Io(_))));
}

#[test]
fn test_shared_session_over_tcp() {
    let sim = start_simulator();
    let shared = SharedSession::connect(config_for(&sim)).unwrap();

    let handles: Vec<_> = (1..=4)
        .map(|relay| {
            let shared = shared.clone();
            thread::spawn(move || shared.turn_on(relay))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(sim.mask(), 0b1111);
    assert_eq!(shared.refresh().unwrap().active(), vec![1, 2, 3, 4]);
}
