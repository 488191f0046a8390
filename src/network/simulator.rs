//! Relay Module Simulator
//!
//! Speaks the module's side of the protocol over TCP so the client can be
//! exercised without hardware.
//!
//! ## Behavior
//! - One request frame per connection, connections served in arrival order
//! - GET_STATUS answers with a response frame carrying the relay bitmask
//! - TURN_ON / TURN_OFF update the bitmask and send nothing back
//! - Frames with a bad checksum, another module number or an out-of-range
//!   relay are logged and dropped

use std::io::Read;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::Result;
use crate::protocol::{
    decode_frame, encode_frame, format_hex, read_frame, write_frame, Action, Frame, MessageType,
    FRAME_SIZE,
};

/// How long a connection may sit idle before the simulator hangs up
const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Mutable device state plus pending fault injections
#[derive(Debug, Default)]
struct DeviceState {
    mask: u32,
    corrupt_remaining: usize,
    silent_remaining: usize,
}

/// In-process stand-in for a relay module
pub struct Simulator {
    listener: TcpListener,
    module_number: u8,
    number_of_relays: usize,
    state: Arc<Mutex<DeviceState>>,
    shutdown: Arc<AtomicBool>,
}

impl Simulator {
    /// Bind the listening socket; use port 0 to let the OS pick one
    pub fn bind(
        addr: impl ToSocketAddrs,
        module_number: u8,
        number_of_relays: usize,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;

        Ok(Self {
            listener,
            module_number,
            number_of_relays,
            state: Arc::new(Mutex::new(DeviceState::default())),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until shut down (blocking)
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Simulating module {} with {} relays on {}",
            self.module_number,
            self.number_of_relays,
            self.local_addr()?
        );

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            match stream {
                Ok(stream) => {
                    if let Err(e) = self.serve_connection(stream) {
                        tracing::warn!("Simulator connection failed: {}", e);
                    }
                }
                Err(e) => tracing::warn!("Simulator accept failed: {}", e),
            }
        }

        tracing::info!("Simulator stopped");
        Ok(())
    }

    /// Run on a background thread
    pub fn spawn(self) -> Result<SimulatorHandle> {
        let addr = self.local_addr()?;
        let state = Arc::clone(&self.state);
        let shutdown = Arc::clone(&self.shutdown);

        let thread = thread::Builder::new()
            .name("relay-sim".to_string())
            .spawn(move || {
                if let Err(e) = self.run() {
                    tracing::error!("Simulator error: {}", e);
                }
            })?;

        Ok(SimulatorHandle {
            addr,
            state,
            shutdown,
            thread: Some(thread),
        })
    }

    /// Handle one request frame on a fresh connection
    fn serve_connection(&self, mut stream: TcpStream) -> Result<()> {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        stream.set_read_timeout(Some(IDLE_TIMEOUT))?;

        let raw = read_frame(&mut stream)?;
        let frame = match decode_frame(&raw) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropping frame from {}: {}", peer, e);
                return Ok(());
            }
        };

        if frame.message_type != MessageType::Request || frame.module_number != self.module_number
        {
            tracing::debug!("Ignoring frame not addressed to us: [{}]", format_hex(&raw));
            return Ok(());
        }

        let mut state = self.state.lock();

        if state.silent_remaining > 0 {
            state.silent_remaining -= 1;
            drop(state);
            tracing::debug!("Staying silent on {} from {}", frame.action, peer);
            drain(&mut stream);
            return Ok(());
        }

        match frame.action {
            Action::TurnOn | Action::TurnOff => {
                let relay = frame.data as usize;
                if relay == 0 || relay > self.number_of_relays || relay > 32 {
                    tracing::warn!("Relay {} out of range, ignoring {}", relay, frame.action);
                    return Ok(());
                }

                let bit = 1u32 << (relay - 1);
                if frame.action == Action::TurnOn {
                    state.mask |= bit;
                } else {
                    state.mask &= !bit;
                }
                tracing::debug!("{} relay {} -> mask {:#06x}", frame.action, relay, state.mask);
            }
            Action::GetStatus => {
                let mut reply = encode_frame(&Frame::response(
                    self.module_number,
                    Action::GetStatus,
                    state.mask,
                ));
                if state.corrupt_remaining > 0 {
                    state.corrupt_remaining -= 1;
                    reply[FRAME_SIZE - 1] = reply[FRAME_SIZE - 1].wrapping_add(1);
                    tracing::debug!("Corrupting status reply to {}", peer);
                }
                drop(state);

                write_frame(&mut stream, &reply)?;
            }
        }

        Ok(())
    }
}

/// Hold the connection open without answering until the client hangs up
fn drain(stream: &mut TcpStream) {
    let mut sink = [0u8; 64];
    while let Ok(n) = stream.read(&mut sink) {
        if n == 0 {
            break;
        }
    }
}

/// Control handle for a simulator running on a background thread
///
/// Dropping the handle stops the simulator.
pub struct SimulatorHandle {
    addr: SocketAddr,
    state: Arc<Mutex<DeviceState>>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SimulatorHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Current relay bitmask
    pub fn mask(&self) -> u32 {
        self.state.lock().mask
    }

    pub fn set_mask(&self, mask: u32) {
        self.state.lock().mask = mask;
    }

    /// Corrupt the checksum of the next `count` status replies
    pub fn corrupt_next(&self, count: usize) {
        self.state.lock().corrupt_remaining = count;
    }

    /// Leave the next `count` requests unanswered
    pub fn silence_next(&self, count: usize) {
        self.state.lock().silent_remaining = count;
    }

    /// Stop accepting connections and wait for the thread to finish
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        self.shutdown.store(true, Ordering::Relaxed);

        // Wake the blocking accept over the listener's own address family
        let mut wake = self.addr;
        if wake.ip().is_unspecified() {
            let loopback: IpAddr = match wake {
                SocketAddr::V4(_) => Ipv4Addr::LOCALHOST.into(),
                SocketAddr::V6(_) => Ipv6Addr::LOCALHOST.into(),
            };
            wake.set_ip(loopback);
        }

        if let Err(e) = TcpStream::connect_timeout(&wake, Duration::from_secs(1)) {
            // Joining would block on accept forever; leave the thread detached
            tracing::warn!("Could not wake simulator on {}: {}", wake, e);
            return;
        }

        if thread.join().is_err() {
            tracing::error!("Simulator thread panicked");
        }
    }
}

impl Drop for SimulatorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
