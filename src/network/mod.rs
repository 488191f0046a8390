//! Network Module
//!
//! TCP plumbing between the session and a relay module.
//!
//! ## Architecture
//! - Connection per exchange, never pooled
//! - Each exchange is a small state machine:
//!   idle → connecting → awaiting-response → done | failed
//! - Simulator plays the module's side for tests and local runs

mod simulator;
mod transport;

pub use simulator::{Simulator, SimulatorHandle};
pub use transport::{TcpTransport, Transport};
