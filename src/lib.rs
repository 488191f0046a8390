//! # relaykit
//!
//! Client for network relay modules driven by fixed 8-byte binary frames:
//! - Frame codec with a modulo-256 checksum
//! - Connection-per-request TCP transport with bounded retry
//! - Session that caches relay states and resynchronizes after every switch
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Session                             │
//! │        (turn_on / turn_off / refresh / is_on, retry)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │  Transport  │
//!   │ (codec, sum)│          │ (TCP, 8 B)  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ Relay module│
//!                           │ (or sim)    │
//!                           └─────────────┘
//! ```
//!
//! ## Example
//! ```no_run
//! use relaykit::{Config, Session};
//!
//! # fn main() -> relaykit::Result<()> {
//! let mut module = Session::connect(Config::default())?;
//! module.turn_on(3)?;
//! assert!(module.is_on(3)?);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod network;
pub mod protocol;
pub mod session;
pub mod state;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{RelayError, Result};
pub use session::{Session, SharedSession};
pub use state::RelayState;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of relaykit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
