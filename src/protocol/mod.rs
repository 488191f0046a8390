//! Protocol Module
//!
//! Defines the binary protocol spoken by the relay module.
//!
//! ## Frame Format
//! ```text
//! ┌────────┬──────┬──────────────┬─────────────────────────────────────┐
//! │ Offset │ Size │ Field        │ Values                              │
//! ├────────┼──────┼──────────────┼─────────────────────────────────────┤
//! │ 0      │ 1    │ type         │ 0x55 request, 0x22 response         │
//! │ 1      │ 1    │ module       │ 1..=255                             │
//! │ 2      │ 1    │ action       │ 0x10 GET_STATUS                     │
//! │        │      │              │ 0x11 TURN_OFF, 0x12 TURN_ON         │
//! │ 3      │ 4    │ data (BE)    │ relay number, or status bitmask     │
//! │ 7      │ 1    │ checksum     │ sum of bytes 0..=6, modulo 256      │
//! └────────┴──────┴──────────────┴─────────────────────────────────────┘
//! ```
//!
//! ### Example
//! - `55 01 12 00 00 00 10 78`: turn relay 16 of module 1 on
//! - `22 01 10 00 00 80 00 B3`: status response, only relay 16 is on

pub mod checksum;
mod codec;
mod frame;

pub use codec::{
    build_get_status, build_turn_off, build_turn_on, decode_frame, encode_frame, format_hex,
    parse_status_response, read_frame, write_frame,
};
pub use frame::{Action, Frame, MessageType, RawFrame, DEFAULT_MODULE, FRAME_SIZE};
