//! Protocol codec
//!
//! Encoding and decoding functions for the relay module wire protocol.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬────────────┬────────────┬─────────────────┬──────────┐
//! │ Type (1) │ Module (1) │ Action (1) │  Data (4, BE)   │ Sum (1)  │
//! └──────────┴────────────┴────────────┴─────────────────┴──────────┘
//! ```
//!
//! The checksum is the modulo-256 sum of the seven bytes before it. A frame
//! whose checksum does not match is never interpreted.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut};

use super::checksum;
use super::frame::{Action, Frame, MessageType, RawFrame, FRAME_SIZE};
use crate::error::{RelayError, Result};
use crate::state::RelayState;

// =============================================================================
// Frame Encoding/Decoding
// =============================================================================

/// Encode a frame to its 8 wire bytes
///
/// Format: type (1) + module (1) + action (1) + data (4, big-endian) + checksum (1)
pub fn encode_frame(frame: &Frame) -> RawFrame {
    let mut buffer: Vec<u8> = Vec::with_capacity(FRAME_SIZE);
    buffer.put_u8(frame.message_type as u8);
    buffer.put_u8(frame.module_number);
    buffer.put_u8(frame.action as u8);
    buffer.put_u32(frame.data);
    checksum::append(&mut buffer);

    let mut raw = [0u8; FRAME_SIZE];
    raw.copy_from_slice(&buffer);
    raw
}

/// Decode a frame from bytes
///
/// The buffer must be exactly [`FRAME_SIZE`] bytes long. The checksum is
/// verified before any field is looked at.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() != FRAME_SIZE {
        return Err(RelayError::MalformedFrame(format!(
            "expected {} bytes, got {} [{}]",
            FRAME_SIZE,
            bytes.len(),
            format_hex(bytes)
        )));
    }

    if !checksum::validate(bytes) {
        return Err(RelayError::InvalidChecksum {
            bytes: format_hex(bytes),
        });
    }

    // Checksum byte is dropped once verified
    let mut body = &bytes[..FRAME_SIZE - 1];
    let type_code = body.get_u8();
    let module_number = body.get_u8();
    let action_code = body.get_u8();
    let data = body.get_u32();

    let message_type = MessageType::from_code(type_code).ok_or_else(|| {
        RelayError::MalformedFrame(format!("unknown message type: 0x{:02x}", type_code))
    })?;
    let action = Action::from_code(action_code).ok_or_else(|| {
        RelayError::MalformedFrame(format!("unknown action: 0x{:02x}", action_code))
    })?;

    Ok(Frame {
        message_type,
        module_number,
        action,
        data,
    })
}

// =============================================================================
// Request Builders
// =============================================================================

/// Request that switches `relay_number` (1-based) on
///
/// No range check happens here; the session enforces the relay bounds.
pub fn build_turn_on(relay_number: u32, module_number: u8) -> RawFrame {
    encode_frame(&Frame::request(module_number, Action::TurnOn, relay_number))
}

/// Request that switches `relay_number` (1-based) off
pub fn build_turn_off(relay_number: u32, module_number: u8) -> RawFrame {
    encode_frame(&Frame::request(module_number, Action::TurnOff, relay_number))
}

/// Request for the relay bitmask
pub fn build_get_status(module_number: u8) -> RawFrame {
    encode_frame(&Frame::request(module_number, Action::GetStatus, 0))
}

// =============================================================================
// Response Parsers
// =============================================================================

/// Decode a status response into per-relay states
///
/// Bit `i` of the data field (least-significant first) becomes relay `i + 1`.
/// A checksum-valid frame that is not a GET_STATUS response is a `Protocol`
/// error.
pub fn parse_status_response(bytes: &[u8], number_of_relays: usize) -> Result<RelayState> {
    let frame = decode_frame(bytes)?;

    if frame.message_type != MessageType::Response || frame.action != Action::GetStatus {
        return Err(RelayError::Protocol(format!(
            "expected GET_STATUS response, got {:?} {} [{}]",
            frame.message_type,
            frame.action,
            format_hex(bytes)
        )));
    }

    Ok(RelayState::from_mask(frame.data, number_of_relays))
}

/// Render bytes as space-separated upper-case hex, e.g. `55 01 12`
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read exactly one frame from a stream
///
/// A stream that ends before [`FRAME_SIZE`] bytes arrive yields
/// `MalformedFrame`. The checksum is not checked here.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<RawFrame> {
    let mut raw = [0u8; FRAME_SIZE];
    let mut filled = 0;

    while filled < FRAME_SIZE {
        match reader.read(&mut raw[filled..]) {
            Ok(0) => {
                return Err(RelayError::MalformedFrame(format!(
                    "stream closed after {} of {} bytes [{}]",
                    filled,
                    FRAME_SIZE,
                    format_hex(&raw[..filled])
                )));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(raw)
}

/// Write a frame to a stream
pub fn write_frame<W: Write>(writer: &mut W, frame: &RawFrame) -> Result<()> {
    writer.write_all(frame)?;
    writer.flush()?;
    Ok(())
}
