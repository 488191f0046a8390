//! Frame definitions
//!
//! Typed view of the fixed 8-byte message exchanged with the relay module.

use std::fmt;

/// Size of every frame on the wire, checksum included
pub const FRAME_SIZE: usize = 8;

/// A frame as it travels over the socket
pub type RawFrame = [u8; FRAME_SIZE];

/// Module address used when none is configured
pub const DEFAULT_MODULE: u8 = 1;

/// Frame direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Request = 0x55,
    Response = 0x22,
}

impl MessageType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x55 => Some(MessageType::Request),
            0x22 => Some(MessageType::Response),
            _ => None,
        }
    }
}

/// Operation carried by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    /// Query the relay bitmask
    GetStatus = 0x10,

    /// Switch one relay off (data = 1-based relay number)
    TurnOff = 0x11,

    /// Switch one relay on (data = 1-based relay number)
    TurnOn = 0x12,
}

impl Action {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x10 => Some(Action::GetStatus),
            0x11 => Some(Action::TurnOff),
            0x12 => Some(Action::TurnOn),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::GetStatus => "GET_STATUS",
            Action::TurnOff => "TURN_OFF",
            Action::TurnOn => "TURN_ON",
        };
        f.write_str(name)
    }
}

/// Decoded frame fields, checksum excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub message_type: MessageType,
    pub module_number: u8,
    pub action: Action,

    /// Relay number for TURN_ON/TURN_OFF, relay bitmask for a status response
    pub data: u32,
}

impl Frame {
    pub fn new(message_type: MessageType, module_number: u8, action: Action, data: u32) -> Self {
        Self {
            message_type,
            module_number,
            action,
            data,
        }
    }

    /// Create a request frame
    pub fn request(module_number: u8, action: Action, data: u32) -> Self {
        Self::new(MessageType::Request, module_number, action, data)
    }

    /// Create a response frame
    pub fn response(module_number: u8, action: Action, data: u32) -> Self {
        Self::new(MessageType::Response, module_number, action, data)
    }
}
