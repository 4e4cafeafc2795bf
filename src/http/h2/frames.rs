//! HTTP/2 frame types and utilities
//!
//! This module defines the frame types of RFC 9113 Section 6 that the probe
//! sends or interprets. Other types are carried through as raw bytes.

use super::error::ErrorCode;
use bytes::Bytes;
use std::fmt;

/// Frame types the client writes or reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Data = 0x0,
    Headers = 0x1,
    Priority = 0x2,
    RstStream = 0x3,
    Settings = 0x4,
    PushPromise = 0x5,
    Ping = 0x6,
    Goaway = 0x7,
    WindowUpdate = 0x8,
    Continuation = 0x9,
}

const FRAME_TYPES: [(FrameType, &str); 10] = [
    (FrameType::Data, "DATA"),
    (FrameType::Headers, "HEADERS"),
    (FrameType::Priority, "PRIORITY"),
    (FrameType::RstStream, "RST_STREAM"),
    (FrameType::Settings, "SETTINGS"),
    (FrameType::PushPromise, "PUSH_PROMISE"),
    (FrameType::Ping, "PING"),
    (FrameType::Goaway, "GOAWAY"),
    (FrameType::WindowUpdate, "WINDOW_UPDATE"),
    (FrameType::Continuation, "CONTINUATION"),
];

impl FrameType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// `None` for extension and unassigned types
    pub fn from_u8(byte: u8) -> Option<Self> {
        FRAME_TYPES.get(usize::from(byte)).map(|(kind, _)| *kind)
    }

    /// Registered name, e.g. `RST_STREAM`
    pub fn name(&self) -> &'static str {
        FRAME_TYPES[self.as_u8() as usize].1
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:x})", self.name(), self.as_u8())
    }
}

/// Flag octet of a frame header
///
/// Bits mean different things per frame type; 0x1 is END_STREAM on DATA and
/// HEADERS but ACK on SETTINGS and PING.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameFlags(u8);

impl FrameFlags {
    pub const END_STREAM: u8 = 0x1;
    pub const ACK: u8 = 0x1;
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;

    pub fn empty() -> Self {
        FrameFlags(0)
    }

    pub fn from_u8(flags: u8) -> Self {
        FrameFlags(flags)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn is_set(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn is_end_stream(&self) -> bool {
        self.is_set(Self::END_STREAM)
    }

    pub fn is_ack(&self) -> bool {
        self.is_set(Self::ACK)
    }

    pub fn is_end_headers(&self) -> bool {
        self.is_set(Self::END_HEADERS)
    }

    pub fn is_padded(&self) -> bool {
        self.is_set(Self::PADDED)
    }

    pub fn is_priority(&self) -> bool {
        self.is_set(Self::PRIORITY)
    }
}

/// Frame as read off the wire
///
/// The type byte is kept raw so that unknown frame types can be recognized
/// and skipped.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw frame type byte
    pub kind: u8,
    /// Frame flags
    pub flags: FrameFlags,
    /// Stream ID
    pub stream_id: u32,
    /// Frame payload
    pub payload: Bytes,
}

impl Frame {
    /// Known frame type, if any
    pub fn frame_type(&self) -> Option<FrameType> {
        FrameType::from_u8(self.kind)
    }

    /// Get payload size
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// Outbound DATA frame
#[derive(Debug, Clone)]
pub struct DataFrame {
    pub stream_id: u32,
    pub data: Bytes,
    pub end_stream: bool,
}

impl DataFrame {
    pub fn new(stream_id: u32, data: Bytes, end_stream: bool) -> Self {
        DataFrame {
            stream_id,
            data,
            end_stream,
        }
    }
}

/// Outbound HEADERS frame carrying an already encoded block fragment
#[derive(Debug, Clone)]
pub struct HeadersFrame {
    pub stream_id: u32,
    pub header_block: Bytes,
    pub end_stream: bool,
    pub end_headers: bool,
}

impl HeadersFrame {
    pub fn new(stream_id: u32, header_block: Bytes, end_stream: bool, end_headers: bool) -> Self {
        HeadersFrame {
            stream_id,
            header_block,
            end_stream,
            end_headers,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContinuationFrame {
    pub stream_id: u32,
    pub header_block: Bytes,
    pub end_headers: bool,
}

impl ContinuationFrame {
    pub fn new(stream_id: u32, header_block: Bytes, end_headers: bool) -> Self {
        ContinuationFrame {
            stream_id,
            header_block,
            end_headers,
        }
    }
}

/// SETTINGS parameter identifiers used by the probe
pub mod settings {
    /// SETTINGS_INITIAL_WINDOW_SIZE
    pub const INITIAL_WINDOW_SIZE: u16 = 0x4;
}

/// SETTINGS frame (RFC 9113 Section 6.5)
#[derive(Debug, Clone, Default)]
pub struct SettingsFrame {
    /// Parameters in the order they are sent
    pub params: Vec<(u16, u32)>,
    /// ACK flag
    pub ack: bool,
}

impl SettingsFrame {
    /// Create a SETTINGS frame carrying `params`
    pub fn new(params: Vec<(u16, u32)>) -> Self {
        SettingsFrame { params, ack: false }
    }

    /// Create a SETTINGS ACK frame
    pub fn ack() -> Self {
        SettingsFrame {
            params: Vec::new(),
            ack: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RstStreamFrame {
    pub stream_id: u32,
    pub error_code: u32,
}

impl RstStreamFrame {
    pub fn new(stream_id: u32, error_code: u32) -> Self {
        RstStreamFrame {
            stream_id,
            error_code,
        }
    }
}

/// GOAWAY; only its error code matters to the read loop
#[derive(Debug, Clone)]
pub struct GoawayFrame {
    pub last_stream_id: u32,
    pub error_code: u32,
    pub debug_data: Bytes,
}

impl GoawayFrame {
    pub fn new(last_stream_id: u32, error_code: u32, debug_data: Bytes) -> Self {
        GoawayFrame {
            last_stream_id,
            error_code,
            debug_data,
        }
    }

    /// Error code name, when it is one of the registered codes
    pub fn error_name(&self) -> Option<&'static str> {
        ErrorCode::from_u32(self.error_code).map(|c| c.name())
    }
}

/// WINDOW_UPDATE; stream 0 targets the connection window
#[derive(Debug, Clone, Copy)]
pub struct WindowUpdateFrame {
    pub stream_id: u32,
    pub size_increment: u32,
}

impl WindowUpdateFrame {
    pub fn new(stream_id: u32, size_increment: u32) -> Self {
        WindowUpdateFrame {
            stream_id,
            size_increment,
        }
    }
}
