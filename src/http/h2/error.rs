//! HTTP/2 error codes
//!
//! Only used to put names on the codes carried by GOAWAY and RST_STREAM;
//! the raw code is what the caller gets back.

use std::fmt;

/// Registered error codes (RFC 9113 Section 7)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    NoError = 0x0,
    ProtocolError = 0x1,
    InternalError = 0x2,
    FlowControlError = 0x3,
    SettingsTimeout = 0x4,
    StreamClosed = 0x5,
    FrameSizeError = 0x6,
    RefusedStream = 0x7,
    Cancel = 0x8,
    CompressionError = 0x9,
    ConnectError = 0xa,
    EnhanceYourCalm = 0xb,
    InadequateSecurity = 0xc,
    Http11Required = 0xd,
}

const ERROR_CODES: [(ErrorCode, &str); 14] = [
    (ErrorCode::NoError, "NO_ERROR"),
    (ErrorCode::ProtocolError, "PROTOCOL_ERROR"),
    (ErrorCode::InternalError, "INTERNAL_ERROR"),
    (ErrorCode::FlowControlError, "FLOW_CONTROL_ERROR"),
    (ErrorCode::SettingsTimeout, "SETTINGS_TIMEOUT"),
    (ErrorCode::StreamClosed, "STREAM_CLOSED"),
    (ErrorCode::FrameSizeError, "FRAME_SIZE_ERROR"),
    (ErrorCode::RefusedStream, "REFUSED_STREAM"),
    (ErrorCode::Cancel, "CANCEL"),
    (ErrorCode::CompressionError, "COMPRESSION_ERROR"),
    (ErrorCode::ConnectError, "CONNECT_ERROR"),
    (ErrorCode::EnhanceYourCalm, "ENHANCE_YOUR_CALM"),
    (ErrorCode::InadequateSecurity, "INADEQUATE_SECURITY"),
    (ErrorCode::Http11Required, "HTTP_1_1_REQUIRED"),
];

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// `None` for codes outside the registry
    pub fn from_u32(code: u32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| ERROR_CODES.get(i))
            .map(|(code, _)| *code)
    }

    pub fn name(&self) -> &'static str {
        ERROR_CODES[self.as_u32() as usize].1
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:x})", self.name(), self.as_u32())
    }
}

/// Render a wire error code with its registered name
pub fn describe(code: u64) -> String {
    match u32::try_from(code).ok().and_then(ErrorCode::from_u32) {
        Some(known) => known.to_string(),
        None => format!("unknown (0x{:x})", code),
    }
}
