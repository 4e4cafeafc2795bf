//! HTTP/2 and HTTP/3 request probing
//!
//! This module holds the protocol-independent pieces (message model, target,
//! configuration, error taxonomy) and the two protocol stacks.
//!
//! # Architecture
//!
//! Each protocol has a wire codec and a transport driver:
//!
//! - `h2::codec` / `h2::client` - frame codec, request encoder and the
//!   TCP+TLS driver with its response read loop
//! - `h3::varint`, `h3::qpack`, `h3::frames` / `h3::client` - varint and
//!   header codecs, frame envelope, and the QUIC driver
//! - `tls` - OpenSSL configuration for HTTP/2, rustls configuration for QUIC,
//!   and the shared key-log sink
//!
//! [`client::send_request`] picks the driver for the configured protocol.
//!
//! # Examples
//!
//! ```no_run
//! use wireprobe::http::{ClientConfig, Message, Protocol, Target};
//! use std::time::Duration;
//!
//! let target = Target::parse("https://example.com/").unwrap();
//! let config = ClientConfig::new(Protocol::H2).timeout(Duration::from_secs(5));
//!
//! let request = Message::new()
//!     .header(":method", "GET")
//!     .header(":scheme", "https")
//!     .header(":authority", "example.com")
//!     .header(":path", "/");
//!
//! let response = wireprobe::http::send_request(&target, &config, &request).unwrap();
//! for field in response.headers() {
//!     println!("{}", field);
//! }
//! ```

pub mod client;
pub mod config;
pub mod h2;
pub mod h3;
pub mod headers;
pub mod message;
pub mod target;
pub mod tls;

pub use client::send_request;
pub use config::{ClientConfig, Protocol};
pub use message::{HeaderField, Message};
pub use target::Target;

use std::fmt;
use std::net::SocketAddr;

/// Result type for probe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors terminating a single request
///
/// Each variant names the phase that failed. None of them is retried
/// internally and no partial response accompanies them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to resolve {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("failed to write request: {0}")]
    Write(#[source] std::io::Error),

    #[error("received {kind}: error code {code}")]
    ProtocolSignal { kind: SignalKind, code: u64 },

    #[error("malformed response: {0}")]
    Decode(#[from] DecodeError),

    #[error("timeout")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

impl From<tls::TlsError> for Error {
    fn from(e: tls::TlsError) -> Self {
        match e {
            tls::TlsError::Timeout => Error::Timeout,
            other => Error::Handshake(other.to_string()),
        }
    }
}

/// Peer-initiated termination signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// HTTP/2 GOAWAY frame
    GoAway,
    /// HTTP/2 RST_STREAM frame on the request stream
    RstStream,
    /// QUIC RESET_STREAM on the request stream
    StreamReset,
    /// QUIC CONNECTION_CLOSE carrying an application error
    ConnectionClose,
}

impl SignalKind {
    /// Signal name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::GoAway => "GOAWAY",
            SignalKind::RstStream => "RST_STREAM",
            SignalKind::StreamReset => "RESET_STREAM",
            SignalKind::ConnectionClose => "CONNECTION_CLOSE",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::GoAway | SignalKind::RstStream => write!(f, "{} frame", self.name()),
            SignalKind::StreamReset | SignalKind::ConnectionClose => {
                write!(f, "connection drop ({})", self.name())
            }
        }
    }
}

/// Response decoding failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated varint")]
    TruncatedVarint,

    #[error("truncated frame: {0}")]
    TruncatedFrame(String),

    #[error("frame payload too large: {0}")]
    FrameTooLarge(u64),

    #[error("HPACK decode error: {0}")]
    Hpack(String),

    #[error("QPACK decode error: {0}")]
    Qpack(String),
}
