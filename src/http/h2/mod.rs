//! HTTP/2 protocol implementation
//!
//! A single-request HTTP/2 client with full control over the bytes it
//! sends. The request is serialized up front into one buffer and written in
//! one go; the response is read frame by frame until its header block and
//! body are complete.
//!
//! # Architecture
//!
//! - `frames` / `codec` - frame types and their binary layout
//! - `hpack` - literal-only header block encoder, and the block decoder
//! - `client` - request encoder, response read loop and the TCP+TLS driver
//!
//! # Wire behavior
//!
//! The encoded request is: client preface, SETTINGS with a large initial
//! window, a connection-level WINDOW_UPDATE, one HEADERS frame on stream 1,
//! DATA frames of at most [`MAX_DATA_CHUNK`] bytes, and finally a SETTINGS
//! ACK. The ACK goes out after the request body without waiting for the
//! server's SETTINGS; servers have to tolerate that ordering.
//!
//! No WINDOW_UPDATE is ever sent for received DATA.
//!
//! # Examples
//!
//! ```no_run
//! use wireprobe::http::h2::client::{encode_request, read_response};
//! use wireprobe::http::Message;
//! use std::net::TcpStream;
//! use std::io::Write;
//!
//! let request = Message::new()
//!     .header(":method", "GET")
//!     .header(":scheme", "http")
//!     .header(":authority", "localhost")
//!     .header(":path", "/");
//!
//! // Prior-knowledge cleartext HTTP/2
//! let mut stream = TcpStream::connect("localhost:8080").unwrap();
//! stream.write_all(&encode_request(&request)).unwrap();
//! let response = read_response(&mut stream).unwrap();
//! println!("{} header fields", response.headers().len());
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod frames;
pub mod hpack;

pub use client::send_request;
pub use codec::FrameCodec;
pub use error::ErrorCode;
pub use frames::{Frame, FrameFlags, FrameType};

/// HTTP/2 connection preface that must be sent by clients
///
/// From RFC 9113 Section 3.4:
/// "PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n"
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// ALPN identifier for HTTP/2 over TLS
pub const ALPN: &str = "h2";

/// The only stream the client opens
pub const REQUEST_STREAM_ID: u32 = 1;

/// Largest DATA payload the encoder puts in one frame
pub const MAX_DATA_CHUNK: usize = 65536;

/// Initial stream window advertised in the client's SETTINGS (2^30 - 1)
pub const INITIAL_WINDOW_SIZE: u32 = (1 << 30) - 1;

/// Connection window increment sent right after SETTINGS
///
/// Brings the connection window from its default of 65535 up to 2^30 - 2.
pub const CONNECTION_WINDOW_INCREMENT: u32 = (1 << 30) - (1 << 16) - 1;

/// Stream ID 0 (connection-level)
pub const CONNECTION_STREAM_ID: u32 = 0;
