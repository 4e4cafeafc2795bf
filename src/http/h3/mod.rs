//! HTTP/3 protocol implementation
//!
//! A single-request HTTP/3 client on top of quinn. The request stream
//! carries a HEADERS frame with a literal-only QPACK block and, for a
//! non-empty body, one DATA frame with the whole body. The response stream
//! is read until the peer finishes it.
//!
//! # Architecture
//!
//! - `varint` - QUIC variable-length integers
//! - `qpack` - literal-only field section encoder and a static-table decoder
//! - `frames` - frame envelope, request encoder and the async frame reader
//! - `client` - QUIC driver and response read loop
//!
//! Before the request stream is opened, a control stream announces an
//! empty SETTINGS frame. No QPACK encoder or decoder streams are opened, so
//! the peer sees a dynamic table capacity of zero.

pub mod client;
pub mod frames;
pub mod qpack;
pub mod varint;

pub use client::send_request;
pub use frames::H3Frame;
