//! wireprobe - HTTP/2 and HTTP/3 conformance probe
//!
//! This crate builds a single HTTP request as raw wire bytes for HTTP/2
//! (over TLS/TCP) or HTTP/3 (over QUIC/UDP), sends it to a target host and
//! reassembles the raw response into header fields and a body. The encoders
//! are free to produce frame sequences a strict peer would reject; that is
//! what the tool is for.

pub mod http;
pub mod logging;
pub mod net;
