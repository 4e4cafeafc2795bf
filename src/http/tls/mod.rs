//! TLS support for the protocol drivers
//!
//! HTTP/2 runs over OpenSSL, HTTP/3 over rustls inside quinn. Both stacks
//! share the same key-log sink and neither verifies certificates.
//!
//! # Architecture
//!
//! 1. `TlsConfig` holds OpenSSL settings (ALPN, SNI, key log)
//! 2. `TlsSession` is the blocking, deadline-bounded encrypted stream
//! 3. `quic::client_crypto` builds the rustls configuration handed to quinn
//!
//! # Examples
//!
//! ```no_run
//! use wireprobe::http::tls::TlsConfig;
//! use wireprobe::net::Deadline;
//! use std::net::TcpStream;
//! use std::time::Duration;
//!
//! let tls_config = TlsConfig::client()
//!     .unwrap()
//!     .alpn(&["h2"])
//!     .unwrap()
//!     .servername("example.com")
//!     .build();
//!
//! let tcp_stream = TcpStream::connect("example.com:443").unwrap();
//! let deadline = Deadline::after(Duration::from_secs(10));
//! let session = tls_config.connect(tcp_stream, deadline).unwrap();
//! assert_eq!(session.negotiated_alpn(), Some(&b"h2"[..]));
//! ```

pub mod config;
pub mod keylog;
pub mod quic;
pub mod session;

pub use config::{ClientConfigBuilder, TlsConfig, TlsError};
pub use keylog::KeyLogSink;
pub use session::TlsSession;
