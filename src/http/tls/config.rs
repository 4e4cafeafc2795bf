//! TLS configuration
//!
//! OpenSSL client configuration for the HTTP/2 driver.

use super::keylog::KeyLogSink;
use super::session::TlsSession;
use crate::net::Deadline;
use std::net::TcpStream;
use std::sync::Arc;

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("rustls error: {0}")]
    Rustls(#[from] rustls::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Handshake timed out")]
    Timeout,
}

/// TLS configuration (immutable after building)
#[derive(Clone)]
pub struct TlsConfig {
    pub(crate) ctx: openssl::ssl::SslContext,
    pub(crate) servername: Option<String>,
}

impl TlsConfig {
    /// Create a new client configuration builder
    pub fn client() -> Result<ClientConfigBuilder, TlsError> {
        ClientConfigBuilder::new()
    }

    /// Connect to a server with TLS
    ///
    /// The handshake and all later I/O on the session are bounded by
    /// `deadline`.
    pub fn connect(&self, stream: TcpStream, deadline: Deadline) -> Result<TlsSession, TlsError> {
        TlsSession::connect(stream, self, deadline)
    }
}

/// Encode protocol names in the length-prefixed ALPN wire format
fn alpn_wire(protocols: &[&str]) -> Result<Vec<u8>, TlsError> {
    let mut alpn_bytes = Vec::new();
    for proto in protocols {
        let len = u8::try_from(proto.len())
            .map_err(|_| TlsError::InvalidConfig(format!("ALPN protocol too long: {}", proto)))?;
        alpn_bytes.push(len);
        alpn_bytes.extend_from_slice(proto.as_bytes());
    }
    Ok(alpn_bytes)
}

/// Client configuration builder
pub struct ClientConfigBuilder {
    ctx_builder: openssl::ssl::SslContextBuilder,
    servername: Option<String>,
}

impl ClientConfigBuilder {
    fn new() -> Result<Self, TlsError> {
        use openssl::ssl::{SslContextBuilder, SslMethod};

        let mut ctx_builder = SslContextBuilder::new(SslMethod::tls_client())?;

        // Default: don't verify peer (test targets use self-signed certs)
        ctx_builder.set_verify(openssl::ssl::SslVerifyMode::NONE);

        Ok(ClientConfigBuilder {
            ctx_builder,
            servername: None,
        })
    }

    /// Set ALPN protocols
    pub fn alpn(mut self, protocols: &[&str]) -> Result<Self, TlsError> {
        self.ctx_builder.set_alpn_protos(&alpn_wire(protocols)?)?;
        Ok(self)
    }

    /// Set SNI servername
    pub fn servername(mut self, name: impl Into<String>) -> Self {
        self.servername = Some(name.into());
        self
    }

    /// Enable/disable peer certificate verification
    pub fn verify_peer(mut self, verify: bool) -> Self {
        if verify {
            self.ctx_builder.set_verify(openssl::ssl::SslVerifyMode::PEER);
        } else {
            self.ctx_builder.set_verify(openssl::ssl::SslVerifyMode::NONE);
        }
        self
    }

    /// Tee every negotiated secret to a key-log file
    pub fn key_log(mut self, sink: Arc<KeyLogSink>) -> Self {
        self.ctx_builder
            .set_keylog_callback(move |_ssl, line| sink.write_line(line));
        self
    }

    /// Build the TLS configuration
    pub fn build(self) -> TlsConfig {
        TlsConfig {
            ctx: self.ctx_builder.build(),
            servername: self.servername,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_builder() {
        let config = TlsConfig::client()
            .unwrap()
            .alpn(&["h2"])
            .unwrap()
            .servername("example.com")
            .verify_peer(false)
            .build();

        assert_eq!(config.servername, Some("example.com".to_string()));
    }

    #[test]
    fn test_alpn_wire_format() {
        assert_eq!(alpn_wire(&["h2"]).unwrap(), b"\x02h2");
        assert_eq!(alpn_wire(&["h3", "h3-29"]).unwrap(), b"\x02h3\x05h3-29");
        let long = "x".repeat(300);
        assert!(alpn_wire(&[long.as_str()]).is_err());
    }
}
