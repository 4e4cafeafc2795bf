//! Per-request client configuration
//!
//! Every driver invocation receives its configuration explicitly; there is no
//! process-wide state.

use super::tls::KeyLogSink;
use super::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default overall timeout for one request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Protocol selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// HTTP/2 over TLS/TCP
    H2,
    /// HTTP/3 over QUIC/UDP
    H3,
}

impl Protocol {
    /// Parse from the short names `h2` and `h3`
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "h2" => Ok(Protocol::H2),
            "h3" => Ok(Protocol::H3),
            _ => Err(Error::InvalidTarget(format!(
                "unknown protocol '{}', must be one of \"h2\" or \"h3\"",
                s
            ))),
        }
    }

    /// Short protocol name
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::H2 => "h2",
            Protocol::H3 => "h3",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Client configuration (immutable once handed to a driver)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    protocol: Protocol,
    timeout: Duration,
    key_log: Option<Arc<KeyLogSink>>,
}

impl ClientConfig {
    /// Create a configuration with the default timeout and no key log
    pub fn new(protocol: Protocol) -> Self {
        ClientConfig {
            protocol,
            timeout: DEFAULT_TIMEOUT,
            key_log: None,
        }
    }

    /// Set the overall timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tee TLS secrets to a key-log sink
    pub fn key_log(mut self, sink: Arc<KeyLogSink>) -> Self {
        self.key_log = Some(sink);
        self
    }

    /// Selected protocol
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Overall timeout
    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    /// Key-log sink, if any
    pub fn get_key_log(&self) -> Option<&Arc<KeyLogSink>> {
        self.key_log.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_parsing() {
        assert_eq!(Protocol::from_str("h2").unwrap(), Protocol::H2);
        assert_eq!(Protocol::from_str("h3").unwrap(), Protocol::H3);
        assert!(Protocol::from_str("h1").is_err());
        assert_eq!(Protocol::H3.to_string(), "h3");
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new(Protocol::H3).timeout(Duration::from_millis(250));
        assert_eq!(config.protocol(), Protocol::H3);
        assert_eq!(config.get_timeout(), Duration::from_millis(250));
        assert!(config.get_key_log().is_none());

        let config = ClientConfig::new(Protocol::H2);
        assert_eq!(config.get_timeout(), DEFAULT_TIMEOUT);
    }
}
