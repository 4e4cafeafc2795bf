//! Target URL parsing
//!
//! Only the pieces a probe needs are extracted: scheme, host, port and the
//! request path. Userinfo and fragments are not supported.

use super::{Error, Result};
use std::fmt;
use std::net::IpAddr;

/// Default port for both protocols
pub const DEFAULT_PORT: u16 = 443;

/// Parsed request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    scheme: String,
    host: String,
    port: u16,
    path: String,
}

impl Target {
    /// Parse a target URL such as `https://example.com:8443/index.html?q=1`
    ///
    /// A missing scheme defaults to `https`, a missing port to 443 and a
    /// missing path to `/`. IPv6 literals must be bracketed.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let (scheme, rest) = match url.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => ("https".to_string(), url),
        };

        if scheme != "https" && scheme != "http" {
            return Err(Error::InvalidTarget(format!("unsupported scheme '{}'", scheme)));
        }

        let (authority, path) = match rest.find(|c| c == '/' || c == '?') {
            Some(pos) if rest.as_bytes()[pos] == b'/' => (&rest[..pos], rest[pos..].to_string()),
            Some(pos) => (&rest[..pos], format!("/{}", &rest[pos..])),
            None => (rest, "/".to_string()),
        };
        let path = match path.split_once('#') {
            Some((path, _fragment)) => path.to_string(),
            None => path,
        };

        if authority.contains('@') {
            return Err(Error::InvalidTarget("userinfo is not supported".to_string()));
        }

        let (host, port) = Self::split_authority(authority)?;
        if host.is_empty() {
            return Err(Error::InvalidTarget(format!("missing host in '{}'", url)));
        }

        Ok(Target {
            scheme,
            host,
            port,
            path,
        })
    }

    fn split_authority(authority: &str) -> Result<(String, u16)> {
        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            let Some((host, after)) = bracketed.split_once(']') else {
                return Err(Error::InvalidTarget(format!("unterminated IPv6 literal '{}'", authority)));
            };
            if host.parse::<std::net::Ipv6Addr>().is_err() {
                return Err(Error::InvalidTarget(format!("invalid IPv6 literal '{}'", host)));
            }
            match after.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None if after.is_empty() => (host, None),
                None => return Err(Error::InvalidTarget(format!("invalid authority '{}'", authority))),
            }
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };

        let port = match port {
            None | Some("") => DEFAULT_PORT,
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| Error::InvalidTarget(format!("invalid port '{}'", p)))?,
        };

        Ok((host.to_ascii_lowercase(), port))
    }

    /// URL scheme (`https` or `http`)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host name or IP literal, without brackets
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Path and query, always starting with `/`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the host is an IP literal rather than a DNS name
    pub fn host_is_ip(&self) -> bool {
        self.host.parse::<IpAddr>().is_ok()
    }

    /// Authority as it belongs in `:authority`
    ///
    /// The port is omitted when it is the default.
    pub fn authority(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == DEFAULT_PORT {
            host
        } else {
            format!("{}:{}", host, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority(), self.path)
    }
}
