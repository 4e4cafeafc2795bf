//! Network helpers
//!
//! Name resolution and socket setup shared by both transport drivers.

use crate::http::{Error, Result};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Resolve a host name (or IP literal) to a socket address
///
/// The first address returned by the system resolver wins.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    let mut addrs = (host, port).to_socket_addrs().map_err(|e| Error::Resolution {
        host: host.to_string(),
        source: e,
    })?;

    addrs.next().ok_or_else(|| Error::Resolution {
        host: host.to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
    })
}

/// Open a TCP connection, giving up after `timeout`
pub fn connect_tcp(addr: SocketAddr, timeout: Duration) -> Result<TcpStream> {
    let connect_err = |source| Error::Connect { addr, source };

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(connect_err)?;
    socket.set_nodelay(true).map_err(connect_err)?;

    socket
        .connect_timeout(&SockAddr::from(addr), timeout)
        .map_err(|e| if is_timeout(&e) { Error::Timeout } else { connect_err(e) })?;

    Ok(socket.into())
}

/// Absolute deadline for all I/O on one connection
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Deadline {
            at: Instant::now() + timeout,
        }
    }

    /// Time left, or `None` once the deadline has passed
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
    }

    /// Bound the next blocking read or write on `stream` by the time left
    pub fn apply(&self, stream: &TcpStream) -> io::Result<()> {
        let remaining = self
            .remaining()
            .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"))?;
        stream.set_read_timeout(Some(remaining))?;
        stream.set_write_timeout(Some(remaining))
    }
}

/// Whether an I/O error is a socket timeout rather than a failure
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

/// Wildcard local address of the same family as `peer`
pub fn unspecified_for(peer: SocketAddr) -> SocketAddr {
    match peer {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_resolve_ip_literal() {
        let addr = resolve("127.0.0.1", 443).unwrap();
        assert_eq!(addr, "127.0.0.1:443".parse().unwrap());

        let addr = resolve("::1", 8443).unwrap();
        assert_eq!(addr, "[::1]:8443".parse().unwrap());
    }

    #[test]
    fn test_resolve_localhost() {
        let addr = resolve("localhost", 80).unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 80);
    }

    #[test]
    fn test_resolve_failure() {
        let result = resolve("does-not-exist.invalid", 443);
        assert!(matches!(result, Err(Error::Resolution { .. })));
    }

    #[test]
    fn test_connect_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let stream = connect_tcp(addr, Duration::from_secs(1)).unwrap();
        assert_eq!(stream.peer_addr().unwrap(), addr);
    }

    #[test]
    fn test_connect_refused() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let result = connect_tcp(addr, Duration::from_secs(1));
        assert!(matches!(result, Err(Error::Connect { .. })));
    }

    #[test]
    fn test_deadline() {
        let deadline = Deadline::after(Duration::from_secs(60));
        assert!(deadline.remaining().unwrap() > Duration::from_secs(59));

        let expired = Deadline::after(Duration::ZERO);
        assert!(expired.remaining().is_none());

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        deadline.apply(&stream).unwrap();
        assert!(stream.read_timeout().unwrap().is_some());

        let err = expired.apply(&stream).unwrap_err();
        assert!(is_timeout(&err));
    }

    #[test]
    fn test_unspecified_for() {
        let v4 = unspecified_for("10.0.0.1:443".parse().unwrap());
        assert!(v4.is_ipv4());
        assert!(v4.ip().is_unspecified());

        let v6 = unspecified_for("[2001:db8::1]:443".parse().unwrap());
        assert!(v6.is_ipv6());
    }
}
