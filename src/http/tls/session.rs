//! TLS sessions
//!
//! A blocking OpenSSL client stream over TCP. An absolute deadline bounds
//! the handshake and every later read or write.

use super::config::{TlsConfig, TlsError};
use crate::net::{self, Deadline};
use openssl::ssl::{HandshakeError, Ssl, SslStream};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

/// Established TLS session
pub struct TlsSession {
    stream: SslStream<TcpStream>,
    deadline: Deadline,
    failed: bool,
}

impl TlsSession {
    /// Create a client TLS connection (perform handshake)
    pub(crate) fn connect(
        tcp_stream: TcpStream,
        config: &TlsConfig,
        deadline: Deadline,
    ) -> Result<Self, TlsError> {
        deadline.apply(&tcp_stream).map_err(io_error)?;

        let mut ssl = Ssl::new(&config.ctx)?;
        if let Some(ref servername) = config.servername {
            ssl.set_hostname(servername)?;
        }

        let stream = ssl.connect(tcp_stream).map_err(handshake_error)?;

        Ok(TlsSession {
            stream,
            deadline,
            failed: false,
        })
    }

    /// Protocol selected by ALPN, if any
    pub fn negotiated_alpn(&self) -> Option<&[u8]> {
        self.stream.ssl().selected_alpn_protocol()
    }

    /// Check if an I/O operation on the session failed
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Get reference to underlying TCP stream
    pub fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref()
    }

    /// Send close_notify (unless the session failed) and shut down TCP
    pub fn close(&mut self) -> io::Result<()> {
        if !self.failed {
            let _ = self.stream.shutdown();
        }
        self.stream.get_ref().shutdown(Shutdown::Both)
    }

    fn arm(&self) -> io::Result<()> {
        self.deadline.apply(self.stream.get_ref())
    }

    fn track<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        if result.is_err() {
            self.failed = true;
        }
        result
    }
}

impl Read for TlsSession {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.arm().and_then(|_| self.stream.read(buf));
        self.track(result)
    }
}

impl Write for TlsSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.arm().and_then(|_| self.stream.write(buf));
        self.track(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.stream.flush();
        self.track(result)
    }
}

fn io_error(e: io::Error) -> TlsError {
    if net::is_timeout(&e) {
        TlsError::Timeout
    } else {
        TlsError::Io(e)
    }
}

fn handshake_error(e: HandshakeError<TcpStream>) -> TlsError {
    match e {
        HandshakeError::SetupFailure(stack) => TlsError::OpenSsl(stack),
        // A blocking socket only reports WouldBlock once its timeout fired
        HandshakeError::WouldBlock(_) => TlsError::Timeout,
        HandshakeError::Failure(mid) => {
            let err = mid.error();
            if err.io_error().map_or(false, net::is_timeout) {
                TlsError::Timeout
            } else {
                TlsError::HandshakeFailed(err.to_string())
            }
        }
    }
}
