//! HTTP/3 client over quinn
//!
//! One QUIC connection, one control stream and one request stream. A timer
//! task closes the whole endpoint when the timeout elapses, which fails any
//! pending stream operation; the shared flag it sets lets the read loop tell
//! that apart from a genuine connection loss. The connection is always closed
//! with code 0, and teardown waits up to [`CLOSE_GRACE`] for the close to
//! reach the wire.

use super::frames::{self, CONTROL_STREAM_PREAMBLE, FRAME_DATA, FRAME_HEADERS};
use super::qpack;
use crate::http::tls::quic::client_crypto;
use crate::http::{ClientConfig, DecodeError, Error, Message, Result, SignalKind, Target};
use crate::net;
use quinn::{ConnectionError, Endpoint};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;

/// How long teardown waits for the CONNECTION_CLOSE to be flushed
pub const CLOSE_GRACE: Duration = Duration::from_millis(250);

/// Closes the endpoint once the timeout elapses; aborted on drop
struct TimeoutTimer {
    fired: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TimeoutTimer {
    fn start(endpoint: Endpoint, timeout: Duration) -> Self {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            flag.store(true, Ordering::SeqCst);
            tracing::debug!(?timeout, "timeout elapsed, closing endpoint");
            endpoint.close(0u32.into(), b"timeout");
        });

        TimeoutTimer { fired, task }
    }

    fn flag(&self) -> &AtomicBool {
        &self.fired
    }

    fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Drop for TimeoutTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Send one request over QUIC and return the decoded response
///
/// Must run inside a tokio runtime with I/O and time drivers enabled.
pub async fn send_request(target: &Target, config: &ClientConfig, request: &Message) -> Result<Message> {
    let addr = net::resolve(target.host(), target.port())?;

    let endpoint = Endpoint::client(net::unspecified_for(addr))
        .map_err(|source| Error::Connect { addr, source })?;

    let crypto = client_crypto(config.get_key_log().cloned())?;
    let quic_crypto = quinn::crypto::rustls::QuicClientConfig::try_from(crypto)
        .map_err(|e| Error::Handshake(e.to_string()))?;

    let mut transport = quinn::TransportConfig::default();
    transport.max_concurrent_bidi_streams(0u32.into());

    let mut client_config = quinn::ClientConfig::new(Arc::new(quic_crypto));
    client_config.transport_config(Arc::new(transport));

    let timer = TimeoutTimer::start(endpoint.clone(), config.get_timeout());

    tracing::debug!(%addr, host = target.host(), "connecting");
    let connecting = endpoint
        .connect_with(client_config, addr, target.host())
        .map_err(|e| Error::Handshake(e.to_string()))?;

    let connection = connecting.await.map_err(|e| {
        if timer.fired() {
            Error::Timeout
        } else {
            Error::Handshake(e.to_string())
        }
    })?;

    let alpn = connection
        .handshake_data()
        .and_then(|data| data.downcast::<quinn::crypto::rustls::HandshakeData>().ok())
        .and_then(|data| data.protocol);
    tracing::debug!(
        alpn = ?alpn.as_deref().map(String::from_utf8_lossy),
        "connection established"
    );

    let result = exchange(&connection, request, timer.flag()).await;

    connection.close(0u32.into(), b"");
    if tokio::time::timeout(CLOSE_GRACE, endpoint.wait_idle()).await.is_err() {
        tracing::debug!(grace = ?CLOSE_GRACE, "endpoint still draining");
    }
    result
}

async fn exchange(connection: &quinn::Connection, request: &Message, timed_out: &AtomicBool) -> Result<Message> {
    // Kept open until the response is read; closing it is a connection error
    let mut control = connection
        .open_uni()
        .await
        .map_err(|e| connection_error(e, timed_out))?;
    control
        .write_all(&CONTROL_STREAM_PREAMBLE)
        .await
        .map_err(|e| write_error(e, timed_out))?;

    let (mut send, mut recv) = connection
        .open_bi()
        .await
        .map_err(|e| connection_error(e, timed_out))?;

    let wire = frames::encode_request(request);
    tracing::debug!(bytes = wire.len(), stream = %send.id(), "writing request");
    send.write_all(&wire).await.map_err(|e| write_error(e, timed_out))?;
    send.finish()
        .map_err(|e| Error::Write(io::Error::new(io::ErrorKind::NotConnected, e)))?;

    read_response(&mut recv, timed_out).await
}

/// Read frames until the stream ends
///
/// DATA payloads are appended to the body and HEADERS blocks (leading
/// headers and trailers alike) to the header list, in arrival order. Other
/// frame types are skipped. If `timed_out` is set by the time the stream
/// stops, the outcome is [`Error::Timeout`] whatever the stream reported.
pub async fn read_response<R: AsyncRead + Unpin>(reader: &mut R, timed_out: &AtomicBool) -> Result<Message> {
    let mut response = Message::new();

    loop {
        let frame = match frames::read_frame(reader).await {
            Ok(Some(frame)) => frame,
            Ok(None) if timed_out.load(Ordering::SeqCst) => return Err(Error::Timeout),
            Ok(None) => break,
            Err(e) => return Err(read_error(e, timed_out)),
        };

        match frame.kind {
            FRAME_DATA => response.extend_body(&frame.payload),
            FRAME_HEADERS => {
                for field in qpack::decode_header_block(&frame.payload)? {
                    response.push_header(field);
                }
            }
            kind => {
                tracing::trace!(kind, len = frame.payload.len(), "ignoring frame");
            }
        }
    }

    Ok(response)
}

fn read_error(e: io::Error, timed_out: &AtomicBool) -> Error {
    if timed_out.load(Ordering::SeqCst) {
        return Error::Timeout;
    }

    if let Some(inner) = e.get_ref() {
        if let Some(read) = inner.downcast_ref::<quinn::ReadError>() {
            match read {
                quinn::ReadError::Reset(code) => {
                    tracing::debug!(code = code.into_inner(), "request stream reset");
                    return Error::ProtocolSignal {
                        kind: SignalKind::StreamReset,
                        code: code.into_inner(),
                    };
                }
                quinn::ReadError::ConnectionLost(lost) => {
                    return connection_error(lost.clone(), timed_out);
                }
                _ => {}
            }
        }
        if let Some(decode) = inner.downcast_ref::<DecodeError>() {
            return Error::Decode(decode.clone());
        }
    }

    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::Decode(DecodeError::TruncatedFrame(
            "stream ended inside a frame".to_string(),
        ))
    } else {
        Error::Io(e)
    }
}

fn write_error(e: quinn::WriteError, timed_out: &AtomicBool) -> Error {
    if timed_out.load(Ordering::SeqCst) {
        return Error::Timeout;
    }

    match e {
        quinn::WriteError::Stopped(code) => Error::ProtocolSignal {
            kind: SignalKind::StreamReset,
            code: code.into_inner(),
        },
        quinn::WriteError::ConnectionLost(lost) => connection_error(lost, timed_out),
        other => Error::Write(io::Error::from(other)),
    }
}

fn connection_error(e: ConnectionError, timed_out: &AtomicBool) -> Error {
    if timed_out.load(Ordering::SeqCst) {
        return Error::Timeout;
    }

    match e {
        ConnectionError::ApplicationClosed(close) => {
            tracing::debug!(code = close.error_code.into_inner(), "connection closed by peer");
            Error::ProtocolSignal {
                kind: SignalKind::ConnectionClose,
                code: close.error_code.into_inner(),
            }
        }
        ConnectionError::TimedOut => Error::Timeout,
        other => Error::Io(io::Error::new(io::ErrorKind::ConnectionAborted, other)),
    }
}
