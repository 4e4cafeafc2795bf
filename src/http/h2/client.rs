//! HTTP/2 client implementation with low-level frame control
//!
//! The request is built as one contiguous byte buffer, written over TLS, and
//! the response is reassembled from the frames addressed to stream 1.

use super::codec::FrameCodec;
use super::error;
use super::frames::*;
use super::hpack::{encode_header_block, HeaderBlockDecoder};
use super::{
    ALPN, CONNECTION_PREFACE, CONNECTION_STREAM_ID, CONNECTION_WINDOW_INCREMENT,
    INITIAL_WINDOW_SIZE, MAX_DATA_CHUNK, REQUEST_STREAM_ID,
};
use crate::http::tls::TlsConfig;
use crate::http::{ClientConfig, DecodeError, Error, Message, Result, SignalKind, Target};
use crate::net::{self, Deadline};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::{self, Read};

/// Serialize a request into the exact bytes sent after the TLS handshake
///
/// The SETTINGS ACK is deliberately the last frame, after the body.
pub fn encode_request(request: &Message) -> Bytes {
    let body = request.body_bytes();
    let mut buf = BytesMut::with_capacity(CONNECTION_PREFACE.len() + 64 + body.len());

    buf.put_slice(CONNECTION_PREFACE);

    let settings = SettingsFrame::new(vec![(settings::INITIAL_WINDOW_SIZE, INITIAL_WINDOW_SIZE)]);
    buf.put_slice(&FrameCodec::encode_settings_frame(&settings));

    let window_update = WindowUpdateFrame::new(CONNECTION_STREAM_ID, CONNECTION_WINDOW_INCREMENT);
    buf.put_slice(&FrameCodec::encode_window_update_frame(&window_update));

    let headers = HeadersFrame::new(
        REQUEST_STREAM_ID,
        encode_header_block(request.headers()),
        body.is_empty(),
        true,
    );
    buf.put_slice(&FrameCodec::encode_headers_frame(&headers));

    let mut chunks = body.chunks(MAX_DATA_CHUNK).peekable();
    while let Some(chunk) = chunks.next() {
        let last = chunks.peek().is_none();
        let data = DataFrame::new(REQUEST_STREAM_ID, Bytes::copy_from_slice(chunk), last);
        buf.put_slice(&FrameCodec::encode_data_frame(&data));
    }

    buf.put_slice(&FrameCodec::encode_settings_frame(&SettingsFrame::ack()));

    buf.freeze()
}

/// Read frames until the response on stream 1 is complete
///
/// Completion means an END_HEADERS flag has been seen and, unless the
/// HEADERS frame also ended the stream, a DATA frame with END_STREAM. Frames
/// for other streams and unknown frame types are skipped.
pub fn read_response<R: Read>(reader: &mut R) -> Result<Message> {
    let mut response = Message::new();
    let mut decoder = HeaderBlockDecoder::new();

    let mut headers_done = false;
    let mut has_body = false;
    let mut body_read = false;

    while !headers_done || (has_body && !body_read) {
        let frame = FrameCodec::read_frame(reader).map_err(read_error)?;
        let frame_type = frame.frame_type();

        if frame_type == Some(FrameType::Goaway) {
            let code = FrameCodec::error_code(&frame)?;
            tracing::debug!(code = %error::describe(code.into()), "received GOAWAY");
            return Err(Error::ProtocolSignal {
                kind: SignalKind::GoAway,
                code: code.into(),
            });
        }

        if frame.stream_id != REQUEST_STREAM_ID {
            tracing::trace!(stream_id = frame.stream_id, kind = frame.kind, "skipping frame");
            continue;
        }

        match frame_type {
            Some(FrameType::Headers) => {
                decoder.push_fragment(&FrameCodec::headers_fragment(&frame)?);
                headers_done = frame.flags.is_end_headers();
                has_body = !frame.flags.is_end_stream();
                if headers_done {
                    decoder.finish()?.into_iter().for_each(|f| response.push_header(f));
                }
            }
            Some(FrameType::Continuation) => {
                decoder.push_fragment(&frame.payload);
                headers_done = frame.flags.is_end_headers();
                if headers_done {
                    decoder.finish()?.into_iter().for_each(|f| response.push_header(f));
                }
            }
            Some(FrameType::Data) => {
                // Flow control is not honored: no WINDOW_UPDATE goes back
                response.extend_body(&FrameCodec::data_payload(&frame)?);
                body_read = frame.flags.is_end_stream();
            }
            Some(FrameType::RstStream) => {
                let code = FrameCodec::error_code(&frame)?;
                tracing::debug!(code = %error::describe(code.into()), "received RST_STREAM");
                return Err(Error::ProtocolSignal {
                    kind: SignalKind::RstStream,
                    code: code.into(),
                });
            }
            _ => {
                tracing::trace!(kind = frame.kind, len = frame.payload_len(), "ignoring frame");
            }
        }
    }

    Ok(response)
}

fn read_error(e: io::Error) -> Error {
    if net::is_timeout(&e) {
        Error::Timeout
    } else if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::Decode(DecodeError::TruncatedFrame(
            "connection closed before the response completed".to_string(),
        ))
    } else {
        Error::Io(e)
    }
}

/// Send one request over TLS/TCP and return the decoded response
///
/// The timeout is an absolute deadline covering connect, handshake, write
/// and the whole read loop.
pub fn send_request(target: &Target, config: &ClientConfig, request: &Message) -> Result<Message> {
    let addr = net::resolve(target.host(), target.port())?;
    let deadline = Deadline::after(config.get_timeout());

    tracing::debug!(%addr, host = target.host(), "connecting");
    let tcp_stream = net::connect_tcp(addr, config.get_timeout())?;

    let mut builder = TlsConfig::client()?.alpn(&[ALPN])?.verify_peer(false);
    if !target.host_is_ip() {
        builder = builder.servername(target.host());
    }
    if let Some(sink) = config.get_key_log() {
        builder = builder.key_log(sink.clone());
    }

    let mut session = builder.build().connect(tcp_stream, deadline)?;
    match session.negotiated_alpn() {
        Some(proto) if proto == ALPN.as_bytes() => tracing::debug!("negotiated h2"),
        other => tracing::warn!(
            alpn = ?other.map(String::from_utf8_lossy),
            "server did not select h2, sending anyway"
        ),
    }

    let wire = encode_request(request);
    tracing::debug!(bytes = wire.len(), "writing request");

    let result = FrameCodec::write_frame(&mut session, &wire)
        .map_err(|e| if net::is_timeout(&e) { Error::Timeout } else { Error::Write(e) })
        .and_then(|_| read_response(&mut session));

    if let Err(e) = session.close() {
        tracing::trace!(error = %e, "close failed");
    }

    result
}
