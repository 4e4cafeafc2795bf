//! HTTP/3 frame envelope (RFC 9114 Section 7)
//!
//! Every frame is `type (varint) | length (varint) | payload`.

use super::{qpack, varint};
use crate::http::{DecodeError, Message};
use bytes::{BufMut, Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

pub const FRAME_DATA: u64 = 0x0;
pub const FRAME_HEADERS: u64 = 0x1;
pub const FRAME_SETTINGS: u64 = 0x4;

/// Unidirectional stream type of the control stream
pub const STREAM_TYPE_CONTROL: u64 = 0x0;

/// Control stream type followed by an empty SETTINGS frame
pub const CONTROL_STREAM_PREAMBLE: [u8; 3] = [STREAM_TYPE_CONTROL as u8, FRAME_SETTINGS as u8, 0x00];

/// Largest payload accepted from a peer
pub const MAX_FRAME_PAYLOAD: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct H3Frame {
    pub kind: u64,
    pub payload: Bytes,
}

impl H3Frame {
    pub fn new(kind: u64, payload: impl Into<Bytes>) -> Self {
        H3Frame {
            kind,
            payload: payload.into(),
        }
    }

    /// Append the encoded frame to `buf`
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(16 + self.payload.len());
        varint::encode(self.kind, buf);
        varint::encode(self.payload.len() as u64, buf);
        buf.put_slice(&self.payload);
    }
}

/// Serialize a request: one HEADERS frame, then one DATA frame with the
/// whole body when it is non-empty
pub fn encode_request(request: &Message) -> Bytes {
    let mut buf = BytesMut::new();

    H3Frame::new(FRAME_HEADERS, qpack::encode_header_block(request.headers())).encode(&mut buf);

    let body = request.body_bytes();
    if !body.is_empty() {
        H3Frame::new(FRAME_DATA, Bytes::copy_from_slice(body)).encode(&mut buf);
    }

    buf.freeze()
}

/// Read one frame from a stream
///
/// Returns `Ok(None)` when the stream ends cleanly on a frame boundary. A
/// stream ending inside a frame is an `UnexpectedEof` error; an oversized
/// length is an `InvalidData` error carrying [`DecodeError::FrameTooLarge`].
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Option<H3Frame>> {
    let Some(kind) = varint::read(reader).await? else {
        return Ok(None);
    };

    let len = varint::read(reader)
        .await?
        .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "frame length missing"))?;
    if len > MAX_FRAME_PAYLOAD {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            DecodeError::FrameTooLarge(len),
        ));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;

    Ok(Some(H3Frame::new(kind, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let mut buf = BytesMut::new();
        H3Frame::new(FRAME_DATA, &b"hello"[..]).encode(&mut buf);
        assert_eq!(&buf[..], b"\x00\x05hello");

        let mut buf = BytesMut::new();
        H3Frame::new(0x21, vec![0u8; 100]).encode(&mut buf);
        assert_eq!(&buf[..3], &[0x21, 0x40, 100]);
        assert_eq!(buf.len(), 103);
    }

    #[test]
    fn test_control_preamble() {
        assert_eq!(CONTROL_STREAM_PREAMBLE, [0x00, 0x04, 0x00]);
    }

    #[test]
    fn test_request_without_body_has_no_data_frame() {
        let request = Message::new().header(":method", "GET").header(":path", "/");
        let wire = encode_request(&request);

        assert_eq!(wire[0], FRAME_HEADERS as u8);
        assert_eq!(wire[1] as usize, wire.len() - 2);
    }

    #[tokio::test]
    async fn test_read_frames_until_eof() {
        let request = Message::new()
            .header(":method", "POST")
            .header(":path", "/x")
            .body(&b"0123456789"[..]);
        let wire = encode_request(&request);
        let mut reader = &wire[..];

        let headers = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(headers.kind, FRAME_HEADERS);
        assert_eq!(
            qpack::decode_header_block(&headers.payload).unwrap(),
            request.headers()
        );

        let data = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(data.kind, FRAME_DATA);
        assert_eq!(&data.payload[..], b"0123456789");

        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_truncated_payload() {
        let mut reader = &[0x00u8, 0x05, b'a', b'b'][..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_read_missing_length() {
        let mut reader = &[0x01u8][..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_read_oversized_length() {
        let mut wire = BytesMut::new();
        varint::encode(FRAME_DATA, &mut wire);
        varint::encode(MAX_FRAME_PAYLOAD + 1, &mut wire);
        let mut reader = &wire[..];

        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let inner = err.get_ref().and_then(|e| e.downcast_ref::<DecodeError>());
        assert_eq!(inner, Some(&DecodeError::FrameTooLarge(MAX_FRAME_PAYLOAD + 1)));
    }
}
