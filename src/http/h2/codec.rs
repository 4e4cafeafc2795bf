//! HTTP/2 frame encoding and decoding
//!
//! Low-level frame construction with full control over flags and layout.
//! The decoding helpers strip padding and priority fields so the read loop
//! sees only header block fragments and body bytes.

use super::frames::*;
use crate::http::DecodeError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::{self, Read, Write};

/// HTTP/2 frame header size (9 bytes)
pub const FRAME_HEADER_SIZE: usize = 9;

/// Frame codec for encoding/decoding HTTP/2 frames
pub struct FrameCodec;

impl FrameCodec {
    /// Encode a frame header into a buffer
    pub fn encode_header(frame_type: FrameType, flags: FrameFlags, stream_id: u32, length: usize) -> [u8; FRAME_HEADER_SIZE] {
        let mut header = [0u8; FRAME_HEADER_SIZE];

        // Length (24 bits, big-endian)
        header[0] = ((length >> 16) & 0xFF) as u8;
        header[1] = ((length >> 8) & 0xFF) as u8;
        header[2] = (length & 0xFF) as u8;

        header[3] = frame_type.as_u8();
        header[4] = flags.as_u8();

        // Stream ID (31 bits, big-endian, reserved bit is 0)
        let stream_id = stream_id & 0x7FFFFFFF;
        header[5..9].copy_from_slice(&stream_id.to_be_bytes());

        header
    }

    /// Decode a frame header into (raw type, flags, stream id, length)
    pub fn decode_header(bytes: &[u8; FRAME_HEADER_SIZE]) -> (u8, FrameFlags, u32, usize) {
        let length = ((bytes[0] as usize) << 16)
            | ((bytes[1] as usize) << 8)
            | (bytes[2] as usize);

        let flags = FrameFlags::from_u8(bytes[4]);

        // Stream ID (31 bits, ignore reserved bit)
        let stream_id = u32::from_be_bytes([bytes[5] & 0x7F, bytes[6], bytes[7], bytes[8]]);

        (bytes[3], flags, stream_id, length)
    }

    /// Encode a DATA frame
    pub fn encode_data_frame(frame: &DataFrame) -> Bytes {
        let mut flags = FrameFlags::empty();
        if frame.end_stream {
            flags.set(FrameFlags::END_STREAM);
        }

        Self::encode_frame(FrameType::Data, flags, frame.stream_id, &frame.data)
    }

    /// Encode a HEADERS frame
    pub fn encode_headers_frame(frame: &HeadersFrame) -> Bytes {
        let mut flags = FrameFlags::empty();
        if frame.end_stream {
            flags.set(FrameFlags::END_STREAM);
        }
        if frame.end_headers {
            flags.set(FrameFlags::END_HEADERS);
        }

        Self::encode_frame(FrameType::Headers, flags, frame.stream_id, &frame.header_block)
    }

    /// Encode a CONTINUATION frame
    pub fn encode_continuation_frame(frame: &ContinuationFrame) -> Bytes {
        let mut flags = FrameFlags::empty();
        if frame.end_headers {
            flags.set(FrameFlags::END_HEADERS);
        }

        Self::encode_frame(FrameType::Continuation, flags, frame.stream_id, &frame.header_block)
    }

    fn encode_frame(kind: FrameType, flags: FrameFlags, stream_id: u32, payload: &[u8]) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
        buf.put_slice(&Self::encode_header(kind, flags, stream_id, payload.len()));
        buf.put_slice(payload);
        buf.freeze()
    }

    /// Encode a SETTINGS frame
    pub fn encode_settings_frame(frame: &SettingsFrame) -> Bytes {
        let mut buf = BytesMut::new();

        let flags = if frame.ack {
            FrameFlags::from_u8(FrameFlags::ACK)
        } else {
            FrameFlags::empty()
        };

        // Each setting is 6 bytes (2 byte ID + 4 byte value); ACK has none
        let params: &[(u16, u32)] = if frame.ack { &[] } else { &frame.params };

        // Stream ID must be 0 for SETTINGS
        let header = Self::encode_header(FrameType::Settings, flags, 0, params.len() * 6);
        buf.put_slice(&header);
        for &(id, value) in params {
            buf.put_u16(id);
            buf.put_u32(value);
        }

        buf.freeze()
    }

    /// Encode a GOAWAY frame
    pub fn encode_goaway_frame(frame: &GoawayFrame) -> Bytes {
        let mut buf = BytesMut::new();

        let payload_len = 8 + frame.debug_data.len(); // 4 bytes stream ID + 4 bytes error code + debug data

        // Stream ID must be 0 for GOAWAY
        let header = Self::encode_header(FrameType::Goaway, FrameFlags::empty(), 0, payload_len);
        buf.put_slice(&header);
        buf.put_u32(frame.last_stream_id & 0x7FFFFFFF);
        buf.put_u32(frame.error_code);
        buf.put_slice(&frame.debug_data);

        buf.freeze()
    }

    /// Encode a WINDOW_UPDATE frame
    pub fn encode_window_update_frame(frame: &WindowUpdateFrame) -> Bytes {
        let mut buf = BytesMut::new();

        let header = Self::encode_header(FrameType::WindowUpdate, FrameFlags::empty(), frame.stream_id, 4);
        buf.put_slice(&header);

        // Window size increment (reserved bit must be 0)
        buf.put_u32(frame.size_increment & 0x7FFFFFFF);

        buf.freeze()
    }

    /// Encode a RST_STREAM frame
    pub fn encode_rst_stream_frame(frame: &RstStreamFrame) -> Bytes {
        let mut buf = BytesMut::new();

        let header = Self::encode_header(FrameType::RstStream, FrameFlags::empty(), frame.stream_id, 4);
        buf.put_slice(&header);
        buf.put_u32(frame.error_code);

        buf.freeze()
    }

    /// Write a frame to a writer (generic over any Write)
    pub fn write_frame<W: Write>(writer: &mut W, frame_data: &[u8]) -> io::Result<()> {
        writer.write_all(frame_data)?;
        writer.flush()
    }

    /// Read one frame from any reader
    pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Frame> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let (kind, flags, stream_id, payload_len) = Self::decode_header(&header);

        let mut payload = vec![0u8; payload_len];
        if payload_len > 0 {
            reader.read_exact(&mut payload)?;
        }

        Ok(Frame {
            kind,
            flags,
            stream_id,
            payload: Bytes::from(payload),
        })
    }

    /// Header block fragment of a HEADERS frame, without padding or priority
    pub fn headers_fragment(frame: &Frame) -> Result<Bytes, DecodeError> {
        let mut fragment = Self::strip_padding(frame)?;
        if frame.flags.is_priority() {
            if fragment.len() < 5 {
                return Err(DecodeError::TruncatedFrame(
                    "HEADERS priority fields missing".to_string(),
                ));
            }
            fragment.advance(5);
        }
        Ok(fragment)
    }

    /// Body bytes of a DATA frame, without padding
    pub fn data_payload(frame: &Frame) -> Result<Bytes, DecodeError> {
        Self::strip_padding(frame)
    }

    /// Error code of a GOAWAY or RST_STREAM frame
    pub fn error_code(frame: &Frame) -> Result<u32, DecodeError> {
        // GOAWAY leads with the last stream ID; RST_STREAM carries only the code
        let offset = match frame.frame_type() {
            Some(FrameType::Goaway) => 4,
            _ => 0,
        };
        frame
            .payload
            .get(offset..offset + 4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| {
                DecodeError::TruncatedFrame(format!("{} frame of {} bytes", frame.kind, frame.payload_len()))
            })
    }

    fn strip_padding(frame: &Frame) -> Result<Bytes, DecodeError> {
        let mut payload = frame.payload.clone();
        if !frame.flags.is_padded() {
            return Ok(payload);
        }

        if payload.is_empty() {
            return Err(DecodeError::TruncatedFrame("pad length missing".to_string()));
        }
        let pad_len = payload.get_u8() as usize;
        if pad_len > payload.len() {
            return Err(DecodeError::TruncatedFrame(format!(
                "padding of {} exceeds {} byte payload",
                pad_len,
                payload.len()
            )));
        }
        payload.truncate(payload.len() - pad_len);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encode_decode_header() {
        let flags = FrameFlags::from_u8(FrameFlags::END_STREAM | FrameFlags::END_HEADERS);
        let header = FrameCodec::encode_header(FrameType::Headers, flags, 42, 1234);
        let (kind, decoded_flags, stream_id, length) = FrameCodec::decode_header(&header);

        assert_eq!(kind, FrameType::Headers.as_u8());
        assert_eq!(decoded_flags, flags);
        assert_eq!(stream_id, 42);
        assert_eq!(length, 1234);
    }

    #[test]
    fn test_decode_header_masks_reserved_bit() {
        let header = [0, 0, 0, 0xfa, 0, 0x80, 0, 0, 3];
        let (kind, _, stream_id, length) = FrameCodec::decode_header(&header);
        assert_eq!(kind, 0xfa);
        assert_eq!(stream_id, 3);
        assert_eq!(length, 0);
    }

    #[test]
    fn test_encode_data_frame() {
        let frame = DataFrame::new(1, Bytes::from("Hello"), true);
        let encoded = FrameCodec::encode_data_frame(&frame);

        assert_eq!(encoded[0..3], [0, 0, 5]);
        assert_eq!(encoded[3], FrameType::Data.as_u8());
        assert_eq!(encoded[4], FrameFlags::END_STREAM);
        assert_eq!(&encoded[5..9], &[0, 0, 0, 1]);
        assert_eq!(&encoded[9..], b"Hello");
    }

    #[test]
    fn test_encode_settings_frame() {
        let frame = SettingsFrame::new(vec![(settings::INITIAL_WINDOW_SIZE, 0x3fff_ffff)]);
        let encoded = FrameCodec::encode_settings_frame(&frame);

        assert_eq!(encoded[0..3], [0, 0, 6]);
        assert_eq!(encoded[3], FrameType::Settings.as_u8());
        assert_eq!(&encoded[5..9], &[0, 0, 0, 0]);
        assert_eq!(&encoded[9..], &[0x00, 0x04, 0x3f, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_encode_settings_ack() {
        let encoded = FrameCodec::encode_settings_frame(&SettingsFrame::ack());
        assert_eq!(encoded.len(), FRAME_HEADER_SIZE);
        assert_eq!(encoded[0..3], [0, 0, 0]);
        assert_eq!(encoded[4], FrameFlags::ACK);
    }

    #[test]
    fn test_read_frame_roundtrip() {
        let goaway = GoawayFrame::new(1, 7, Bytes::from_static(b"bye"));
        let mut reader = Cursor::new(FrameCodec::encode_goaway_frame(&goaway).to_vec());

        let frame = FrameCodec::read_frame(&mut reader).unwrap();
        assert_eq!(frame.frame_type(), Some(FrameType::Goaway));
        assert_eq!(frame.stream_id, 0);
        assert_eq!(FrameCodec::error_code(&frame).unwrap(), 7);
    }

    #[test]
    fn test_read_frame_truncated() {
        let data = FrameCodec::encode_data_frame(&DataFrame::new(1, Bytes::from("Hello"), true));
        let mut reader = Cursor::new(data[..data.len() - 2].to_vec());

        let err = FrameCodec::read_frame(&mut reader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    /// Frame bytes with a PADDED pad of `pad` zero bytes around `body`
    fn padded(kind: FrameType, flags: u8, prefix: &[u8], body: &[u8], pad: u8) -> Vec<u8> {
        let mut payload = vec![pad];
        payload.extend_from_slice(prefix);
        payload.extend_from_slice(body);
        payload.resize(payload.len() + usize::from(pad), 0);

        let flags = FrameFlags::from_u8(flags | FrameFlags::PADDED);
        let mut wire = FrameCodec::encode_header(kind, flags, 1, payload.len()).to_vec();
        wire.extend_from_slice(&payload);
        wire
    }

    #[test]
    fn test_padded_headers_fragment() {
        // Dependency 0, weight 15
        let wire = padded(
            FrameType::Headers,
            FrameFlags::END_HEADERS | FrameFlags::PRIORITY,
            &[0, 0, 0, 0, 15],
            b"\x88",
            4,
        );
        let mut reader = Cursor::new(wire);

        let frame = FrameCodec::read_frame(&mut reader).unwrap();
        assert!(frame.flags.is_padded());
        assert!(frame.flags.is_priority());
        assert_eq!(FrameCodec::headers_fragment(&frame).unwrap(), Bytes::from_static(b"\x88"));
    }

    #[test]
    fn test_padded_data_payload() {
        let mut reader = Cursor::new(padded(FrameType::Data, 0, &[], b"Hi", 10));

        let frame = FrameCodec::read_frame(&mut reader).unwrap();
        assert_eq!(frame.payload_len(), 13);
        assert_eq!(FrameCodec::data_payload(&frame).unwrap(), Bytes::from("Hi"));
    }

    #[test]
    fn test_bad_padding() {
        let frame = Frame {
            kind: FrameType::Data.as_u8(),
            flags: FrameFlags::from_u8(FrameFlags::PADDED),
            stream_id: 1,
            payload: Bytes::from_static(&[9, b'x']),
        };
        assert!(matches!(
            FrameCodec::data_payload(&frame),
            Err(DecodeError::TruncatedFrame(_))
        ));
    }

    #[test]
    fn test_rst_stream_error_code() {
        let rst = RstStreamFrame::new(1, 8);
        let mut reader = Cursor::new(FrameCodec::encode_rst_stream_frame(&rst).to_vec());
        let frame = FrameCodec::read_frame(&mut reader).unwrap();
        assert_eq!(FrameCodec::error_code(&frame).unwrap(), 8);
    }
}
