//! HPACK header block handling
//!
//! Requests are encoded with literal, never-indexed representations only, so
//! the encoder needs no dynamic table and the header order on the wire is
//! exactly the order of the message. Responses are decoded with the `hpack`
//! crate, which keeps the dynamic table across blocks. Every block is walked
//! once before decoding so that malformed integers and table size updates
//! are rejected here rather than inside `hpack`.

use crate::http::{DecodeError, HeaderField};
use bytes::{BufMut, Bytes, BytesMut};

/// Literal header field never indexed, with a literal name (RFC 7541 6.2.3)
pub const LITERAL_NEVER_INDEXED: u8 = 0x10;

/// Largest dynamic table the peer may switch to; SETTINGS_HEADER_TABLE_SIZE
/// is never sent, so the default applies
pub const MAX_TABLE_SIZE: u64 = 4096;

/// Octets an integer may occupy, prefix included
const MAX_INTEGER_OCTETS: usize = 5;

/// Write `value` as an integer with an N-bit prefix (RFC 7541 Section 5.1)
///
/// `first` carries the flag bits above the prefix; they must not overlap it.
pub fn encode_integer(buf: &mut BytesMut, first: u8, prefix_bits: u8, value: u64) {
    let max = (1u64 << prefix_bits) - 1;
    if value < max {
        buf.put_u8(first | value as u8);
        return;
    }

    buf.put_u8(first | max as u8);
    let mut rest = value - max;
    while rest >= 0x80 {
        buf.put_u8((rest & 0x7f) as u8 | 0x80);
        rest >>= 7;
    }
    buf.put_u8(rest as u8);
}

/// Write a string literal without Huffman coding
fn encode_string(buf: &mut BytesMut, s: &[u8]) {
    encode_integer(buf, 0x00, 7, s.len() as u64);
    buf.put_slice(s);
}

/// Encode every field as a literal never-indexed representation
pub fn encode_header_block(fields: &[HeaderField]) -> Bytes {
    let size: usize = fields.iter().map(|f| f.len() + 11).sum();
    let mut buf = BytesMut::with_capacity(size);

    for field in fields {
        buf.put_u8(LITERAL_NEVER_INDEXED);
        encode_string(&mut buf, &field.name);
        encode_string(&mut buf, &field.value);
    }

    buf.freeze()
}

fn malformed(msg: &str) -> DecodeError {
    DecodeError::Hpack(msg.to_string())
}

/// Read an integer with an N-bit prefix, returning it with its length
fn decode_integer(data: &[u8], prefix_bits: u8) -> Result<(u64, usize), DecodeError> {
    let Some(&first) = data.first() else {
        return Err(malformed("truncated integer"));
    };

    let max = (1u64 << prefix_bits) - 1;
    let mut value = u64::from(first) & max;
    if value < max {
        return Ok((value, 1));
    }

    for (i, &byte) in data.iter().enumerate().skip(1).take(MAX_INTEGER_OCTETS - 1) {
        value += u64::from(byte & 0x7f) << (7 * (i - 1));
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    if data.len() >= MAX_INTEGER_OCTETS {
        Err(malformed("integer too long"))
    } else {
        Err(malformed("truncated integer"))
    }
}

/// Length of the string literal at the start of `data`
fn string_len(data: &[u8]) -> Result<usize, DecodeError> {
    let (len, prefix) = decode_integer(data, 7)?;
    let total = prefix as u64 + len;
    if total > data.len() as u64 {
        return Err(malformed("truncated string literal"));
    }
    Ok(total as usize)
}

/// Walk the representations of a block without decoding them
///
/// Table size updates are only legal before the first field (RFC 7541 4.2)
/// and may not exceed [`MAX_TABLE_SIZE`].
fn check_block(block: &[u8]) -> Result<(), DecodeError> {
    let mut pos = 0;
    let mut seen_field = false;

    while pos < block.len() {
        let rest = &block[pos..];
        let first = rest[0];

        if first & 0x80 != 0 {
            pos += decode_integer(rest, 7)?.1;
            seen_field = true;
        } else if first & 0xe0 == 0x20 {
            if seen_field {
                return Err(malformed("table size update after a header field"));
            }
            let (size, len) = decode_integer(rest, 5)?;
            if size > MAX_TABLE_SIZE {
                return Err(DecodeError::Hpack(format!(
                    "table size update to {} exceeds {}",
                    size, MAX_TABLE_SIZE
                )));
            }
            pos += len;
        } else {
            let prefix_bits = if first & 0x40 != 0 { 6 } else { 4 };
            let (index, len) = decode_integer(rest, prefix_bits)?;
            pos += len;
            if index == 0 {
                pos += string_len(&block[pos..])?;
            }
            pos += string_len(&block[pos..])?;
            seen_field = true;
        }
    }

    Ok(())
}

/// Accumulates header block fragments and decodes complete blocks
pub struct HeaderBlockDecoder {
    decoder: hpack::Decoder<'static>,
    pending: BytesMut,
}

impl HeaderBlockDecoder {
    /// Create a decoder with an empty dynamic table
    pub fn new() -> Self {
        HeaderBlockDecoder {
            decoder: hpack::Decoder::new(),
            pending: BytesMut::new(),
        }
    }

    /// Buffer a fragment from HEADERS or CONTINUATION
    pub fn push_fragment(&mut self, fragment: &[u8]) {
        self.pending.extend_from_slice(fragment);
    }

    /// Decode the buffered block, in wire order
    pub fn finish(&mut self) -> Result<Vec<HeaderField>, DecodeError> {
        let block = self.pending.split();
        check_block(&block)?;

        let mut fields = Vec::new();
        self.decoder
            .decode_with_cb(&block, |name, value| {
                fields.push(HeaderField::new(name.into_owned(), value.into_owned()));
            })
            .map_err(|e| DecodeError::Hpack(format!("{:?}", e)))?;

        Ok(fields)
    }
}

impl Default for HeaderBlockDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(block: &[u8]) -> Vec<HeaderField> {
        let mut decoder = HeaderBlockDecoder::new();
        decoder.push_fragment(block);
        decoder.finish().unwrap()
    }

    #[test]
    fn test_integer_prefix_boundaries() {
        let mut buf = BytesMut::new();
        encode_integer(&mut buf, 0x00, 7, 126);
        assert_eq!(&buf[..], &[126]);

        let mut buf = BytesMut::new();
        encode_integer(&mut buf, 0x00, 7, 127);
        assert_eq!(&buf[..], &[127, 0]);

        // RFC 7541 C.1.2: 1337 with a 5-bit prefix
        let mut buf = BytesMut::new();
        encode_integer(&mut buf, 0x00, 5, 1337);
        assert_eq!(&buf[..], &[31, 154, 10]);

        let mut buf = BytesMut::new();
        encode_integer(&mut buf, 0x20, 3, 5);
        assert_eq!(&buf[..], &[0x25]);
    }

    #[test]
    fn test_literal_layout() {
        let block = encode_header_block(&[HeaderField::new(":method", "GET")]);
        assert_eq!(&block[..], b"\x10\x07:method\x03GET");
    }

    #[test]
    fn test_literal_roundtrip() {
        let long_value = "v".repeat(300);
        let fields = vec![
            HeaderField::new(":method", "POST"),
            HeaderField::new(":path", "/upload"),
            HeaderField::new("x-empty", ""),
            HeaderField::new("x-long", long_value.as_str()),
            HeaderField::new("x-dup", "1"),
            HeaderField::new("x-dup", "2"),
        ];

        let decoded = decode(&encode_header_block(&fields));
        assert_eq!(decoded, fields);
    }

    #[test]
    fn test_fragmented_block() {
        let fields = vec![
            HeaderField::new(":status", "200"),
            HeaderField::new("content-type", "text/plain"),
        ];
        let block = encode_header_block(&fields);
        let (first, second) = block.split_at(5);

        let mut decoder = HeaderBlockDecoder::new();
        decoder.push_fragment(first);
        decoder.push_fragment(second);
        assert_eq!(decoder.finish().unwrap(), fields);
    }

    #[test]
    fn test_decode_indexed_response() {
        let mut encoder = hpack::Encoder::new();
        let block = encoder.encode(vec![
            (&b":status"[..], &b"200"[..]),
            (&b"server"[..], &b"probe-test"[..]),
        ]);

        let decoded = decode(&block);
        assert_eq!(
            decoded,
            vec![
                HeaderField::new(":status", "200"),
                HeaderField::new("server", "probe-test"),
            ]
        );
    }

    #[test]
    fn test_decode_garbage() {
        let mut decoder = HeaderBlockDecoder::new();
        decoder.push_fragment(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(decoder.finish(), Err(DecodeError::Hpack(_))));
    }

    fn decode_err(block: &[u8]) -> DecodeError {
        let mut decoder = HeaderBlockDecoder::new();
        decoder.push_fragment(block);
        decoder.finish().unwrap_err()
    }

    #[test]
    fn test_size_update_overlong_integer() {
        assert!(matches!(
            decode_err(&[0x3f, 0xff, 0xff, 0xff, 0xff, 0x0f]),
            DecodeError::Hpack(_)
        ));
    }

    #[test]
    fn test_size_update_truncated() {
        assert!(matches!(decode_err(&[0x3f, 0xe1]), DecodeError::Hpack(_)));
        assert!(matches!(decode_err(&[0x3f]), DecodeError::Hpack(_)));
    }

    #[test]
    fn test_size_update_above_limit() {
        // 4097 with a 5-bit prefix
        let mut block = BytesMut::new();
        encode_integer(&mut block, 0x20, 5, 4097);
        assert!(matches!(decode_err(&block), DecodeError::Hpack(_)));
    }

    #[test]
    fn test_size_update_after_field() {
        assert!(matches!(decode_err(&[0x88, 0x20]), DecodeError::Hpack(_)));
    }

    #[test]
    fn test_size_update_before_fields() {
        // Shrink to zero then back to 4096, then :status 200
        let mut block = BytesMut::new();
        block.put_u8(0x20);
        encode_integer(&mut block, 0x20, 5, 4096);
        block.put_u8(0x88);
        assert_eq!(decode(&block), vec![HeaderField::new(":status", "200")]);
    }

    #[test]
    fn test_truncated_literal() {
        assert!(matches!(decode_err(&[0x10, 0x03, 0x61]), DecodeError::Hpack(_)));
    }

    #[test]
    fn test_decode_integer_limits() {
        assert_eq!(decode_integer(&[31, 154, 10], 5).unwrap(), (1337, 3));
        assert_eq!(decode_integer(&[0x7f, 0x80, 0x80, 0x80, 0x01], 7).unwrap(), (127 + (1 << 21), 5));
        assert!(decode_integer(&[0x7f, 0x80, 0x80, 0x80, 0x80, 0x01], 7).is_err());
    }
}
