//! QPACK field sections (RFC 9204)
//!
//! The encoder never touches the dynamic table: every field becomes a
//! literal with a literal name, so a header block can be decoded without
//! any encoder stream. Static table references are skipped as well, so the
//! names and values appear on the wire byte for byte as the caller wrote
//! them, casing and duplicates included. The decoder accepts everything a server may send
//! while the client advertises a dynamic table capacity of zero: indexed
//! static entries and literals with static or literal names, optionally
//! Huffman coded.

use crate::http::h2::hpack::encode_integer;
use crate::http::{DecodeError, HeaderField};
use bytes::{BufMut, Bytes, BytesMut};

/// Encode fields as literals with literal names, in the order given
pub fn encode_header_block(fields: &[HeaderField]) -> Bytes {
    let size: usize = fields.iter().map(|f| f.len() + 10).sum();
    let mut buf = BytesMut::with_capacity(size + 2);

    // Required Insert Count = 0, Delta Base = 0
    buf.put_u8(0x00);
    buf.put_u8(0x00);

    for field in fields {
        // 001 N H + 3-bit name length; N=0 (may be indexed), H=0 (no Huffman)
        encode_integer(&mut buf, 0x20, 3, field.name.len() as u64);
        buf.put_slice(&field.name);

        // H=0 + 7-bit value length
        encode_integer(&mut buf, 0x00, 7, field.value.len() as u64);
        buf.put_slice(&field.value);
    }

    buf.freeze()
}

/// Decode a complete field section
pub fn decode_header_block(data: &[u8]) -> Result<Vec<HeaderField>, DecodeError> {
    let mut offset = 0;

    let (required_insert_count, n) = decode_prefix_int(&data[offset..], 8)?;
    offset += n;
    if required_insert_count != 0 {
        return Err(dynamic_table());
    }

    // Delta Base is meaningless without dynamic entries
    let (_, n) = decode_prefix_int(&data[offset..], 7)?;
    offset += n;

    let mut fields = Vec::new();

    while offset < data.len() {
        let first_byte = data[offset];

        if first_byte & 0x80 != 0 {
            // Indexed Field Line: 1 T index(6)
            let is_static = first_byte & 0x40 != 0;
            let (index, n) = decode_prefix_int(&data[offset..], 6)?;
            offset += n;

            if !is_static {
                return Err(dynamic_table());
            }
            let (name, value) = static_entry(index)?;
            fields.push(HeaderField::new(name, value));
        } else if first_byte & 0xc0 == 0x40 {
            // Literal Field Line with Name Reference: 01 N T index(4)
            let is_static = first_byte & 0x10 != 0;
            let (index, n) = decode_prefix_int(&data[offset..], 4)?;
            offset += n;

            if !is_static {
                return Err(dynamic_table());
            }
            let (name, _) = static_entry(index)?;
            let (value, n) = decode_string(&data[offset..], 7)?;
            offset += n;
            fields.push(HeaderField::new(name, value));
        } else if first_byte & 0xe0 == 0x20 {
            // Literal Field Line with Literal Name: 001 N H length(3)
            let (name, n) = decode_string(&data[offset..], 3)?;
            offset += n;
            let (value, n) = decode_string(&data[offset..], 7)?;
            offset += n;
            fields.push(HeaderField::new(name, value));
        } else {
            // Post-base forms (0001, 0000) always reference the dynamic table
            return Err(dynamic_table());
        }
    }

    Ok(fields)
}

fn dynamic_table() -> DecodeError {
    DecodeError::Qpack("dynamic table references are not supported".to_string())
}

fn static_entry(index: u64) -> Result<(&'static str, &'static str), DecodeError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| STATIC_TABLE.get(i))
        .copied()
        .ok_or_else(|| DecodeError::Qpack(format!("static index {} out of range", index)))
}

/// Decode an N-bit prefixed integer, returning (value, bytes consumed)
fn decode_prefix_int(data: &[u8], prefix_bits: u8) -> Result<(u64, usize), DecodeError> {
    let Some(&first) = data.first() else {
        return Err(DecodeError::Qpack("unexpected end of prefix int".to_string()));
    };

    let max_prefix = (1u64 << prefix_bits) - 1;
    let mut value = u64::from(first) & max_prefix;
    if value < max_prefix {
        return Ok((value, 1));
    }

    let mut shift = 0u32;
    for (i, &byte) in data.iter().enumerate().skip(1) {
        if shift > 56 {
            return Err(DecodeError::Qpack("prefix int overflow".to_string()));
        }
        value += u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }

    Err(DecodeError::Qpack("truncated prefix int".to_string()))
}

/// Decode a string literal whose Huffman flag sits just above the prefix
fn decode_string(data: &[u8], prefix_bits: u8) -> Result<(Vec<u8>, usize), DecodeError> {
    let Some(&first) = data.first() else {
        return Err(DecodeError::Qpack("unexpected end of string".to_string()));
    };

    let huffman = first & (1 << prefix_bits) != 0;
    let (length, n) = decode_prefix_int(data, prefix_bits)?;
    let end = usize::try_from(length)
        .ok()
        .and_then(|len| n.checked_add(len))
        .filter(|&end| end <= data.len())
        .ok_or_else(|| DecodeError::Qpack("truncated string".to_string()))?;

    let raw = &data[n..end];
    let s = if huffman {
        hpack::huffman::HuffmanDecoder::new()
            .decode(raw)
            .map_err(|e| DecodeError::Qpack(format!("Huffman decode error: {:?}", e)))?
    } else {
        raw.to_vec()
    };

    Ok((s, end))
}

/// QPACK static table (RFC 9204 Appendix A)
static STATIC_TABLE: [(&str, &str); 99] = [
    (":authority", ""),
    (":path", "/"),
    ("age", "0"),
    ("content-disposition", ""),
    ("content-length", "0"),
    ("cookie", ""),
    ("date", ""),
    ("etag", ""),
    ("if-modified-since", ""),
    ("if-none-match", ""),
    ("last-modified", ""),
    ("link", ""),
    ("location", ""),
    ("referer", ""),
    ("set-cookie", ""),
    (":method", "CONNECT"),
    (":method", "DELETE"),
    (":method", "GET"),
    (":method", "HEAD"),
    (":method", "OPTIONS"),
    (":method", "POST"),
    (":method", "PUT"),
    (":scheme", "http"),
    (":scheme", "https"),
    (":status", "103"),
    (":status", "200"),
    (":status", "304"),
    (":status", "404"),
    (":status", "503"),
    ("accept", "*/*"),
    ("accept", "application/dns-message"),
    ("accept-encoding", "gzip, deflate, br"),
    ("accept-ranges", "bytes"),
    ("access-control-allow-headers", "cache-control"),
    ("access-control-allow-headers", "content-type"),
    ("access-control-allow-origin", "*"),
    ("cache-control", "max-age=0"),
    ("cache-control", "max-age=2592000"),
    ("cache-control", "max-age=604800"),
    ("cache-control", "no-cache"),
    ("cache-control", "no-store"),
    ("cache-control", "public, max-age=31536000"),
    ("content-encoding", "br"),
    ("content-encoding", "gzip"),
    ("content-type", "application/dns-message"),
    ("content-type", "application/javascript"),
    ("content-type", "application/json"),
    ("content-type", "application/x-www-form-urlencoded"),
    ("content-type", "image/gif"),
    ("content-type", "image/jpeg"),
    ("content-type", "image/png"),
    ("content-type", "text/css"),
    ("content-type", "text/html; charset=utf-8"),
    ("content-type", "text/plain"),
    ("content-type", "text/plain;charset=utf-8"),
    ("range", "bytes=0-"),
    ("strict-transport-security", "max-age=31536000"),
    ("strict-transport-security", "max-age=31536000; includesubdomains"),
    ("strict-transport-security", "max-age=31536000; includesubdomains; preload"),
    ("vary", "accept-encoding"),
    ("vary", "origin"),
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    (":status", "100"),
    (":status", "204"),
    (":status", "206"),
    (":status", "302"),
    (":status", "400"),
    (":status", "403"),
    (":status", "421"),
    (":status", "425"),
    (":status", "500"),
    ("accept-language", ""),
    ("access-control-allow-credentials", "FALSE"),
    ("access-control-allow-credentials", "TRUE"),
    ("access-control-allow-headers", "*"),
    ("access-control-allow-methods", "get"),
    ("access-control-allow-methods", "get, post, options"),
    ("access-control-allow-methods", "options"),
    ("access-control-expose-headers", "content-length"),
    ("access-control-request-headers", "content-type"),
    ("access-control-request-method", "get"),
    ("access-control-request-method", "post"),
    ("alt-svc", "clear"),
    ("authorization", ""),
    ("content-security-policy", "script-src 'none'; object-src 'none'; base-uri 'none'"),
    ("early-data", "1"),
    ("expect-ct", ""),
    ("forwarded", ""),
    ("if-range", ""),
    ("origin", ""),
    ("purpose", "prefetch"),
    ("server", ""),
    ("timing-allow-origin", "*"),
    ("upgrade-insecure-requests", "1"),
    ("user-agent", ""),
    ("x-forwarded-for", ""),
    ("x-frame-options", "deny"),
    ("x-frame-options", "sameorigin"),
];
