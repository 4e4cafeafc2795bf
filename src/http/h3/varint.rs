//! QUIC variable-length integer encoding (RFC 9000 §16).
//!
//! Varints use 1, 2, 4, or 8 bytes. The two most-significant bits of
//! the first byte encode the length prefix:
//!
//! | 2MSB | Length | Usable Bits | Max Value              |
//! |------|--------|-------------|------------------------|
//! | 00   | 1      | 6           | 63                     |
//! | 01   | 2      | 14          | 16383                  |
//! | 10   | 4      | 30          | 1073741823             |
//! | 11   | 8      | 62          | 4611686018427387903    |

use crate::http::DecodeError;
use bytes::{Buf, BufMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Largest value with a 1-byte encoding
pub const MAX_VARINT_1: u64 = 63;
/// Largest value with a 2-byte encoding
pub const MAX_VARINT_2: u64 = 16_383;
/// Largest value with a 4-byte encoding
pub const MAX_VARINT_4: u64 = 1_073_741_823;
/// Maximum value representable as a QUIC varint
pub const MAX_VARINT: u64 = 4_611_686_018_427_387_903;

/// Returns the number of bytes needed to encode `v` as a QUIC varint.
pub const fn varint_len(v: u64) -> usize {
    if v <= MAX_VARINT_1 {
        1
    } else if v <= MAX_VARINT_2 {
        2
    } else if v <= MAX_VARINT_4 {
        4
    } else {
        8
    }
}

/// Append `v` to `buf` in the shortest encoding.
///
/// # Panics
///
/// Panics if `v` exceeds [`MAX_VARINT`]; callers only pass lengths and
/// frame types, which never come close.
pub fn encode<B: BufMut>(v: u64, buf: &mut B) {
    assert!(v <= MAX_VARINT, "{:#x} doesn't fit into 62 bits", v);
    match varint_len(v) {
        1 => buf.put_u8(v as u8),
        2 => buf.put_u16(0x4000 | v as u16),
        4 => buf.put_u32(0x8000_0000 | v as u32),
        _ => buf.put_u64(0xc000_0000_0000_0000 | v),
    }
}

/// Decode a varint from the front of `buf`, advancing past it.
pub fn decode<B: Buf>(buf: &mut B) -> Result<u64, DecodeError> {
    if !buf.has_remaining() {
        return Err(DecodeError::TruncatedVarint);
    }
    let len = 1usize << (buf.chunk()[0] >> 6);
    if buf.remaining() < len {
        return Err(DecodeError::TruncatedVarint);
    }

    let mut v = u64::from(buf.get_u8() & 0x3f);
    for _ in 1..len {
        v = (v << 8) | u64::from(buf.get_u8());
    }
    Ok(v)
}

/// Read one varint from an async stream.
///
/// Returns `Ok(None)` when the stream ends cleanly before the first byte,
/// and an `UnexpectedEof` error when it ends part-way through.
pub async fn read<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Option<u64>> {
    let mut first = [0u8; 1];
    if reader.read(&mut first).await? == 0 {
        return Ok(None);
    }

    let len = 1usize << (first[0] >> 6);
    let mut rest = [0u8; 7];
    reader.read_exact(&mut rest[..len - 1]).await?;

    let v = rest[..len - 1]
        .iter()
        .fold(u64::from(first[0] & 0x3f), |v, &b| (v << 8) | u64::from(b));
    Ok(Some(v))
}
