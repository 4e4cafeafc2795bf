//! Header line parsing
//!
//! Turns curl-style `name: value` lines into header fields for the request
//! message.

use super::{Error, HeaderField, Message, Result, Target};
use rand::RngCore;

/// Parse a `name: value` line into a header field
///
/// The name is trimmed and lower-cased, the value is trimmed. The line is
/// split at the first colon, so values may themselves contain colons.
pub fn parse_header_line(line: &str) -> Result<HeaderField> {
    let Some((name, value)) = line.split_once(':') else {
        return Err(Error::InvalidHeader(format!(
            "'{}', expected syntax: 'x-extra-header: val'",
            line
        )));
    };

    let name = name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return Err(Error::InvalidHeader(format!("empty header name in '{}'", line)));
    }

    Ok(HeaderField::new(name, value.trim()))
}

/// Parse a list of header lines, preserving order
pub fn parse_header_lines<S: AsRef<str>>(lines: &[S]) -> Result<Vec<HeaderField>> {
    lines.iter().map(|l| parse_header_line(l.as_ref())).collect()
}

/// Request skeleton with the pseudo-headers in wire order
///
/// `:method`, `:scheme`, `:authority` and `:path`, nothing else.
pub fn base_request(method: &str, target: &Target) -> Message {
    Message::new()
        .header(":method", method)
        .header(":scheme", target.scheme())
        .header(":authority", target.authority())
        .header(":path", target.path())
}

/// Random (version 4) UUID in its hyphenated lower-case form
pub fn request_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..]
    )
}
