//! Protocol-independent message model
//!
//! The same shape serves outbound requests and decoded responses: an ordered
//! list of header fields and an opaque body.

use std::fmt;

/// A single header field
///
/// Names and values are raw byte strings. Names are expected to be
/// lower-cased by whoever builds the message; nothing here enforces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

impl HeaderField {
    /// Create a new header field
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        HeaderField {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Encoded size of name plus value
    pub fn len(&self) -> usize {
        self.name.len() + self.value.len()
    }

    /// Check if both name and value are empty
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.value.is_empty()
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            String::from_utf8_lossy(&self.name),
            String::from_utf8_lossy(&self.value)
        )
    }
}

/// HTTP message (request or response)
///
/// Header order is preserved exactly; duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    headers: Vec<HeaderField>,
    body: Vec<u8>,
}

impl Message {
    /// Create an empty message
    pub fn new() -> Self {
        Message::default()
    }

    /// Append a header field (builder style)
    pub fn header(mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push(HeaderField::new(name, value));
        self
    }

    /// Set the body (builder style)
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Append a header field
    pub fn push_header(&mut self, field: HeaderField) {
        self.headers.push(field);
    }

    /// Append bytes to the body
    pub fn extend_body(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    /// Header fields in order
    pub fn headers(&self) -> &[HeaderField] {
        &self.headers
    }

    /// Body bytes
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// First value for a header name (exact byte match)
    pub fn header_value(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|f| f.name == name.as_bytes())
            .map(|f| f.value.as_slice())
    }

    /// Split into header fields and body
    pub fn into_parts(self) -> (Vec<HeaderField>, Vec<u8>) {
        (self.headers, self.body)
    }
}

impl FromIterator<HeaderField> for Message {
    fn from_iter<T: IntoIterator<Item = HeaderField>>(iter: T) -> Self {
        Message {
            headers: iter.into_iter().collect(),
            body: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_order_preserved() {
        let msg = Message::new()
            .header("b", "1")
            .header("a", "2")
            .header("b", "3");

        let names: Vec<&[u8]> = msg.headers().iter().map(|f| f.name.as_slice()).collect();
        assert_eq!(names, vec![&b"b"[..], b"a", b"b"]);
        assert_eq!(msg.header_value("b"), Some(&b"1"[..]));
        assert_eq!(msg.header_value("missing"), None);
    }

    #[test]
    fn test_body_accumulation() {
        let mut msg = Message::new();
        msg.extend_body(b"Hello, ");
        msg.extend_body(b"world");
        assert_eq!(msg.body_bytes(), b"Hello, world");

        let (headers, body) = msg.into_parts();
        assert!(headers.is_empty());
        assert_eq!(body, b"Hello, world");
    }

    #[test]
    fn test_header_field_display() {
        let field = HeaderField::new(":status", "200");
        assert_eq!(field.to_string(), ":status: 200");
        assert_eq!(field.len(), 10);
        assert!(!field.is_empty());
        assert!(HeaderField::new("", "").is_empty());
    }
}
