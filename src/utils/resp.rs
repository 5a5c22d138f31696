//! The five RESP frame shapes and their streaming parser.
//!
//! The parser consumes from a growing buffer and returns either a fully
//! parsed frame plus the number of bytes it consumed, or `None` meaning
//! "need more bytes". It never blocks and never allocates more than one
//! frame tree per call.

use bytes::Bytes;

use crate::error::ProtocolError;

/// Bulk strings and arrays longer than this are treated as a protocol
/// violation rather than an allocation a client can force on the server.
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;
pub const MAX_ARRAY_LEN: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Simple(Bytes),
    Error(Bytes),
    Integer(i64),
    Bulk(Bytes),
    NullBulk,
    Array(Vec<Frame>),
    NullArray,
}

impl Frame {
    pub fn simple(s: impl Into<Vec<u8>>) -> Self {
        Frame::Simple(Bytes::from(s.into()))
    }

    pub fn error(s: impl Into<Vec<u8>>) -> Self {
        Frame::Error(Bytes::from(s.into()))
    }

    pub fn bulk(b: impl Into<Bytes>) -> Self {
        Frame::Bulk(b.into())
    }

    pub fn command(parts: &[Bytes]) -> Self {
        Frame::Array(parts.iter().cloned().map(Frame::Bulk).collect())
    }

    /// Serializes this frame back to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Frame::Simple(s) => {
                out.push(b'+');
                out.extend_from_slice(s);
                out.extend_from_slice(b"\r\n");
            }
            Frame::Error(s) => {
                out.push(b'-');
                out.extend_from_slice(s);
                out.extend_from_slice(b"\r\n");
            }
            Frame::Integer(n) => {
                out.push(b':');
                out.extend_from_slice(n.to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Frame::Bulk(b) => {
                out.push(b'$');
                out.extend_from_slice(b.len().to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(b);
                out.extend_from_slice(b"\r\n");
            }
            Frame::NullBulk => out.extend_from_slice(b"$-1\r\n"),
            Frame::Array(items) => {
                out.push(b'*');
                out.extend_from_slice(items.len().to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
                for item in items {
                    item.encode_into(out);
                }
            }
            Frame::NullArray => out.extend_from_slice(b"*-1\r\n"),
        }
    }
}

/// Parses one frame from the front of `buf`. Returns `Ok(None)` if `buf`
/// does not yet contain a complete frame. Never panics on malformed input —
/// malformed input is always a `ProtocolError`, which callers use to decide
/// to close the connection.
pub fn parse(buf: &[u8]) -> Result<Option<(Frame, usize)>, ProtocolError> {
    if buf.is_empty() {
        return Ok(None);
    }
    let prefix = buf[0];
    let Some(line_end) = find_crlf(&buf[1..]) else {
        return Ok(None);
    };
    let line_end = line_end + 1;
    let line = &buf[1..line_end];

    match prefix {
        b'+' => Ok(Some((Frame::Simple(Bytes::copy_from_slice(line)), line_end + 2))),
        b'-' => Ok(Some((Frame::Error(Bytes::copy_from_slice(line)), line_end + 2))),
        b':' => {
            let n = parse_signed_decimal(line)?;
            Ok(Some((Frame::Integer(n), line_end + 2)))
        }
        b'$' => parse_bulk(line, buf, line_end),
        b'*' => parse_array(line, buf, line_end),
        other => Err(ProtocolError::UnknownPrefix(other)),
    }
}

fn parse_bulk(len_line: &[u8], buf: &[u8], header_end: usize) -> Result<Option<(Frame, usize)>, ProtocolError> {
    let len = parse_signed_decimal(len_line)?;
    if len == -1 {
        return Ok(Some((Frame::NullBulk, header_end + 2)));
    }
    if len < -1 {
        return Err(ProtocolError::InvalidLength);
    }
    if len as usize > MAX_BULK_LEN {
        return Err(ProtocolError::BulkTooLarge(len, MAX_BULK_LEN));
    }
    let len = len as usize;
    let body_start = header_end + 2;
    let body_end = body_start + len;
    if buf.len() < body_end + 2 {
        return Ok(None);
    }
    if &buf[body_end..body_end + 2] != b"\r\n" {
        return Err(ProtocolError::MissingTerminator);
    }
    let data = Bytes::copy_from_slice(&buf[body_start..body_end]);
    Ok(Some((Frame::Bulk(data), body_end + 2)))
}

fn parse_array(count_line: &[u8], buf: &[u8], header_end: usize) -> Result<Option<(Frame, usize)>, ProtocolError> {
    let count = parse_signed_decimal(count_line)?;
    if count == -1 {
        return Ok(Some((Frame::NullArray, header_end + 2)));
    }
    if count < -1 {
        return Err(ProtocolError::InvalidLength);
    }
    if count as usize > MAX_ARRAY_LEN {
        return Err(ProtocolError::ArrayTooLarge(count, MAX_ARRAY_LEN));
    }
    let mut items = Vec::with_capacity(count as usize);
    let mut offset = header_end + 2;
    for _ in 0..count {
        match parse(&buf[offset..])? {
            Some((frame, consumed)) => {
                items.push(frame);
                offset += consumed;
            }
            None => return Ok(None),
        }
    }
    Ok(Some((Frame::Array(items), offset)))
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n").map(|p| p + 1)
}

/// Parses an ASCII signed decimal integer line. Rejects anything that isn't
/// `-?[0-9]+`, including leading `+`, whitespace, or non-ASCII digits.
fn parse_signed_decimal(line: &[u8]) -> Result<i64, ProtocolError> {
    let s = std::str::from_utf8(line).map_err(|_| ProtocolError::InvalidLength)?;
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::InvalidLength);
    }
    let magnitude: i64 = digits.parse().map_err(|_| ProtocolError::InvalidLength)?;
    Ok(sign * magnitude)
}

/// Extracts a client command (always an array of bulk strings) from the
/// front of `buf`. Returns the parts plus bytes consumed, or `None` if the
/// buffer doesn't hold a complete command yet.
pub fn parse_command(buf: &[u8]) -> Result<Option<(Vec<Bytes>, usize)>, ProtocolError> {
    match parse(buf)? {
        None => Ok(None),
        Some((Frame::Array(items), consumed)) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Frame::Bulk(b) => parts.push(b),
                    _ => return Err(ProtocolError::NotACommand),
                }
            }
            Ok(Some((parts, consumed)))
        }
        Some((Frame::NullArray, consumed)) => Ok(Some((Vec::new(), consumed))),
        Some(_) => Err(ProtocolError::NotACommand),
    }
}
