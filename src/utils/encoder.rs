use bytes::Bytes;

use super::resp::Frame;

pub type RespResult = Result<Vec<u8>, String>;

pub fn encode_simple_string(s: &str) -> Vec<u8> {
    Frame::simple(s).encode()
}

pub fn encode_error(s: &str) -> Vec<u8> {
    Frame::error(s).encode()
}

pub fn encode_bulk_string(s: impl Into<Bytes>) -> Vec<u8> {
    Frame::bulk(s.into()).encode()
}

pub fn encode_null_string() -> Vec<u8> {
    Frame::NullBulk.encode()
}

pub fn encode_integer(n: i64) -> Vec<u8> {
    Frame::Integer(n).encode()
}

pub fn encode_array(arr: &[Bytes]) -> Vec<u8> {
    Frame::Array(arr.iter().cloned().map(Frame::Bulk).collect()).encode()
}

/// Wraps already-encoded frames (from nested helpers) in an array header
/// without re-parsing them. Used by XADD/XRANGE/XREAD/GEOSEARCH, whose
/// elements are themselves arrays or bulk strings assembled ad hoc.
pub fn encode_raw_array(parts: Vec<Vec<u8>>) -> Vec<u8> {
    let mut response = format!("*{}\r\n", parts.len()).into_bytes();
    for part in parts {
        response.extend(part);
    }
    response
}

pub fn encode_null_array() -> Vec<u8> {
    Frame::NullArray.encode()
}
