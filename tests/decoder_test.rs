use bytes::Bytes;
use redis_cache::utils::decoder::decode_command;

fn decode(raw: &str) -> Vec<Bytes> {
    let (parts, consumed) = decode_command(raw.as_bytes()).unwrap().unwrap();
    assert_eq!(consumed, raw.len());
    parts
}

fn bytes(strs: &[&str]) -> Vec<Bytes> {
    strs.iter().map(|s| Bytes::from(s.to_string())).collect()
}

// ==================== Basic RESP Decoding ====================

#[test]
fn test_decode_resp_ping() {
    assert_eq!(decode("*1\r\n$4\r\nPING\r\n"), bytes(&["PING"]));
}

#[test]
fn test_decode_resp_echo() {
    assert_eq!(decode("*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n"), bytes(&["ECHO", "hello"]));
}

#[test]
fn test_decode_resp_set() {
    assert_eq!(decode("*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n"), bytes(&["SET", "key", "value"]));
}

#[test]
fn test_decode_resp_set_with_expiry() {
    let raw = "*5\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n$2\r\nEX\r\n$2\r\n10\r\n";
    assert_eq!(decode(raw), bytes(&["SET", "key", "value", "EX", "10"]));
}

#[test]
fn test_decode_resp_get() {
    assert_eq!(decode("*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n"), bytes(&["GET", "key"]));
}

// ==================== List Commands Decoding ====================

#[test]
fn test_decode_resp_rpush_multiple() {
    let raw = "*4\r\n$5\r\nRPUSH\r\n$6\r\nmylist\r\n$2\r\nv1\r\n$2\r\nv2\r\n";
    assert_eq!(decode(raw), bytes(&["RPUSH", "mylist", "v1", "v2"]));
}

#[test]
fn test_decode_resp_lpop_with_count() {
    let raw = "*3\r\n$4\r\nLPOP\r\n$6\r\nmylist\r\n$1\r\n3\r\n";
    assert_eq!(decode(raw), bytes(&["LPOP", "mylist", "3"]));
}

#[test]
fn test_decode_resp_blpop_with_timeout() {
    let raw = "*3\r\n$5\r\nBLPOP\r\n$6\r\nmylist\r\n$3\r\n0.1\r\n";
    assert_eq!(decode(raw), bytes(&["BLPOP", "mylist", "0.1"]));
}

// ==================== Stream Commands Decoding ====================

#[test]
fn test_decode_resp_xadd_partial_wildcard() {
    let raw = "*5\r\n$4\r\nXADD\r\n$8\r\nmystream\r\n$3\r\n0-*\r\n$3\r\nfoo\r\n$3\r\nbar\r\n";
    assert_eq!(decode(raw), bytes(&["XADD", "mystream", "0-*", "foo", "bar"]));
}

#[test]
fn test_decode_resp_xread_with_block() {
    let raw = "*6\r\n$5\r\nXREAD\r\n$5\r\nBLOCK\r\n$4\r\n1000\r\n$7\r\nSTREAMS\r\n$8\r\nmystream\r\n$3\r\n0-0\r\n";
    assert_eq!(decode(raw), bytes(&["XREAD", "BLOCK", "1000", "STREAMS", "mystream", "0-0"]));
}

// ==================== Edge Cases ====================

#[test]
fn test_decode_resp_empty_value() {
    assert_eq!(decode("*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$0\r\n\r\n"), bytes(&["SET", "key", ""]));
}

#[test]
fn test_decode_resp_value_with_spaces() {
    let raw = "*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$11\r\nhello world\r\n";
    assert_eq!(decode(raw), bytes(&["SET", "key", "hello world"]));
}

#[test]
fn test_decode_resp_case_preserved() {
    assert_eq!(decode("*2\r\n$4\r\necho\r\n$5\r\nHELLO\r\n"), bytes(&["echo", "HELLO"]));
}

#[test]
fn test_decode_incomplete_buffer_needs_more_bytes() {
    let raw = b"*2\r\n$4\r\nECHO\r\n$5\r\nhel";
    assert_eq!(decode_command(raw).unwrap(), None);
}

#[test]
fn test_decode_binary_safe_value() {
    let mut raw = b"*2\r\n$3\r\nGET\r\n$4\r\n".to_vec();
    raw.extend_from_slice(&[0xff, 0x00, 0x01, 0x02]);
    raw.extend_from_slice(b"\r\n");
    let (parts, consumed) = decode_command(&raw).unwrap().unwrap();
    assert_eq!(consumed, raw.len());
    assert_eq!(parts[1].as_ref(), &[0xff, 0x00, 0x01, 0x02]);
}
