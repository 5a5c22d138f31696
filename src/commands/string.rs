use std::time::Instant;

use bytes::Bytes;

use crate::keyspace::{get_live, get_live_mut, Map};
use crate::models::{RedisData, RedisValue};
use crate::utils::encoder::*;

pub fn process_set(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "SET", parts[1] = key, parts[2] = value, [parts[3] = EX/PX, parts[4] = time]
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'set' command".to_string());
    }

    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let value = parts[2].clone();
    let mut expires_at = None;

    // Handle expiry if present: SET key value EX 10 or SET key value PX 1000
    if parts.len() >= 5 {
        let flag = String::from_utf8_lossy(&parts[3]).to_uppercase();
        let time_val: u64 = std::str::from_utf8(&parts[4])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| "ERR value is not an integer or out of range".to_string())?;
        match flag.as_str() {
            "EX" => expires_at = Some(Instant::now() + std::time::Duration::from_secs(time_val)),
            "PX" => expires_at = Some(Instant::now() + std::time::Duration::from_millis(time_val)),
            _ => return Err("ERR syntax error".to_string()),
        }
    }

    map.insert(key, RedisValue::new(RedisData::String(value), expires_at));

    Ok(encode_simple_string("OK"))
}

pub fn process_get(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "GET", parts[1] = key
    if parts.len() < 2 {
        return Err("ERR wrong number of arguments for 'get' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();

    match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::String(s) => Ok(encode_bulk_string(s.clone())),
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_null_string()),
    }
}

/// INCR parses the string's current bytes as a signed decimal integer and
/// stores `n + 1`. A missing key starts from zero; anything not a clean
/// decimal integer is a parse error, never a silent reset.
pub fn process_incr(parts: &[Bytes], map: &mut Map) -> RespResult {
    if parts.len() < 2 {
        return Err("ERR wrong number of arguments for 'incr' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();

    match get_live_mut(map, &key) {
        Some(value) => match &mut value.data {
            RedisData::String(s) => {
                let current = parse_integer(s)?;
                let next = current.checked_add(1).ok_or_else(|| "ERR increment or decrement would overflow".to_string())?;
                *s = Bytes::from(next.to_string());
                Ok(encode_integer(next))
            }
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => {
            map.insert(key, RedisValue::new(RedisData::String(Bytes::from("1")), None));
            Ok(encode_integer(1))
        }
    }
}

fn parse_integer(bytes: &[u8]) -> Result<i64, String> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| "ERR value is not an integer or out of range".to_string())
}
