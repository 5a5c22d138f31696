use std::collections::VecDeque;

use bytes::Bytes;

use crate::blocker::Blocker;
use crate::keyspace::{get_live, get_live_mut, Keyspace, Map};
use crate::models::{ListDir, RedisData, RedisValue};
use crate::utils::encoder::*;

pub fn process_push(parts: &[Bytes], map: &mut Map, blocker: &Blocker, push_type: ListDir) -> RespResult {
    // parts[0] = "RPUSH"/"LPUSH", parts[1] = key, parts[2..] = values
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'push' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let new_elements = &parts[2..];

    if let Some(value) = get_live(map, &key) {
        if !matches!(value.data, RedisData::List(_)) {
            return Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string());
        }
    }

    let mut leftovers = Vec::with_capacity(new_elements.len());
    for element in new_elements {
        if let Some(value) = blocker.try_handoff(&key, element.clone()) {
            leftovers.push(value);
        }
    }

    let total_new = new_elements.len();
    let carried = leftovers.len();

    let entry = map.entry(key).or_insert_with(|| RedisValue::new(RedisData::List(VecDeque::new()), None));
    match &mut entry.data {
        RedisData::List(list) => {
            if !leftovers.is_empty() {
                match push_type {
                    ListDir::L => {
                        for value in leftovers {
                            list.push_front(value);
                        }
                    }
                    ListDir::R => list.extend(leftovers),
                }
            }
            let final_len = list.len() + (total_new - carried);
            Ok(encode_integer(final_len as i64))
        }
        _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
    }
}

pub fn process_lrange(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "LRANGE", parts[1] = key, parts[2] = start, parts[3] = end
    if parts.len() < 4 {
        return Err("ERR wrong number of arguments for 'lrange' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let mut start = parse_index(&parts[2])?;
    let mut end = parse_index(&parts[3])?;

    match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::List(list) => {
                if start < 0 {
                    start += list.len() as i64;
                }
                if end < 0 {
                    end += list.len() as i64;
                }
                let start_idx = start.max(0) as usize;
                if start_idx >= list.len() {
                    return Ok(encode_array(&[]));
                }
                let end_idx = ((end.max(0) as usize) + 1).min(list.len());
                if start_idx >= end_idx {
                    return Ok(encode_array(&[]));
                }
                let slice: Vec<Bytes> = list.iter().skip(start_idx).take(end_idx - start_idx).cloned().collect();
                Ok(encode_array(&slice))
            }
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_array(&[])),
    }
}

pub fn process_llen(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "LLEN", parts[1] = key
    if parts.len() < 2 {
        return Err("ERR wrong number of arguments for 'llen' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::List(list) => Ok(encode_integer(list.len() as i64)),
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_integer(0)),
    }
}

pub fn process_pop(parts: &[Bytes], map: &mut Map, push_type: ListDir) -> RespResult {
    // parts[0] = "LPOP"/"RPOP", parts[1] = key, [parts[2] = count]
    if parts.len() < 2 {
        return Err("ERR wrong number of arguments for 'pop' command".to_string());
    }
    let had_count = parts.len() >= 3;
    let mut remaining: i64 = if had_count {
        std::str::from_utf8(&parts[2])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| "ERR value is not an integer or out of range".to_string())?
    } else {
        1
    };

    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let mut should_remove = false;

    let response = match get_live_mut(map, &key) {
        Some(value) => match &mut value.data {
            RedisData::List(list) => {
                if list.is_empty() {
                    if had_count {
                        Ok(encode_null_array())
                    } else {
                        Ok(encode_null_string())
                    }
                } else {
                    let mut dropped = Vec::new();
                    while remaining > 0 && !list.is_empty() {
                        let item = match push_type {
                            ListDir::L => list.pop_front().unwrap(),
                            ListDir::R => list.pop_back().unwrap(),
                        };
                        dropped.push(item);
                        remaining -= 1;
                    }
                    if list.is_empty() {
                        should_remove = true;
                    }
                    if had_count {
                        Ok(encode_array(&dropped))
                    } else {
                        Ok(encode_bulk_string(dropped[0].clone()))
                    }
                }
            }
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => {
            if had_count {
                Ok(encode_null_array())
            } else {
                Ok(encode_null_string())
            }
        }
    };

    if should_remove {
        map.remove(&key);
    }
    response
}

pub async fn process_blpop(parts: &[Bytes], keyspace: &Keyspace, blocker: &Blocker) -> RespResult {
    // parts[0] = "BLPOP", parts[1..-1] = keys, parts[-1] = timeout (seconds, fractional)
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'blpop' command".to_string());
    }
    let keys: Vec<String> =
        parts[1..parts.len() - 1].iter().map(|k| String::from_utf8_lossy(k).into_owned()).collect();
    let timeout_secs: f64 = std::str::from_utf8(&parts[parts.len() - 1])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| "ERR timeout is not a float or out of range".to_string())?;

    if let Some((key, item)) = try_pop_any(&mut keyspace.lock(), &keys) {
        return Ok(encode_array(&[Bytes::from(key), item]));
    }

    let (token, mut rx) = blocker.register(&keys);
    let received = if timeout_secs > 0.0 {
        let duration = tokio::time::Duration::from_secs_f64(timeout_secs);
        tokio::time::timeout(duration, rx.recv()).await.unwrap_or(None)
    } else {
        rx.recv().await
    };
    blocker.unregister(&keys, token);

    match received {
        Some(wake) => Ok(encode_array(&[Bytes::from(wake.key), wake.value])),
        None => Ok(encode_null_array()),
    }
}

/// Pops the head off the first of `keys` that currently has a non-empty
/// list. Shared by `BLPOP`'s immediate attempt and its non-blocking
/// behavior when queued inside a transaction (blocking commands never
/// actually block once `EXEC` starts replaying the queue).
fn try_pop_any(map: &mut Map, keys: &[String]) -> Option<(String, Bytes)> {
    for key in keys {
        if let Some(value) = get_live_mut(map, key) {
            if let RedisData::List(list) = &mut value.data {
                if let Some(item) = list.pop_front() {
                    return Some((key.clone(), item));
                }
            }
        }
    }
    None
}

/// `BLPOP` as run from inside `EXEC`: a transaction never actually blocks,
/// so this is the registered/await path collapsed to a single attempt.
pub fn process_blpop_immediate(parts: &[Bytes], map: &mut Map) -> RespResult {
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'blpop' command".to_string());
    }
    let keys: Vec<String> =
        parts[1..parts.len() - 1].iter().map(|k| String::from_utf8_lossy(k).into_owned()).collect();
    match try_pop_any(map, &keys) {
        Some((key, item)) => Ok(encode_array(&[Bytes::from(key), item])),
        None => Ok(encode_null_array()),
    }
}

fn parse_index(bytes: &[u8]) -> Result<i64, String> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| "ERR value is not an integer or out of range".to_string())
}
