use bytes::Bytes;

use crate::keyspace::{get_live, get_live_mut, Map};
use crate::models::{RedisData, RedisValue, SortedSet};
use crate::utils::encoder::*;

pub fn process_zadd(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "ZADD", parts[1] = key, then (score, member) pairs
    if parts.len() < 4 || parts.len() % 2 != 0 {
        return Err("ERR wrong number of arguments for 'zadd' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let pairs: Vec<(f64, Bytes)> = parts[2..]
        .chunks_exact(2)
        .map(|c| {
            let score = parse_score(&c[0])?;
            Ok((score, c[1].clone()))
        })
        .collect::<Result<_, String>>()?;

    let entry = map.entry(key).or_insert_with(|| RedisValue::new(RedisData::SortedSet(SortedSet::new()), None));
    match &mut entry.data {
        RedisData::SortedSet(set) => {
            let added = pairs.into_iter().filter(|(score, member)| set.add(member.clone(), *score)).count();
            Ok(encode_integer(added as i64))
        }
        _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
    }
}

pub fn process_zscore(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "ZSCORE", parts[1] = key, parts[2] = member
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'zscore' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::SortedSet(set) => match set.score(&parts[2]) {
                Some(score) => Ok(encode_bulk_string(format_score(score))),
                None => Ok(encode_null_string()),
            },
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_null_string()),
    }
}

pub fn process_zrank(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "ZRANK", parts[1] = key, parts[2] = member
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'zrank' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::SortedSet(set) => match set.rank(&parts[2]) {
                Some(rank) => Ok(encode_integer(rank as i64)),
                None => Ok(encode_null_string()),
            },
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_null_string()),
    }
}

pub fn process_zrange(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "ZRANGE", parts[1] = key, parts[2] = start, parts[3] = stop, [parts[4] = WITHSCORES]
    if parts.len() < 4 {
        return Err("ERR wrong number of arguments for 'zrange' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let start = parse_index(&parts[2])?;
    let stop = parse_index(&parts[3])?;
    let with_scores = parts.get(4).is_some_and(|p| p.eq_ignore_ascii_case(b"WITHSCORES"));

    match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::SortedSet(set) => {
                let members = set.range(start, stop);
                if with_scores {
                    let flat: Vec<Bytes> =
                        members.into_iter().flat_map(|(m, s)| [m, Bytes::from(format_score(s))]).collect();
                    Ok(encode_array(&flat))
                } else {
                    let flat: Vec<Bytes> = members.into_iter().map(|(m, _)| m).collect();
                    Ok(encode_array(&flat))
                }
            }
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_array(&[])),
    }
}

pub fn process_zrem(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "ZREM", parts[1] = key, parts[2..] = members
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'zrem' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let mut should_remove = false;

    let response = match get_live_mut(map, &key) {
        Some(value) => match &mut value.data {
            RedisData::SortedSet(set) => {
                let removed = parts[2..].iter().filter(|m| set.remove(m)).count();
                if set.is_empty() {
                    should_remove = true;
                }
                Ok(encode_integer(removed as i64))
            }
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_integer(0)),
    };

    if should_remove {
        map.remove(&key);
    }
    response
}

pub fn process_zcard(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "ZCARD", parts[1] = key
    if parts.len() < 2 {
        return Err("ERR wrong number of arguments for 'zcard' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::SortedSet(set) => Ok(encode_integer(set.len() as i64)),
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_integer(0)),
    }
}

/// Accepts any finite float plus `inf`/`-inf`/`+inf` (any case); `nan` is
/// rejected since it can't be placed in the score ordering.
fn parse_score(bytes: &[u8]) -> Result<f64, String> {
    let score: f64 = std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| "ERR value is not a valid float".to_string())?;
    if score.is_nan() {
        return Err("ERR value is not a valid float".to_string());
    }
    Ok(score)
}

fn parse_index(bytes: &[u8]) -> Result<i64, String> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| "ERR value is not an integer or out of range".to_string())
}

/// Redis formats scores as the shortest decimal that round-trips, with no
/// trailing `.0` on whole numbers — exactly what `f64`'s `Display` gives us.
fn format_score(score: f64) -> String {
    format!("{score}")
}
