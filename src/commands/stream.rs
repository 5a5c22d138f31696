use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::blocker::Blocker;
use crate::keyspace::{get_live, get_live_mut, Keyspace, Map};
use crate::models::{RedisData, RedisValue, Stream, StreamEntry, StreamId};
use crate::utils::encoder::*;

pub fn process_xadd(parts: &[Bytes], map: &mut Map, blocker: &Blocker) -> RespResult {
    // parts[0] = "XADD", parts[1] = key, parts[2] = id, parts[3..] = field value pairs
    if parts.len() < 5 || parts.len() % 2 != 1 {
        return Err("ERR wrong number of arguments for 'xadd' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let id_spec = std::str::from_utf8(&parts[2]).map_err(|_| "ERR Invalid stream ID specified as stream command argument".to_string())?;
    let fields: Vec<(Bytes, Bytes)> = parts[3..].chunks_exact(2).map(|c| (c[0].clone(), c[1].clone())).collect();

    let entry = map.entry(key.clone()).or_insert_with(|| RedisValue::new(RedisData::Stream(Stream::new()), None));

    match &mut entry.data {
        RedisData::Stream(stream) => {
            let id = resolve_stream_id(id_spec, stream.last_id)?;
            if id <= stream.last_id && (stream.last_id != StreamId::ZERO || !stream.entries.is_empty()) {
                return Err("ERR The ID specified in XADD is equal or smaller than the target stream top item".to_string());
            }
            if id == StreamId::ZERO {
                return Err("ERR The ID specified in XADD must be greater than 0-0".to_string());
            }
            stream.push(id, fields);
            blocker.notify_all(&key);
            Ok(encode_bulk_string(id.to_string()))
        }
        _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
    }
}

pub fn process_xrange(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "XRANGE", parts[1] = key, parts[2] = start, parts[3] = end
    if parts.len() < 4 {
        return Err("ERR wrong number of arguments for 'xrange' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let low = parse_range_bound(&parts[2], StreamId::MIN)?;
    let high = parse_range_bound(&parts[3], StreamId::MAX)?;

    match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::Stream(stream) => {
                let entries: Vec<Vec<u8>> = stream.range(low, high).into_iter().map(encode_stream_entry).collect();
                Ok(encode_raw_array(entries))
            }
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_array(&[])),
    }
}

pub async fn process_xread(parts: &[Bytes], keyspace: &Keyspace, blocker: &Blocker) -> RespResult {
    // parts[0] = "XREAD", [BLOCK ms], "STREAMS", keys..., ids...
    let streams_idx = parts
        .iter()
        .position(|p| p.eq_ignore_ascii_case(b"STREAMS"))
        .ok_or_else(|| "ERR syntax error".to_string())?;

    let block_ms: Option<u64> = parts
        .iter()
        .position(|p| p.eq_ignore_ascii_case(b"BLOCK"))
        .and_then(|idx| parts.get(idx + 1))
        .and_then(|v| std::str::from_utf8(v).ok())
        .and_then(|s| s.parse().ok());

    let remaining = &parts[streams_idx + 1..];
    if remaining.is_empty() || remaining.len() % 2 != 0 {
        return Err("ERR Unbalanced XREAD list of streams: for each stream key an ID or '$' must be specified.".to_string());
    }
    let num_streams = remaining.len() / 2;
    let keys: Vec<String> = remaining[..num_streams].iter().map(|k| String::from_utf8_lossy(k).into_owned()).collect();
    let raw_ids = &remaining[num_streams..];

    let floors = resolve_floors(&keys, raw_ids, &mut keyspace.lock())?;

    let mut result = read_since(&keys, &floors, &mut keyspace.lock());
    if !result.is_empty() {
        return Ok(encode_raw_array(result));
    }

    if let Some(timeout_ms) = block_ms {
        let (token, mut rx) = blocker.register(&keys);
        if timeout_ms > 0 {
            let duration = tokio::time::Duration::from_millis(timeout_ms);
            let _ = tokio::time::timeout(duration, rx.recv()).await;
        } else {
            rx.recv().await;
        }
        blocker.unregister(&keys, token);
        result = read_since(&keys, &floors, &mut keyspace.lock());
    }

    if result.is_empty() {
        Ok(encode_null_array())
    } else {
        Ok(encode_raw_array(result))
    }
}

/// `XREAD` as run from inside `EXEC`: `BLOCK` is accepted syntactically but
/// never actually parks (a transaction never blocks) — this is the same
/// single non-blocking attempt `process_xread` makes before it would park.
pub fn process_xread_immediate(parts: &[Bytes], map: &mut Map) -> RespResult {
    let streams_idx =
        parts.iter().position(|p| p.eq_ignore_ascii_case(b"STREAMS")).ok_or_else(|| "ERR syntax error".to_string())?;
    let remaining = &parts[streams_idx + 1..];
    if remaining.is_empty() || remaining.len() % 2 != 0 {
        return Err("ERR Unbalanced XREAD list of streams: for each stream key an ID or '$' must be specified.".to_string());
    }
    let num_streams = remaining.len() / 2;
    let keys: Vec<String> = remaining[..num_streams].iter().map(|k| String::from_utf8_lossy(k).into_owned()).collect();
    let raw_ids = &remaining[num_streams..];

    let floors = resolve_floors(&keys, raw_ids, map)?;
    let result = read_since(&keys, &floors, map);
    if result.is_empty() {
        Ok(encode_null_array())
    } else {
        Ok(encode_raw_array(result))
    }
}

fn resolve_floors(keys: &[String], raw_ids: &[Bytes], map: &mut Map) -> Result<Vec<StreamId>, String> {
    keys.iter()
        .zip(raw_ids)
        .map(|(key, raw)| {
            if raw.as_ref() == b"$" {
                Ok(match get_live(map, key) {
                    Some(RedisValue { data: RedisData::Stream(stream), .. }) => stream.last_id,
                    _ => StreamId::ZERO,
                })
            } else {
                parse_range_bound(raw, StreamId::MIN)
            }
        })
        .collect()
}

fn read_since(keys: &[String], floors: &[StreamId], map: &mut Map) -> Vec<Vec<u8>> {
    let mut result = Vec::new();
    for (key, floor) in keys.iter().zip(floors) {
        if let Some(RedisValue { data: RedisData::Stream(stream), .. }) = get_live(map, key) {
            let entries = stream.after(*floor);
            if !entries.is_empty() {
                let encoded: Vec<Vec<u8>> = entries.into_iter().map(encode_stream_entry).collect();
                result.push(encode_raw_array(vec![encode_bulk_string(key.clone()), encode_raw_array(encoded)]));
            }
        }
    }
    result
}

fn encode_stream_entry(entry: &StreamEntry) -> Vec<u8> {
    let field_pairs: Vec<Bytes> = entry.fields.iter().flat_map(|(f, v)| [f.clone(), v.clone()]).collect();
    encode_raw_array(vec![encode_bulk_string(entry.id.to_string()), encode_array(&field_pairs)])
}

/// Resolves an XADD ID argument against the stream's current last ID.
/// `*` auto-generates `now_ms-0` (or `now_ms-seq+1` if another entry already
/// claimed that millisecond); `ms-*` auto-generates the next sequence number
/// within that millisecond.
fn resolve_stream_id(spec: &str, last: StreamId) -> Result<StreamId, String> {
    if spec == "*" {
        let ms = now_ms().max(last.ms);
        let seq = if ms == last.ms { last.seq + 1 } else { 0 };
        return Ok(StreamId::new(ms, seq));
    }
    let (ms_part, seq_part) = spec.split_once('-').ok_or_else(invalid_id)?;
    let ms: u64 = ms_part.parse().map_err(|_| invalid_id())?;
    if seq_part == "*" {
        let seq = if ms == last.ms { last.seq + 1 } else if ms == 0 { 1 } else { 0 };
        Ok(StreamId::new(ms, seq))
    } else {
        let seq: u64 = seq_part.parse().map_err(|_| invalid_id())?;
        Ok(StreamId::new(ms, seq))
    }
}

fn parse_range_bound(raw: &[u8], default: StreamId) -> Result<StreamId, String> {
    match raw {
        b"-" => Ok(StreamId::MIN),
        b"+" => Ok(StreamId::MAX),
        _ => {
            let s = std::str::from_utf8(raw).map_err(|_| invalid_id())?;
            match s.split_once('-') {
                Some((ms, seq)) => Ok(StreamId::new(ms.parse().map_err(|_| invalid_id())?, seq.parse().map_err(|_| invalid_id())?)),
                None => {
                    let ms: u64 = s.parse().map_err(|_| invalid_id())?;
                    Ok(StreamId::new(ms, if default == StreamId::MAX { u64::MAX } else { 0 }))
                }
            }
        }
    }
}

fn invalid_id() -> String {
    "ERR Invalid stream ID specified as stream command argument".to_string()
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("clock before epoch").as_millis() as u64
}
