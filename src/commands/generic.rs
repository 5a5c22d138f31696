use bytes::Bytes;

use crate::config::Config;
use crate::keyspace::{get_live, keys_matching, Map};
use crate::utils::encoder::*;

pub fn process_ping() -> RespResult {
    Ok(encode_simple_string("PONG"))
}

pub fn process_echo(parts: &[Bytes]) -> RespResult {
    // parts[0] = "ECHO", parts[1] = message
    if parts.len() < 2 {
        return Err("ERR wrong number of arguments for 'echo' command".to_string());
    }
    Ok(encode_bulk_string(parts[1].clone()))
}

pub fn process_type(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "TYPE", parts[1] = key
    if parts.len() < 2 {
        return Err("ERR wrong number of arguments for 'type' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    match get_live(map, &key) {
        Some(value) => Ok(encode_simple_string(value.data.type_name())),
        None => Ok(encode_simple_string("none")),
    }
}

pub fn process_keys(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "KEYS", parts[1] = pattern
    if parts.len() < 2 {
        return Err("ERR wrong number of arguments for 'keys' command".to_string());
    }
    let matches = keys_matching(map, &parts[1]);
    Ok(encode_array(&matches.into_iter().map(Bytes::from).collect::<Vec<_>>()))
}

/// `CONFIG GET <param>`. Only `dir` and `dbfilename` are recognized; an
/// unknown parameter returns an empty array rather than an error.
pub fn process_config_get(parts: &[Bytes], config: &Config) -> RespResult {
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'config|get' command".to_string());
    }
    let name = String::from_utf8_lossy(&parts[2]).into_owned();
    match config.get(&name) {
        Some(value) => Ok(encode_array(&[Bytes::from(name), Bytes::from(value.to_string())])),
        None => Ok(encode_array(&[])),
    }
}
