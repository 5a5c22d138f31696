use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;

use redis_cache::keyspace::{get_live, get_live_mut, keys_matching};
use redis_cache::models::{RedisData, RedisValue};

#[test]
fn get_live_deletes_expired_row() {
    let mut map = HashMap::new();
    map.insert(
        "k".to_string(),
        RedisValue::new(RedisData::String(Bytes::from("v")), Some(Instant::now() - Duration::from_secs(1))),
    );
    assert!(get_live(&mut map, "k").is_none());
    assert!(!map.contains_key("k"));
}

#[test]
fn get_live_returns_a_row_that_has_not_expired() {
    let mut map = HashMap::new();
    map.insert("k".to_string(), RedisValue::new(RedisData::String(Bytes::from("v")), None));
    assert!(get_live(&mut map, "k").is_some());
}

#[test]
fn get_live_mut_deletes_expired_row_too() {
    let mut map = HashMap::new();
    map.insert(
        "k".to_string(),
        RedisValue::new(RedisData::String(Bytes::from("v")), Some(Instant::now() - Duration::from_secs(1))),
    );
    assert!(get_live_mut(&mut map, "k").is_none());
    assert!(!map.contains_key("k"));
}

#[test]
fn keys_matching_filters_by_glob_and_drops_expired() {
    let mut map = HashMap::new();
    map.insert("foo".to_string(), RedisValue::new(RedisData::String(Bytes::from("1")), None));
    map.insert("bar".to_string(), RedisValue::new(RedisData::String(Bytes::from("1")), None));
    map.insert(
        "foe".to_string(),
        RedisValue::new(RedisData::String(Bytes::from("1")), Some(Instant::now() - Duration::from_secs(1))),
    );
    let mut found = keys_matching(&mut map, b"fo*");
    found.sort();
    assert_eq!(found, vec!["foo".to_string()]);
    assert!(!map.contains_key("foe"));
}
