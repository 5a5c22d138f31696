use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::RedisValue;
use crate::utils::glob::glob_match;

/// The plain map type every command's locked-critical-section body operates
/// on. A bare alias rather than a newtype: handlers need `HashMap`'s own
/// `entry`/`remove`/`get_mut` vocabulary, not a wrapper around it.
pub type Map = HashMap<String, RedisValue>;

/// The process-wide keyspace: one mutex-guarded map from key to tagged
/// value. Command handlers lock it for the span of one command (or, for
/// `EXEC`, one whole transaction) and never hold the guard across an
/// `.await`.
#[derive(Default)]
pub struct Keyspace {
    inner: Mutex<HashMap<String, RedisValue>>,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, HashMap<String, RedisValue>> {
        self.inner.lock().unwrap()
    }
}

/// Returns the live (non-expired) value at `key`, lazily deleting it if its
/// expire-at has passed. Centralizes the "check expiry, delete, re-check"
/// dance every read-path command needs.
pub fn get_live<'a>(map: &'a mut HashMap<String, RedisValue>, key: &str) -> Option<&'a RedisValue> {
    if map.get(key).is_some_and(RedisValue::is_expired) {
        map.remove(key);
        return None;
    }
    map.get(key)
}

pub fn get_live_mut<'a>(map: &'a mut HashMap<String, RedisValue>, key: &str) -> Option<&'a mut RedisValue> {
    if map.get(key).is_some_and(RedisValue::is_expired) {
        map.remove(key);
        return None;
    }
    map.get_mut(key)
}

/// Keys matching `pattern` (standard Redis glob grammar), skipping and
/// lazily deleting any that have expired.
pub fn keys_matching(map: &mut HashMap<String, RedisValue>, pattern: &[u8]) -> Vec<String> {
    let expired: Vec<String> = map
        .iter()
        .filter(|(_, v)| v.is_expired())
        .map(|(k, _)| k.clone())
        .collect();
    for key in expired {
        map.remove(&key);
    }
    map.keys().filter(|k| glob_match(pattern, k.as_bytes())).cloned().collect()
}
