use std::collections::VecDeque;
use std::time::Instant;

use bytes::Bytes;

use super::sortedset::SortedSet;
use super::stream::Stream;

/// The tagged shape a key's row can take. A command handler matches on this
/// and rejects a mismatch with `WRONGTYPE` rather than coercing between
/// shapes.
pub enum RedisData {
    String(Bytes),
    List(VecDeque<Bytes>),
    Stream(Stream),
    SortedSet(SortedSet),
}

impl RedisData {
    pub fn type_name(&self) -> &'static str {
        match self {
            RedisData::String(_) => "string",
            RedisData::List(_) => "list",
            RedisData::Stream(_) => "stream",
            RedisData::SortedSet(_) => "zset",
        }
    }
}

pub struct RedisValue {
    pub data: RedisData,
    pub expires_at: Option<Instant>, // None means it never expires
}

impl RedisValue {
    pub fn new(data: RedisData, expires_at: Option<Instant>) -> Self {
        Self { data, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(deadline) if Instant::now() > deadline)
    }
}
