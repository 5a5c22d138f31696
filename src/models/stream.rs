use std::fmt;

use bytes::Bytes;

/// A stream entry ID: two unsigned integers ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId { ms: u64::MAX, seq: u64::MAX };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(Bytes, Bytes)>,
}

#[derive(Default)]
pub struct Stream {
    pub entries: Vec<StreamEntry>,
    pub last_id: StreamId,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: StreamId, fields: Vec<(Bytes, Bytes)>) {
        self.last_id = id;
        self.entries.push(StreamEntry { id, fields });
    }

    pub fn range(&self, low: StreamId, high: StreamId) -> Vec<&StreamEntry> {
        self.entries.iter().filter(|e| e.id >= low && e.id <= high).collect()
    }

    pub fn after(&self, floor: StreamId) -> Vec<&StreamEntry> {
        self.entries.iter().filter(|e| e.id > floor).collect()
    }
}
