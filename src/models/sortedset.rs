use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;

/// An `f64` wrapper that is `Ord` on the understanding that NaN is never
/// inserted (ZADD rejects it before it reaches here). `total_cmp` gives a
/// well-defined order for `inf`/`-inf` as well as ordinary floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score(pub f64);

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Members ordered by (score, member lexicographic), with an injective
/// member → score index for O(log n) point lookups.
#[derive(Default)]
pub struct SortedSet {
    by_member: HashMap<Bytes, f64>,
    by_score: BTreeSet<(Score, Bytes)>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_member.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_member.is_empty()
    }

    /// Inserts or updates `member`'s score. Returns `true` if `member` is
    /// newly added (score updates to an existing member return `false`).
    pub fn add(&mut self, member: Bytes, score: f64) -> bool {
        match self.by_member.get(&member).copied() {
            Some(old) if old == score => false,
            Some(old) => {
                self.by_score.remove(&(Score(old), member.clone()));
                self.by_score.insert((Score(score), member.clone()));
                self.by_member.insert(member, score);
                false
            }
            None => {
                self.by_score.insert((Score(score), member.clone()));
                self.by_member.insert(member, score);
                true
            }
        }
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.by_member.get(member).copied()
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.by_member.remove(member) {
            Some(score) => {
                self.by_score.remove(&(Score(score), Bytes::copy_from_slice(member)));
                true
            }
            None => false,
        }
    }

    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        self.score(member)?;
        self.by_score.iter().position(|(_, m)| m.as_ref() == member)
    }

    /// Members in ascending (score, member) order over the inclusive rank
    /// range `[start, stop]`, with negative indices normalized exactly like
    /// `LRANGE`.
    pub fn range(&self, start: i64, stop: i64) -> Vec<(Bytes, f64)> {
        let len = self.len() as i64;
        let mut start = if start < 0 { len + start } else { start };
        let mut stop = if stop < 0 { len + stop } else { stop };
        start = start.max(0);
        stop = stop.min(len - 1);
        if len == 0 || start > stop || start >= len {
            return Vec::new();
        }
        self.by_score
            .iter()
            .enumerate()
            .filter(|(i, _)| *i as i64 >= start && *i as i64 <= stop)
            .map(|(_, (score, member))| (member.clone(), score.0))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, f64)> {
        self.by_score.iter().map(|(score, member)| (member, score.0))
    }
}
