//! The keyspace's startup data source. Decoding an on-disk RDB file is out
//! of scope for this crate; `SnapshotSource` is the seam a real decoder
//! would plug into. The default implementation always reports an empty
//! database, which is what a fresh master (and every replica, which gets
//! its state from the replication stream instead) needs.

use crate::keyspace::Keyspace;

pub trait SnapshotSource: Send + Sync {
    /// Populates `keyspace` from whatever this source represents. Returns
    /// `Ok(())` even when there was nothing to load.
    fn load_into(&self, keyspace: &Keyspace) -> std::io::Result<()>;
}

pub struct EmptySnapshot;

impl SnapshotSource for EmptySnapshot {
    fn load_into(&self, _keyspace: &Keyspace) -> std::io::Result<()> {
        Ok(())
    }
}
