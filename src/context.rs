use std::sync::atomic::{AtomicU64, Ordering};

use crate::blocker::Blocker;
use crate::config::Config;
use crate::keyspace::Keyspace;
use crate::models::{ReplicationInfo, Role, ServerInfo};
use crate::pubsub::PubSub;
use crate::replication::ReplicaRegistry;
use crate::snapshot::{EmptySnapshot, SnapshotSource};

/// The process-wide state every connection task shares, reached through an
/// explicit `Arc<Context>` parameter rather than ambient globals.
pub struct Context {
    pub keyspace: Keyspace,
    pub blocker: Blocker,
    pub pubsub: PubSub,
    pub replicas: ReplicaRegistry,
    pub server_info: ServerInfo,
    pub config: Config,
    next_session_id: AtomicU64,
}

impl Context {
    pub fn new(config: Config) -> Self {
        let role = if config.replicaof.is_some() { Role::Slave } else { Role::Master };
        let context = Self {
            keyspace: Keyspace::new(),
            blocker: Blocker::new(),
            pubsub: PubSub::new(),
            replicas: ReplicaRegistry::new(),
            server_info: ServerInfo { replication_info: ReplicationInfo::new(role) },
            config,
            next_session_id: AtomicU64::new(1),
        };
        let _ = EmptySnapshot.load_into(&context.keyspace);
        context
    }

    pub fn next_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn is_replica(&self) -> bool {
        self.server_info.replication_info.role == Role::Slave
    }
}
