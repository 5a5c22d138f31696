use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;
use tokio::sync::{mpsc, Notify};

use crate::utils::resp::Frame;

struct ReplicaEntry {
    outbox: mpsc::Sender<Vec<u8>>,
    acked_offset: u64,
}

/// Master-side bookkeeping: one entry per connection that completed PSYNC.
/// `propagate` fans a write command out to every registered replica and
/// advances the shared repl-offset by the frame's encoded length; `WAIT`
/// polls `acked_offset` against a target via the shared `Notify`.
#[derive(Default)]
pub struct ReplicaRegistry {
    replicas: Mutex<HashMap<u64, ReplicaEntry>>,
    ack_notify: Notify,
}

impl ReplicaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, session_id: u64, outbox: mpsc::Sender<Vec<u8>>) {
        self.replicas.lock().unwrap().insert(session_id, ReplicaEntry { outbox, acked_offset: 0 });
    }

    pub fn remove(&self, session_id: u64) {
        self.replicas.lock().unwrap().remove(&session_id);
    }

    pub fn count(&self) -> usize {
        self.replicas.lock().unwrap().len()
    }

    /// Serializes `parts` as a RESP command array and appends it to every
    /// replica's outbox. Returns the frame's byte length, which the caller
    /// adds to the master's repl-offset.
    pub fn propagate(&self, parts: &[Bytes]) -> u64 {
        let frame = Frame::command(parts).encode();
        let replicas = self.replicas.lock().unwrap();
        for entry in replicas.values() {
            let _ = entry.outbox.try_send(frame.clone());
        }
        frame.len() as u64
    }

    /// Sends `REPLCONF GETACK *` to every replica.
    pub fn request_acks(&self) {
        let frame = Frame::command(&[Bytes::from("REPLCONF"), Bytes::from("GETACK"), Bytes::from("*")]).encode();
        let replicas = self.replicas.lock().unwrap();
        for entry in replicas.values() {
            let _ = entry.outbox.try_send(frame.clone());
        }
    }

    pub fn record_ack(&self, session_id: u64, offset: u64) {
        let mut replicas = self.replicas.lock().unwrap();
        if let Some(entry) = replicas.get_mut(&session_id) {
            entry.acked_offset = entry.acked_offset.max(offset);
        }
        drop(replicas);
        self.ack_notify.notify_waiters();
    }

    pub fn count_acked_at_least(&self, target: u64) -> usize {
        self.replicas.lock().unwrap().values().filter(|e| e.acked_offset >= target).count()
    }

    /// Blocks until at least `numreplicas` replicas have acked `target`, or
    /// `timeout` elapses (`None` means forever). Returns the final count.
    pub async fn wait_for_acks(&self, target: u64, numreplicas: usize, timeout: Option<std::time::Duration>) -> usize {
        let deadline = timeout.map(|d| tokio::time::Instant::now() + d);
        loop {
            let acked = self.count_acked_at_least(target);
            if acked >= numreplicas {
                return acked;
            }
            let notified = self.ack_notify.notified();
            match deadline {
                Some(deadline) => {
                    let now = tokio::time::Instant::now();
                    if now >= deadline {
                        return self.count_acked_at_least(target);
                    }
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return self.count_acked_at_least(target);
                    }
                }
                None => notified.await,
            }
        }
    }
}
