use std::collections::HashSet;

use bytes::Bytes;
use tokio::sync::mpsc;

/// A connection's mode. `Queuing` and `Subscribed` gate which verbs the
/// dispatcher will even attempt to run; `Normal` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Queuing,
    Subscribed,
}

/// Per-connection state carried by the dispatcher across commands. Never
/// shared between connections — a session lives and dies with its socket.
pub struct Session {
    pub id: u64,
    pub db_index: usize,
    pub mode: Mode,
    pub queue: Vec<Vec<Bytes>>,
    pub queue_errored: bool,
    pub subscriptions: HashSet<String>,
    pub outbox: mpsc::Sender<Vec<u8>>,
    pub replica: Option<ReplicaHandle>,
}

/// Recorded once a session issues `PSYNC` and is promoted to a replica
/// connection on the master side.
pub struct ReplicaHandle {
    pub replica_id: String,
    pub acked_offset: u64,
}

impl Session {
    pub fn new(id: u64, outbox: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            id,
            db_index: 0,
            mode: Mode::Normal,
            queue: Vec::new(),
            queue_errored: false,
            subscriptions: HashSet::new(),
            outbox,
            replica: None,
        }
    }

    pub fn enter_queuing(&mut self) {
        self.mode = Mode::Queuing;
        self.queue.clear();
        self.queue_errored = false;
    }

    pub fn leave_queuing(&mut self) -> (Vec<Vec<Bytes>>, bool) {
        self.mode = Mode::Normal;
        let queue = std::mem::take(&mut self.queue);
        let errored = std::mem::replace(&mut self.queue_errored, false);
        (queue, errored)
    }

    pub fn enqueue(&mut self, command: Vec<Bytes>) {
        self.queue.push(command);
    }

    pub fn mark_queue_errored(&mut self) {
        self.queue_errored = true;
    }

    pub fn add_subscription(&mut self, channel: &str) -> usize {
        self.subscriptions.insert(channel.to_string());
        if self.subscriptions.is_empty() {
            self.mode = Mode::Normal;
        } else {
            self.mode = Mode::Subscribed;
        }
        self.subscriptions.len()
    }

    pub fn remove_subscription(&mut self, channel: &str) -> usize {
        self.subscriptions.remove(channel);
        if self.subscriptions.is_empty() {
            self.mode = Mode::Normal;
        }
        self.subscriptions.len()
    }
}
