use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use tokio::sync::mpsc;

/// What a waiter receives when woken: the key that satisfied it (list
/// pushes hand off a value inline; stream wakes carry no payload, since the
/// waiter re-reads the stream itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wake {
    pub key: String,
    pub value: Bytes,
}

struct Waiter {
    token: u64,
    tx: mpsc::Sender<Wake>,
}

/// Park-set for `BLPOP` and `XREAD BLOCK`. A parked session registers one
/// waiter (sharing a single token and channel) under every key it's
/// blocking on; the mutating command (LPUSH/RPUSH/XADD), while still
/// holding the keyspace lock, hands off a value to the first waiter in
/// FIFO order (lists) or wakes every waiter so it can retry its own read
/// (streams). Once a waiter wakes on one key, its entries on every other
/// key it registered are dropped so it can never be woken twice.
#[derive(Default)]
pub struct Blocker {
    waiters: Mutex<HashMap<String, VecDeque<Waiter>>>,
    next_token: AtomicU64,
}

impl Blocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh waiter on every key in `keys`, returning the
    /// receiving half the caller awaits (with an optional deadline) and the
    /// token identifying this registration for later cleanup.
    pub fn register(&self, keys: &[String]) -> (u64, mpsc::Receiver<Wake>) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(1);
        let mut waiters = self.waiters.lock().unwrap();
        for key in keys {
            waiters.entry(key.clone()).or_default().push_back(Waiter { token, tx: tx.clone() });
        }
        (token, rx)
    }

    /// Removes every queued entry for `token` across `keys` — called once a
    /// waiter has woken (or timed out) so a later push on a different key
    /// it was also parked on can't hand it a second, unobserved value.
    pub fn unregister(&self, keys: &[String], token: u64) {
        let mut waiters = self.waiters.lock().unwrap();
        for key in keys {
            if let Some(queue) = waiters.get_mut(key) {
                queue.retain(|w| w.token != token);
            }
        }
    }

    /// Hands `value` directly to the first live waiter on `key`, bypassing
    /// the list entirely (the element is never observably stored). Returns
    /// the value back if no waiter accepted it, so the caller can store it
    /// normally.
    pub fn try_handoff(&self, key: &str, value: Bytes) -> Option<Bytes> {
        let mut waiters = self.waiters.lock().unwrap();
        let Some(queue) = waiters.get_mut(key) else {
            return Some(value);
        };
        let mut value = Some(value);
        while let Some(waiter) = queue.front() {
            let Some(v) = value.take() else { break };
            match waiter.tx.try_send(Wake { key: key.to_string(), value: v }) {
                Ok(()) => {
                    queue.pop_front();
                    return None;
                }
                Err(mpsc::error::TrySendError::Full(wake)) | Err(mpsc::error::TrySendError::Closed(wake)) => {
                    queue.pop_front();
                    value = Some(wake.value);
                }
            }
        }
        value
    }

    /// Wakes every waiter currently parked on `key` with an empty signal —
    /// used by XADD, where the waiter re-reads the stream itself rather
    /// than receiving the new entry inline.
    pub fn notify_all(&self, key: &str) {
        let mut waiters = self.waiters.lock().unwrap();
        if let Some(queue) = waiters.get_mut(key) {
            while let Some(waiter) = queue.pop_front() {
                let _ = waiter.tx.try_send(Wake { key: key.to_string(), value: Bytes::new() });
            }
        }
    }

}
