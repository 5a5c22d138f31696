use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::utils::encoder::encode_raw_array;

/// Channel → subscribers, in subscription order. PUBLISH enqueues to each
/// subscriber's outbox under the same lock the keyspace uses for writes,
/// so a publish is linearized against concurrent writes; the actual socket
/// write happens later, off the lock, in the session's writer task.
#[derive(Default)]
pub struct PubSub {
    channels: Mutex<HashMap<String, Vec<(u64, mpsc::Sender<Vec<u8>>)>>>,
}

impl PubSub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `session_id` to `channel`, returning the session's total
    /// subscription count after this call.
    pub fn subscribe(&self, channel: &str, session_id: u64, outbox: mpsc::Sender<Vec<u8>>) {
        let mut channels = self.channels.lock().unwrap();
        let subs = channels.entry(channel.to_string()).or_default();
        if !subs.iter().any(|(id, _)| *id == session_id) {
            subs.push((session_id, outbox));
        }
    }

    /// Unsubscribes `session_id` from `channel`. Returns `true` if it was
    /// subscribed.
    pub fn unsubscribe(&self, channel: &str, session_id: u64) -> bool {
        let mut channels = self.channels.lock().unwrap();
        let Some(subs) = channels.get_mut(channel) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|(id, _)| *id != session_id);
        if subs.is_empty() {
            channels.remove(channel);
        }
        subs.len() != before
    }

    /// Drops every subscription held by `session_id` (client disconnect).
    pub fn drop_session(&self, session_id: u64) {
        let mut channels = self.channels.lock().unwrap();
        channels.retain(|_, subs| {
            subs.retain(|(id, _)| *id != session_id);
            !subs.is_empty()
        });
    }

    /// Publishes `payload` to every current subscriber of `channel`, in
    /// subscription order. Returns the subscriber count, per PUBLISH's
    /// reply contract — not the number of deliveries that actually
    /// succeeded. A subscriber whose outbox is full (e.g. parked in BLPOP
    /// or WAIT behind a backlog) simply misses the message; that
    /// backpressure outcome is not folded into the reply value.
    pub fn publish(&self, channel: &str, payload: &[u8]) -> usize {
        let channels = self.channels.lock().unwrap();
        let Some(subs) = channels.get(channel) else {
            return 0;
        };
        let frame = encode_raw_array(vec![
            crate::utils::encoder::encode_bulk_string(&b"message"[..]),
            crate::utils::encoder::encode_bulk_string(channel.as_bytes().to_vec()),
            crate::utils::encoder::encode_bulk_string(payload.to_vec()),
        ]);
        for (_, tx) in subs {
            let _ = tx.try_send(frame.clone());
        }
        subs.len()
    }

    pub fn subscription_count(&self, session_id: u64) -> usize {
        let channels = self.channels.lock().unwrap();
        channels.values().filter(|subs| subs.iter().any(|(id, _)| *id == session_id)).count()
    }
}

/// Builds the `["subscribe"|"unsubscribe", channel, count]` reply frame.
pub fn subscription_ack(verb: &str, channel: &str, count: usize) -> Vec<u8> {
    encode_raw_array(vec![
        crate::utils::encoder::encode_bulk_string(verb.as_bytes().to_vec()),
        crate::utils::encoder::encode_bulk_string(channel.as_bytes().to_vec()),
        crate::utils::encoder::encode_integer(count as i64),
    ])
}
