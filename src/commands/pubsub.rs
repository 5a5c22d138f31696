use bytes::Bytes;

use crate::pubsub::{subscription_ack, PubSub};
use crate::session::Session;
use crate::utils::encoder::*;

pub fn process_subscribe(parts: &[Bytes], pubsub: &PubSub, session: &mut Session) -> RespResult {
    // parts[0] = "SUBSCRIBE", parts[1..] = channels
    if parts.len() < 2 {
        return Err("ERR wrong number of arguments for 'subscribe' command".to_string());
    }
    let mut reply = Vec::new();
    for channel_bytes in &parts[1..] {
        let channel = String::from_utf8_lossy(channel_bytes).into_owned();
        pubsub.subscribe(&channel, session.id, session.outbox.clone());
        let count = session.add_subscription(&channel);
        reply.extend(subscription_ack("subscribe", &channel, count));
    }
    Ok(reply)
}

pub fn process_unsubscribe(parts: &[Bytes], pubsub: &PubSub, session: &mut Session) -> RespResult {
    // parts[0] = "UNSUBSCRIBE", parts[1..] = channels (all, if omitted)
    let channels: Vec<String> = if parts.len() > 1 {
        parts[1..].iter().map(|c| String::from_utf8_lossy(c).into_owned()).collect()
    } else {
        session.subscriptions.iter().cloned().collect()
    };

    if channels.is_empty() {
        return Ok(subscription_ack("unsubscribe", "", 0));
    }

    let mut reply = Vec::new();
    for channel in channels {
        pubsub.unsubscribe(&channel, session.id);
        let count = session.remove_subscription(&channel);
        reply.extend(subscription_ack("unsubscribe", &channel, count));
    }
    Ok(reply)
}

pub fn process_publish(parts: &[Bytes], pubsub: &PubSub) -> RespResult {
    // parts[0] = "PUBLISH", parts[1] = channel, parts[2] = message
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'publish' command".to_string());
    }
    let channel = String::from_utf8_lossy(&parts[1]).into_owned();
    let delivered = pubsub.publish(&channel, &parts[2]);
    Ok(encode_integer(delivered as i64))
}
