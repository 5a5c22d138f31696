//! Routes one parsed command array to its handler, consulting and mutating
//! the session's mode as it goes. `dispatch` is the single entry point both
//! the per-connection reader task and (for applying the replication stream)
//! the replica client call into.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::commands::*;
use crate::context::Context;
use crate::keyspace::Map;
use crate::models::ListDir;
use crate::session::{Mode, Session};
use crate::utils::encoder::*;

/// Command verbs permitted while a session is in subscribed mode.
const SUBSCRIBED_ALLOWED: &[&str] = &["SUBSCRIBE", "UNSUBSCRIBE", "PING", "QUIT"];

/// Verbs that mutate the keyspace and are therefore propagated to replicas
/// once applied on a master. Read-only and control commands are never
/// propagated.
const WRITE_VERBS: &[&str] = &[
    "SET", "INCR", "RPUSH", "LPUSH", "LPOP", "RPOP", "XADD", "ZADD", "ZREM", "GEOADD",
];

/// Dispatches `parts` against `ctx`/`session`. `from_master` is `true` only
/// when a replica's apply loop is replaying the replication stream: it
/// skips the replica's own read-only gate and never re-propagates.
pub fn dispatch<'a>(
    ctx: &'a Context,
    session: &'a mut Session,
    parts: &'a [Bytes],
    from_master: bool,
) -> Pin<Box<dyn Future<Output = Vec<u8>> + Send + 'a>> {
    Box::pin(async move {
        if parts.is_empty() {
            return Vec::new();
        }
        let verb = String::from_utf8_lossy(&parts[0]).to_uppercase();

        if session.mode == Mode::Subscribed && !SUBSCRIBED_ALLOWED.contains(&verb.as_str()) {
            return render(Err(format!(
                "ERR Can't execute '{}': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT are allowed in this context",
                verb.to_lowercase()
            )));
        }

        if session.mode == Mode::Queuing && verb != "EXEC" && verb != "DISCARD" && verb != "MULTI" {
            if !known_verb(&verb) {
                session.mark_queue_errored();
                return render(Err(format!("ERR unknown command '{verb}'")));
            }
            if parts.len() < min_arity(&verb) {
                session.mark_queue_errored();
                return render(Err(format!("ERR wrong number of arguments for '{}' command", verb.to_lowercase())));
            }
            session.enqueue(parts.to_vec());
            return encode_simple_string("QUEUED");
        }

        match verb.as_str() {
            "MULTI" => {
                if session.mode == Mode::Queuing {
                    return render(Err("ERR MULTI calls can not be nested".to_string()));
                }
                session.enter_queuing();
                encode_simple_string("OK")
            }
            "DISCARD" => {
                if session.mode != Mode::Queuing {
                    return render(Err("ERR DISCARD without MULTI".to_string()));
                }
                session.leave_queuing();
                encode_simple_string("OK")
            }
            "EXEC" => {
                if session.mode != Mode::Queuing {
                    return render(Err("ERR EXEC without MULTI".to_string()));
                }
                let (queue, errored) = session.leave_queuing();
                if errored {
                    return render(Err("EXECABORT Transaction discarded because of previous errors.".to_string()));
                }
                encode_raw_array(run_transaction(ctx, session, &queue, from_master))
            }
            "REPLCONF" if parts.len() >= 3 && parts[1].eq_ignore_ascii_case(b"ACK") => {
                if let Some(offset) = std::str::from_utf8(&parts[2]).ok().and_then(|s| s.parse().ok()) {
                    ctx.replicas.record_ack(session.id, offset);
                }
                Vec::new()
            }
            "PSYNC" => {
                ctx.replicas.register(session.id, session.outbox.clone());
                process_psync(parts, ctx)
            }
            _ => {
                let result = run(ctx, session, &verb, parts, from_master).await;
                let should_propagate =
                    !from_master && !ctx.is_replica() && result.is_ok() && WRITE_VERBS.contains(&verb.as_str());
                let bytes = render(result);
                if should_propagate {
                    let len = ctx.replicas.propagate(parts);
                    ctx.server_info.replication_info.advance_offset(len);
                }
                bytes
            }
        }
    })
}

/// Runs every queued command of a successful `EXEC` under a single
/// acquisition of the keyspace mutex, so the whole transaction is one
/// linearization point: no other connection's write can land between two
/// commands of this batch. None of the queueable verbs need to suspend the
/// session here — `BLPOP`/`XREAD BLOCK` fall back to a single non-blocking
/// attempt, matching real Redis's "blocking commands don't block inside a
/// transaction" behavior, since parking while holding the keyspace mutex
/// would stall every other connection.
fn run_transaction(ctx: &Context, session: &mut Session, queue: &[Vec<Bytes>], from_master: bool) -> Vec<Vec<u8>> {
    let mut map = ctx.keyspace.lock();
    let mut replies = Vec::with_capacity(queue.len());
    for command in queue {
        if command.is_empty() {
            replies.push(Vec::new());
            continue;
        }
        let verb = String::from_utf8_lossy(&command[0]).to_uppercase();
        let result = run_locked(ctx, session, &verb, command, &mut map, from_master);
        let should_propagate =
            !from_master && !ctx.is_replica() && result.is_ok() && WRITE_VERBS.contains(&verb.as_str());
        replies.push(render(result));
        if should_propagate {
            let len = ctx.replicas.propagate(command);
            ctx.server_info.replication_info.advance_offset(len);
        }
    }
    replies
}

fn render(result: RespResult) -> Vec<u8> {
    match result {
        Ok(bytes) => bytes,
        Err(message) => encode_error(&message),
    }
}

fn known_verb(verb: &str) -> bool {
    matches!(
        verb,
        "PING" | "ECHO" | "TYPE" | "KEYS" | "CONFIG" | "SET" | "GET" | "INCR" | "RPUSH" | "LPUSH" | "LRANGE" | "LLEN"
            | "LPOP" | "RPOP" | "BLPOP" | "XADD" | "XRANGE" | "XREAD" | "ZADD" | "ZSCORE" | "ZRANK" | "ZRANGE" | "ZREM"
            | "ZCARD" | "GEOADD" | "GEOPOS" | "GEODIST" | "GEOSEARCH" | "SUBSCRIBE" | "UNSUBSCRIBE" | "PUBLISH"
            | "INFO" | "REPLCONF" | "PSYNC" | "WAIT"
    )
}

/// Minimum total part count (verb included) for each known verb, mirroring
/// the `parts.len() < N` guard at the top of that verb's own handler. Used
/// at queueing time so a `MULTI`-queued command with too few arguments sets
/// `errored` (and `EXEC` later replies `EXECABORT`) instead of only failing
/// once it's replayed.
fn min_arity(verb: &str) -> usize {
    match verb {
        "PING" | "UNSUBSCRIBE" | "INFO" | "PSYNC" => 1,
        "ECHO" | "TYPE" | "KEYS" | "ZCARD" | "LLEN" | "LPOP" | "RPOP" | "GET" | "INCR" | "SUBSCRIBE" | "REPLCONF"
        | "CONFIG" => 2,
        "SET" | "RPUSH" | "LPUSH" | "BLPOP" | "ZSCORE" | "ZRANK" | "ZREM" | "GEOPOS" | "PUBLISH" | "WAIT" => 3,
        "LRANGE" | "XRANGE" | "XREAD" | "ZADD" | "ZRANGE" | "GEODIST" => 4,
        "XADD" | "GEOADD" => 5,
        "GEOSEARCH" => 8,
        _ => 1,
    }
}

async fn run(ctx: &Context, session: &mut Session, verb: &str, parts: &[Bytes], from_master: bool) -> RespResult {
    match verb {
        "PING" => process_ping(),
        "ECHO" => process_echo(parts),
        "TYPE" => process_type(parts, &mut ctx.keyspace.lock()),
        "KEYS" => process_keys(parts, &mut ctx.keyspace.lock()),
        "CONFIG" if parts.get(1).is_some_and(|p| p.eq_ignore_ascii_case(b"GET")) => {
            process_config_get(parts, &ctx.config)
        }
        "CONFIG" => Err("ERR unknown CONFIG subcommand".to_string()),
        "SET" => guard_write(ctx, from_master, || process_set(parts, &mut ctx.keyspace.lock())),
        "GET" => process_get(parts, &mut ctx.keyspace.lock()),
        "INCR" => guard_write(ctx, from_master, || process_incr(parts, &mut ctx.keyspace.lock())),
        "RPUSH" => {
            guard_write(ctx, from_master, || process_push(parts, &mut ctx.keyspace.lock(), &ctx.blocker, ListDir::R))
        }
        "LPUSH" => {
            guard_write(ctx, from_master, || process_push(parts, &mut ctx.keyspace.lock(), &ctx.blocker, ListDir::L))
        }
        "LRANGE" => process_lrange(parts, &mut ctx.keyspace.lock()),
        "LLEN" => process_llen(parts, &mut ctx.keyspace.lock()),
        "LPOP" => guard_write(ctx, from_master, || process_pop(parts, &mut ctx.keyspace.lock(), ListDir::L)),
        "RPOP" => guard_write(ctx, from_master, || process_pop(parts, &mut ctx.keyspace.lock(), ListDir::R)),
        "BLPOP" => process_blpop(parts, &ctx.keyspace, &ctx.blocker).await,
        "XADD" => guard_write(ctx, from_master, || process_xadd(parts, &mut ctx.keyspace.lock(), &ctx.blocker)),
        "XRANGE" => process_xrange(parts, &mut ctx.keyspace.lock()),
        "XREAD" => process_xread(parts, &ctx.keyspace, &ctx.blocker).await,
        "ZADD" => guard_write(ctx, from_master, || process_zadd(parts, &mut ctx.keyspace.lock())),
        "ZSCORE" => process_zscore(parts, &mut ctx.keyspace.lock()),
        "ZRANK" => process_zrank(parts, &mut ctx.keyspace.lock()),
        "ZRANGE" => process_zrange(parts, &mut ctx.keyspace.lock()),
        "ZREM" => guard_write(ctx, from_master, || process_zrem(parts, &mut ctx.keyspace.lock())),
        "ZCARD" => process_zcard(parts, &mut ctx.keyspace.lock()),
        "GEOADD" => guard_write(ctx, from_master, || process_geoadd(parts, &mut ctx.keyspace.lock())),
        "GEOPOS" => process_geopos(parts, &mut ctx.keyspace.lock()),
        "GEODIST" => process_geodist(parts, &mut ctx.keyspace.lock()),
        "GEOSEARCH" => process_geosearch(parts, &mut ctx.keyspace.lock()),
        "SUBSCRIBE" => process_subscribe(parts, &ctx.pubsub, session),
        "UNSUBSCRIBE" => process_unsubscribe(parts, &ctx.pubsub, session),
        "PUBLISH" => process_publish(parts, &ctx.pubsub),
        "INFO" => process_info(parts, &ctx.server_info),
        "REPLCONF" => process_replconf(parts),
        "WAIT" => process_wait(parts, ctx).await,
        _ => Err(format!("ERR unknown command '{}'", verb.to_lowercase())),
    }
}

/// The synchronous counterpart to `run`, used only while replaying an
/// `EXEC` batch under an already-held keyspace guard. Every verb that would
/// otherwise suspend (`BLPOP`, `XREAD BLOCK`, `WAIT`) takes its single
/// immediate attempt instead, since there is no way to park mid-transaction
/// without stalling every other connection on the shared mutex.
fn run_locked(ctx: &Context, session: &mut Session, verb: &str, parts: &[Bytes], map: &mut Map, from_master: bool) -> RespResult {
    match verb {
        "PING" => process_ping(),
        "ECHO" => process_echo(parts),
        "TYPE" => process_type(parts, map),
        "KEYS" => process_keys(parts, map),
        "CONFIG" if parts.get(1).is_some_and(|p| p.eq_ignore_ascii_case(b"GET")) => {
            process_config_get(parts, &ctx.config)
        }
        "CONFIG" => Err("ERR unknown CONFIG subcommand".to_string()),
        "SET" => guard_write(ctx, from_master, || process_set(parts, map)),
        "GET" => process_get(parts, map),
        "INCR" => guard_write(ctx, from_master, || process_incr(parts, map)),
        "RPUSH" => guard_write(ctx, from_master, || process_push(parts, map, &ctx.blocker, ListDir::R)),
        "LPUSH" => guard_write(ctx, from_master, || process_push(parts, map, &ctx.blocker, ListDir::L)),
        "LRANGE" => process_lrange(parts, map),
        "LLEN" => process_llen(parts, map),
        "LPOP" => guard_write(ctx, from_master, || process_pop(parts, map, ListDir::L)),
        "RPOP" => guard_write(ctx, from_master, || process_pop(parts, map, ListDir::R)),
        "BLPOP" => guard_write(ctx, from_master, || process_blpop_immediate(parts, map)),
        "XADD" => guard_write(ctx, from_master, || process_xadd(parts, map, &ctx.blocker)),
        "XRANGE" => process_xrange(parts, map),
        "XREAD" => process_xread_immediate(parts, map),
        "ZADD" => guard_write(ctx, from_master, || process_zadd(parts, map)),
        "ZSCORE" => process_zscore(parts, map),
        "ZRANK" => process_zrank(parts, map),
        "ZRANGE" => process_zrange(parts, map),
        "ZREM" => guard_write(ctx, from_master, || process_zrem(parts, map)),
        "ZCARD" => process_zcard(parts, map),
        "GEOADD" => guard_write(ctx, from_master, || process_geoadd(parts, map)),
        "GEOPOS" => process_geopos(parts, map),
        "GEODIST" => process_geodist(parts, map),
        "GEOSEARCH" => process_geosearch(parts, map),
        "SUBSCRIBE" => process_subscribe(parts, &ctx.pubsub, session),
        "UNSUBSCRIBE" => process_unsubscribe(parts, &ctx.pubsub, session),
        "PUBLISH" => process_publish(parts, &ctx.pubsub),
        "INFO" => process_info(parts, &ctx.server_info),
        "REPLCONF" => process_replconf(parts),
        "WAIT" => {
            // `WAIT` never actually blocks here (see the function doc): same
            // argument validation as `process_wait`, but it reports whatever
            // is already acked instead of issuing GETACK and parking.
            if parts.len() < 3 {
                return Err("ERR wrong number of arguments for 'wait' command".to_string());
            }
            let numreplicas: usize = std::str::from_utf8(&parts[1])
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| "ERR value is not an integer or out of range".to_string())?;
            std::str::from_utf8(&parts[2])
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| "ERR timeout is not an integer or out of range".to_string())?;

            let target = ctx.server_info.replication_info.offset();
            if target == 0 || ctx.replicas.count_acked_at_least(target) >= numreplicas {
                Ok(encode_integer(ctx.replicas.count() as i64))
            } else {
                Ok(encode_integer(ctx.replicas.count_acked_at_least(target) as i64))
            }
        }
        _ => Err(format!("ERR unknown command '{}'", verb.to_lowercase())),
    }
}

/// Write commands issued by an ordinary client are rejected outright on a
/// replica; the same handlers are reused, unguarded, when `from_master`
/// replays the replication stream.
fn guard_write(ctx: &Context, from_master: bool, run: impl FnOnce() -> RespResult) -> RespResult {
    if !from_master && ctx.is_replica() {
        return Err("READONLY You can't write against a read only replica.".to_string());
    }
    run()
}
