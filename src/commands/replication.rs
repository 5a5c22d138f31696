use bytes::Bytes;

use crate::context::Context;
use crate::utils::encoder::*;

/// The minimal well-formed empty RDB payload (`REDIS0011` header, two aux
/// fields, an empty DB 0, EOF marker, zeroed checksum) sent as the bulk
/// payload of a `PSYNC` full resync. A real snapshot would come from
/// `SnapshotSource`; every database in scope here starts empty, so this
/// fixed payload is always correct.
pub const EMPTY_RDB: &[u8] = &[
    0x52, 0x45, 0x44, 0x49, 0x53, 0x30, 0x30, 0x31, 0x31, 0xfa, 0x09, 0x72, 0x65, 0x64, 0x69, 0x73, 0x2d, 0x76, 0x65,
    0x72, 0x05, 0x37, 0x2e, 0x32, 0x2e, 0x30, 0xfa, 0x0a, 0x72, 0x65, 0x64, 0x69, 0x73, 0x2d, 0x62, 0x69, 0x74, 0x73,
    0xc0, 0x40, 0xfe, 0x00, 0xfb, 0x00, 0x00, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// `REPLCONF listening-port <port>` / `REPLCONF capa ...` (handshake,
/// answered `+OK`) and `REPLCONF GETACK *` (sent master → replica, needs no
/// reply from this handler — the replica's apply loop answers it with its
/// own `REPLCONF ACK`). `REPLCONF ACK <offset>` is intercepted by the
/// dispatcher before reaching here, since it updates `ReplicaRegistry`
/// rather than producing a client-visible reply.
pub fn process_replconf(parts: &[Bytes]) -> RespResult {
    if parts.len() < 2 {
        return Err("ERR wrong number of arguments for 'replconf' command".to_string());
    }
    Ok(encode_simple_string("OK"))
}

/// `PSYNC ? -1`: always answers with a full resync, since this server never
/// retains enough backlog for a partial one.
pub fn process_psync(_parts: &[Bytes], ctx: &Context) -> Vec<u8> {
    let replid = &ctx.server_info.replication_info.master_replid;
    let offset = ctx.server_info.replication_info.offset();
    let mut response = encode_simple_string(&format!("FULLRESYNC {replid} {offset}"));
    response.extend_from_slice(format!("${}\r\n", EMPTY_RDB.len()).as_bytes());
    response.extend_from_slice(EMPTY_RDB);
    response
}

pub async fn process_wait(parts: &[Bytes], ctx: &Context) -> RespResult {
    // parts[0] = "WAIT", parts[1] = numreplicas, parts[2] = timeout_ms
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'wait' command".to_string());
    }
    let numreplicas: usize = std::str::from_utf8(&parts[1])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| "ERR value is not an integer or out of range".to_string())?;
    let timeout_ms: u64 = std::str::from_utf8(&parts[2])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| "ERR timeout is not an integer or out of range".to_string())?;

    let target = ctx.server_info.replication_info.offset();
    if target == 0 || ctx.replicas.count_acked_at_least(target) >= numreplicas {
        return Ok(encode_integer(ctx.replicas.count() as i64));
    }

    ctx.replicas.request_acks();
    let timeout = if timeout_ms == 0 { None } else { Some(std::time::Duration::from_millis(timeout_ms)) };
    let acked = ctx.replicas.wait_for_acks(target, numreplicas, timeout).await;
    Ok(encode_integer(acked as i64))
}
