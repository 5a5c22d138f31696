//! The replica side of the replication handshake and apply loop: connect to
//! the configured master, perform the PING / REPLCONF / PSYNC exchange,
//! then replay the command stream against the local keyspace, tracking
//! how many bytes of that stream have been applied so `REPLCONF GETACK *`
//! can be answered accurately.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::config::ReplicaOf;
use crate::context::Context;
use crate::dispatcher::dispatch;
use crate::error::ReplicationError;
use crate::session::Session;
use crate::utils::resp::{parse_command, Frame};

/// Connects to `master`, completes the handshake, and replays the command
/// stream forever (or until the connection drops, which logs and returns —
/// the caller decides whether to retry).
pub async fn run(master: ReplicaOf, ctx: Arc<Context>) -> Result<(), ReplicationError> {
    let addr = format!("{}:{}", master.host, master.port);
    let mut stream = TcpStream::connect(&addr).await?;
    tracing::info!(%addr, "connecting to master");

    let mut buf = BytesMut::new();
    send_command(&mut stream, &["PING"]).await?;
    read_line_reply(&mut stream, &mut buf, "PING").await?;

    send_command(&mut stream, &["REPLCONF", "listening-port", &ctx.config.port.to_string()]).await?;
    read_line_reply(&mut stream, &mut buf, "REPLCONF listening-port").await?;

    send_command(&mut stream, &["REPLCONF", "capa", "psync2"]).await?;
    read_line_reply(&mut stream, &mut buf, "REPLCONF capa").await?;

    send_command(&mut stream, &["PSYNC", "?", "-1"]).await?;
    read_line_reply(&mut stream, &mut buf, "PSYNC").await?;
    read_rdb_payload(&mut stream, &mut buf).await?;

    tracing::info!("initial sync complete, applying replication stream");

    let (outbox_tx, mut outbox_rx) = mpsc::channel::<Vec<u8>>(16);
    // The replica's own outbox is drained straight back to the master
    // socket — the only thing ever queued on it is REPLCONF ACK.
    let mut session = Session::new(ctx.next_session_id(), outbox_tx);

    loop {
        match parse_command(&buf)? {
            Some((parts, consumed)) => {
                buf.split_to(consumed);
                apply_from_master(&ctx, &mut session, &parts, consumed as u64).await;
                while let Ok(frame) = outbox_rx.try_recv() {
                    stream.write_all(&frame).await?;
                }
                continue;
            }
            None => {}
        }
        let mut chunk = [0u8; 4096];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            tracing::warn!("master closed replication stream");
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

async fn apply_from_master(ctx: &Arc<Context>, session: &mut Session, parts: &[Bytes], consumed: u64) {
    if parts.first().is_some_and(|p| p.eq_ignore_ascii_case(b"REPLCONF")) && parts.get(1).is_some_and(|p| p.eq_ignore_ascii_case(b"GETACK")) {
        // The ACK reports the offset as it stood before this very GETACK
        // frame was counted, per the wire contract; the frame's bytes are
        // still folded into the running offset afterward for the next one.
        let offset_before = ctx.server_info.replication_info.offset();
        ctx.server_info.replication_info.advance_offset(consumed);
        let ack = Frame::command(&[Bytes::from("REPLCONF"), Bytes::from("ACK"), Bytes::from(offset_before.to_string())]).encode();
        let _ = session.outbox.send(ack).await;
        return;
    }
    ctx.server_info.replication_info.advance_offset(consumed);
    let _ = dispatch(ctx, session, parts, true).await;
}

async fn send_command(stream: &mut TcpStream, parts: &[&str]) -> Result<(), ReplicationError> {
    let frame = Frame::command(&parts.iter().map(|s| Bytes::from(s.to_string())).collect::<Vec<_>>()).encode();
    stream.write_all(&frame).await?;
    Ok(())
}

/// Reads one line-oriented reply (`+OK\r\n`, `+FULLRESYNC ...\r\n`) directly
/// off the socket, growing `buf` as needed. Leaves any bytes read past the
/// line's terminator in `buf` for the next step to consume.
async fn read_line_reply(stream: &mut TcpStream, buf: &mut BytesMut, step: &'static str) -> Result<String, ReplicationError> {
    loop {
        if let Some(pos) = find_crlf(buf) {
            let line = String::from_utf8_lossy(&buf[1..pos]).into_owned();
            buf.split_to(pos + 2);
            return Ok(line);
        }
        let mut chunk = [0u8; 512];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(ReplicationError::HandshakeRejected { step, reply: "connection closed".to_string() });
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Reads the `$<len>\r\n<len bytes>` RDB bulk that follows `FULLRESYNC`,
/// which — unlike every other bulk string in the protocol — has no
/// trailing CRLF.
async fn read_rdb_payload(stream: &mut TcpStream, buf: &mut BytesMut) -> Result<(), ReplicationError> {
    let header_end = loop {
        if let Some(pos) = find_crlf(buf) {
            break pos;
        }
        let mut chunk = [0u8; 512];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(ReplicationError::MalformedFullresync("connection closed before RDB header".to_string()));
        }
        buf.extend_from_slice(&chunk[..n]);
    };
    if buf[0] != b'$' {
        return Err(ReplicationError::MalformedFullresync(String::from_utf8_lossy(&buf[..header_end]).into_owned()));
    }
    let len: usize = std::str::from_utf8(&buf[1..header_end])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ReplicationError::MalformedFullresync("bad RDB length".to_string()))?;
    buf.split_to(header_end + 2);

    while buf.len() < len {
        let mut chunk = [0u8; 4096];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(ReplicationError::MalformedFullresync("connection closed mid-RDB".to_string()));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    buf.split_to(len);
    Ok(())
}

/// Index of the `\r` in the first `\r\n` found in `buf`, if any.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
