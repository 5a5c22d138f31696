//! One accepted TCP socket becomes one reader task and one writer task,
//! sharing a session through its outbox channel. The reader decodes
//! commands and feeds replies into the outbox; the writer only ever drains
//! it onto the socket, so a blocked dispatch (BLPOP, XREAD BLOCK, WAIT)
//! never stalls a concurrent PUBLISH delivery to the same connection.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::context::Context;
use crate::dispatcher::dispatch;
use crate::session::Session;
use crate::utils::resp::parse_command;

const READ_CHUNK: usize = 4096;

pub async fn handle_connection(socket: TcpStream, ctx: Arc<Context>) {
    let (mut read_half, mut write_half) = socket.into_split();
    let (outbox_tx, mut outbox_rx) = mpsc::channel::<Vec<u8>>(64);

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbox_rx.recv().await {
            if write_half.write_all(&frame).await.is_err() {
                break;
            }
        }
    });

    let session_id = ctx.next_session_id();
    let mut session = Session::new(session_id, outbox_tx);
    let mut buf = BytesMut::with_capacity(READ_CHUNK);

    loop {
        match parse_command(&buf) {
            Ok(Some((parts, consumed))) => {
                buf.split_to(consumed);
                if parts.is_empty() {
                    continue;
                }
                let is_quit = parts[0].eq_ignore_ascii_case(b"QUIT");
                let reply = if is_quit {
                    crate::utils::encoder::encode_simple_string("OK")
                } else {
                    dispatch(&ctx, &mut session, &parts, false).await
                };
                if !reply.is_empty() && session.outbox.send(reply).await.is_err() {
                    break;
                }
                if is_quit {
                    break;
                }
                continue;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(session = session_id, %err, "closing connection after protocol error");
                break;
            }
        }

        let mut chunk = [0u8; READ_CHUNK];
        match read_half.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(err) => {
                tracing::warn!(session = session_id, %err, "read error, closing connection");
                break;
            }
        }
    }

    cleanup(&ctx, &session);
    drop(session);
    let _ = writer.await;
}

fn cleanup(ctx: &Context, session: &Session) {
    ctx.pubsub.drop_session(session.id);
    ctx.replicas.remove(session.id);
}
