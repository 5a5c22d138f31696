use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use redis_cache::config::{Args, Config};
use redis_cache::connection::handle_connection;
use redis_cache::context::Context;
use redis_cache::replica;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let args = Args::parse();
    let config = Config::from_args(args)?;
    let port = config.port;
    let replicaof = config.replicaof.clone();

    let ctx = Arc::new(Context::new(config));

    if let Some(master) = replicaof {
        let replica_ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(err) = replica::run(master, replica_ctx).await {
                tracing::error!(%err, "replication with master ended");
            }
        });
    }

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await.map_err(|err| {
        tracing::error!(%addr, %err, "failed to bind listener");
        err
    })?;
    tracing::info!(%addr, "redis-cache listening");

    loop {
        let (socket, peer) = listener.accept().await?;
        tracing::debug!(%peer, "accepted connection");
        let ctx = ctx.clone();
        tokio::spawn(async move {
            handle_connection(socket, ctx).await;
        });
    }
}
