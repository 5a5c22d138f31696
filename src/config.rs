use clap::Parser;

use crate::error::ConfigError;

/// Flags accepted by the server binary. Parsing itself is an external
/// collaborator's job (`clap`); this struct and its derived defaults are
/// the crate's own surface.
#[derive(Debug, Parser)]
#[command(name = "redis-cache", about = "A Redis-protocol-compatible in-memory server")]
pub struct Args {
    #[arg(long, default_value_t = 6379)]
    pub port: u16,

    /// `"<host> <port>"` of the master to replicate from. Presence of this
    /// flag is what makes the process start in replica role.
    #[arg(long)]
    pub replicaof: Option<String>,

    #[arg(long, default_value = ".")]
    pub dir: String,

    #[arg(long, default_value = "dump.rdb")]
    pub dbfilename: String,
}

#[derive(Debug, Clone)]
pub struct ReplicaOf {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub replicaof: Option<ReplicaOf>,
    pub dir: String,
    pub dbfilename: String,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let replicaof = args.replicaof.as_deref().map(parse_replicaof).transpose()?;
        Ok(Self { port: args.port, replicaof, dir: args.dir, dbfilename: args.dbfilename })
    }

    /// `CONFIG GET <name>`: only `dir` and `dbfilename` are recognized.
    pub fn get(&self, name: &str) -> Option<&str> {
        match name.to_ascii_lowercase().as_str() {
            "dir" => Some(&self.dir),
            "dbfilename" => Some(&self.dbfilename),
            _ => None,
        }
    }
}

fn parse_replicaof(spec: &str) -> Result<ReplicaOf, ConfigError> {
    let mut parts = spec.split_whitespace();
    let invalid = || ConfigError::InvalidReplicaOf(spec.to_string());
    let host = parts.next().ok_or_else(invalid)?.to_string();
    let port: u16 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(ReplicaOf { host, port })
}
