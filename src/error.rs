use thiserror::Error;

/// Structural failures of the wire codec. Anything that reaches this point is
/// not a RESP error reply (those are plain strings, see [`crate::utils::encoder::RespResult`]) —
/// it means the connection itself can no longer be trusted and must be closed.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unexpected byte in length field")]
    InvalidLength,
    #[error("bulk string length {0} exceeds the {1} byte ceiling")]
    BulkTooLarge(i64, usize),
    #[error("array count {0} exceeds the {1} element ceiling")]
    ArrayTooLarge(i64, usize),
    #[error("missing CRLF terminator")]
    MissingTerminator,
    #[error("unknown frame prefix byte {0:#x}")]
    UnknownPrefix(u8),
    #[error("command array must contain only bulk strings")]
    NotACommand,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures turning parsed CLI flags into a usable `Config`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--replicaof must be \"<host> <port>\", got {0:?}")]
    InvalidReplicaOf(String),
}

/// Failures specific to the replication handshake and apply loop.
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("master rejected handshake step {step}: {reply}")]
    HandshakeRejected { step: &'static str, reply: String },
    #[error("malformed FULLRESYNC reply: {0}")]
    MalformedFullresync(String),
    #[error("protocol error during replication stream: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
