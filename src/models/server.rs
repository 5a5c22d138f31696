use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

/// The `INFO` sections this server knows how to render. Only `replication`
/// is implemented; any other section name is a recognized-but-empty
/// section, per `INFO`'s own behavior of tolerating unknown section names.
pub enum InfoOption {
    Replication,
}

impl InfoOption {
    pub fn parse(section: &str) -> Option<Self> {
        match section.to_ascii_uppercase().as_str() {
            "REPLICATION" => Some(InfoOption::Replication),
            _ => None,
        }
    }
}

pub struct ServerInfo {
    pub replication_info: ReplicationInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master,
    Slave,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Slave => "slave",
        }
    }
}

pub struct ReplicationInfo {
    pub role: Role,
    pub master_replid: String,
    master_repl_offset: AtomicU64,
}

impl ReplicationInfo {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            master_replid: Self::generate_replid(),
            master_repl_offset: AtomicU64::new(0),
        }
    }

    pub fn offset(&self) -> u64 {
        self.master_repl_offset.load(Ordering::SeqCst)
    }

    pub fn advance_offset(&self, by: u64) -> u64 {
        self.master_repl_offset.fetch_add(by, Ordering::SeqCst) + by
    }

    pub fn to_info_string(&self) -> String {
        format!(
            "# Replication\r\nrole:{}\r\nmaster_replid:{}\r\nmaster_repl_offset:{}\r\n",
            self.role.as_str(),
            self.master_replid,
            self.offset(),
        )
    }

    fn generate_replid() -> String {
        const HEX: &[u8] = b"0123456789abcdef";
        let mut rng = rand::thread_rng();
        (0..40).map(|_| HEX[rng.gen_range(0..16)] as char).collect()
    }
}
