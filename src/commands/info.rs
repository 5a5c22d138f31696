use bytes::Bytes;

use crate::models::{InfoOption, ServerInfo};
use crate::utils::encoder::*;

pub fn process_info(parts: &[Bytes], server_info: &ServerInfo) -> RespResult {
    let section = parts.get(1).map(|p| String::from_utf8_lossy(p).into_owned());
    match section {
        None => Ok(encode_bulk_string(server_info.replication_info.to_info_string())),
        Some(section) => match InfoOption::parse(&section) {
            Some(InfoOption::Replication) => Ok(encode_bulk_string(server_info.replication_info.to_info_string())),
            None => Ok(encode_bulk_string("")),
        },
    }
}
