use bytes::Bytes;

use crate::error::ProtocolError;

use super::resp::parse_command;

/// Pulls the next complete client command out of `buf`, if any.
///
/// Returns `(parts, bytes_consumed)` where `parts` are the command's bulk
/// string arguments in order (`parts[0]` is the verb). Returns `Ok(None)`
/// when `buf` holds an incomplete frame — the caller should read more bytes
/// and try again. A malformed frame is a [`ProtocolError`]; the caller
/// closes the connection rather than replying.
pub fn decode_command(buf: &[u8]) -> Result<Option<(Vec<Bytes>, usize)>, ProtocolError> {
    parse_command(buf)
}
