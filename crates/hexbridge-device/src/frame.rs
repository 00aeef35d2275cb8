//! Binary wire frames exchanged with the device.
//!
//! ```text
//! host   → device   [0x10, duty]        set level
//! device → host     "...\0<garbage>"    acknowledgment, up to 128 bytes
//! device → host     "ping"              keepalive, answered with "pong"
//! ```

use std::fmt;

/// Opcode of the set-level command.
pub const SET_LEVEL_OPCODE: u8 = 0x10;

/// Largest frame read from the device in one go.
pub const BUFFER_SIZE: usize = 128;

/// Keepalive request sent by the device.
pub const PING: &[u8; 4] = b"ping";

/// Keepalive reply sent back on the same connection.
pub const PONG: &[u8; 4] = b"pong";

/// Builds the 2-byte set-level command.
pub fn encode_set_level(duty_cycle: u8) -> [u8; 2] {
    [SET_LEVEL_OPCODE, duty_cycle]
}

/// If `chunk` opens with a keepalive, returns the bytes after it.
///
/// TCP may coalesce a ping with a following acknowledgment, so the caller
/// handles the remainder as an ordinary frame when it is not empty.
pub fn strip_ping(chunk: &[u8]) -> Option<&[u8]> {
    chunk.strip_prefix(PING.as_slice())
}

/// A decoded device acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack(String);

impl Ack {
    /// Decodes an acknowledgment. Only bytes before the first NUL count,
    /// surrounding whitespace is trimmed.
    pub fn decode(chunk: &[u8]) -> Self {
        let end = chunk.iter().position(|b| *b == 0).unwrap_or(chunk.len());
        let text = String::from_utf8_lossy(&chunk[..end]);
        Self(text.trim().to_string())
    }

    /// The acknowledgment text.
    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
