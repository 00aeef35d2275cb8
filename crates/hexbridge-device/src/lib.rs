//! Device layer for Hexbridge.
//!
//! Talks to the hexagon controller over a raw TCP link:
//!
//! - [`level`] — maps a 0–10 level to a duty cycle byte
//! - [`Backoff`] — capped exponential backoff between reconnects
//! - [`frame`] — the binary set-level command, acks, and the keepalive
//! - [`DeviceLink`] — the connection worker and its request handle
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (above)  ← start/stop rounds, calls set_level
//!     ↕
//! Device Layer (this crate)  ← socket, reconnects, ack correlation
//!     ↕
//! TCP  ← the hexagon controller
//! ```

mod backoff;
mod config;
mod error;
pub mod frame;
pub mod level;
mod link;
mod slot;

pub use backoff::{Backoff, BackoffConfig};
pub use config::LinkConfig;
pub use error::DeviceBridgeError;
pub use frame::Ack;
pub use link::{DeviceLink, StateReceiver};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connectivity of the device link, as reported by its worker.
///
/// ```text
/// Connecting ──▶ Ready ──(i/o error)──▶ Error ──(backoff)──▶ Connecting
///     │                                                          
///     └──(connect failed)──▶ Error           any ──(stop)──▶ Disconnected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Ready => write!(f, "READY"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Ready.to_string(), "READY");
        assert_eq!(ConnectionState::Disconnected.to_string(), "DISCONNECTED");
    }
}
