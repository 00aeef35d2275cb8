//! # Hexbridge
//!
//! Chat-driven game rounds on a TCP-controlled hexagon prop.
//!
//! A round is started for one chat user, spins the hexagon at a level
//! from 0 to 10, counts down with chat announcements, and ends when time
//! runs out or the player types the stop command.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hexbridge::prelude::*;
//!
//! # async fn run() -> Result<(), HexbridgeError> {
//! let (bridge, mut events) = Hexbridge::builder()
//!     .device("10.0.0.5", 4242)
//!     .start_with_channel()?;
//!
//! bridge.start_round("alice", Some(30), None).await?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod bridge;
mod error;

pub use bridge::{Hexbridge, HexbridgeBuilder, load_config};
pub use error::HexbridgeError;

pub use hexbridge_device as device;
pub use hexbridge_session as session;
pub use hexbridge_tick as tick;

/// Everything needed to run a bridge.
pub mod prelude {
    pub use crate::{Hexbridge, HexbridgeBuilder, HexbridgeError, load_config};
    pub use hexbridge_device::{ConnectionState, DeviceBridgeError, LinkConfig};
    pub use hexbridge_session::{
        BridgeConfig, ConfigError, EventSink, GameConfig, MessageTemplates, SessionError,
        SessionEvent, SessionInfo, SessionState,
    };
}
