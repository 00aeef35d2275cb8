//! Game session layer for Hexbridge.
//!
//! Turns start/change/end requests and chat lines into timed rounds on the
//! hexagon device.
//!
//! # Key types
//!
//! - [`SessionController`] — the actor that owns the round and the device link
//! - [`SessionHandle`] — send requests to a running session
//! - [`SessionState`] — the externally visible state, folded from link reports
//! - [`EventSink`] — receives every [`SessionEvent`]
//! - [`BridgeConfig`] — link and game settings, validated before spawning

mod config;
mod controller;
mod error;
mod sink;
mod state;

pub use config::{BridgeConfig, GameConfig, MessageTemplates};
pub use controller::{SessionController, SessionHandle, SessionInfo};
pub use error::{ConfigError, SessionError};
pub use sink::{EventSink, SessionEvent};
pub use state::{GameSession, SessionState, TickOutcome};
