//! Game and bridge configuration.

use std::time::Duration;

use hexbridge_device::LinkConfig;
use hexbridge_device::level::NUM_LEVELS;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ConfigError;

// ---------------------------------------------------------------------------
// MessageTemplates
// ---------------------------------------------------------------------------

/// Chat lines announced during a round.
///
/// Placeholders: `{playername}`, `{stopcommand}` and `{gametime}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub game_start: String,
    pub game_end: String,
    pub time_announce: String,
    pub time_short_announce: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            game_start: "The hexagon is spinning, @{playername}! Type {stopcommand} to stop \
                         it. You have {gametime} seconds!"
                .into(),
            game_end: "Time's up! The round is over!".into(),
            time_announce: "{gametime} seconds left!".into(),
            time_short_announce: "{gametime}!".into(),
        }
    }
}

impl MessageTemplates {
    pub fn render_start(&self, player: &str, stop_command: &str, game_time: i64) -> String {
        let secs = game_time.to_string();
        render(
            &self.game_start,
            &[
                ("playername", player),
                ("stopcommand", stop_command),
                ("gametime", secs.as_str()),
            ],
        )
    }

    pub fn render_end(&self) -> String {
        render(&self.game_end, &[])
    }

    pub fn render_announce(&self, remaining: i64) -> String {
        let secs = remaining.to_string();
        render(&self.time_announce, &[("gametime", secs.as_str())])
    }

    pub fn render_short_announce(&self, remaining: i64) -> String {
        let secs = remaining.to_string();
        render(&self.time_short_announce, &[("gametime", secs.as_str())])
    }
}

/// Replaces every `{key}` in `template`. Unknown placeholders stay as they are.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_owned();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Round settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Round length when a start request gives none (or ≤ 0).
    pub default_game_time_secs: u32,

    /// Chat prefix that lets the player stop the round. Matched
    /// case-insensitively.
    pub stop_command: String,

    /// Level used when a start request gives none. Clamped to 0–10.
    pub default_level: i32,

    /// Length of one game-timer tick. One tick is one game second.
    pub tick_interval_ms: u64,

    pub templates: MessageTemplates,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_game_time_secs: 60,
            stop_command: "!stop".into(),
            default_level: 2,
            tick_interval_ms: 1_000,
            templates: MessageTemplates::default(),
        }
    }
}

impl GameConfig {
    /// `default_level` clamped to 0–10, with a warning when out of range.
    pub fn effective_default_level(&self) -> u8 {
        let clamped = self.default_level.clamp(0, i32::from(NUM_LEVELS));
        if clamped != self.default_level {
            warn!(
                configured = self.default_level,
                used = clamped,
                "default level out of range, clamping"
            );
        }
        clamped as u8
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// ---------------------------------------------------------------------------
// BridgeConfig
// ---------------------------------------------------------------------------

/// Everything needed to run a session against one device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub link: LinkConfig,
    pub game: GameConfig,
}

impl BridgeConfig {
    /// Config for `host:port` with default game settings.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            link: LinkConfig::new(host, port),
            game: GameConfig::default(),
        }
    }

    /// Checks the settings that make a session impossible to run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.link.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        let port = self.link.port;
        if port == 0 || port == u16::MAX {
            return Err(ConfigError::InvalidPort(port));
        }
        if self.game.stop_command.trim().is_empty() {
            return Err(ConfigError::EmptyStopCommand);
        }
        Ok(())
    }
}
