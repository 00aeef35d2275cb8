//! Cancellable fixed-period ticker for Hexbridge game rounds.
//!
//! A [`Ticker`] is either running or stopped. While stopped,
//! [`Ticker::wait_for_tick`] pends forever, so the ticker can sit inside an
//! actor's `tokio::select!` loop next to its command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tick = ticker.wait_for_tick(), if ticker.is_running() => {
//!             on_tick(tick).await;
//!             ticker.record_tick_end();
//!         }
//!     }
//! }
//! ```
//!
//! Because the tick body runs inside the same loop as the commands, ticks
//! never overlap each other or a command. [`Ticker::stop`] takes effect
//! immediately: once it returns, no further tick is delivered.
//!
//! Deadlines stay on a fixed grid. If the loop was busy past one or more
//! deadlines, the missed ticks fire back to back, so every period that
//! elapsed is delivered exactly once.

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Ticker configuration.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between two ticks.
    pub period: Duration,
    /// Fraction of the period (0.0–1.0) after which a slow tick body is
    /// logged. Default: 0.80.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            budget_warn_threshold: 0.80,
        }
    }
}

impl TickConfig {
    /// Shortest period accepted.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// Config for a specific period with default settings.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(
                period_us = self.period.as_micros() as u64,
                "tick period below minimum, clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Information about a tick, returned by [`Ticker::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number since the last [`Ticker::start`], starting at 1.
    pub tick: u64,
    /// Further deadlines that had already passed when this tick fired.
    /// They are delivered next, without waiting.
    pub behind: u64,
}

/// Fixed-period ticker with idempotent start and stop.
pub struct Ticker {
    config: TickConfig,
    tick_count: u64,
    /// When the next tick should fire. `None` while stopped.
    next_tick: Option<TokioInstant>,
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
}

impl Ticker {
    /// Creates a stopped ticker.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        debug!(
            period_ms = config.period.as_secs_f64() * 1000.0,
            "ticker created"
        );
        Self {
            config,
            tick_count: 0,
            next_tick: None,
            tick_start: None,
        }
    }

    /// Creates a stopped ticker for `period` with default settings.
    pub fn with_period(period: Duration) -> Self {
        Self::new(TickConfig::with_period(period))
    }

    /// Starts ticking. The first tick fires one period from now.
    ///
    /// Returns `false` (and changes nothing) if already running.
    pub fn start(&mut self) -> bool {
        if self.next_tick.is_some() {
            return false;
        }
        self.tick_count = 0;
        self.tick_start = None;
        self.next_tick = Some(TokioInstant::now() + self.config.period);
        debug!("ticker started");
        true
    }

    /// Stops ticking. Returns `true` only for the call that actually
    /// stopped a running ticker; later calls are no-ops.
    pub fn stop(&mut self) -> bool {
        if self.next_tick.take().is_none() {
            return false;
        }
        self.tick_start = None;
        debug!(ticks = self.tick_count, "ticker stopped");
        true
    }

    /// Whether the ticker is running.
    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Waits until the next tick is due.
    ///
    /// While stopped this future pends forever; `tokio::select!` keeps
    /// serving its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let Some(next) = self.next_tick else {
            return std::future::pending().await;
        };
        let period = self.config.period;

        time::sleep_until(next).await;

        let late_by = TokioInstant::now().saturating_duration_since(next);
        let behind = (late_by.as_nanos() / period.as_nanos()) as u64;
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());
        self.next_tick = Some(next + period);

        if behind > 0 {
            warn!(
                tick = self.tick_count,
                behind,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "ticker fell behind, catching up"
            );
        } else {
            trace!(tick = self.tick_count, "tick fired");
        }

        TickInfo {
            tick: self.tick_count,
            behind,
        }
    }

    /// Records that the body of the current tick has finished and logs tick
    /// bodies that come close to the period.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.config.period.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                period_ms = self.config.period.as_secs_f64() * 1000.0,
                "tick body approaching its period"
            );
        }
    }
}
