//! Exponential backoff between reconnect attempts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for [`Backoff`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// First wait after a failure, in milliseconds.
    pub initial_interval_ms: u64,
    /// Upper bound for any single wait, in milliseconds.
    pub max_interval_ms: u64,
    /// Growth factor applied between consecutive waits.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1_000,
            max_interval_ms: 5 * 60 * 1_000,
            multiplier: 2.0,
        }
    }
}

/// Stateful backoff interval calculator.
///
/// The sequence is nondecreasing and converges to `max_interval_ms`.
/// [`reset`](Self::reset) is called by the link after every successful
/// connection.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current_ms: u64,
    attempt: u32,
}

impl Backoff {
    /// Creates a backoff starting at the configured initial interval.
    pub fn new(config: BackoffConfig) -> Self {
        let current_ms = config.initial_interval_ms.min(config.max_interval_ms);
        Self {
            config,
            current_ms,
            attempt: 0,
        }
    }

    /// Returns the next wait. Every call but the first after a reset grows
    /// the interval by the multiplier, capped at the maximum.
    pub fn next(&mut self) -> Duration {
        if self.attempt > 0 {
            let grown = (self.current_ms as f64 * self.config.multiplier.max(1.0)) as u64;
            self.current_ms = grown.min(self.config.max_interval_ms);
        }
        self.attempt = self.attempt.saturating_add(1);
        Duration::from_millis(self.current_ms)
    }

    /// Restores the initial interval and zeroes the attempt counter.
    pub fn reset(&mut self) {
        self.current_ms = self
            .config
            .initial_interval_ms
            .min(self.config.max_interval_ms);
        self.attempt = 0;
    }

    /// Number of waits handed out since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(backoff: &mut Backoff) -> u64 {
        backoff.next().as_millis() as u64
    }

    #[test]
    fn test_default_sequence_doubles() {
        let mut b = Backoff::default();
        let seq: Vec<u64> = (0..5).map(|_| millis(&mut b)).collect();
        assert_eq!(seq, vec![1_000, 2_000, 4_000, 8_000, 16_000]);
        assert_eq!(b.attempt(), 5);
    }

    #[test]
    fn test_sequence_is_capped_at_max() {
        let mut b = Backoff::default();
        let mut last = 0;
        for _ in 0..20 {
            last = millis(&mut b);
        }
        assert_eq!(last, 300_000);
        // 1000 * 2^8 = 256000, the ninth step is the first capped one.
        let mut b = Backoff::default();
        let seq: Vec<u64> = (0..11).map(|_| millis(&mut b)).collect();
        assert_eq!(seq[8], 256_000);
        assert_eq!(seq[9], 300_000);
        assert_eq!(seq[10], 300_000);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut b = Backoff::default();
        millis(&mut b);
        millis(&mut b);
        millis(&mut b);
        b.reset();
        assert_eq!(b.attempt(), 0);
        assert_eq!(millis(&mut b), 1_000);
        assert_eq!(millis(&mut b), 2_000);
    }

    #[test]
    fn test_multiplier_below_one_never_shrinks() {
        let mut b = Backoff::new(BackoffConfig {
            initial_interval_ms: 100,
            max_interval_ms: 1_000,
            multiplier: 0.5,
        });
        assert_eq!(millis(&mut b), 100);
        assert_eq!(millis(&mut b), 100);
    }
}
