//! Retry configuration for store reads
//!
//! Fixed delay is the default: five attempts, two seconds apart. Exponential
//! backoff with jitter can be selected through configuration; either way the
//! caller decides what counts as a successful attempt.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the wait between attempts grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Same delay before every retry
    #[default]
    Fixed,
    /// `base_delay * backoff_multiplier^(attempt - 1)`, capped at `max_delay`
    Exponential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub strategy: BackoffStrategy,
    /// Randomize each delay within `[delay / 2, delay]`
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            strategy: BackoffStrategy::Fixed,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Fixed delay between a bounded number of attempts
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            ..Self::default()
        }
    }

    /// Exponential backoff with jitter
    pub fn exponential() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            strategy: BackoffStrategy::Exponential,
            jitter: true,
        }
    }

    /// Single attempt, no waiting (for testing)
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            strategy: BackoffStrategy::Fixed,
            jitter: false,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Attempts actually made, never less than one
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after the given (1-based) attempt failed
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = match self.strategy {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Exponential => {
                let exponent = attempt.saturating_sub(1).min(31) as i32;
                let scaled = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
                if scaled.is_nan() {
                    return Duration::ZERO;
                }
                Duration::from_secs_f64(scaled.clamp(0.0, self.max_delay.as_secs_f64()))
            }
        };

        if self.jitter { jittered(delay) } else { delay }
    }
}

fn jittered(delay: Duration) -> Duration {
    let millis = delay.as_millis() as u64;
    if millis < 2 {
        return delay;
    }
    Duration::from_millis(rand::rng().random_range(millis / 2..=millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fixed_five_by_two_seconds() {
        let config = RetryConfig::default();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.strategy, BackoffStrategy::Fixed);
        for attempt in 1..=5 {
            assert_eq!(config.delay_for_attempt(attempt), Duration::from_secs(2));
        }
    }

    #[test]
    fn test_exponential_growth_is_capped() {
        let config = RetryConfig::exponential().with_jitter(false);

        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(20), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let config = RetryConfig::fixed(5, Duration::from_millis(1000)).with_jitter(true);

        for attempt in 1..50 {
            let delay = config.delay_for_attempt(attempt);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_disabled_config() {
        let config = RetryConfig::disabled();

        assert_eq!(config.attempts(), 1);
        assert_eq!(config.delay_for_attempt(1), Duration::ZERO);
    }

    #[test]
    fn test_out_of_range_multiplier_never_panics() {
        let mut config = RetryConfig::exponential().with_jitter(false);

        config.backoff_multiplier = -2.0;
        assert_eq!(config.delay_for_attempt(2), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(2));

        config.backoff_multiplier = f64::NAN;
        assert_eq!(config.delay_for_attempt(2), Duration::ZERO);

        config.backoff_multiplier = f64::INFINITY;
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let config = RetryConfig::default().with_max_attempts(0);
        assert_eq!(config.attempts(), 1);
    }
}
