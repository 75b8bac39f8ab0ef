// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Exponential backoff for failed reconciliation cycles

use super::config::SyncConfig;
use std::time::Duration;

/// Capped exponential retry delay
///
/// The n-th consecutive failure waits `initial * multiplier^(n-1)`, never more
/// than `max`. A success resets the sequence.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: u32,
    failures: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, multiplier: u32) -> Self {
        Self {
            initial,
            max,
            multiplier: multiplier.max(1),
            failures: 0,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.backoff_initial,
            config.backoff_max,
            config.backoff_multiplier,
        )
    }

    /// Record a failure and return how long to wait before retrying
    pub fn next_delay(&mut self) -> Duration {
        let factor = self
            .multiplier
            .checked_pow(self.failures)
            .unwrap_or(u32::MAX);
        self.failures = self.failures.saturating_add(1);
        self.initial.saturating_mul(factor).min(self.max)
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Consecutive failures since the last reset
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_until_ceiling() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(10), 2);
        let delays: Vec<u64> = (0..6).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 10, 10]);
        assert_eq!(backoff.failures(), 6);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(1), 3);
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_many_failures_do_not_overflow() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(300), 2);
        for _ in 0..200 {
            assert!(backoff.next_delay() <= Duration::from_secs(300));
        }
    }
}
