// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Synchronization configuration

use crate::catalog::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Reconciliation schedule, timeouts and retry policy
///
/// Durations are written as seconds in config files; fractions are allowed
/// (`0.25` is 250ms).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Time between reconciliation cycles when the previous one succeeded
    #[serde(with = "serde_duration")]
    pub interval: Duration,

    /// Upper bound for one metadata fetch
    #[serde(with = "serde_duration")]
    pub fetch_timeout: Duration,

    /// Upper bound for one connector build
    #[serde(with = "serde_duration")]
    pub build_timeout: Duration,

    /// Upper bound for handing one connector back to its factory
    #[serde(with = "serde_duration")]
    pub release_timeout: Duration,

    /// First retry delay after a failed fetch
    #[serde(with = "serde_duration")]
    pub backoff_initial: Duration,

    /// Ceiling for the retry delay
    #[serde(with = "serde_duration")]
    pub backoff_max: Duration,

    /// Growth factor applied per consecutive failure
    pub backoff_multiplier: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
            build_timeout: Duration::from_secs(30),
            release_timeout: Duration::from_secs(30),
            backoff_initial: Duration::from_secs(1),
            backoff_max: Duration::from_secs(300), // 5 minutes
            backoff_multiplier: 2,
        }
    }
}

impl SyncConfig {
    /// Short intervals and timeouts for tests and local demos
    pub fn fast() -> Self {
        Self {
            interval: Duration::from_millis(50),
            fetch_timeout: Duration::from_millis(500),
            build_timeout: Duration::from_millis(500),
            release_timeout: Duration::from_millis(500),
            backoff_initial: Duration::from_millis(10),
            backoff_max: Duration::from_millis(200),
            backoff_multiplier: 2,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_release_timeout(mut self, timeout: Duration) -> Self {
        self.release_timeout = timeout;
        self
    }

    /// Load a configuration from a JSON file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> CatalogResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SyncConfig = serde_json::from_str(&contents)
            .map_err(|e| CatalogError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CatalogResult<()> {
        let durations = [
            ("interval", self.interval),
            ("fetch_timeout", self.fetch_timeout),
            ("build_timeout", self.build_timeout),
            ("release_timeout", self.release_timeout),
            ("backoff_initial", self.backoff_initial),
            ("backoff_max", self.backoff_max),
        ];
        if let Some((field, _)) = durations.iter().find(|(_, d)| d.is_zero()) {
            return Err(CatalogError::InvalidConfig(format!(
                "{} must be greater than zero",
                field
            )));
        }
        if self.backoff_multiplier < 1 {
            return Err(CatalogError::InvalidConfig(
                "backoff_multiplier must be at least 1".to_string(),
            ));
        }
        if self.backoff_initial > self.backoff_max {
            return Err(CatalogError::InvalidConfig(
                "backoff_initial must not exceed backoff_max".to_string(),
            ));
        }
        Ok(())
    }
}

mod serde_duration {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs_f64().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| D::Error::custom(format!("invalid duration {}: {}", secs, e)))
    }
}
