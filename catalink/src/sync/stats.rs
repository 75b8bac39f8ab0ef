// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reconciliation counters

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters updated by the sync engine
#[derive(Debug, Default)]
pub struct SyncStats {
    pub cycles: AtomicU64,
    pub failed_cycles: AtomicU64,
    pub consecutive_failures: AtomicU64,
    pub publishes: AtomicU64,
    pub builds: AtomicU64,
    pub build_failures: AtomicU64,
    pub releases: AtomicU64,
    pub release_failures: AtomicU64,
    last_success: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle_success(&self, published: bool) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        if published {
            self.publishes.fetch_add(1, Ordering::Relaxed);
        }
        *self.last_success.write() = Some(Utc::now());
    }

    pub fn record_cycle_failure(&self, error: &str) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.failed_cycles.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.write() = Some(error.to_string());
    }

    pub fn record_build(&self, succeeded: bool) {
        self.builds.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.build_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_release(&self, succeeded: bool) {
        self.releases.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.release_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            failed_cycles: self.failed_cycles.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            publishes: self.publishes.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            build_failures: self.build_failures.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            release_failures: self.release_failures.load(Ordering::Relaxed),
            last_success: *self.last_success.read(),
            last_error: self.last_error.read().clone(),
        }
    }
}

/// Serializable view of [`SyncStats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatsSnapshot {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub consecutive_failures: u64,
    pub publishes: u64,
    pub builds: u64,
    pub build_failures: u64,
    pub releases: u64,
    pub release_failures: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}
