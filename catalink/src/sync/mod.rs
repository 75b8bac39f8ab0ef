// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog synchronization
//!
//! Pulls the desired catalog set from a [`MetadataSource`](crate::catalog::MetadataSource),
//! reconciles it with the [`CatalogRegistry`](crate::catalog::CatalogRegistry)
//! and publishes the result. [`SyncEngine`] is the only registry writer.

pub mod backoff;
pub mod config;
pub mod diff;
pub mod engine;
pub mod stats;
pub mod task;

pub use backoff::Backoff;
pub use config::SyncConfig;
pub use diff::{plan_reconciliation, ActionKind, ReconcileAction, ReconcilePlan};
pub use engine::{CycleReport, SyncEngine};
pub use stats::{SyncStats, SyncStatsSnapshot};
pub use task::SyncTaskHandle;
