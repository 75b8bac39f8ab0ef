// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog registry implementation
//!
//! This module provides the CatalogRegistry that holds the live connector handle
//! for every known catalog. The registry is versioned as a whole: each publish
//! installs a new immutable [`RegistrySnapshot`], and readers pin whichever
//! snapshot was current when they asked. Reads are a single atomic load and
//! never wait on the writer.

use super::error::CatalogError;
use super::factory::NativeConnector;
use super::handle::{ConnectorHandle, ConnectorState};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A desired revision that could not be applied
///
/// Recorded when the replacement build for an active catalog fails; the
/// previous handle keeps serving until a later build succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncFailure {
    pub revision: u64,
    pub error: CatalogError,
    pub failed_at: DateTime<Utc>,
    pub attempts: u32,
}

/// Immutable registry state produced by one publish
#[derive(Debug)]
pub struct RegistrySnapshot {
    version: u64,
    entries: BTreeMap<String, Arc<ConnectorHandle>>,
    failures: BTreeMap<String, SyncFailure>,
    published_at: DateTime<Utc>,
}

impl RegistrySnapshot {
    fn empty() -> Self {
        Self {
            version: 0,
            entries: BTreeMap::new(),
            failures: BTreeMap::new(),
            published_at: Utc::now(),
        }
    }

    /// Position of this snapshot in the publish order (0 = initial empty state)
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ConnectorHandle>> {
        self.entries.get(name)
    }

    /// Handles ordered by catalog name
    pub fn handles(&self) -> impl Iterator<Item = &Arc<ConnectorHandle>> {
        self.entries.values()
    }

    pub fn entries(&self) -> &BTreeMap<String, Arc<ConnectorHandle>> {
        &self.entries
    }

    pub fn failures(&self) -> &BTreeMap<String, SyncFailure> {
        &self.failures
    }

    pub fn failure(&self, name: &str) -> Option<&SyncFailure> {
        self.failures.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Count handles currently in `state`
    pub fn count_in_state(&self, state: ConnectorState) -> usize {
        self.entries.values().filter(|h| h.state() == state).count()
    }
}

/// Authoritative name → connector handle mapping
///
/// The sync engine is the only writer. Everything else reads snapshots.
pub struct CatalogRegistry {
    current: ArcSwap<RegistrySnapshot>,
    /// Serializes publishers so versions stay gap-free; readers never take it
    publish_lock: Mutex<()>,
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogRegistry {
    /// Create a registry holding the empty version-0 snapshot
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(RegistrySnapshot::empty()),
            publish_lock: Mutex::new(()),
        }
    }

    /// Currently published snapshot
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.load_full()
    }

    /// Install a new snapshot built from `entries` and `failures`
    ///
    /// The new snapshot becomes visible to every later `snapshot()` call in a
    /// single step. Readers holding the previous snapshot keep it until they
    /// drop it.
    ///
    /// # Returns
    /// * `Arc<RegistrySnapshot>` - The snapshot that was published
    pub fn publish(
        &self,
        entries: BTreeMap<String, Arc<ConnectorHandle>>,
        failures: BTreeMap<String, SyncFailure>,
    ) -> Arc<RegistrySnapshot> {
        let _guard = self.publish_lock.lock();
        let version = self.current.load().version + 1;
        let snapshot = Arc::new(RegistrySnapshot {
            version,
            entries,
            failures,
            published_at: Utc::now(),
        });
        self.current.store(snapshot.clone());
        log::info!(
            "Published catalog registry v{} ({} catalogs, {} pending failures)",
            version,
            snapshot.len(),
            snapshot.failures.len()
        );
        snapshot
    }

    /// Look up the handle for `name` in the current snapshot
    pub fn lookup(&self, name: &str) -> Option<Arc<ConnectorHandle>> {
        self.current.load().get(name).cloned()
    }

    /// Connector for query planning
    ///
    /// Only active handles resolve; loading, failed and retiring catalogs are
    /// treated as absent.
    pub fn get_catalog(&self, name: &str) -> Option<NativeConnector> {
        self.current.load().get(name).and_then(|h| h.native())
    }

    /// Version of the current snapshot
    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Sorted catalog names in the current snapshot
    pub fn catalog_names(&self) -> Vec<String> {
        self.current.load().entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}
