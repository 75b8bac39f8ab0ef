// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog Service - entry point wiring the registry, sync engine and system tables
//!
//! Query engines hold one `CatalogService` per metadata attachment. They
//! resolve catalogs through [`CatalogService::get_catalog`] and introspect
//! through [`CatalogService::scan`]; the background task keeps both fresh.

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::factory::{ConnectorFactoryRegistry, NativeConnector};
use crate::catalog::handle::ConnectorHandle;
use crate::catalog::registry::{CatalogRegistry, RegistrySnapshot};
use crate::catalog::source::{FileMetadataSource, MetadataSource};
use crate::sync::{CycleReport, SyncConfig, SyncEngine, SyncStatsSnapshot, SyncTaskHandle};
use crate::system::{JsonPropertySerializer, PropertySerializer, SystemTableProvider, TableScan};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Catalog Service - keeps connectors in step with a metadata source
///
/// This is the main entry point of the crate. It handles:
/// - Registry ownership and catalog lookups
/// - Starting and stopping background synchronization
/// - System table scans
pub struct CatalogService {
    registry: Arc<CatalogRegistry>,
    engine: Arc<SyncEngine>,
    system_tables: SystemTableProvider,
    task: Mutex<Option<SyncTaskHandle>>,
}

impl CatalogService {
    /// Create a service using the JSON property serializer
    ///
    /// # Arguments
    /// * `source` - Metadata source polled every cycle
    /// * `factories` - Connector factories keyed by provider
    /// * `config` - Sync schedule; validated here
    ///
    /// # Returns
    /// * `Ok(CatalogService)` - Service with an empty registry, not yet syncing
    /// * `Err(CatalogError::InvalidConfig)` - If `config` is rejected
    pub fn new(
        source: Arc<dyn MetadataSource>,
        factories: ConnectorFactoryRegistry,
        config: SyncConfig,
    ) -> CatalogResult<Self> {
        Self::with_serializer(source, factories, config, Arc::new(JsonPropertySerializer::new()))
    }

    /// Create a service with a custom serializer for `system.catalogs`
    pub fn with_serializer(
        source: Arc<dyn MetadataSource>,
        factories: ConnectorFactoryRegistry,
        config: SyncConfig,
        serializer: Arc<dyn PropertySerializer>,
    ) -> CatalogResult<Self> {
        config.validate()?;

        let registry = Arc::new(CatalogRegistry::new());
        let engine = Arc::new(SyncEngine::new(
            source,
            Arc::new(factories),
            registry.clone(),
            config,
        ));
        let system_tables = SystemTableProvider::new(registry.clone(), serializer);

        Ok(Self {
            registry,
            engine,
            system_tables,
            task: Mutex::new(None),
        })
    }

    /// Service over a JSON descriptor file with the built-in providers
    pub fn from_file(path: impl AsRef<Path>, config: SyncConfig) -> CatalogResult<Self> {
        let source = Arc::new(FileMetadataSource::new(path.as_ref()));
        Self::new(source, ConnectorFactoryRegistry::with_builtins(), config)
    }

    /// Start background synchronization
    ///
    /// Must be called from within a tokio runtime. Returns `false` if the
    /// background task is already running.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock();
        if task.is_some() {
            return false;
        }
        *task = Some(self.engine.start());
        true
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map_or(false, |t| !t.is_finished())
    }

    /// Ask the background task for an immediate cycle
    ///
    /// Returns `false` if the service is not running.
    pub fn trigger(&self) -> bool {
        match self.task.lock().as_ref() {
            Some(task) => {
                task.trigger();
                true
            }
            None => false,
        }
    }

    /// Run one reconciliation cycle now and wait for its report
    pub async fn refresh(&self) -> CatalogResult<CycleReport> {
        self.engine.run_cycle().await
    }

    /// Active connector for `name`, if any
    pub fn get_catalog(&self, name: &str) -> Option<NativeConnector> {
        self.registry.get_catalog(name)
    }

    /// Like [`get_catalog`](Self::get_catalog) but with an error for planners
    pub fn require_catalog(&self, name: &str) -> CatalogResult<NativeConnector> {
        self.get_catalog(name)
            .ok_or_else(|| CatalogError::CatalogNotFound(name.to_string()))
    }

    /// Handle for `name` in any state
    pub fn lookup(&self, name: &str) -> Option<Arc<ConnectorHandle>> {
        self.registry.lookup(name)
    }

    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.registry.snapshot()
    }

    /// Scan a table of the `system` schema
    pub fn scan(&self, table_name: &str) -> CatalogResult<TableScan> {
        self.system_tables.scan(table_name)
    }

    pub fn system_tables(&self) -> &SystemTableProvider {
        &self.system_tables
    }

    pub fn registry(&self) -> &Arc<CatalogRegistry> {
        &self.registry
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.engine.stats()
    }

    /// Stop the background task and release every connector
    pub async fn shutdown(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.shutdown().await;
        }
        let released = self.engine.release_all().await;
        log::info!("Catalog service shut down ({} connectors released)", released);
    }
}
