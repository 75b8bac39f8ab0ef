// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Connector factory traits and provider dispatch
//!
//! Each provider (hive, iceberg, jdbc, ...) contributes one [`ConnectorFactory`]
//! implementation. The synchronization engine never inspects the connectors it
//! builds; it only drives their lifecycle through `build` and `release`.
//! Factories are selected by the descriptor's provider string through the
//! [`ConnectorFactoryRegistry`].

use super::descriptor::CatalogDescriptor;
use super::error::{CatalogError, CatalogResult};
use super::providers;
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Engine-facing connector object built from a descriptor
///
/// Implementations are opaque to the core. The introspection methods back the
/// `system.schemas` and `system.tables` tables and default to empty listings.
pub trait Connector: Send + Sync + fmt::Debug {
    /// Downcast support for engine glue that knows the concrete type
    fn as_any(&self) -> &dyn Any;

    /// List schema names exposed by this connector
    fn list_schemas(&self) -> CatalogResult<Vec<String>> {
        Ok(Vec::new())
    }

    /// List table names inside `schema`
    fn list_tables(&self, _schema: &str) -> CatalogResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Shared reference to a built connector
pub type NativeConnector = Arc<dyn Connector>;

/// Builds and tears down connectors for one provider
///
/// Both methods must be safe to call concurrently for different catalogs.
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    /// Provider name this factory serves (matched case-insensitively)
    fn provider(&self) -> &str;

    /// Build a connector for `descriptor`
    ///
    /// # Returns
    /// * `Ok(NativeConnector)` on success
    /// * `Err(CatalogError)` if the provider rejects the configuration or the
    ///   backing system is unreachable
    async fn build(&self, descriptor: &CatalogDescriptor) -> CatalogResult<NativeConnector>;

    /// Release a connector previously returned by `build`
    ///
    /// Called exactly once per built connector when its handle retires.
    async fn release(&self, native: NativeConnector) {
        drop(native);
    }
}

/// Hand `native` back to `factory` on its own task
///
/// A panic inside `release` comes back as [`CatalogError::ConnectorRelease`]
/// and a release still running after `timeout` as [`CatalogError::Timeout`];
/// neither reaches the caller as an unwind or a stall.
pub async fn release_connector(
    factory: Arc<dyn ConnectorFactory>,
    native: NativeConnector,
    catalog: &str,
    timeout: Duration,
) -> CatalogResult<()> {
    let task = tokio::spawn(async move { factory.release(native).await });
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(CatalogError::ConnectorRelease {
            name: catalog.to_string(),
            reason: format!("release task aborted: {}", e),
        }),
        Err(_) => Err(CatalogError::Timeout {
            operation: format!("connector release for catalog '{}'", catalog),
            elapsed: timeout,
        }),
    }
}

/// Provider-keyed lookup of connector factories
#[derive(Default, Clone)]
pub struct ConnectorFactoryRegistry {
    factories: HashMap<String, Arc<dyn ConnectorFactory>>,
}

impl ConnectorFactoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in providers registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        providers::register_builtin_factories(&mut registry);
        registry
    }

    /// Register a factory under its provider name
    ///
    /// A factory registered later for the same provider replaces the earlier one.
    pub fn register(&mut self, factory: Arc<dyn ConnectorFactory>) {
        let key = factory.provider().to_ascii_lowercase();
        if self.factories.insert(key.clone(), factory).is_some() {
            log::warn!("Replaced connector factory for provider '{}'", key);
        } else {
            log::info!("Registered connector factory: {}", key);
        }
    }

    /// Find the factory serving `provider`
    pub fn get(&self, provider: &str) -> Option<Arc<dyn ConnectorFactory>> {
        self.factories.get(&provider.to_ascii_lowercase()).cloned()
    }

    pub fn has_provider(&self, provider: &str) -> bool {
        self.factories.contains_key(&provider.to_ascii_lowercase())
    }

    /// Sorted list of registered provider names
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ConnectorFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorFactoryRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
