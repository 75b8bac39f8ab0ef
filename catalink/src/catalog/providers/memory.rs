// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory connector provider
//!
//! Builds connectors whose schema and table layout comes entirely from the
//! descriptor's `tables` property, a comma-separated list of
//! `schema.table` names. Useful for wiring tests and demos without a real
//! backing system.

use crate::catalog::descriptor::CatalogDescriptor;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::factory::{Connector, ConnectorFactory, NativeConnector};
use async_trait::async_trait;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const PROVIDER: &str = "memory";
pub const TABLES_PROPERTY: &str = "tables";

/// Connector exposing a fixed schema/table layout
#[derive(Debug)]
pub struct MemoryConnector {
    catalog: String,
    schemas: BTreeMap<String, Vec<String>>,
}

impl MemoryConnector {
    /// Parse the `tables` property of `descriptor`
    pub fn from_descriptor(descriptor: &CatalogDescriptor) -> CatalogResult<Self> {
        let mut schemas: BTreeMap<String, Vec<String>> = BTreeMap::new();

        let layout = descriptor.property(TABLES_PROPERTY).unwrap_or("");
        for entry in layout.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (schema, table) = entry
                .split_once('.')
                .filter(|(s, t)| !s.is_empty() && !t.is_empty() && !t.contains('.'))
                .ok_or_else(|| {
                    CatalogError::invalid_descriptor(
                        descriptor.name(),
                        format!("malformed table entry '{}', expected schema.table", entry),
                    )
                })?;
            let tables = schemas.entry(schema.to_string()).or_default();
            if !tables.iter().any(|t| t == table) {
                tables.push(table.to_string());
            }
        }
        for tables in schemas.values_mut() {
            tables.sort();
        }

        Ok(Self {
            catalog: descriptor.name().to_string(),
            schemas,
        })
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }
}

impl Connector for MemoryConnector {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn list_schemas(&self) -> CatalogResult<Vec<String>> {
        Ok(self.schemas.keys().cloned().collect())
    }

    fn list_tables(&self, schema: &str) -> CatalogResult<Vec<String>> {
        Ok(self.schemas.get(schema).cloned().unwrap_or_default())
    }
}

/// Factory for [`MemoryConnector`]
#[derive(Debug, Default)]
pub struct MemoryConnectorFactory {
    live: AtomicUsize,
}

impl MemoryConnectorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connectors built and not yet released
    pub fn live_connectors(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ConnectorFactory for MemoryConnectorFactory {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn build(&self, descriptor: &CatalogDescriptor) -> CatalogResult<NativeConnector> {
        let connector = MemoryConnector::from_descriptor(descriptor)?;
        self.live.fetch_add(1, Ordering::AcqRel);
        log::debug!(
            "Built memory connector for '{}' with {} schemas",
            descriptor.name(),
            connector.schemas.len()
        );
        Ok(Arc::new(connector))
    }

    async fn release(&self, native: NativeConnector) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        drop(native);
    }
}
