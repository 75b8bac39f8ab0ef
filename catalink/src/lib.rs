// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalink - catalog lifecycle and synchronization for query engines
//!
//! Catalink pulls catalog descriptors from a metadata service and keeps a
//! registry of live connectors in step with them.
//!
//! # Features
//!
//! - **Atomic Snapshots**: Readers see one consistent registry version, lock-free
//! - **Safe Replacement**: Connectors are rebuilt and swapped, never mutated in place
//! - **Fault Isolation**: A catalog that fails to build never blocks the others
//! - **System Tables**: `system.catalogs` and friends for introspection
//!
//! # Usage
//!
//! ```no_run
//! use catalink::{CatalogService, ConnectorFactoryRegistry, StaticMetadataSource, SyncConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> catalink::CatalogResult<()> {
//! let source = Arc::new(StaticMetadataSource::new(vec![]));
//! let service = CatalogService::new(source, ConnectorFactoryRegistry::with_builtins(), SyncConfig::default())?;
//! service.start();
//! let rows = service.scan("system.catalogs")?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod service;
pub mod sync;
pub mod system;
pub mod version;

pub use catalog::{
    CatalogDescriptor, CatalogError, CatalogProperties, CatalogRegistry, CatalogResult, Connector,
    ConnectorFactory, ConnectorFactoryRegistry, ConnectorHandle, ConnectorState,
    FileMetadataSource, MetadataSource, NativeConnector, RegistrySnapshot, StaticMetadataSource,
    SyncFailure,
};
pub use service::CatalogService;
pub use sync::{CycleReport, SyncConfig, SyncEngine, SyncStatsSnapshot, SyncTaskHandle};
pub use system::{
    JsonPropertySerializer, PropertySerializer, Row, SystemTableProvider, TableScan, Value,
};
pub use version::{build_info, BuildInfo};

/// Catalink version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Catalink crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
