// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog model, connector lifecycle and registry
//!
//! This module holds the pieces the synchronization engine works with:
//! descriptors fetched from a metadata source, connector factories selected by
//! provider, connector handles with their lifecycle, and the snapshot
//! registry readers resolve catalogs against.

pub mod descriptor;
pub mod error;
pub mod factory;
pub mod handle;
pub mod providers;
pub mod registry;
pub mod source;

pub use descriptor::{CatalogDescriptor, CatalogProperties};
pub use error::{CatalogError, CatalogResult};
pub use factory::{Connector, ConnectorFactory, ConnectorFactoryRegistry, NativeConnector};
pub use handle::{ConnectorHandle, ConnectorState};
pub use registry::{CatalogRegistry, RegistrySnapshot, SyncFailure};
pub use source::{FileMetadataSource, MetadataSource, StaticMetadataSource};
