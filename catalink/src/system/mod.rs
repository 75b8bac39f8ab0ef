// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Introspection tables over the catalog registry
//!
//! Every scan reads exactly one registry snapshot, so a result never mixes
//! catalogs from two reconciliation rounds.

pub mod provider;
pub mod serializer;
pub mod table;
pub mod tables;
pub mod value;

pub use provider::SystemTableProvider;
pub use serializer::{JsonPropertySerializer, PropertySerializer};
pub use table::{ColumnMetadata, SystemTable, SYSTEM_SCHEMA};
pub use tables::{CatalogStatusTable, CatalogsTable, SchemasTable, TablesTable};
pub use value::{ColumnType, Row, TableScan, Value};
