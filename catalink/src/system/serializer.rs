// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog property rendering for the `catalogs` system table

use crate::catalog::descriptor::CatalogProperties;
use crate::catalog::error::{CatalogError, CatalogResult};

/// Renders a property map as a single text cell
///
/// Implementations are stateless and shared across scans.
pub trait PropertySerializer: Send + Sync {
    fn serialize(&self, properties: &CatalogProperties) -> CatalogResult<String>;
}

/// Compact JSON object with keys in sorted order
///
/// `{"uri": "thrift://a:9083"}` renders as `{"uri":"thrift://a:9083"}`; an
/// empty map renders as `{}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPropertySerializer;

impl JsonPropertySerializer {
    pub fn new() -> Self {
        Self
    }
}

impl PropertySerializer for JsonPropertySerializer {
    fn serialize(&self, properties: &CatalogProperties) -> CatalogResult<String> {
        serde_json::to_string(properties).map_err(|e| CatalogError::Serialization(e.to_string()))
    }
}
