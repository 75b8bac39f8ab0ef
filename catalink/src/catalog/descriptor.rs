// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog descriptor value model
//!
//! A [`CatalogDescriptor`] is the metadata store's view of one catalog at a
//! point in time. Descriptors are immutable: a configuration change upstream
//! arrives as a new descriptor value with a new revision.

use super::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered catalog configuration properties
pub type CatalogProperties = BTreeMap<String, String>;

/// Identity and configuration of one catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDescriptor {
    name: String,
    provider: String,
    #[serde(default)]
    properties: CatalogProperties,
    #[serde(default)]
    revision: u64,
}

impl CatalogDescriptor {
    /// Create a descriptor at revision 0 with no properties
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            properties: CatalogProperties::new(),
            revision: 0,
        }
    }

    /// Return a copy of this descriptor carrying `properties`
    pub fn with_properties<I, K, V>(&self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..self.clone()
        }
    }

    /// Return a copy of this descriptor with one property added or replaced
    pub fn with_property(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut properties = self.properties.clone();
        properties.insert(key.into(), value.into());
        Self {
            properties,
            ..self.clone()
        }
    }

    /// Return a copy of this descriptor at `revision`
    pub fn with_revision(&self, revision: u64) -> Self {
        Self {
            revision,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn properties(&self) -> &CatalogProperties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Check the descriptor is well-formed enough to attempt a build
    pub fn validate(&self) -> CatalogResult<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::invalid_descriptor(
                &self.name,
                "catalog name must not be empty",
            ));
        }
        if self.provider.trim().is_empty() {
            return Err(CatalogError::invalid_descriptor(
                &self.name,
                "provider must not be empty",
            ));
        }
        if self.properties.keys().any(|k| k.trim().is_empty()) {
            return Err(CatalogError::invalid_descriptor(
                &self.name,
                "property keys must not be empty",
            ));
        }
        Ok(())
    }

    /// Whether `other` describes the same configuration at the same revision
    ///
    /// A revision bump or a content change (provider or properties) both count
    /// as a change.
    pub fn is_same_revision(&self, other: &CatalogDescriptor) -> bool {
        self.revision == other.revision
            && self.provider == other.provider
            && self.properties == other.properties
    }
}

impl fmt::Display for CatalogDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}@r{})", self.name, self.provider, self.revision)
    }
}
