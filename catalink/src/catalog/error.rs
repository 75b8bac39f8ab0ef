// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for catalog synchronization

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Metadata fetch failed: {0}")]
    MetadataFetch(String),

    #[error("Invalid descriptor for catalog '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("Failed to build connector for catalog '{name}': {reason}")]
    ConnectorBuild { name: String, reason: String },

    #[error("Failed to release connector for catalog '{name}': {reason}")]
    ConnectorRelease { name: String, reason: String },

    #[error("Sync cycle aborted: {0}")]
    CycleAborted(String),

    #[error("Catalog '{name}' uses unsupported provider '{provider}'")]
    UnsupportedProvider { name: String, provider: String },

    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        operation: String,
        elapsed: Duration,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Catalog not found: {0}")]
    CatalogNotFound(String),

    #[error("System table not found: {0}")]
    TableNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl CatalogError {
    /// Shorthand for [`CatalogError::InvalidDescriptor`]
    pub fn invalid_descriptor(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CatalogError::InvalidDescriptor {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`CatalogError::ConnectorBuild`]
    pub fn connector_build(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CatalogError::ConnectorBuild {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure is expected to clear up on a later attempt
    ///
    /// Fetch failures, timeouts and IO errors are transient. Descriptor and
    /// provider errors persist until the catalog definition changes.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CatalogError::MetadataFetch(_) | CatalogError::Timeout { .. } | CatalogError::Io(_)
        )
    }

    /// Short machine-friendly label used in introspection output
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::MetadataFetch(_) => "metadata_fetch",
            CatalogError::InvalidDescriptor { .. } => "invalid_descriptor",
            CatalogError::ConnectorBuild { .. } => "connector_build",
            CatalogError::ConnectorRelease { .. } => "connector_release",
            CatalogError::CycleAborted(_) => "cycle_aborted",
            CatalogError::UnsupportedProvider { .. } => "unsupported_provider",
            CatalogError::Timeout { .. } => "timeout",
            CatalogError::Serialization(_) => "serialization",
            CatalogError::CatalogNotFound(_) => "catalog_not_found",
            CatalogError::TableNotFound(_) => "table_not_found",
            CatalogError::InvalidConfig(_) => "invalid_config",
            CatalogError::Io(_) => "io",
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serialization(err.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
