// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Metadata sources
//!
//! A [`MetadataSource`] answers one question: which catalogs should exist right
//! now. Every call returns the complete set; there is no incremental feed.

use super::descriptor::CatalogDescriptor;
use super::error::{CatalogError, CatalogResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Source of truth for the desired catalog set
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch every catalog descriptor currently defined
    ///
    /// # Returns
    /// * `Ok(Vec<CatalogDescriptor>)` - The full current set, in source order
    /// * `Err(CatalogError::MetadataFetch)` on transport or parse failures
    async fn list_catalogs(&self) -> CatalogResult<Vec<CatalogDescriptor>>;

    /// Human-readable description used in logs
    fn describe(&self) -> String;
}

/// In-memory source whose contents are replaced by the caller
///
/// Used by embedders that already hold catalog state, and by tests.
#[derive(Default)]
pub struct StaticMetadataSource {
    catalogs: RwLock<Vec<CatalogDescriptor>>,
}

impl StaticMetadataSource {
    pub fn new(catalogs: Vec<CatalogDescriptor>) -> Self {
        Self {
            catalogs: RwLock::new(catalogs),
        }
    }

    /// Replace the whole catalog set
    pub fn set_catalogs(&self, catalogs: Vec<CatalogDescriptor>) {
        *self.catalogs.write() = catalogs;
    }

    /// Insert or replace one catalog by name
    pub fn upsert(&self, descriptor: CatalogDescriptor) {
        let mut catalogs = self.catalogs.write();
        match catalogs.iter_mut().find(|d| d.name() == descriptor.name()) {
            Some(existing) => *existing = descriptor,
            None => catalogs.push(descriptor),
        }
    }

    /// Remove a catalog by name, returning whether it existed
    pub fn remove(&self, name: &str) -> bool {
        let mut catalogs = self.catalogs.write();
        let before = catalogs.len();
        catalogs.retain(|d| d.name() != name);
        catalogs.len() != before
    }
}

#[async_trait]
impl MetadataSource for StaticMetadataSource {
    async fn list_catalogs(&self) -> CatalogResult<Vec<CatalogDescriptor>> {
        Ok(self.catalogs.read().clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// Accepted layouts for a catalog file
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { catalogs: Vec<CatalogDescriptor> },
    Bare(Vec<CatalogDescriptor>),
}

/// Source that re-reads a JSON file on every fetch
///
/// The file holds either `{"catalogs": [...]}` or a bare array of descriptors.
pub struct FileMetadataSource {
    path: PathBuf,
}

impl FileMetadataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a catalog document
    pub fn parse(contents: &str) -> CatalogResult<Vec<CatalogDescriptor>> {
        let file: CatalogFile = serde_json::from_str(contents)
            .map_err(|e| CatalogError::MetadataFetch(format!("invalid catalog file: {}", e)))?;
        Ok(match file {
            CatalogFile::Wrapped { catalogs } => catalogs,
            CatalogFile::Bare(catalogs) => catalogs,
        })
    }
}

#[async_trait]
impl MetadataSource for FileMetadataSource {
    async fn list_catalogs(&self) -> CatalogResult<Vec<CatalogDescriptor>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CatalogError::MetadataFetch(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        Self::parse(&contents)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
