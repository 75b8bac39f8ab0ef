// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! System table contract

use super::value::{ColumnType, Row};
use crate::catalog::registry::RegistrySnapshot;
use serde::Serialize;

/// Schema name every system table lives under
pub const SYSTEM_SCHEMA: &str = "system";

/// Column name, type and nullability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnMetadata {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnMetadata {
    pub const fn varchar(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::Varchar,
            nullable: false,
        }
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub const fn bigint(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::BigInt,
            nullable: false,
        }
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self {
            name,
            column_type: ColumnType::Timestamp,
            nullable: true,
        }
    }
}

/// A read-only table rendered from a registry snapshot
///
/// Implementations must derive every row from the snapshot they are given and
/// never consult the live registry.
pub trait SystemTable: Send + Sync {
    /// Table name within [`SYSTEM_SCHEMA`]
    fn table_name(&self) -> &'static str;

    fn columns(&self) -> &'static [ColumnMetadata];

    /// Render all rows from `snapshot`
    fn rows(&self, snapshot: &RegistrySnapshot) -> Vec<Row>;

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name.to_string()).collect()
    }
}
