// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Built-in system tables

use super::serializer::PropertySerializer;
use super::table::{ColumnMetadata, SystemTable};
use super::value::{Row, Value};
use crate::catalog::registry::RegistrySnapshot;
use std::sync::Arc;

/// `system.catalogs`: one row per catalog in the snapshot, whatever its state
pub struct CatalogsTable {
    serializer: Arc<dyn PropertySerializer>,
}

impl CatalogsTable {
    pub const NAME: &'static str = "catalogs";

    const COLUMNS: &'static [ColumnMetadata] = &[
        ColumnMetadata::varchar("name"),
        ColumnMetadata::varchar("provider"),
        ColumnMetadata::varchar("properties"),
    ];

    pub fn new(serializer: Arc<dyn PropertySerializer>) -> Self {
        Self { serializer }
    }
}

impl SystemTable for CatalogsTable {
    fn table_name(&self) -> &'static str {
        Self::NAME
    }

    fn columns(&self) -> &'static [ColumnMetadata] {
        Self::COLUMNS
    }

    fn rows(&self, snapshot: &RegistrySnapshot) -> Vec<Row> {
        snapshot
            .handles()
            .map(|handle| {
                let descriptor = handle.descriptor();
                let properties = match self.serializer.serialize(descriptor.properties()) {
                    Ok(json) => Value::Text(json),
                    Err(e) => {
                        log::warn!(
                            "Could not render properties of catalog '{}': {}",
                            descriptor.name(),
                            e
                        );
                        Value::Error(e.to_string())
                    }
                };
                Row::new(vec![
                    descriptor.name().into(),
                    descriptor.provider().into(),
                    properties,
                ])
            })
            .collect()
    }
}

/// `system.catalog_status`: lifecycle state and pending failures per catalog
#[derive(Debug, Default)]
pub struct CatalogStatusTable;

impl CatalogStatusTable {
    pub const NAME: &'static str = "catalog_status";

    const COLUMNS: &'static [ColumnMetadata] = &[
        ColumnMetadata::varchar("name"),
        ColumnMetadata::varchar("provider"),
        ColumnMetadata::varchar("state"),
        ColumnMetadata::bigint("revision"),
        ColumnMetadata::bigint("attempts"),
        ColumnMetadata::timestamp("loaded_at"),
        ColumnMetadata::varchar("error").nullable(),
        ColumnMetadata::bigint("pending_revision").nullable(),
        ColumnMetadata::varchar("pending_error").nullable(),
    ];
}

impl SystemTable for CatalogStatusTable {
    fn table_name(&self) -> &'static str {
        Self::NAME
    }

    fn columns(&self) -> &'static [ColumnMetadata] {
        Self::COLUMNS
    }

    fn rows(&self, snapshot: &RegistrySnapshot) -> Vec<Row> {
        snapshot
            .handles()
            .map(|handle| {
                let descriptor = handle.descriptor();
                let pending = snapshot.failure(descriptor.name());
                Row::new(vec![
                    descriptor.name().into(),
                    descriptor.provider().into(),
                    handle.state().to_string().into(),
                    descriptor.revision().into(),
                    handle.attempts().into(),
                    handle.loaded_at().map_or(Value::Null, Value::from),
                    Value::optional_text(handle.error().map(|e| e.to_string())),
                    pending.map_or(Value::Null, |f| f.revision.into()),
                    Value::optional_text(pending.map(|f| f.error.to_string())),
                ])
            })
            .collect()
    }
}

/// `system.schemas`: schemas exposed by active connectors
#[derive(Debug, Default)]
pub struct SchemasTable;

impl SchemasTable {
    pub const NAME: &'static str = "schemas";

    const COLUMNS: &'static [ColumnMetadata] = &[
        ColumnMetadata::varchar("catalog_name"),
        ColumnMetadata::varchar("schema_name"),
    ];
}

impl SystemTable for SchemasTable {
    fn table_name(&self) -> &'static str {
        Self::NAME
    }

    fn columns(&self) -> &'static [ColumnMetadata] {
        Self::COLUMNS
    }

    fn rows(&self, snapshot: &RegistrySnapshot) -> Vec<Row> {
        let mut rows = Vec::new();
        for handle in snapshot.handles() {
            let Some(native) = handle.native() else {
                continue;
            };
            match native.list_schemas() {
                Ok(schemas) => rows.extend(
                    schemas
                        .into_iter()
                        .map(|schema| Row::new(vec![handle.name().into(), schema.into()])),
                ),
                Err(e) => rows.push(Row::new(vec![
                    handle.name().into(),
                    Value::Error(e.to_string()),
                ])),
            }
        }
        rows
    }
}

/// `system.tables`: tables exposed by active connectors
#[derive(Debug, Default)]
pub struct TablesTable;

impl TablesTable {
    pub const NAME: &'static str = "tables";

    const COLUMNS: &'static [ColumnMetadata] = &[
        ColumnMetadata::varchar("catalog_name"),
        ColumnMetadata::varchar("schema_name"),
        ColumnMetadata::varchar("table_name"),
    ];
}

impl SystemTable for TablesTable {
    fn table_name(&self) -> &'static str {
        Self::NAME
    }

    fn columns(&self) -> &'static [ColumnMetadata] {
        Self::COLUMNS
    }

    fn rows(&self, snapshot: &RegistrySnapshot) -> Vec<Row> {
        let mut rows = Vec::new();
        for handle in snapshot.handles() {
            let Some(native) = handle.native() else {
                continue;
            };
            let schemas = match native.list_schemas() {
                Ok(schemas) => schemas,
                Err(e) => {
                    rows.push(Row::new(vec![
                        handle.name().into(),
                        Value::Null,
                        Value::Error(e.to_string()),
                    ]));
                    continue;
                }
            };
            for schema in schemas {
                match native.list_tables(&schema) {
                    Ok(tables) => rows.extend(tables.into_iter().map(|table| {
                        Row::new(vec![
                            handle.name().into(),
                            schema.clone().into(),
                            table.into(),
                        ])
                    })),
                    Err(e) => rows.push(Row::new(vec![
                        handle.name().into(),
                        schema.clone().into(),
                        Value::Error(e.to_string()),
                    ])),
                }
            }
        }
        rows
    }
}
