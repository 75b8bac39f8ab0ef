// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! System table lookup and scanning

use super::serializer::PropertySerializer;
use super::table::{ColumnMetadata, SystemTable, SYSTEM_SCHEMA};
use super::tables::{CatalogStatusTable, CatalogsTable, SchemasTable, TablesTable};
use super::value::TableScan;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::registry::CatalogRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Serves the tables of the `system` schema from registry snapshots
pub struct SystemTableProvider {
    registry: Arc<CatalogRegistry>,
    tables: BTreeMap<&'static str, Box<dyn SystemTable>>,
}

impl SystemTableProvider {
    /// Create a provider with the built-in tables
    ///
    /// `serializer` renders the `properties` column of `system.catalogs`.
    pub fn new(registry: Arc<CatalogRegistry>, serializer: Arc<dyn PropertySerializer>) -> Self {
        let mut provider = Self {
            registry,
            tables: BTreeMap::new(),
        };
        provider.register(Box::new(CatalogsTable::new(serializer)));
        provider.register(Box::new(CatalogStatusTable));
        provider.register(Box::new(SchemasTable));
        provider.register(Box::new(TablesTable));
        provider
    }

    /// Add or replace a table
    pub fn register(&mut self, table: Box<dyn SystemTable>) {
        log::debug!("Registered system table {}.{}", SYSTEM_SCHEMA, table.table_name());
        self.tables.insert(table.table_name(), table);
    }

    /// Sorted table names
    pub fn table_names(&self) -> Vec<&'static str> {
        self.tables.keys().copied().collect()
    }

    pub fn columns(&self, table_name: &str) -> CatalogResult<&'static [ColumnMetadata]> {
        self.table(table_name).map(|t| t.columns())
    }

    /// Scan `table_name` against one registry snapshot
    ///
    /// Accepts both `catalogs` and `system.catalogs`.
    pub fn scan(&self, table_name: &str) -> CatalogResult<TableScan> {
        let table = self.table(table_name)?;
        let snapshot = self.registry.snapshot();
        let rows = table.rows(&snapshot);
        log::debug!(
            "Scanned {}.{}: {} rows from registry v{}",
            SYSTEM_SCHEMA,
            table.table_name(),
            rows.len(),
            snapshot.version()
        );
        Ok(TableScan {
            table: table.table_name().to_string(),
            columns: table.column_names(),
            rows,
            snapshot_version: snapshot.version(),
        })
    }

    fn table(&self, table_name: &str) -> CatalogResult<&dyn SystemTable> {
        let unqualified = table_name
            .strip_prefix(SYSTEM_SCHEMA)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(table_name);
        self.tables
            .get(unqualified.to_ascii_lowercase().as_str())
            .map(|t| t.as_ref())
            .ok_or_else(|| CatalogError::TableNotFound(table_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::descriptor::{CatalogDescriptor, CatalogProperties};
    use crate::catalog::handle::ConnectorHandle;
    use crate::system::serializer::JsonPropertySerializer;
    use crate::system::value::Value;

    struct BrokenSerializer;

    impl PropertySerializer for BrokenSerializer {
        fn serialize(&self, properties: &CatalogProperties) -> CatalogResult<String> {
            if properties.contains_key("secret") {
                return Err(CatalogError::Serialization("unsupported value".to_string()));
            }
            JsonPropertySerializer.serialize(properties)
        }
    }

    fn registry_with_failed(descriptors: Vec<CatalogDescriptor>) -> Arc<CatalogRegistry> {
        let registry = Arc::new(CatalogRegistry::new());
        let entries = descriptors
            .into_iter()
            .map(|d| {
                let name = d.name().to_string();
                let handle = ConnectorHandle::failed(
                    Arc::new(d),
                    CatalogError::connector_build(name.clone(), "offline"),
                    1,
                );
                (name, Arc::new(handle))
            })
            .collect();
        registry.publish(entries, BTreeMap::new());
        registry
    }

    #[test]
    fn test_catalogs_rows_include_failed_catalogs() {
        let registry = registry_with_failed(vec![
            CatalogDescriptor::new("sales", "hive").with_property("uri", "thrift://a:9083")
        ]);
        let provider = SystemTableProvider::new(registry, Arc::new(JsonPropertySerializer));

        let scan = provider.scan("system.catalogs").unwrap();
        assert_eq!(scan.columns, vec!["name", "provider", "properties"]);
        assert_eq!(
            scan.rows[0].values,
            vec![
                Value::text("sales"),
                Value::text("hive"),
                Value::text(r#"{"uri":"thrift://a:9083"}"#)
            ]
        );
    }

    #[test]
    fn test_serializer_error_is_confined_to_its_row() {
        let registry = registry_with_failed(vec![
            CatalogDescriptor::new("a", "hive").with_property("secret", "x"),
            CatalogDescriptor::new("b", "hive"),
        ]);
        let provider = SystemTableProvider::new(registry, Arc::new(BrokenSerializer));

        let scan = provider.scan("catalogs").unwrap();
        assert_eq!(scan.row_count(), 2);
        assert!(scan.find_row("a").unwrap().has_errors());
        assert_eq!(
            scan.find_row("b").unwrap().get(2),
            Some(&Value::text("{}"))
        );
    }

    #[test]
    fn test_unknown_table_and_metadata() {
        let provider = SystemTableProvider::new(
            Arc::new(CatalogRegistry::new()),
            Arc::new(JsonPropertySerializer),
        );

        assert!(matches!(
            provider.scan("nope"),
            Err(CatalogError::TableNotFound(_))
        ));
        assert_eq!(
            provider.table_names(),
            vec!["catalog_status", "catalogs", "schemas", "tables"]
        );
        assert_eq!(provider.columns("catalog_status").unwrap().len(), 9);
        assert_eq!(provider.scan("catalogs").unwrap().snapshot_version, 0);
    }

    #[test]
    fn test_status_row_for_failed_catalog() {
        let registry = registry_with_failed(vec![CatalogDescriptor::new("hr", "jdbc").with_revision(4)]);
        let provider = SystemTableProvider::new(registry, Arc::new(JsonPropertySerializer));

        let scan = provider.scan("catalog_status").unwrap();
        let row = scan.find_row("hr").unwrap();
        assert_eq!(row.get(2), Some(&Value::text("failed")));
        assert_eq!(row.get(3), Some(&Value::Integer(4)));
        assert_eq!(row.get(5), Some(&Value::Null));
        assert!(row.get(6).and_then(Value::as_text).unwrap().contains("offline"));
        assert_eq!(row.get(7), Some(&Value::Null));
    }
}
