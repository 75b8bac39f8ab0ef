//! Sync fixture for catalink integration tests
//!
//! Wires a `ScriptedSource` and a `RecordingFactory` into a `SyncEngine` with
//! short timeouts, using only the public catalink API.

use super::fake_factory::RecordingFactory;
use super::scripted_source::ScriptedSource;
use catalink::{
    CatalogDescriptor, CatalogRegistry, ConnectorFactoryRegistry, CycleReport,
    JsonPropertySerializer, SyncConfig, SyncEngine, SystemTableProvider, TableScan,
};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const PROVIDER: &str = "hive";

/// Descriptor for the fake provider with a metastore uri
pub fn hive(name: &str, revision: u64, uri: &str) -> CatalogDescriptor {
    CatalogDescriptor::new(name, PROVIDER)
        .with_property("uri", uri)
        .with_revision(revision)
}

pub struct SyncFixture {
    pub source: Arc<ScriptedSource>,
    pub factory: Arc<RecordingFactory>,
    pub registry: Arc<CatalogRegistry>,
    pub engine: Arc<SyncEngine>,
    pub tables: SystemTableProvider,
}

impl SyncFixture {
    pub fn new(catalogs: Vec<CatalogDescriptor>) -> Self {
        Self::with_config(catalogs, SyncConfig::fast())
    }

    pub fn with_config(catalogs: Vec<CatalogDescriptor>, config: SyncConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let source = ScriptedSource::new(catalogs);
        let factory = RecordingFactory::new(PROVIDER);
        let mut factories = ConnectorFactoryRegistry::with_builtins();
        factories.register(factory.clone());

        let registry = Arc::new(CatalogRegistry::new());
        let engine = Arc::new(SyncEngine::new(
            source.clone(),
            Arc::new(factories),
            registry.clone(),
            config,
        ));
        let tables = SystemTableProvider::new(registry.clone(), Arc::new(JsonPropertySerializer));

        Self {
            source,
            factory,
            registry,
            engine,
            tables,
        }
    }

    /// Run one cycle, panicking if the fetch fails
    pub async fn cycle(&self) -> CycleReport {
        self.engine
            .run_cycle()
            .await
            .expect("reconciliation cycle failed")
    }

    pub fn scan(&self, table: &str) -> TableScan {
        self.tables.scan(table).expect("system table scan failed")
    }
}

/// Poll `condition` every few milliseconds until it holds or `timeout` passes
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Await `future`, failing the test if it takes longer than `timeout`
pub async fn within<T>(timeout: Duration, future: impl Future<Output = T>) -> T {
    tokio::time::timeout(timeout, future)
        .await
        .expect("operation did not finish in time")
}
