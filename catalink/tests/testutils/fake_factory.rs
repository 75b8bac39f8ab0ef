//! Recording connector factory
//!
//! Builds `FakeConnector`s and keeps count of every build and release so tests
//! can assert on churn. Individual catalogs can be made to fail, hang or panic,
//! both while building and while being released.

use async_trait::async_trait;
use catalink::{CatalogDescriptor, CatalogError, CatalogResult, Connector, ConnectorFactory, NativeConnector};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Connector carrying the revision and uri it was built from
#[derive(Debug)]
pub struct FakeConnector {
    pub catalog: String,
    pub revision: u64,
    pub uri: Option<String>,
    released: AtomicBool,
    broken_introspection: bool,
}

impl FakeConnector {
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn list_schemas(&self) -> CatalogResult<Vec<String>> {
        if self.broken_introspection {
            return Err(CatalogError::Io("metastore unreachable".to_string()));
        }
        Ok(vec!["default".to_string()])
    }

    fn list_tables(&self, schema: &str) -> CatalogResult<Vec<String>> {
        Ok(vec![format!("{}_events", schema)])
    }
}

/// Downcast a native connector built by [`RecordingFactory`]
pub fn as_fake(native: &NativeConnector) -> &FakeConnector {
    native
        .as_any()
        .downcast_ref::<FakeConnector>()
        .expect("connector was not built by RecordingFactory")
}

pub struct RecordingFactory {
    provider: String,
    failing: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    broken_introspection: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    release_panics: Mutex<HashSet<String>>,
    release_delays: Mutex<HashMap<String, Duration>>,
    build_attempts: AtomicUsize,
    built: Mutex<Vec<(String, u64)>>,
    released: Mutex<Vec<(String, u64)>>,
    double_releases: AtomicUsize,
}

impl RecordingFactory {
    pub fn new(provider: &str) -> Arc<Self> {
        Arc::new(Self {
            provider: provider.to_string(),
            failing: Mutex::new(HashSet::new()),
            panicking: Mutex::new(HashSet::new()),
            broken_introspection: Mutex::new(HashSet::new()),
            delays: Mutex::new(HashMap::new()),
            release_panics: Mutex::new(HashSet::new()),
            release_delays: Mutex::new(HashMap::new()),
            build_attempts: AtomicUsize::new(0),
            built: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
            double_releases: AtomicUsize::new(0),
        })
    }

    /// Make every build of `catalog` fail until healed
    pub fn fail(&self, catalog: &str) {
        self.failing.lock().insert(catalog.to_string());
    }

    pub fn heal(&self, catalog: &str) {
        self.failing.lock().remove(catalog);
        self.panicking.lock().remove(catalog);
        self.delays.lock().remove(catalog);
    }

    pub fn panic_on(&self, catalog: &str) {
        self.panicking.lock().insert(catalog.to_string());
    }

    pub fn delay(&self, catalog: &str, delay: Duration) {
        self.delays.lock().insert(catalog.to_string(), delay);
    }

    /// Make `release` of this catalog's connector panic
    pub fn panic_on_release(&self, catalog: &str) {
        self.release_panics.lock().insert(catalog.to_string());
    }

    /// Make `release` of this catalog's connector sleep before returning
    pub fn delay_release(&self, catalog: &str, delay: Duration) {
        self.release_delays.lock().insert(catalog.to_string(), delay);
    }

    pub fn break_introspection(&self, catalog: &str) {
        self.broken_introspection.lock().insert(catalog.to_string());
    }

    /// Every call to `build`, successful or not
    pub fn build_attempts(&self) -> usize {
        self.build_attempts.load(Ordering::SeqCst)
    }

    /// Successful builds as (catalog, revision), in completion order
    pub fn built(&self) -> Vec<(String, u64)> {
        self.built.lock().clone()
    }

    pub fn released(&self) -> Vec<(String, u64)> {
        self.released.lock().clone()
    }

    pub fn live_connectors(&self) -> usize {
        self.built.lock().len() - self.released.lock().len()
    }

    pub fn double_releases(&self) -> usize {
        self.double_releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectorFactory for RecordingFactory {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn build(&self, descriptor: &CatalogDescriptor) -> CatalogResult<NativeConnector> {
        self.build_attempts.fetch_add(1, Ordering::SeqCst);
        let name = descriptor.name().to_string();

        let delay = self.delays.lock().get(&name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.panicking.lock().contains(&name) {
            panic!("connector for {} exploded", name);
        }
        if self.failing.lock().contains(&name) {
            return Err(CatalogError::connector_build(&name, "metastore refused connection"));
        }

        self.built.lock().push((name.clone(), descriptor.revision()));
        Ok(Arc::new(FakeConnector {
            catalog: name.clone(),
            revision: descriptor.revision(),
            uri: descriptor.property("uri").map(str::to_string),
            released: AtomicBool::new(false),
            broken_introspection: self.broken_introspection.lock().contains(&name),
        }))
    }

    async fn release(&self, native: NativeConnector) {
        let fake = as_fake(&native);
        let delay = self.release_delays.lock().get(&fake.catalog).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.release_panics.lock().contains(&fake.catalog) {
            panic!("closing connector for {} crashed", fake.catalog);
        }
        if fake.released.swap(true, Ordering::SeqCst) {
            self.double_releases.fetch_add(1, Ordering::SeqCst);
            return;
        }
        self.released
            .lock()
            .push((fake.catalog.clone(), fake.revision));
    }
}
