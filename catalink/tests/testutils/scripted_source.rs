//! Metadata source controlled by the test

use async_trait::async_trait;
use catalink::{CatalogDescriptor, CatalogError, CatalogResult, MetadataSource};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub struct ScriptedSource {
    catalogs: RwLock<Vec<CatalogDescriptor>>,
    failing: AtomicBool,
    panicking: AtomicBool,
    delay: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(catalogs: Vec<CatalogDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            catalogs: RwLock::new(catalogs),
            ..Self::default()
        })
    }

    pub fn set(&self, catalogs: Vec<CatalogDescriptor>) {
        *self.catalogs.write() = catalogs;
    }

    pub fn upsert(&self, descriptor: CatalogDescriptor) {
        let mut catalogs = self.catalogs.write();
        catalogs.retain(|d| d.name() != descriptor.name());
        catalogs.push(descriptor);
    }

    pub fn remove(&self, name: &str) {
        self.catalogs.write().retain(|d| d.name() != name);
    }

    /// Make every fetch fail until called again with `false`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every fetch panic until called again with `false`
    pub fn set_panicking(&self, panicking: bool) {
        self.panicking.store(panicking, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSource for ScriptedSource {
    async fn list_catalogs(&self) -> CatalogResult<Vec<CatalogDescriptor>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.panicking.load(Ordering::SeqCst) {
            panic!("metadata client crashed");
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::MetadataFetch(
                "connection refused".to_string(),
            ));
        }
        Ok(self.catalogs.read().clone())
    }

    fn describe(&self) -> String {
        "scripted source".to_string()
    }
}
