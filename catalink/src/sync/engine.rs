// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reconciliation engine
//!
//! One cycle runs as follows:
//!
//! 1. fetch the full descriptor set (bounded by `fetch_timeout`); a failure
//!    aborts the cycle and leaves the registry untouched
//! 2. plan per-name actions against the current snapshot
//! 3. publish `Loading` handles for new catalogs and retries
//! 4. build connectors concurrently (each bounded by `build_timeout`)
//! 5. publish the composed mapping as one snapshot
//! 6. retire and release replaced or removed handles (each release on its own
//!    task, bounded by `release_timeout`)
//!
//! Per-catalog failures end up in the published snapshot as `Failed` handles
//! or pending [`SyncFailure`] records and never fail the cycle itself.

use super::config::SyncConfig;
use super::diff::{plan_reconciliation, ReconcileAction};
use super::stats::{SyncStats, SyncStatsSnapshot};
use crate::catalog::descriptor::CatalogDescriptor;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::factory::{
    release_connector, ConnectorFactory, ConnectorFactoryRegistry, NativeConnector,
};
use crate::catalog::handle::{ConnectorHandle, ConnectorState};
use crate::catalog::registry::{CatalogRegistry, SyncFailure};
use crate::catalog::source::MetadataSource;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Outcome of one successful reconciliation cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    /// Version of the final snapshot, `None` when nothing changed
    pub published_version: Option<u64>,
    pub added: Vec<String>,
    pub replaced: Vec<String>,
    /// Previously failed catalogs that built successfully this time
    pub recovered: Vec<String>,
    pub removed: Vec<String>,
    /// Catalogs whose build or validation failed this cycle
    pub failed: Vec<String>,
    pub unchanged: usize,
    /// Fetched descriptors dropped for lacking a name
    pub skipped: usize,
    pub elapsed: Duration,
}

impl CycleReport {
    /// Number of connector builds that succeeded
    pub fn successful_builds(&self) -> usize {
        self.added.len() + self.replaced.len() + self.recovered.len()
    }

    pub fn has_changes(&self) -> bool {
        self.published_version.is_some()
    }
}

enum BuildKind {
    Add,
    Retry,
    Replace { previous: Arc<ConnectorHandle> },
}

struct PendingBuild {
    name: String,
    handle: Arc<ConnectorHandle>,
    kind: BuildKind,
}

type BuildOutput = CatalogResult<(NativeConnector, Arc<dyn ConnectorFactory>)>;

/// Keeps the catalog registry in step with a metadata source
pub struct SyncEngine {
    source: Arc<dyn MetadataSource>,
    factories: Arc<ConnectorFactoryRegistry>,
    registry: Arc<CatalogRegistry>,
    config: SyncConfig,
    stats: SyncStats,
    /// Held for the whole cycle so cycles never overlap
    cycle_lock: Mutex<()>,
}

impl SyncEngine {
    /// Create an engine that writes into `registry`
    ///
    /// # Arguments
    /// * `source` - Where the desired catalog set comes from
    /// * `factories` - Connector factories keyed by provider
    /// * `registry` - Registry this engine becomes the sole writer of
    /// * `config` - Schedule, timeouts and backoff
    pub fn new(
        source: Arc<dyn MetadataSource>,
        factories: Arc<ConnectorFactoryRegistry>,
        registry: Arc<CatalogRegistry>,
        config: SyncConfig,
    ) -> Self {
        Self {
            source,
            factories,
            registry,
            config,
            stats: SyncStats::new(),
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<CatalogRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn MetadataSource> {
        &self.source
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run one reconciliation cycle
    ///
    /// The cycle runs on its own task. Dropping the returned future does not
    /// cancel it: published `Loading` handles are still resolved and every
    /// connector built along the way is either published or released.
    ///
    /// # Returns
    /// * `Ok(CycleReport)` - The cycle completed, possibly with per-catalog failures
    /// * `Err(CatalogError::MetadataFetch | Timeout)` - The fetch failed; the
    ///   registry is unchanged
    /// * `Err(CatalogError::CycleAborted)` - The cycle panicked part way
    pub async fn run_cycle(self: &Arc<Self>) -> CatalogResult<CycleReport> {
        let engine = self.clone();
        match tokio::spawn(async move { engine.cycle().await }).await {
            Ok(result) => result,
            Err(e) => {
                let error = CatalogError::CycleAborted(e.to_string());
                log::error!("{}", error);
                self.stats.record_cycle_failure(&error.to_string());
                Err(error)
            }
        }
    }

    async fn cycle(&self) -> CatalogResult<CycleReport> {
        let _cycle = self.cycle_lock.lock().await;
        let started = Instant::now();

        let fetched = match self.fetch().await {
            Ok(fetched) => fetched,
            Err(e) => {
                log::warn!(
                    "Catalog fetch from {} failed, keeping registry v{}: {}",
                    self.source.describe(),
                    self.registry.version(),
                    e
                );
                self.stats.record_cycle_failure(&e.to_string());
                return Err(e);
            }
        };

        let current = self.registry.snapshot();
        let plan = plan_reconciliation(&current, fetched);

        let mut report = CycleReport {
            skipped: plan.skipped(),
            ..CycleReport::default()
        };

        if plan.is_noop() {
            log::debug!(
                "Catalog registry v{} is up to date ({} catalogs)",
                current.version(),
                current.len()
            );
            report.unchanged = plan.actions().len();
            report.elapsed = started.elapsed();
            self.stats.record_cycle_success(false);
            return Ok(report);
        }

        log::info!("Reconciling catalogs against v{}: {}", current.version(), plan);

        let mut next: BTreeMap<String, Arc<ConnectorHandle>> = BTreeMap::new();
        let mut failures: BTreeMap<String, SyncFailure> = BTreeMap::new();
        let mut builds: Vec<PendingBuild> = Vec::new();
        let mut retiring: Vec<Arc<ConnectorHandle>> = Vec::new();
        let mut announce_loading = false;

        for (name, action) in plan.into_actions() {
            match action {
                ReconcileAction::Keep { previous } => {
                    next.insert(name, previous);
                    report.unchanged += 1;
                }
                ReconcileAction::Add { descriptor } => {
                    let handle = Arc::new(ConnectorHandle::loading(descriptor, 1));
                    next.insert(name.clone(), handle.clone());
                    builds.push(PendingBuild {
                        name,
                        handle,
                        kind: BuildKind::Add,
                    });
                    announce_loading = true;
                }
                ReconcileAction::Retry {
                    descriptor,
                    previous,
                } => {
                    let attempts = if previous.descriptor().is_same_revision(&descriptor) {
                        previous.attempts() + 1
                    } else {
                        1
                    };
                    let handle = Arc::new(ConnectorHandle::loading(descriptor, attempts));
                    next.insert(name.clone(), handle.clone());
                    retiring.push(previous);
                    builds.push(PendingBuild {
                        name,
                        handle,
                        kind: BuildKind::Retry,
                    });
                    announce_loading = true;
                }
                ReconcileAction::Replace {
                    descriptor,
                    previous,
                    attempts,
                } => {
                    // the active handle keeps serving until its successor is active
                    if let Some(failure) = current.failure(&name) {
                        failures.insert(name.clone(), failure.clone());
                    }
                    let handle = Arc::new(ConnectorHandle::loading(descriptor, attempts));
                    next.insert(name.clone(), previous.clone());
                    builds.push(PendingBuild {
                        name,
                        handle,
                        kind: BuildKind::Replace { previous },
                    });
                }
                ReconcileAction::Reject {
                    descriptor,
                    error,
                    previous,
                } => {
                    log::warn!("Rejected catalog descriptor {}: {}", descriptor, error);
                    report.failed.push(name.clone());
                    match previous {
                        Some(previous) if previous.state() == ConnectorState::Active => {
                            let attempts = current
                                .failure(&name)
                                .filter(|f| f.revision == descriptor.revision())
                                .map_or(1, |f| f.attempts + 1);
                            failures.insert(
                                name.clone(),
                                SyncFailure {
                                    revision: descriptor.revision(),
                                    error,
                                    failed_at: Utc::now(),
                                    attempts,
                                },
                            );
                            next.insert(name, previous);
                        }
                        previous => {
                            let attempts = previous
                                .as_ref()
                                .filter(|p| p.descriptor().is_same_revision(&descriptor))
                                .map_or(1, |p| p.attempts() + 1);
                            let handle =
                                Arc::new(ConnectorHandle::failed(descriptor, error, attempts));
                            next.insert(name, handle);
                            retiring.extend(previous);
                        }
                    }
                }
                ReconcileAction::Remove { previous } => {
                    log::info!("Catalog '{}' was removed upstream", name);
                    retiring.push(previous);
                    report.removed.push(name);
                }
            }
        }

        if announce_loading {
            self.registry.publish(next.clone(), failures.clone());
        }

        for (build, output) in self.run_builds(builds).await {
            self.apply_build(build, output, &mut next, &mut failures, &mut retiring, &mut report)
                .await;
        }

        let snapshot = self.registry.publish(next, failures);
        report.published_version = Some(snapshot.version());

        for handle in retiring {
            self.retire(&handle).await;
        }

        report.elapsed = started.elapsed();
        self.stats.record_cycle_success(true);
        log::info!(
            "Catalog cycle finished in {:?}: +{} ~{} ^{} -{} !{}",
            report.elapsed,
            report.added.len(),
            report.replaced.len(),
            report.recovered.len(),
            report.removed.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Publish an empty registry and release every connector
    ///
    /// Used at shutdown. Waits for any running cycle to finish first.
    pub async fn release_all(&self) -> usize {
        let _cycle = self.cycle_lock.lock().await;
        let previous = self.registry.snapshot();
        if previous.is_empty() && previous.failures().is_empty() {
            return 0;
        }
        self.registry.publish(BTreeMap::new(), BTreeMap::new());

        let mut released = 0;
        for handle in previous.handles() {
            if self.retire(handle).await {
                released += 1;
            }
        }
        log::info!("Released {} catalog connectors", released);
        released
    }

    async fn fetch(&self) -> CatalogResult<Vec<CatalogDescriptor>> {
        let timeout = self.config.fetch_timeout;
        match tokio::time::timeout(timeout, self.source.list_catalogs()).await {
            Ok(Ok(catalogs)) => Ok(catalogs),
            Ok(Err(e @ CatalogError::MetadataFetch(_))) => Err(e),
            Ok(Err(e)) => Err(CatalogError::MetadataFetch(e.to_string())),
            Err(_) => Err(CatalogError::Timeout {
                operation: format!("metadata fetch from {}", self.source.describe()),
                elapsed: timeout,
            }),
        }
    }

    /// Start every build on its own task, then collect the outputs in order
    async fn run_builds(&self, builds: Vec<PendingBuild>) -> Vec<(PendingBuild, BuildOutput)> {
        let tasks: Vec<(PendingBuild, JoinHandle<BuildOutput>)> = builds
            .into_iter()
            .map(|build| {
                let factories = self.factories.clone();
                let descriptor = build.handle.descriptor().clone();
                let timeout = self.config.build_timeout;
                let task =
                    tokio::spawn(
                        async move { build_connector(&factories, &descriptor, timeout).await },
                    );
                (build, task)
            })
            .collect();

        let mut outputs = Vec::with_capacity(tasks.len());
        for (build, task) in tasks {
            let output = match task.await {
                Ok(output) => output,
                Err(e) => Err(CatalogError::connector_build(
                    &build.name,
                    format!("build task aborted: {}", e),
                )),
            };
            outputs.push((build, output));
        }
        outputs
    }

    async fn apply_build(
        &self,
        build: PendingBuild,
        output: BuildOutput,
        next: &mut BTreeMap<String, Arc<ConnectorHandle>>,
        failures: &mut BTreeMap<String, SyncFailure>,
        retiring: &mut Vec<Arc<ConnectorHandle>>,
        report: &mut CycleReport,
    ) {
        let PendingBuild { name, handle, kind } = build;

        let error = match output {
            Ok((native, factory)) => match handle.activate(native, factory.clone()) {
                Ok(()) => None,
                Err(native) => {
                    let released =
                        release_connector(factory, native, &name, self.config.release_timeout)
                            .await;
                    self.record_release(&name, &released);
                    Some(CatalogError::connector_build(
                        &name,
                        "handle left loading state before activation",
                    ))
                }
            },
            Err(e) => Some(e),
        };

        match error {
            None => {
                self.stats.record_build(true);
                log::info!(
                    "Catalog {} is active (attempt {})",
                    handle.descriptor(),
                    handle.attempts()
                );
                failures.remove(&name);
                match kind {
                    BuildKind::Add => report.added.push(name),
                    BuildKind::Retry => report.recovered.push(name),
                    BuildKind::Replace { previous } => {
                        next.insert(name.clone(), handle);
                        retiring.push(previous);
                        report.replaced.push(name);
                    }
                }
            }
            Some(error) => {
                self.stats.record_build(false);
                log::warn!(
                    "Catalog {} failed to build (attempt {}, {}): {}",
                    handle.descriptor(),
                    handle.attempts(),
                    error.kind(),
                    error
                );
                handle.fail(error.clone());
                if let BuildKind::Replace { .. } = kind {
                    failures.insert(
                        name.clone(),
                        SyncFailure {
                            revision: handle.descriptor().revision(),
                            error,
                            failed_at: Utc::now(),
                            attempts: handle.attempts(),
                        },
                    );
                }
                report.failed.push(name);
            }
        }
    }

    /// Move a handle to `Retiring` and release its connector
    async fn retire(&self, handle: &Arc<ConnectorHandle>) -> bool {
        if handle.begin_retire() {
            log::debug!("Retiring catalog handle {}", handle.descriptor());
        }
        match handle.release(self.config.release_timeout).await {
            Ok(released) => {
                if released {
                    self.record_release(handle.name(), &Ok(()));
                }
                released
            }
            Err(e) => {
                self.record_release(handle.name(), &Err(e));
                false
            }
        }
    }

    fn record_release(&self, catalog: &str, result: &CatalogResult<()>) {
        match result {
            Ok(()) => self.stats.record_release(true),
            Err(e) => {
                self.stats.record_release(false);
                log::error!(
                    "Connector for catalog '{}' was not released cleanly: {}",
                    catalog,
                    e
                );
            }
        }
    }
}

async fn build_connector(
    factories: &ConnectorFactoryRegistry,
    descriptor: &CatalogDescriptor,
    timeout: Duration,
) -> BuildOutput {
    let factory = factories
        .get(descriptor.provider())
        .ok_or_else(|| CatalogError::UnsupportedProvider {
            name: descriptor.name().to_string(),
            provider: descriptor.provider().to_string(),
        })?;

    match tokio::time::timeout(timeout, factory.build(descriptor)).await {
        Ok(Ok(native)) => Ok((native, factory)),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(CatalogError::Timeout {
            operation: format!("connector build for catalog '{}'", descriptor.name()),
            elapsed: timeout,
        }),
    }
}
