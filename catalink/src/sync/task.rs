// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Background reconciliation loop

use super::backoff::Backoff;
use super::engine::SyncEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// Control handle for a running background sync task
///
/// Dropping the handle without calling [`SyncTaskHandle::shutdown`] also stops
/// the loop, once its current cycle completes.
pub struct SyncTaskHandle {
    trigger: Arc<Notify>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncTaskHandle {
    /// Request a cycle now instead of waiting for the interval
    ///
    /// Triggers that arrive while a cycle runs collapse into a single
    /// follow-up cycle.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop and wait for the task to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            log::error!("Catalog sync task ended abnormally: {}", e);
        }
    }
}

impl SyncEngine {
    /// Spawn the background loop on the current tokio runtime
    ///
    /// The first cycle runs immediately. A cycle that activated connectors is
    /// followed by an immediate confirmation cycle; otherwise a successful
    /// cycle sleeps for `interval`. After a failed fetch or an aborted cycle
    /// the loop sleeps for the next backoff delay.
    pub fn start(self: &Arc<Self>) -> SyncTaskHandle {
        let trigger = Arc::new(Notify::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(self.clone(), trigger.clone(), shutdown_rx));

        SyncTaskHandle {
            trigger,
            shutdown_tx,
            task,
        }
    }
}

async fn run_loop(
    engine: Arc<SyncEngine>,
    trigger: Arc<Notify>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = Backoff::from_config(engine.config());
    let mut delay = Duration::ZERO;

    log::info!(
        "Catalog sync started (source: {}, interval: {:?})",
        engine.source().describe(),
        engine.config().interval
    );

    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = trigger.notified() => {
                log::debug!("Catalog sync cycle triggered on demand");
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        if *shutdown.borrow() {
            break;
        }

        delay = match engine.run_cycle().await {
            Ok(report) => {
                backoff.reset();
                if report.successful_builds() > 0 {
                    // confirm against a fresh fetch so catalogs removed upstream
                    // while they were loading are retired right away
                    Duration::ZERO
                } else {
                    engine.config().interval
                }
            }
            Err(e) => {
                let wait = backoff.next_delay();
                log::warn!(
                    "Catalog sync cycle failed ({} in a row), retrying in {:?}: {}",
                    backoff.failures(),
                    wait,
                    e
                );
                wait
            }
        };
    }

    log::info!("Catalog sync stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::descriptor::CatalogDescriptor;
    use crate::catalog::factory::ConnectorFactoryRegistry;
    use crate::catalog::registry::CatalogRegistry;
    use crate::catalog::source::StaticMetadataSource;
    use crate::sync::config::SyncConfig;

    #[tokio::test]
    async fn test_trigger_picks_up_change_before_interval() {
        let source = Arc::new(StaticMetadataSource::new(vec![]));
        let engine = Arc::new(SyncEngine::new(
            source.clone(),
            Arc::new(ConnectorFactoryRegistry::with_builtins()),
            Arc::new(CatalogRegistry::new()),
            SyncConfig::fast().with_interval(Duration::from_secs(3600)),
        ));
        let handle = engine.start();

        // wait for the initial cycle
        for _ in 0..100 {
            if engine.stats().cycles > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        source.upsert(CatalogDescriptor::new("sales", "memory"));
        handle.trigger();

        let mut found = false;
        for _ in 0..200 {
            if engine.registry().get_catalog("sales").is_some() {
                found = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(found);

        handle.shutdown().await;
    }
}
