// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Connector handles and their lifecycle
//!
//! A [`ConnectorHandle`] binds one descriptor to the connector built from it.
//! Handles live inside published registry snapshots and are shared with
//! readers, so every mutable part is either an atomic or a set-once cell:
//!
//! ```text
//! Loading ──► Active ──► Retiring ──► (released)
//!    │                      ▲
//!    └──────► Failed ───────┘
//! ```
//!
//! Transitions only move forward. Readers observe the state at access time,
//! which is how a handle that retires under an old snapshot stops being usable
//! even for readers that still hold that snapshot.

use super::descriptor::CatalogDescriptor;
use super::error::{CatalogError, CatalogResult};
use super::factory::{release_connector, ConnectorFactory, NativeConnector};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle state of a connector handle
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorState {
    Loading = 0,
    Active = 1,
    Failed = 2,
    Retiring = 3,
}

impl ConnectorState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ConnectorState::Loading,
            1 => ConnectorState::Active,
            2 => ConnectorState::Failed,
            _ => ConnectorState::Retiring,
        }
    }
}

impl fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectorState::Loading => "loading",
            ConnectorState::Active => "active",
            ConnectorState::Failed => "failed",
            ConnectorState::Retiring => "retiring",
        };
        write!(f, "{}", s)
    }
}

/// Built connector together with the factory that owns its teardown
struct BuiltConnector {
    native: NativeConnector,
    factory: Arc<dyn ConnectorFactory>,
}

/// Live binding between a catalog descriptor and its connector
pub struct ConnectorHandle {
    descriptor: Arc<CatalogDescriptor>,
    state: AtomicU8,
    built: OnceCell<BuiltConnector>,
    error: OnceCell<CatalogError>,
    created_at: DateTime<Utc>,
    loaded_at: OnceCell<DateTime<Utc>>,
    /// Consecutive build attempts for this catalog, including this one
    attempts: u32,
    released: AtomicBool,
}

impl ConnectorHandle {
    /// Create a handle in `Loading` state, before its build starts
    pub fn loading(descriptor: Arc<CatalogDescriptor>, attempts: u32) -> Self {
        Self {
            descriptor,
            state: AtomicU8::new(ConnectorState::Loading as u8),
            built: OnceCell::new(),
            error: OnceCell::new(),
            created_at: Utc::now(),
            loaded_at: OnceCell::new(),
            attempts,
            released: AtomicBool::new(false),
        }
    }

    /// Create a handle that failed before a build could start
    pub fn failed(descriptor: Arc<CatalogDescriptor>, error: CatalogError, attempts: u32) -> Self {
        let handle = Self::loading(descriptor, attempts);
        handle.fail(error);
        handle
    }

    /// Complete a build: `Loading → Active`
    ///
    /// # Returns
    /// * `Ok(())` if the handle is now active
    /// * `Err(native)` if the handle already left `Loading`; the caller owns the
    ///   connector and must release it
    pub fn activate(
        &self,
        native: NativeConnector,
        factory: Arc<dyn ConnectorFactory>,
    ) -> Result<(), NativeConnector> {
        if self.state() != ConnectorState::Loading {
            return Err(native);
        }
        let retained = native.clone();
        if self.built.set(BuiltConnector { native, factory }).is_err() {
            return Err(retained);
        }
        let _ = self.loaded_at.set(Utc::now());

        self.state
            .compare_exchange(
                ConnectorState::Loading as u8,
                ConnectorState::Active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| {
                // never became active; the caller releases the connector
                self.released.store(true, Ordering::Release);
                retained
            })
    }

    /// Record a build failure: `Loading → Failed`
    ///
    /// Returns `false` if the handle was not loading.
    pub fn fail(&self, error: CatalogError) -> bool {
        if self.state() != ConnectorState::Loading {
            return false;
        }
        let _ = self.error.set(error);
        self.state
            .compare_exchange(
                ConnectorState::Loading as u8,
                ConnectorState::Failed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Begin retirement: `Active | Failed → Retiring`
    ///
    /// Loading handles are never retired; their build finishes first.
    /// Returns `true` if this call performed the transition.
    pub fn begin_retire(&self) -> bool {
        for from in [ConnectorState::Active, ConnectorState::Failed] {
            if self
                .state
                .compare_exchange(
                    from as u8,
                    ConnectorState::Retiring as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return true;
            }
        }
        false
    }

    /// Release the native connector through its factory
    ///
    /// Only retiring handles release, and only once, even when the factory
    /// panics or times out.
    ///
    /// # Returns
    /// * `Ok(true)` if this call handed the connector to its factory
    /// * `Ok(false)` if there was nothing to release
    /// * `Err(CatalogError)` if the factory's `release` panicked or timed out
    pub async fn release(&self, timeout: Duration) -> CatalogResult<bool> {
        if self.state() != ConnectorState::Retiring {
            return Ok(false);
        }
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        let Some(built) = self.built.get() else {
            return Ok(false);
        };
        release_connector(
            built.factory.clone(),
            built.native.clone(),
            self.name(),
            timeout,
        )
        .await?;
        log::info!("Released connector for catalog '{}'", self.name());
        Ok(true)
    }

    pub fn state(&self) -> ConnectorState {
        ConnectorState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether query planning may use this handle right now
    pub fn is_usable(&self) -> bool {
        self.state() == ConnectorState::Active
    }

    /// Connector for query planning; `None` unless the handle is active
    pub fn native(&self) -> Option<NativeConnector> {
        if !self.is_usable() {
            return None;
        }
        self.built.get().map(|b| b.native.clone())
    }

    pub fn descriptor(&self) -> &Arc<CatalogDescriptor> {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn error(&self) -> Option<&CatalogError> {
        self.error.get()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at.get().copied()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ConnectorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorHandle")
            .field("descriptor", &self.descriptor)
            .field("state", &self.state())
            .field("error", &self.error.get())
            .field("attempts", &self.attempts)
            .field("released", &self.is_released())
            .finish()
    }
}
