// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reconciliation planning
//!
//! Compares a freshly fetched descriptor set with the published registry
//! snapshot and decides, per catalog name, what the cycle has to do. Planning
//! is pure: it builds nothing and publishes nothing.

use crate::catalog::descriptor::CatalogDescriptor;
use crate::catalog::error::CatalogError;
use crate::catalog::handle::{ConnectorHandle, ConnectorState};
use crate::catalog::registry::RegistrySnapshot;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// What a cycle does with one catalog name
#[derive(Debug, Clone)]
pub enum ReconcileAction {
    /// New catalog: build a connector
    Add { descriptor: Arc<CatalogDescriptor> },

    /// Active catalog with a new revision: build, swap, then retire `previous`
    Replace {
        descriptor: Arc<CatalogDescriptor>,
        previous: Arc<ConnectorHandle>,
        attempts: u32,
    },

    /// Catalog whose last build did not succeed: build again from scratch
    Retry {
        descriptor: Arc<CatalogDescriptor>,
        previous: Arc<ConnectorHandle>,
    },

    /// Descriptor failed validation; no build is attempted
    Reject {
        descriptor: Arc<CatalogDescriptor>,
        error: CatalogError,
        previous: Option<Arc<ConnectorHandle>>,
    },

    /// Catalog no longer defined upstream
    Remove { previous: Arc<ConnectorHandle> },

    /// Unchanged active catalog
    Keep { previous: Arc<ConnectorHandle> },
}

/// Discriminant of a [`ReconcileAction`], used for counting and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Add,
    Replace,
    Retry,
    Reject,
    Remove,
    Keep,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Add,
        ActionKind::Replace,
        ActionKind::Retry,
        ActionKind::Reject,
        ActionKind::Remove,
        ActionKind::Keep,
    ];
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Add => "add",
            ActionKind::Replace => "replace",
            ActionKind::Retry => "retry",
            ActionKind::Reject => "reject",
            ActionKind::Remove => "remove",
            ActionKind::Keep => "keep",
        };
        f.write_str(name)
    }
}

impl ReconcileAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            ReconcileAction::Add { .. } => ActionKind::Add,
            ReconcileAction::Replace { .. } => ActionKind::Replace,
            ReconcileAction::Retry { .. } => ActionKind::Retry,
            ReconcileAction::Reject { .. } => ActionKind::Reject,
            ReconcileAction::Remove { .. } => ActionKind::Remove,
            ReconcileAction::Keep { .. } => ActionKind::Keep,
        }
    }
}

/// Per-name actions for one reconciliation cycle
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    actions: BTreeMap<String, ReconcileAction>,
    /// Fetched descriptors dropped because they had no usable name
    skipped: usize,
    /// The current snapshot carries pending failures that this plan settles
    clears_failures: bool,
}

impl ReconcilePlan {
    pub fn actions(&self) -> &BTreeMap<String, ReconcileAction> {
        &self.actions
    }

    pub fn into_actions(self) -> BTreeMap<String, ReconcileAction> {
        self.actions
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Nothing to build, remove or record: the registry stays as published
    pub fn is_noop(&self) -> bool {
        !self.clears_failures
            && self
                .actions
                .values()
                .all(|a| matches!(a, ReconcileAction::Keep { .. }))
    }

    /// Number of actions of the given kind
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.values().filter(|a| a.kind() == kind).count()
    }
}

impl fmt::Display for ReconcilePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in ActionKind::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", kind, self.count(*kind))?;
        }
        Ok(())
    }
}

/// Diff `fetched` against `current`
///
/// Rules, by catalog name:
/// - only fetched: add
/// - both, changed revision or content, current active: replace
/// - both, current not active: retry (a failed catalog is rebuilt every cycle)
/// - both, unchanged, current active: keep
/// - only current: remove
///
/// Invalid descriptors and names fetched more than once are rejected. Names
/// that are empty cannot be keyed and are skipped.
pub fn plan_reconciliation(
    current: &RegistrySnapshot,
    fetched: Vec<CatalogDescriptor>,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    // First pass: desired state by name, with duplicate detection
    let mut desired: BTreeMap<String, (Arc<CatalogDescriptor>, Option<CatalogError>)> =
        BTreeMap::new();
    for descriptor in fetched {
        if descriptor.name().trim().is_empty() {
            log::warn!(
                "Skipping catalog descriptor with empty name (provider '{}')",
                descriptor.provider()
            );
            plan.skipped += 1;
            continue;
        }
        let name = descriptor.name().to_string();
        match desired.entry(name) {
            Entry::Vacant(slot) => {
                let error = descriptor.validate().err();
                slot.insert((Arc::new(descriptor), error));
            }
            Entry::Occupied(mut slot) => {
                let error = CatalogError::invalid_descriptor(
                    slot.key().clone(),
                    "catalog name defined more than once in metadata source",
                );
                slot.get_mut().1 = Some(error);
            }
        }
    }

    // Second pass: compare with the published snapshot
    for (name, (descriptor, error)) in desired {
        let previous = current.get(&name).cloned();

        let action = match (error, previous) {
            (Some(error), previous) => ReconcileAction::Reject {
                descriptor,
                error,
                previous,
            },
            (None, None) => ReconcileAction::Add { descriptor },
            (None, Some(previous)) if previous.state() != ConnectorState::Active => {
                ReconcileAction::Retry {
                    descriptor,
                    previous,
                }
            }
            (None, Some(previous)) if previous.descriptor().is_same_revision(&descriptor) => {
                ReconcileAction::Keep { previous }
            }
            (None, Some(previous)) => {
                let attempts = current
                    .failure(&name)
                    .filter(|f| f.revision == descriptor.revision())
                    .map_or(1, |f| f.attempts + 1);
                ReconcileAction::Replace {
                    descriptor,
                    previous,
                    attempts,
                }
            }
        };
        plan.actions.insert(name, action);
    }

    for (name, handle) in current.entries() {
        if !plan.actions.contains_key(name) {
            plan.actions.insert(
                name.clone(),
                ReconcileAction::Remove {
                    previous: handle.clone(),
                },
            );
        }
    }

    plan.clears_failures = current.failures().keys().any(|name| {
        matches!(
            plan.actions.get(name),
            Some(ReconcileAction::Keep { .. }) | None
        )
    });

    plan
}
