// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Built-in connector providers
//!
//! Adding a provider requires implementing the ConnectorFactory trait and
//! adding one line to the register_builtin_factories function. Engine-specific
//! providers are registered by the embedding application instead.

use super::factory::ConnectorFactoryRegistry;
use std::sync::Arc;

pub mod memory;

/// Register all built-in connector factories
pub fn register_builtin_factories(registry: &mut ConnectorFactoryRegistry) {
    registry.register(Arc::new(memory::MemoryConnectorFactory::new()));

    log::debug!("Built-in connector factory registration complete");
}
