// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for catalink
//!
//! Provides one-shot synchronization, a watch mode that prints registry
//! changes, and an interactive console over the system tables.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::{handle_console, handle_sync, handle_version, handle_watch, load_config};
