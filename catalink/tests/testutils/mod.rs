//! Test utilities for catalink integration tests
//!
//! - fake_factory: connector factory that records builds and releases
//! - scripted_source: metadata source whose contents and failures tests control
//! - test_fixture: engine, registry and system tables wired over both

#![allow(dead_code)]

pub mod fake_factory;
pub mod scripted_source;
pub mod test_fixture;
