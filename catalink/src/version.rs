// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Build information

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

const UNKNOWN: &str = "unknown";

/// Version, compile date and commit of a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    version: String,
    compile_date: String,
    git_commit: String,
}

impl BuildInfo {
    pub fn new(
        version: impl Into<String>,
        compile_date: impl Into<String>,
        git_commit: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            compile_date: compile_date.into(),
            git_commit: git_commit.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn compile_date(&self) -> &str {
        &self.compile_date
    }

    pub fn git_commit(&self) -> &str {
        &self.git_commit
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (compiled {}, commit {})",
            self.version, self.compile_date, self.git_commit
        )
    }
}

static BUILD_INFO: Lazy<BuildInfo> = Lazy::new(|| {
    BuildInfo::new(
        env!("CARGO_PKG_VERSION"),
        option_env!("CATALINK_COMPILE_DATE").unwrap_or(UNKNOWN),
        option_env!("CATALINK_GIT_COMMIT").unwrap_or(UNKNOWN),
    )
});

/// Build information of this crate
///
/// `compile_date` and `git_commit` come from the `CATALINK_COMPILE_DATE` and
/// `CATALINK_GIT_COMMIT` environment variables at compile time.
pub fn build_info() -> &'static BuildInfo {
    &BUILD_INFO
}
