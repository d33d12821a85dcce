pub mod archive;
pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod execution;
pub mod harvest;
pub mod pipeline;
pub mod workspace;

use async_trait::async_trait;
use anyhow::Result;
use crate::core::{BuildConfig, BuildOutcome};
use std::path::Path;

pub use crate::error::PackError;

#[async_trait]
pub trait BuildRunner: Send + Sync {
    async fn detect(&self, path: &Path) -> bool;
    async fn build(&self, workspace: &Path, config: &BuildConfig) -> Result<BuildOutcome>;
}

/// Drives the real `cargo` binary, streaming its output to our own stdout and stderr.
pub struct CargoBuildRunner {
    program: String,
}

impl Default for CargoBuildRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CargoBuildRunner {
    pub fn new() -> Self {
        Self::with_program(config::cargo_program())
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl BuildRunner for CargoBuildRunner {
    async fn detect(&self, path: &Path) -> bool {
        detection::has_manifest(path).await
    }

    async fn build(&self, workspace: &Path, config: &BuildConfig) -> Result<BuildOutcome> {
        execution::run_build_tool(&self.program, workspace, config).await
    }
}
