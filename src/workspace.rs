use crate::core::{BuildConfig, SharedDependency, MANIFEST_FILE, SOURCE_DIR};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Minimal binary that links the shared dependency so the warm-up build compiles it.
pub fn placeholder_main(dependency: &SharedDependency) -> String {
    format!("use {} as _;\n\nfn main() {{}}\n", dependency.name.replace('-', "_"))
}

pub fn placeholder_manifest(dependency: &SharedDependency) -> String {
    format!(
        r#"[package]
name = "tmp_build"
version = "0.1.0"
edition = "2018"

[dependencies]
{} = "{}"
"#,
        dependency.name, dependency.version
    )
}

/// The one project every candidate is built inside, so dependencies compile once.
#[derive(Debug, Clone)]
pub struct ScratchWorkspace {
    root: PathBuf,
}

impl ScratchWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(SOURCE_DIR)
    }

    /// Where the build tool leaves the executable for the project named `name`.
    pub fn binary_path(&self, name: &str, config: &BuildConfig) -> PathBuf {
        config.artifact_dir(&self.root).join(config.executable_file_name(name))
    }

    /// Creates the directory tree and writes the placeholder project into it.
    pub async fn initialize(&self, dependency: &SharedDependency) -> Result<()> {
        fs::create_dir_all(self.source_dir())
            .await
            .with_context(|| format!("failed to create {}", self.source_dir().display()))?;
        fs::create_dir_all(self.root.join("target")).await?;

        fs::write(self.source_dir().join("main.rs"), placeholder_main(dependency)).await?;
        fs::write(self.manifest_path(), placeholder_manifest(dependency)).await?;

        tracing::debug!("Scratch workspace ready at {:?}", self.root);
        Ok(())
    }

    /// Swaps the candidate's manifest and top-level source files in for whatever was staged before.
    ///
    /// Only regular files directly under `src/` are copied. Nested module directories are
    /// dropped, so candidates must keep their sources flat.
    pub async fn stage(&self, candidate: &Path) -> Result<()> {
        let source_dir = self.source_dir();
        if fs::metadata(&source_dir).await.is_ok() {
            fs::remove_dir_all(&source_dir)
                .await
                .with_context(|| format!("failed to clear {}", source_dir.display()))?;
        }
        fs::create_dir_all(&source_dir).await?;

        match fs::remove_file(self.manifest_path()).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).context("failed to remove staged manifest"),
        }

        let candidate_sources = candidate.join(SOURCE_DIR);
        if fs::metadata(&candidate_sources).await.is_ok() {
            let mut entries = fs::read_dir(&candidate_sources)
                .await
                .with_context(|| format!("failed to list {}", candidate_sources.display()))?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if !entry.file_type().await?.is_file() {
                    tracing::debug!("Not staging nested entry {:?}", path);
                    continue;
                }
                fs::copy(&path, source_dir.join(entry.file_name()))
                    .await
                    .with_context(|| format!("failed to stage {}", path.display()))?;
            }
        }

        fs::copy(candidate.join(MANIFEST_FILE), self.manifest_path())
            .await
            .with_context(|| format!("failed to stage manifest of {}", candidate.display()))?;

        Ok(())
    }
}
