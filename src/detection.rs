use crate::core::{BuildConfig, DirSelection, MANIFEST_FILE};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

pub async fn has_manifest(path: &Path) -> bool {
    fs::metadata(path.join(MANIFEST_FILE))
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

/// Lists the paths the build loop should visit, in the order it should visit them.
///
/// `DirSelection::All` yields every directory in the root sorted by name, minus the scratch
/// workspace and the output directory. A `Single` path is passed through unchecked.
pub async fn discover_candidates(config: &BuildConfig) -> Result<Vec<PathBuf>> {
    match &config.selection {
        DirSelection::None => Ok(Vec::new()),
        DirSelection::Single(dir) => Ok(vec![dir.clone()]),
        DirSelection::All => {
            let mut entries = fs::read_dir(&config.root)
                .await
                .with_context(|| format!("failed to list {}", config.root.display()))?;
            let reserved = [
                canonical(&config.workspace_dir).await,
                canonical(&config.output_dir).await,
            ];
            let mut candidates = Vec::new();

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if reserved.contains(&canonical(&path).await) {
                    tracing::debug!("Ignoring reserved directory {:?}", path);
                    continue;
                }
                if entry.file_type().await?.is_dir() {
                    candidates.push(path);
                }
            }

            candidates.sort();
            Ok(candidates)
        }
    }
}

/// Resolved form of `path` for comparisons; paths that do not exist yet are kept as given.
async fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}
