use crate::core::{candidate_name, BuildConfig, HarvestAction, HarvestRecord};
use crate::error::PackError;
use crate::workspace::ScratchWorkspace;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

async fn exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

/// Copies each built binary from the scratch workspace into the output directory.
pub async fn harvest(
    workspace: &ScratchWorkspace,
    built: &[PathBuf],
    config: &BuildConfig,
) -> Result<Vec<HarvestRecord>> {
    let mut records = Vec::with_capacity(built.len());

    for dir in built {
        let name = candidate_name(dir).ok_or_else(|| PackError::UnnamedCandidate(dir.clone()))?;
        let source = workspace.binary_path(name, config);
        let destination = config.output_dir.join(config.executable_file_name(name));

        let action = harvest_one(&source, &destination, &config.output_dir).await?;
        records.push(HarvestRecord {
            dir: dir.clone(),
            source,
            destination,
            action,
        });
    }

    Ok(records)
}

/// Applies the harvest checks in order: missing output directory, existing destination,
/// missing binary, copy.
///
/// An existing destination is kept as is, even when a newer binary is available.
pub async fn harvest_one(source: &Path, destination: &Path, output_dir: &Path) -> Result<HarvestAction> {
    if !exists(output_dir).await {
        fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        if !exists(source).await {
            info!("Skipping {:?} as it does not exist.", source);
            return Ok(HarvestAction::MissingBinary);
        }
        copy_binary(source, destination).await?;
        return Ok(HarvestAction::CreatedAndCopied);
    }

    if exists(destination).await {
        tracing::debug!("Keeping existing {:?}", destination);
        return Ok(HarvestAction::KeptExisting);
    }

    if !exists(source).await {
        info!("Skipping {:?} as it does not exist.", source);
        return Ok(HarvestAction::MissingBinary);
    }

    copy_binary(source, destination).await?;
    Ok(HarvestAction::Copied)
}

async fn copy_binary(source: &Path, destination: &Path) -> Result<()> {
    info!("Copying {:?} to {:?}", source, destination);
    fs::copy(source, destination)
        .await
        .with_context(|| format!("failed to copy {} to {}", source.display(), destination.display()))?;
    Ok(())
}
