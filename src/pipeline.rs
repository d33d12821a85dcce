use crate::core::{BuildConfig, RunSummary, WarmupOutcome};
use crate::error::PackError;
use crate::workspace::ScratchWorkspace;
use crate::{archive, detection, execution, harvest, BuildRunner};
use anyhow::Result;
use std::time::Instant;
use tracing::info;

/// Runs every phase in order: workspace setup, warm-up, build loop, harvest, archive.
///
/// The first failing candidate ends the run with `PackError::BuildFailure` before anything is
/// harvested or archived.
pub async fn run<R: BuildRunner + ?Sized>(runner: &R, config: &BuildConfig) -> Result<RunSummary> {
    let start_time = Instant::now();

    let workspace = ScratchWorkspace::new(&config.workspace_dir);
    workspace.initialize(&config.shared_dependency).await?;

    let warmup = execution::warm_up(runner, &workspace, config).await?;
    if let WarmupOutcome::Failed { code } = warmup {
        if config.strict_warmup {
            return Err(PackError::WarmupFailed { code }.into());
        }
    }

    let candidates = detection::discover_candidates(config).await?;
    info!("Found {} candidate director(ies)", candidates.len());

    let build = execution::build_candidates(runner, &workspace, &candidates, config).await?;
    if let Some((dir, code)) = build.failure() {
        return Err(PackError::BuildFailure {
            dir: dir.to_path_buf(),
            code,
        }
        .into());
    }

    let built = build.successes();
    let harvested = harvest::harvest(&workspace, &built, config).await?;
    let archive_entries = archive::create_archive(config).await?;

    Ok(RunSummary {
        warmup,
        build,
        harvested,
        archive_path: config.archive_path.clone(),
        archive_entries,
        duration_ms: start_time.elapsed().as_millis() as u64,
    })
}
