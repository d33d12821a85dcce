use crate::core::{BuildConfig, BuildOutcome, BuildReport, CandidateResult, WarmupOutcome};
use crate::workspace::ScratchWorkspace;
use crate::BuildRunner;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info, warn};

/// Runs one build in `workspace` and waits for it. Output is inherited, not captured.
pub async fn run_build_tool(program: &str, workspace: &Path, config: &BuildConfig) -> Result<BuildOutcome> {
    let args = config.build_args();
    tracing::debug!("Running {} {} in {:?}", program, args.join(" "), workspace);

    let status = Command::new(program)
        .args(&args)
        .current_dir(workspace)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("failed to spawn {}", program))?;

    Ok(BuildOutcome::from_code(status.code()))
}

/// Builds the placeholder project so shared dependencies are compiled before any candidate.
///
/// The outcome is returned rather than acted on: whether a failed warm-up matters is the
/// caller's decision.
pub async fn warm_up<R: BuildRunner + ?Sized>(
    runner: &R,
    workspace: &ScratchWorkspace,
    config: &BuildConfig,
) -> Result<WarmupOutcome> {
    info!(
        "Building {} and dependencies",
        config.shared_dependency.name
    );

    let outcome: WarmupOutcome = runner.build(workspace.root(), config).await?.into();
    match outcome {
        WarmupOutcome::Succeeded => info!("Build complete."),
        WarmupOutcome::Failed { code } => warn!("Warm-up build failed with exit code {:?}", code),
    }

    Ok(outcome)
}

/// Stages and builds each candidate in turn. Stops at the first failing build; the failure is
/// the last entry of the returned report.
pub async fn build_candidates<R: BuildRunner + ?Sized>(
    runner: &R,
    workspace: &ScratchWorkspace,
    candidates: &[PathBuf],
    config: &BuildConfig,
) -> Result<BuildReport> {
    let mut report = BuildReport::default();
    info!("Building with arguments: {}", config.build_args().join(" "));

    for dir in candidates {
        if !tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            info!("Skipping {:?} as it is not a directory.", dir);
            report.results.push(CandidateResult::Skipped {
                dir: dir.clone(),
                reason: "not a directory".to_string(),
            });
            continue;
        }

        if !runner.detect(dir).await {
            info!("Skipping {:?} as it does not contain a Cargo.toml file.", dir);
            report.results.push(CandidateResult::Skipped {
                dir: dir.clone(),
                reason: "no Cargo.toml".to_string(),
            });
            continue;
        }

        info!("Building directory: {:?}", dir);
        workspace.stage(dir).await?;

        match runner.build(workspace.root(), config).await? {
            BuildOutcome::Success => report.results.push(CandidateResult::Built(dir.clone())),
            BuildOutcome::Failure { code } => {
                error!("Failed to build {:?}. Exiting.", dir);
                report.results.push(CandidateResult::Failed {
                    dir: dir.clone(),
                    code,
                });
                break;
            }
        }
    }

    Ok(report)
}
