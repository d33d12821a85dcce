use crate::core::{BuildConfig, DirSelection, SharedDependency};
use crate::error::PackError;
use anyhow::Result;
use clap::{ArgGroup, Parser};
use std::env;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

pub const VERSION_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "release-packer")]
#[command(about = "Build project directories through a shared scratch workspace and zip the executables")]
#[command(group(ArgGroup::new("dirs").args(["all", "dir"])))]
pub struct Cli {
    /// Build in release mode. This is already the default.
    #[arg(long)]
    pub release: bool,

    /// Build in debug mode instead.
    #[arg(long, conflicts_with = "release")]
    pub debug: bool,

    /// Build for the specified target. Defaults to the host triple reported by rustc.
    #[arg(long)]
    pub target: Option<String>,

    /// Build every directory in the root directory.
    #[arg(long)]
    pub all: bool,

    /// Build the specified directory.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Directory that holds the projects, the scratch workspace and the outputs.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[arg(long, default_value = "tmp_build")]
    pub workspace_dir: PathBuf,

    #[arg(long, default_value = "release")]
    pub output_dir: PathBuf,

    #[arg(long, default_value = "release.zip")]
    pub archive: PathBuf,

    /// Crate the placeholder project depends on, prebuilt before any project.
    #[arg(long, default_value = "nannou")]
    pub shared_dep: String,

    #[arg(long, default_value = "0.19.0")]
    pub shared_dep_version: String,

    /// Abort when the placeholder warm-up build fails.
    #[arg(long)]
    pub strict_warmup: bool,

    /// Print a JSON summary of the run on stdout.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Builds the configuration, querying rustc for the host triple when no target was given.
    pub async fn resolve(&self) -> Result<BuildConfig> {
        let target = match &self.target {
            Some(target) => target.clone(),
            None => detect_host_triple(&rustc_program()).await?,
        };

        Ok(self.to_config(Some(target)))
    }

    pub fn to_config(&self, target: Option<String>) -> BuildConfig {
        let root = self.root.clone();

        let selection = if self.all {
            DirSelection::All
        } else if let Some(dir) = &self.dir {
            DirSelection::Single(root.join(dir))
        } else {
            DirSelection::None
        };

        BuildConfig {
            target,
            release: !self.debug,
            selection,
            workspace_dir: root.join(&self.workspace_dir),
            output_dir: root.join(&self.output_dir),
            archive_path: root.join(&self.archive),
            shared_dependency: SharedDependency {
                name: self.shared_dep.clone(),
                version: self.shared_dep_version.clone(),
            },
            strict_warmup: self.strict_warmup,
            root,
        }
    }
}

pub fn cargo_program() -> String {
    env::var("CARGO").unwrap_or_else(|_| "cargo".to_string())
}

pub fn rustc_program() -> String {
    env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string())
}

/// Runs `<rustc> --version --verbose` and returns the triple on its `host:` line.
pub async fn detect_host_triple(rustc: &str) -> Result<String> {
    let query = Command::new(rustc)
        .arg("--version")
        .arg("--verbose")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match timeout(VERSION_QUERY_TIMEOUT, query).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(PackError::Configuration(format!("failed to run {}: {}", rustc, e)).into());
        }
        Err(_) => {
            return Err(PackError::Configuration(format!(
                "{} --version --verbose did not finish within {}s",
                rustc,
                VERSION_QUERY_TIMEOUT.as_secs()
            ))
            .into());
        }
    };

    if !output.status.success() {
        return Err(PackError::Configuration(format!(
            "failed to get rustc version: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ))
        .into());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let triple = parse_host_triple(&stdout).ok_or_else(|| {
        PackError::Configuration("failed to get host target triple from rustc output".to_string())
    })?;

    tracing::debug!("Detected host triple: {}", triple);
    Ok(triple)
}

pub fn parse_host_triple(version_output: &str) -> Option<String> {
    version_output
        .lines()
        .find(|line| line.starts_with("host: "))
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
}
