use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "Cargo.toml";
pub const SOURCE_DIR: &str = "src";

/// Which directories the build loop should consider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirSelection {
    All,
    Single(PathBuf),
    None,
}

/// Third-party crate the placeholder project pulls in so it gets built once up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDependency {
    pub name: String,
    pub version: String,
}

impl Default for SharedDependency {
    fn default() -> Self {
        Self {
            name: "nannou".to_string(),
            version: "0.19.0".to_string(),
        }
    }
}

/// Resolved once at startup and handed by reference to every phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub target: Option<String>,
    pub release: bool,
    pub selection: DirSelection,
    pub root: PathBuf,
    pub workspace_dir: PathBuf,
    pub output_dir: PathBuf,
    pub archive_path: PathBuf,
    pub shared_dependency: SharedDependency,
    pub strict_warmup: bool,
}

impl BuildConfig {
    /// Config rooted at `root` with the default directory names.
    pub fn new(root: impl Into<PathBuf>, target: Option<String>, release: bool, selection: DirSelection) -> Self {
        let root = root.into();
        Self {
            target,
            release,
            selection,
            workspace_dir: root.join("tmp_build"),
            output_dir: root.join("release"),
            archive_path: root.join("release.zip"),
            root,
            shared_dependency: SharedDependency::default(),
            strict_warmup: false,
        }
    }

    /// Arguments passed to the build tool, minus the program name.
    pub fn build_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["build", "--color", "never", "--message-format", "short"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        if let Some(target) = &self.target {
            args.push("--target".to_string());
            args.push(target.clone());
        }

        if self.release {
            args.push("--release".to_string());
        }

        args
    }

    pub fn profile_name(&self) -> &'static str {
        if self.release {
            "release"
        } else {
            "debug"
        }
    }

    /// Extension cargo gives executables for the configured target, without the dot.
    pub fn executable_extension(&self) -> &'static str {
        match &self.target {
            Some(target) if target.contains("windows") => "exe",
            Some(_) => "",
            None => std::env::consts::EXE_EXTENSION,
        }
    }

    /// Directory the build tool drops binaries into, relative to a project root.
    pub fn artifact_dir(&self, project: &Path) -> PathBuf {
        let mut dir = project.join("target");
        if let Some(target) = &self.target {
            dir.push(target);
        }
        dir.join(self.profile_name())
    }

    /// `name` with the executable extension applied.
    pub fn executable_file_name(&self, name: &str) -> String {
        match self.executable_extension() {
            "" => name.to_string(),
            ext => format!("{}.{}", name, ext),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildOutcome {
    Success,
    Failure { code: Option<i32> },
}

impl BuildOutcome {
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => BuildOutcome::Success,
            other => BuildOutcome::Failure { code: other },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }
}

/// Result of the placeholder build. Never checked by default, see `BuildConfig::strict_warmup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarmupOutcome {
    Succeeded,
    Failed { code: Option<i32> },
}

impl From<BuildOutcome> for WarmupOutcome {
    fn from(outcome: BuildOutcome) -> Self {
        match outcome {
            BuildOutcome::Success => WarmupOutcome::Succeeded,
            BuildOutcome::Failure { code } => WarmupOutcome::Failed { code },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateResult {
    Built(PathBuf),
    Skipped { dir: PathBuf, reason: String },
    Failed { dir: PathBuf, code: Option<i32> },
}

/// Ordered per-candidate results of one pass of the build loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildReport {
    pub results: Vec<CandidateResult>,
}

impl BuildReport {
    /// Directories that built, in the order they were processed.
    pub fn successes(&self) -> Vec<PathBuf> {
        self.results
            .iter()
            .filter_map(|result| match result {
                CandidateResult::Built(dir) => Some(dir.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn failure(&self) -> Option<(&Path, Option<i32>)> {
        self.results.iter().find_map(|result| match result {
            CandidateResult::Failed { dir, code } => Some((dir.as_path(), *code)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarvestAction {
    CreatedAndCopied,
    KeptExisting,
    MissingBinary,
    Copied,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestRecord {
    pub dir: PathBuf,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub action: HarvestAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub warmup: WarmupOutcome,
    pub build: BuildReport,
    pub harvested: Vec<HarvestRecord>,
    pub archive_path: PathBuf,
    pub archive_entries: Vec<String>,
    pub duration_ms: u64,
}

/// Directory name used for the binary and the harvested file.
pub fn candidate_name(dir: &Path) -> Option<&str> {
    dir.file_name().and_then(|name| name.to_str())
}
