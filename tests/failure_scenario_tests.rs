use async_trait::async_trait;
use release_packer::config::detect_host_triple;
use release_packer::core::{BuildConfig, BuildOutcome, CandidateResult, DirSelection, WarmupOutcome};
use release_packer::execution::build_candidates;
use release_packer::workspace::ScratchWorkspace;
use release_packer::{pipeline, BuildRunner, CargoBuildRunner, PackError};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

const TARGET: &str = "x86_64-pc-windows-msvc";

/// Fails the projects named in `failing`, and the warm-up when `warmup_code` is non-zero.
struct MockFailingRunner {
    failing: Vec<String>,
    warmup_code: i32,
    invocations: Mutex<Vec<String>>,
}

impl MockFailingRunner {
    fn new(failing: &[&str], warmup_code: i32) -> Self {
        Self {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            warmup_code,
            invocations: Mutex::new(Vec::new()),
        }
    }

    fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildRunner for MockFailingRunner {
    async fn detect(&self, path: &Path) -> bool {
        path.join("Cargo.toml").exists()
    }

    async fn build(&self, workspace: &Path, config: &BuildConfig) -> anyhow::Result<BuildOutcome> {
        let manifest = fs::read_to_string(workspace.join("Cargo.toml"))?;
        let name = manifest
            .lines()
            .find_map(|line| line.strip_prefix("name = "))
            .map(|name| name.trim_matches('"').to_string())
            .unwrap_or_default();
        self.invocations.lock().unwrap().push(name.clone());

        if name == "tmp_build" {
            return Ok(BuildOutcome::from_code(Some(self.warmup_code)));
        }
        if self.failing.contains(&name) {
            return Ok(BuildOutcome::Failure { code: Some(101) });
        }

        let binary = ScratchWorkspace::new(workspace).binary_path(&name, config);
        fs::create_dir_all(binary.parent().unwrap())?;
        fs::write(&binary, name.as_bytes())?;
        Ok(BuildOutcome::Success)
    }
}

fn create_project(root: &Path, name: &str) {
    let dir = root.join(name);
    fs::create_dir_all(dir.join("src")).unwrap();
    fs::write(dir.join("Cargo.toml"), format!("[package]\nname = \"{}\"\nversion = \"0.1.0\"\n", name)).unwrap();
    fs::write(dir.join("src").join("main.rs"), "fn main() {}\n").unwrap();
}

#[tokio::test]
async fn test_first_failure_stops_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    for name in ["a", "b", "c"] {
        create_project(root, name);
    }

    let config = BuildConfig::new(root, Some(TARGET.to_string()), true, DirSelection::All);
    let runner = MockFailingRunner::new(&["b"], 0);
    let err = pipeline::run(&runner, &config).await.unwrap_err();

    match err.downcast_ref::<PackError>() {
        Some(PackError::BuildFailure { dir, code }) => {
            assert_eq!(dir, &root.join("b"));
            assert_eq!(*code, Some(101));
        }
        other => panic!("expected BuildFailure, got {:?}", other),
    }

    // `c` is never attempted and nothing is harvested or archived
    assert_eq!(runner.invocations(), vec!["tmp_build", "a", "b"]);
    assert!(!root.join("release").exists());
    assert!(!root.join("release.zip").exists());
}

#[tokio::test]
async fn test_build_report_ends_with_failure() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    for name in ["comets", "jelly", "orbits"] {
        create_project(root, name);
    }

    let config = BuildConfig::new(root, Some(TARGET.to_string()), true, DirSelection::All);
    let workspace = ScratchWorkspace::new(&config.workspace_dir);
    workspace.initialize(&config.shared_dependency).await.unwrap();

    let candidates = vec![root.join("comets"), root.join("jelly"), root.join("orbits")];
    let runner = MockFailingRunner::new(&["jelly"], 0);
    let report = build_candidates(&runner, &workspace, &candidates, &config).await.unwrap();

    assert_eq!(
        report.results,
        vec![
            CandidateResult::Built(root.join("comets")),
            CandidateResult::Failed {
                dir: root.join("jelly"),
                code: Some(101),
            },
        ]
    );
    assert_eq!(report.successes(), vec![root.join("comets")]);
    assert_eq!(report.failure(), Some((root.join("jelly").as_path(), Some(101))));
}

#[tokio::test]
async fn test_failed_warmup_is_reported_but_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    create_project(root, "boids");

    let config = BuildConfig::new(root, Some(TARGET.to_string()), true, DirSelection::All);
    let runner = MockFailingRunner::new(&[], 1);
    let summary = pipeline::run(&runner, &config).await.unwrap();

    assert_eq!(summary.warmup, WarmupOutcome::Failed { code: Some(1) });
    assert_eq!(summary.build.successes(), vec![root.join("boids")]);
    assert_eq!(summary.archive_entries.len(), 1);
}

#[tokio::test]
async fn test_strict_warmup_aborts_before_candidates() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    create_project(root, "boids");

    let mut config = BuildConfig::new(root, Some(TARGET.to_string()), true, DirSelection::All);
    config.strict_warmup = true;
    let runner = MockFailingRunner::new(&[], 1);
    let err = pipeline::run(&runner, &config).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PackError>(),
        Some(PackError::WarmupFailed { code: Some(1) })
    ));
    assert_eq!(runner.invocations(), vec!["tmp_build"]);
}

#[tokio::test]
async fn test_missing_single_directory_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let config = BuildConfig::new(
        root,
        Some(TARGET.to_string()),
        true,
        DirSelection::Single(root.join("does-not-exist")),
    );
    let runner = MockFailingRunner::new(&[], 0);
    let summary = pipeline::run(&runner, &config).await.unwrap();

    assert_eq!(
        summary.build.results,
        vec![CandidateResult::Skipped {
            dir: root.join("does-not-exist"),
            reason: "not a directory".to_string(),
        }]
    );
    assert!(summary.archive_entries.is_empty());
}

#[tokio::test]
async fn test_missing_binary_is_skipped_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    create_project(root, "hello-world");

    // A runner that reports success but produces nothing
    struct NoOutputRunner;

    #[async_trait]
    impl BuildRunner for NoOutputRunner {
        async fn detect(&self, path: &Path) -> bool {
            path.join("Cargo.toml").exists()
        }

        async fn build(&self, _workspace: &Path, _config: &BuildConfig) -> anyhow::Result<BuildOutcome> {
            Ok(BuildOutcome::Success)
        }
    }

    let config = BuildConfig::new(root, Some(TARGET.to_string()), true, DirSelection::All);
    let summary = pipeline::run(&NoOutputRunner, &config).await.unwrap();

    assert_eq!(
        summary.harvested[0].action,
        release_packer::core::HarvestAction::MissingBinary
    );
    assert!(summary.archive_entries.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_host_triple_detection_failures_are_configuration_errors() {
    // Exits non-zero
    let err = detect_host_triple("false").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<PackError>(), Some(PackError::Configuration(_))));

    // Exits zero without a host line
    let err = detect_host_triple("true").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<PackError>(), Some(PackError::Configuration(_))));

    // Cannot be spawned
    let err = detect_host_triple("/nonexistent/release-packer-rustc").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<PackError>(), Some(PackError::Configuration(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn test_cargo_runner_maps_exit_status() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let config = BuildConfig::new(root, Some(TARGET.to_string()), true, DirSelection::All);

    let outcome = CargoBuildRunner::with_program("false").build(root, &config).await.unwrap();
    assert_eq!(outcome, BuildOutcome::Failure { code: Some(1) });

    let outcome = CargoBuildRunner::with_program("true").build(root, &config).await.unwrap();
    assert_eq!(outcome, BuildOutcome::Success);
}

#[cfg(unix)]
#[tokio::test]
async fn test_cargo_runner_failure_aborts_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    create_project(root, "orbits");

    let config = BuildConfig::new(root, Some(TARGET.to_string()), true, DirSelection::All);
    let runner = CargoBuildRunner::with_program("false");
    let err = pipeline::run(&runner, &config).await.unwrap_err();

    match err.downcast_ref::<PackError>() {
        Some(PackError::BuildFailure { dir, code }) => {
            assert_eq!(dir, &root.join("orbits"));
            assert_eq!(*code, Some(1));
        }
        other => panic!("expected BuildFailure, got {:?}", other),
    }
    assert!(!root.join("release.zip").exists());
}
