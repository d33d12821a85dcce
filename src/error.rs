use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to build {}: {}", .dir.display(), describe_exit(.code))]
    BuildFailure { dir: PathBuf, code: Option<i32> },

    #[error("workspace warm-up build failed: {}", describe_exit(.code))]
    WarmupFailed { code: Option<i32> },

    #[error("{} has no usable directory name", .0.display())]
    UnnamedCandidate(PathBuf),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("build tool exited with status {}", code),
        None => "build tool was terminated by a signal".to_string(),
    }
}
