use crate::core::BuildConfig;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Name a harvested file gets inside the archive: stem, target suffix, mode suffix, extension.
///
/// `foo.exe` built for `x86_64-pc-windows-msvc` in release mode becomes
/// `foo_x86_64_pc_windows_msvc_RELEASE.exe`.
pub fn archive_entry_name(file: &Path, target: Option<&str>, release: bool) -> Option<String> {
    let mut name = file.file_stem()?.to_str()?.to_string();

    if let Some(target) = target.filter(|t| !t.is_empty()) {
        name.push('_');
        name.push_str(&target.replace('-', "_"));
    }

    if release {
        name.push_str("_RELEASE");
    }

    if let Some(ext) = file.extension().and_then(|e| e.to_str()) {
        name.push('.');
        name.push_str(ext);
    }

    Some(name)
}

/// Regular files directly inside `dir` carrying `extension`, sorted by name.
/// An empty `extension` selects files without one. A missing `dir` has no executables.
pub fn list_executables(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut executables = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }

        let matches = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext == extension,
            None => extension.is_empty(),
        };
        if matches {
            executables.push(path);
        }
    }

    executables.sort();
    Ok(executables)
}

/// Writes the archive, replacing any previous one, and returns the entry names in order.
pub fn write_archive(
    archive_path: &Path,
    output_dir: &Path,
    extension: &str,
    target: Option<&str>,
    release: bool,
) -> Result<Vec<String>> {
    let executables = list_executables(output_dir, extension)?;

    let file = File::create(archive_path)
        .with_context(|| format!("failed to create {}", archive_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().unix_permissions(0o755);

    let mut entries = Vec::with_capacity(executables.len());
    for path in executables {
        let Some(entry_name) = archive_entry_name(&path, target, release) else {
            warn!("Skipping {:?}: file name is not valid UTF-8", path);
            continue;
        };

        info!("Adding {} to {}", entry_name, archive_path.display());
        zip.start_file(entry_name.as_str(), options)?;
        let mut source = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
        std::io::copy(&mut source, &mut zip)?;
        entries.push(entry_name);
    }

    zip.finish()?;
    Ok(entries)
}

pub async fn create_archive(config: &BuildConfig) -> Result<Vec<String>> {
    let archive_path = config.archive_path.clone();
    let output_dir = config.output_dir.clone();
    let extension = config.executable_extension();
    let target = config.target.clone();
    let release = config.release;

    let entries = tokio::task::spawn_blocking(move || {
        write_archive(&archive_path, &output_dir, extension, target.as_deref(), release)
    })
    .await??;

    info!("Release zip created at {}.", config.archive_path.display());
    Ok(entries)
}
