use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{MtimeError, Result};
use crate::fs_utils;
use crate::manifest::{Manifest, Record};
use crate::progress::{ProgressConfig, Spinner};
use crate::timestamp::Timestamp;

/// Outcome of a capture run
#[derive(Debug, Clone)]
pub struct CaptureStats {
    /// Where the manifest was written
    pub manifest_path: PathBuf,
    /// Number of records written
    pub files: usize,
    /// Files skipped by `ignore` patterns
    pub ignored: usize,
    pub elapsed: String,
}

/// Record the mtime of every non-directory entry under `root` into
/// `<output_dir>/<manifest_name>` (current directory when `output_dir` is None).
pub fn capture(
    root: &Path,
    output_dir: Option<&Path>,
    config: &Config,
    verbose: bool,
    progress_config: ProgressConfig,
) -> Result<CaptureStats> {
    fs_utils::validate_root(root)?;

    let manifest_path = fs_utils::manifest_location(output_dir, &config.manifest_name)?;
    let manifest_dir = manifest_path.parent().unwrap_or(Path::new("/"));
    fs_utils::ensure_dir(manifest_dir)?;

    let own_manifest = canonical_in_dir(&manifest_path)
        .ok_or_else(|| MtimeError::invalid_path(&manifest_path, "cannot resolve output directory"))?;

    if verbose {
        eprintln!("Capturing {} into {}", root.display(), manifest_path.display());
    }

    let spinner = Spinner::new(progress_config, &format!("Scanning {}", root.display()));

    let mut manifest = Manifest::new();
    let mut ignored = 0usize;

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            MtimeError::io("walk", &path, e.into())
        })?;

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();

        if entry.file_name() == own_manifest.file_name().unwrap_or_default()
            && canonical_in_dir(path).as_deref() == Some(own_manifest.as_path())
        {
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .map_err(|_| MtimeError::invalid_path(path, "not inside the capture root"))?;
        let portable = fs_utils::to_portable(relative)?;

        if config.should_ignore(&portable) {
            if verbose {
                spinner.println(&format!("  Ignored: {}", portable));
            }
            ignored += 1;
            continue;
        }

        let modified = entry
            .metadata()
            .map_err(|e| MtimeError::io("read metadata of", path, e.into()))?
            .modified()
            .map_err(|e| MtimeError::io("read modification time of", path, e))?;

        let timestamp = Timestamp::from_system_time(modified).ok_or_else(|| {
            MtimeError::invalid_path(path, "modification time is outside years 0000-9999")
        })?;

        if verbose {
            spinner.println(&format!("  {}\t{}", portable, timestamp));
        }

        manifest.push(Record::new(portable, timestamp));
        spinner.tick();
    }

    manifest.save(&manifest_path)?;
    let elapsed = spinner.finish();

    Ok(CaptureStats {
        manifest_path,
        files: manifest.records.len(),
        ignored,
        elapsed,
    })
}

/// Canonicalize the parent directory and re-attach the file name, so the
/// last component is compared as-is even when it is a symlink.
fn canonical_in_dir(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?.canonicalize().ok()?;
    Some(parent.join(path.file_name()?))
}
