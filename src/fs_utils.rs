use filetime::FileTime;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{MtimeError, Result};

/// Atomically write data to a file using temp file + rename
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    ensure_dir(parent)?;

    let temp_path = parent.join(format!(
        ".mtstamp_tmp_{}_{}",
        std::process::id(),
        rand_suffix()
    ));

    let mut file = File::create(&temp_path)
        .map_err(|e| MtimeError::io("create temp file", &temp_path, e))?;

    let written = file.write_all(data).and_then(|_| file.sync_all());
    drop(file);

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(MtimeError::io("write temp file", &temp_path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        MtimeError::io("replace", path, e)
    })?;

    Ok(())
}

/// Generate a random suffix for temp files
fn rand_suffix() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    duration.as_nanos() as u64
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| MtimeError::io("create directory", path, e))?;
    }
    Ok(())
}

pub fn require_absolute(path: &Path) -> Result<()> {
    if !path.is_absolute() {
        return Err(MtimeError::invalid_path(path, "must be an absolute path"));
    }
    Ok(())
}

/// Check that a root is absolute, exists and is a directory
pub fn validate_root(root: &Path) -> Result<()> {
    require_absolute(root)?;

    let metadata = fs::metadata(root).map_err(|e| MtimeError::io("read", root, e))?;
    if !metadata.is_dir() {
        return Err(MtimeError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Resolve `<dir>/<manifest_name>`, defaulting `dir` to the current directory
pub fn manifest_location(dir: Option<&Path>, manifest_name: &str) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => {
            require_absolute(dir)?;
            dir.to_path_buf()
        }
        None => std::env::current_dir()
            .map_err(|e| MtimeError::io("determine", Path::new("current directory"), e))?,
    };
    Ok(dir.join(manifest_name))
}

/// Convert a path relative to a root into the manifest's slash-separated form
pub fn to_portable(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| MtimeError::invalid_path(relative, "not valid UTF-8"))?;
                parts.push(part);
            }
            Component::CurDir => {}
            _ => return Err(MtimeError::invalid_path(relative, "not a plain relative path")),
        }
    }

    let portable = parts.join("/");
    if portable.is_empty() {
        return Err(MtimeError::invalid_path(relative, "empty relative path"));
    }
    if portable.contains(['\t', '\n', '\r']) {
        return Err(MtimeError::invalid_path(
            relative,
            "contains a tab or line break and cannot be recorded",
        ));
    }
    Ok(portable)
}

/// Resolve a manifest path against a root. Absolute paths are used verbatim,
/// relative ones are joined component by component using native separators.
pub fn resolve_record_path(root: &Path, recorded: &str) -> PathBuf {
    let as_path = Path::new(recorded);
    if as_path.is_absolute() {
        return as_path.to_path_buf();
    }

    let mut full = root.to_path_buf();
    for part in recorded.split('/').filter(|p| !p.is_empty()) {
        full.push(part);
    }
    full
}

/// Set both access and modification time of a file
pub fn set_file_times(path: &Path, time: FileTime) -> Result<()> {
    filetime::set_file_times(path, time, time)
        .map_err(|e| MtimeError::io("set times on", path, e))
}
