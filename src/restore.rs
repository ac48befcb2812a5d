use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{MtimeError, Result};
use crate::fs_utils;
use crate::manifest::Manifest;
use crate::progress::{ProgressConfig, Spinner};

/// Outcome of a restore run
#[derive(Debug, Clone, Default)]
pub struct RestoreStats {
    pub manifest_path: PathBuf,
    /// Files whose times were applied
    pub restored: usize,
    /// Resolved paths listed in the manifest that no longer exist
    pub missing: Vec<PathBuf>,
    pub elapsed: String,
}

/// Reapply the times recorded in `<manifest_dir>/<manifest_name>` to the
/// matching files under `root`, one line at a time. Missing files are
/// reported and skipped. A malformed line or any other failure aborts the
/// rest of the manifest; lines before it stay applied.
pub fn restore(
    root: &Path,
    manifest_dir: Option<&Path>,
    config: &Config,
    verbose: bool,
    progress_config: ProgressConfig,
) -> Result<RestoreStats> {
    fs_utils::validate_root(root)?;

    let manifest_path = fs_utils::manifest_location(manifest_dir, &config.manifest_name)?;
    let records = Manifest::open(&manifest_path)?;

    if verbose {
        eprintln!("Restoring from {} into {}", manifest_path.display(), root.display());
    }

    let spinner = Spinner::new(progress_config, &format!("Restoring {}", root.display()));
    let mut stats = RestoreStats {
        manifest_path,
        ..Default::default()
    };

    for record in records {
        let record = record?;
        let full_path = fs_utils::resolve_record_path(root, &record.path);
        spinner.tick();

        match fs::metadata(&full_path) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                spinner.println(&format!(
                    "Warning: file does not exist, skipping: {}",
                    full_path.display()
                ));
                stats.missing.push(full_path);
                continue;
            }
            Err(e) => return Err(MtimeError::io("read", &full_path, e)),
        }

        let time = record.timestamp.to_file_time().ok_or_else(|| {
            MtimeError::invalid_path(
                &full_path,
                format!("recorded time {} does not exist in the local timezone", record.timestamp),
            )
        })?;

        fs_utils::set_file_times(&full_path, time)?;
        stats.restored += 1;

        if verbose {
            spinner.println(&format!("  Restored: {} -> {}", record.path, record.timestamp));
        }
    }

    stats.elapsed = spinner.finish();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::capture;
    use crate::manifest::MANIFEST_FILENAME;
    use crate::timestamp::Timestamp;
    use filetime::FileTime;
    use tempfile::TempDir;

    fn set_mtime(path: &Path, digits: &str) {
        let time = Timestamp::from_digits(digits).unwrap().to_file_time().unwrap();
        filetime::set_file_mtime(path, time).unwrap();
    }

    fn write_file(path: &Path, digits: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"content").unwrap();
        set_mtime(path, digits);
    }

    fn mtime_of(path: &Path) -> String {
        let modified = fs::metadata(path).unwrap().modified().unwrap();
        Timestamp::from_system_time(modified).unwrap().to_string()
    }

    fn touch_now(path: &Path) {
        filetime::set_file_mtime(path, FileTime::now()).unwrap();
    }

    fn run(root: &Path, manifest_dir: &Path) -> Result<RestoreStats> {
        restore(root, Some(manifest_dir), &Config::default(), false, ProgressConfig::ForceDisable)
    }

    fn write_manifest(dir: &Path, content: &str) {
        fs::write(dir.join(MANIFEST_FILENAME), content).unwrap();
    }

    #[test]
    fn test_capture_then_restore_round_trip() {
        let root = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = root.path().join("a.txt");
        let b = root.path().join("sub").join("b.txt");
        let c = root.path().join("sub").join("deep").join("c.bin");
        write_file(&a, "20230101000000");
        write_file(&b, "20230615123000");
        write_file(&c, "19991231235959");

        capture(root.path(), Some(out.path()), &Config::default(), false, ProgressConfig::ForceDisable)
            .unwrap();

        for path in [&a, &b, &c] {
            touch_now(path);
        }

        let stats = run(root.path(), out.path()).unwrap();

        assert_eq!(stats.restored, 3);
        assert!(stats.missing.is_empty());
        assert_eq!(mtime_of(&a), "20230101000000");
        assert_eq!(mtime_of(&b), "20230615123000");
        assert_eq!(mtime_of(&c), "19991231235959");
    }

    #[test]
    fn test_restore_sets_access_time() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a.txt");
        write_file(&a, "20230101000000");
        write_manifest(root.path(), "a.txt\t20200202020202\n");

        run(root.path(), root.path()).unwrap();

        let expected = Timestamp::from_digits("20200202020202").unwrap().to_file_time().unwrap();
        let metadata = fs::metadata(&a).unwrap();
        assert_eq!(FileTime::from_last_access_time(&metadata).unix_seconds(), expected.unix_seconds());
        assert_eq!(mtime_of(&a), "20200202020202");
    }

    #[test]
    fn test_restore_is_idempotent() {
        let root = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = root.path().join("a.txt");
        write_file(&a, "20230101000000");
        write_manifest(out.path(), "a.txt\t20210101010101\nmissing.txt\t20210101010101\n");

        let first = run(root.path(), out.path()).unwrap();
        let after_first = mtime_of(&a);
        let second = run(root.path(), out.path()).unwrap();

        assert_eq!(first.restored, second.restored);
        assert_eq!(first.missing, second.missing);
        assert_eq!(after_first, mtime_of(&a));
    }

    #[test]
    fn test_restore_skips_missing_files() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a.txt");
        write_file(&a, "20230101000000");
        write_manifest(
            root.path(),
            "gone.txt\t20200101000000\na.txt\t20200101000000\n",
        );

        let stats = run(root.path(), root.path()).unwrap();

        assert_eq!(stats.restored, 1);
        assert_eq!(stats.missing, vec![root.path().join("gone.txt")]);
        assert_eq!(mtime_of(&a), "20200101000000");
    }

    #[test]
    fn test_restore_uses_absolute_paths_verbatim() {
        let root = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let target = elsewhere.path().join("outside.txt");
        write_file(&target, "20230101000000");
        write_manifest(root.path(), &format!("{}\t20190505050505\n", target.display()));

        let stats = run(root.path(), root.path()).unwrap();

        assert_eq!(stats.restored, 1);
        assert_eq!(mtime_of(&target), "20190505050505");
    }

    #[test]
    fn test_restore_into_different_root() {
        let original = TempDir::new().unwrap();
        let copy = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_file(&original.path().join("sub").join("b.txt"), "20230615123000");
        write_file(&copy.path().join("sub").join("b.txt"), "20240101000000");

        capture(original.path(), Some(out.path()), &Config::default(), false, ProgressConfig::ForceDisable)
            .unwrap();
        let stats = run(copy.path(), out.path()).unwrap();

        assert_eq!(stats.restored, 1);
        assert_eq!(mtime_of(&copy.path().join("sub").join("b.txt")), "20230615123000");
    }

    #[test]
    fn test_restore_applies_lines_before_a_bad_line() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a.txt");
        let b = root.path().join("b.txt");

        let cases = [
            ("a.txt\t20200101000000\nno-tab-here\nb.txt\t20200101000000\n", 2),
            ("a.txt\t20200101000000\n\nb\t20200101000000\tx\nb.txt\t20200101000000\n", 3),
            ("a.txt\t20200101000000\nb.txt\t2020010100000\n", 2),
            ("a.txt\t20200101000000\nb.txt\t202001010000000\n", 2),
            ("a.txt\t20200101000000\nb.txt\t2020010100000a\n", 2),
        ];

        for (content, line) in cases {
            write_file(&a, "20230101000000");
            write_file(&b, "20230101000000");
            write_manifest(root.path(), content);

            let err = run(root.path(), root.path()).unwrap_err();

            assert!(matches!(err, MtimeError::Format { .. }), "{content:?}: {err}");
            assert_eq!(err.line(), Some(line));
            assert_eq!(mtime_of(&a), "20200101000000", "{content:?}");
            assert_eq!(mtime_of(&b), "20230101000000", "{content:?}");
        }
    }

    #[test]
    fn test_restore_bad_first_line_touches_nothing() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a.txt");
        write_file(&a, "20230101000000");
        write_manifest(root.path(), "a.txt\t2020010100000x\na.txt\t20200101000000\n");

        let err = run(root.path(), root.path()).unwrap_err();

        assert_eq!(err.line(), Some(1));
        assert_eq!(mtime_of(&a), "20230101000000");
    }

    #[test]
    fn test_restore_rejects_invalid_calendar_date() {
        let root = TempDir::new().unwrap();
        write_manifest(root.path(), "a.txt\t20231301120000\n");

        let err = run(root.path(), root.path()).unwrap_err();

        assert!(matches!(err, MtimeError::TimestampParse { line: 1, .. }));
    }

    #[test]
    fn test_restore_missing_manifest() {
        let root = TempDir::new().unwrap();
        let err = run(root.path(), root.path()).unwrap_err();
        assert!(matches!(err, MtimeError::Io { action: "open manifest", .. }));
    }

    #[test]
    fn test_restore_rejects_relative_manifest_dir() {
        let root = TempDir::new().unwrap();
        let err = restore(
            root.path(),
            Some(Path::new("relative")),
            &Config::default(),
            false,
            ProgressConfig::ForceDisable,
        )
        .unwrap_err();
        assert!(matches!(err, MtimeError::InvalidPath { .. }));
    }

    #[test]
    fn test_restore_rejects_missing_root() {
        let root = TempDir::new().unwrap();
        let err = run(&root.path().join("nope"), root.path()).unwrap_err();
        assert!(matches!(err, MtimeError::Io { .. }));
    }

    /// False when running with privileges that bypass directory permissions
    #[cfg(unix)]
    fn permissions_enforced(locked_dir: &Path) -> bool {
        fs::read_dir(locked_dir).is_err()
    }

    #[cfg(unix)]
    fn set_mode(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_restore_aborts_on_unreadable_target() {
        let root = TempDir::new().unwrap();
        let locked = root.path().join("locked");
        let inside = locked.join("inner.txt");
        let after = root.path().join("after.txt");
        write_file(&inside, "20230101000000");
        write_file(&after, "20230101000000");
        write_manifest(
            root.path(),
            "locked/inner.txt\t20200101000000\nafter.txt\t20200101000000\n",
        );

        set_mode(&locked, 0o000);
        if !permissions_enforced(&locked) {
            set_mode(&locked, 0o755);
            return;
        }

        let result = run(root.path(), root.path());
        set_mode(&locked, 0o755);

        let err = result.unwrap_err();
        assert!(matches!(err, MtimeError::Io { action: "read", .. }), "{err}");
        assert_eq!(mtime_of(&inside), "20230101000000");
        assert_eq!(mtime_of(&after), "20230101000000");
    }

    #[test]
    #[cfg(unix)]
    fn test_restore_aborts_when_setting_times_fails() {
        use std::os::unix::fs::MetadataExt;

        let root = TempDir::new().unwrap();
        let after = root.path().join("after.txt");
        write_file(&after, "20230101000000");

        // A directory owned by someone else cannot have its times set
        let foreign = std::env::temp_dir();
        let our_uid = fs::metadata(&after).unwrap().uid();
        let foreign_meta = fs::metadata(&foreign).unwrap();
        if foreign_meta.uid() == our_uid || our_uid == 0 {
            return;
        }

        write_manifest(
            root.path(),
            &format!("{}\t20000101000000\nafter.txt\t20200101000000\n", foreign.display()),
        );

        let err = run(root.path(), root.path()).unwrap_err();

        assert!(matches!(err, MtimeError::Io { action: "set times on", .. }), "{err}");
        assert_eq!(mtime_of(&after), "20230101000000");
    }
}
