//! Run directory discovery.
//!
//! Only the immediate children of the root are considered. Among the
//! directories whose name starts with the prefix, the one with the greatest
//! modification time wins. When several share that time the first one in
//! directory listing order is kept, which is platform dependent; callers
//! must not rely on a particular winner in that case.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ReportError;

/// A selected run directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunDirectory {
    /// Full path of the directory.
    pub path: PathBuf,
    /// Directory name (starts with the requested prefix).
    pub name: String,
    /// Last modification time.
    pub modified: SystemTime,
}

/// Find the most recently modified subdirectory of `root` named `prefix*`.
///
/// Symbolic links to directories count as directories. Entries whose
/// metadata cannot be read are skipped.
///
/// # Errors
///
/// Returns [`ReportError::RootUnreadable`] if `root` cannot be listed, and
/// [`ReportError::NotFound`] if no subdirectory matches `prefix`.
pub fn find_latest_run(root: &Path, prefix: &str) -> Result<RunDirectory, ReportError> {
    let mut latest: Option<RunDirectory> = None;

    for entry_result in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry_result {
            Ok(e) => e,
            // Depth 0 is the root itself: listing it failed.
            Err(err) if err.depth() == 0 => {
                return Err(ReportError::RootUnreadable {
                    root: root.to_owned(),
                    source: err,
                });
            }
            Err(err) => {
                debug!("skipping unreadable entry: {err}");
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        let modified = match entry
            .metadata()
            .map_err(std::io::Error::from)
            .and_then(|m| m.modified())
        {
            Ok(t) => t,
            Err(err) => {
                debug!("skipping {}: {err}", entry.path().display());
                continue;
            }
        };

        debug!("candidate run directory {name}");
        if latest.as_ref().is_none_or(|best| modified > best.modified) {
            latest = Some(RunDirectory {
                path: entry.path().to_path_buf(),
                name: name.to_owned(),
                modified,
            });
        }
    }

    latest.ok_or_else(|| ReportError::NotFound {
        prefix: prefix.to_owned(),
        root: root.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn set_mtime(path: &Path, secs: u64) {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
        fs::File::open(path).unwrap().set_modified(time).unwrap();
    }

    #[test]
    fn test_picks_newest_prefixed_directory() {
        let tmp = TempDir::new().unwrap();
        for (name, secs) in [("RUN_a", 1_000), ("RUN_b", 3_000), ("RUN_c", 2_000)] {
            let dir = tmp.path().join(name);
            fs::create_dir(&dir).unwrap();
            set_mtime(&dir, secs);
        }
        let other = tmp.path().join("OTHER_newest");
        fs::create_dir(&other).unwrap();
        set_mtime(&other, 9_000);

        let run = find_latest_run(tmp.path(), "RUN_").unwrap();
        assert_eq!(run.name, "RUN_b");
        assert_eq!(run.path, tmp.path().join("RUN_b"));
    }

    #[test]
    fn test_ignores_files_with_prefix() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("RUN_dir");
        fs::create_dir(&dir).unwrap();
        set_mtime(&dir, 1_000);
        let file = tmp.path().join("RUN_file");
        fs::write(&file, "x").unwrap();
        set_mtime(&file, 5_000);

        let run = find_latest_run(tmp.path(), "RUN_").unwrap();
        assert_eq!(run.name, "RUN_dir");
    }

    #[test]
    fn test_no_match_is_not_found() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("OTHER")).unwrap();
        let err = find_latest_run(tmp.path(), "RUN_").unwrap_err();
        assert!(
            matches!(&err, ReportError::NotFound { prefix, .. } if prefix == "RUN_"),
            "got: {err:?}"
        );
    }

    #[test]
    fn test_nested_directories_are_not_candidates() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("outer").join("RUN_inner")).unwrap();
        assert!(matches!(
            find_latest_run(tmp.path(), "RUN_"),
            Err(ReportError::NotFound { .. })
        ));
    }

    #[test]
    fn test_missing_root_is_unreadable() {
        let tmp = TempDir::new().unwrap();
        let err = find_latest_run(&tmp.path().join("absent"), "RUN_").unwrap_err();
        assert!(
            matches!(err, ReportError::RootUnreadable { .. }),
            "got: {err:?}"
        );
    }
}
