//! Batch copy and delete of tagged images.
//!
//! Both operations visit every path and record an outcome per file; a failure
//! on one file never stops the batch.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::Tag;

/// Outcome of one file in a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<()>,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-file results of a batch copy or delete.
#[derive(Debug)]
pub struct BatchReport {
    pub action: Tag,
    /// Destination folder of a copy, `None` for deletes
    pub destination: Option<PathBuf>,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| o.succeeded())
            .map(|o| o.path.as_path())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failure_count() == 0
    }

    /// One-line summary for the user, e.g. "Successfully copied 3 images".
    pub fn summary(&self) -> String {
        let ok = self.success_count();
        let failed = self.failure_count();
        let verb = self.action.past_tense();
        if failed == 0 {
            format!("Successfully {verb} {ok} images")
        } else {
            format!(
                "Finished: {verb} {ok} of {} images, {failed} failed",
                self.attempted()
            )
        }
    }

    fn log(&self) {
        for outcome in self.failed() {
            if let Err(err) = &outcome.result {
                warn!(path = ?outcome.path, error = %err, "Batch {} failed for file", self.action);
            }
        }
        info!(
            action = %self.action,
            succeeded = self.success_count(),
            failed = self.failure_count(),
            destination = ?self.destination,
            "Batch finished"
        );
    }
}

/// Copies each file into `destination`, keeping its base name.
///
/// Existing files with the same name in `destination` are overwritten.
/// Copying a file onto itself is reported as a failure instead of truncating it.
pub fn copy_files(paths: &[PathBuf], destination: &Path) -> BatchReport {
    let outcomes = paths
        .iter()
        .map(|path| FileOutcome {
            path: path.clone(),
            result: copy_one(path, destination),
        })
        .collect();

    let report = BatchReport {
        action: Tag::Copy,
        destination: Some(destination.to_path_buf()),
        outcomes,
    };
    report.log();
    report
}

fn copy_one(src: &Path, destination: &Path) -> Result<()> {
    let name = src
        .file_name()
        .ok_or_else(|| Error::NoFileName(src.to_path_buf()))?;
    let dst = destination.join(name);

    if let (Ok(a), Ok(b)) = (src.canonicalize(), dst.canonicalize()) {
        if a == b {
            return Err(Error::SameFile(a));
        }
    }

    std::fs::copy(src, &dst).map_err(|err| Error::io(src, err))?;
    Ok(())
}

/// Deletes each file permanently. There is no trash and no undo.
pub fn delete_files(paths: &[PathBuf]) -> BatchReport {
    let outcomes = paths
        .iter()
        .map(|path| FileOutcome {
            path: path.clone(),
            result: std::fs::remove_file(path).map_err(|err| Error::io(path, err)),
        })
        .collect();

    let report = BatchReport {
        action: Tag::Delete,
        destination: None,
        outcomes,
    };
    report.log();
    report
}

/// Runs the batch for `action`. `destination` is required for copies.
pub fn execute(action: Tag, paths: &[PathBuf], destination: Option<&Path>) -> Option<BatchReport> {
    match action {
        Tag::Copy => destination.map(|dest| copy_files(paths, dest)),
        Tag::Delete => Some(delete_files(paths)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_copy_by_base_name() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let a = src.path().join("a.jpg");
        fs::write(&a, b"aaa").unwrap();

        let report = copy_files(&[a.clone()], dst.path());

        assert!(report.is_complete_success());
        assert_eq!(report.destination.as_deref(), Some(dst.path()));
        assert_eq!(fs::read(dst.path().join("a.jpg")).unwrap(), b"aaa");
        assert!(a.exists());
    }

    #[test]
    fn test_copy_continues_after_failure() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let missing = src.path().join("missing.jpg");
        let b = src.path().join("b.png");
        fs::write(&b, b"bbb").unwrap();

        let report = copy_files(&[missing.clone(), b.clone()], dst.path());

        assert_eq!(report.attempted(), 2);
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.succeeded().collect::<Vec<_>>(), vec![b.as_path()]);
        assert_eq!(report.failed().next().unwrap().path, missing);
        assert!(dst.path().join("b.png").exists());
        assert_eq!(report.summary(), "Finished: copied 1 of 2 images, 1 failed");
    }

    #[test]
    fn test_copy_overwrites_existing_destination() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let a = src.path().join("a.jpg");
        fs::write(&a, b"new").unwrap();
        fs::write(dst.path().join("a.jpg"), b"old").unwrap();

        let report = copy_files(&[a], dst.path());
        assert!(report.is_complete_success());
        assert_eq!(fs::read(dst.path().join("a.jpg")).unwrap(), b"new");
    }

    #[test]
    fn test_copy_onto_itself_fails_without_truncating() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        fs::write(&a, b"keep me").unwrap();

        let report = copy_files(&[a.clone()], dir.path());

        assert_eq!(report.failure_count(), 1);
        assert!(matches!(
            report.outcomes[0].result,
            Err(Error::SameFile(_))
        ));
        assert_eq!(fs::read(&a).unwrap(), b"keep me");
    }

    #[test]
    fn test_delete_reports_each_file() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let gone = dir.path().join("gone.jpg");
        fs::write(&a, b"a").unwrap();

        let report = delete_files(&[a.clone(), gone]);

        assert_eq!(report.action, Tag::Delete);
        assert!(report.destination.is_none());
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert!(!a.exists());
    }

    #[test]
    fn test_summary_for_full_success() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        fs::write(&a, b"a").unwrap();
        let report = delete_files(&[a]);
        assert_eq!(report.summary(), "Successfully deleted 1 images");
    }

    #[test]
    fn test_execute_copy_requires_destination() {
        assert!(execute(Tag::Copy, &[], None).is_none());
        let report = execute(Tag::Delete, &[], None).unwrap();
        assert_eq!(report.attempted(), 0);
    }
}
