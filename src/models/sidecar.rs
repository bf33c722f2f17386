//! JSON sidecar persistence of per-folder selections.
//!
//! The sidecar lives inside the triaged folder as
//! `.image-manager-selections.json` and is rewritten in full on every save.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::Selections;
use crate::error::{Error, Result};

pub const SIDECAR_FILE_NAME: &str = ".image-manager-selections.json";

pub fn sidecar_path(folder: &Path) -> PathBuf {
    folder.join(SIDECAR_FILE_NAME)
}

/// Loads the selections saved for `folder`.
///
/// A missing, unreadable or malformed sidecar yields empty selections.
pub fn load_selections(folder: &Path) -> Selections {
    match try_load_selections(folder) {
        Ok(Some(selections)) => {
            debug!(?folder, count = selections.len(), "Loaded selections");
            selections
        }
        Ok(None) => Selections::new(),
        Err(err) => {
            warn!(error = %err, "Ignoring unreadable selection sidecar");
            Selections::new()
        }
    }
}

/// Like [`load_selections`] but reports why nothing could be loaded.
/// Returns `Ok(None)` when the folder has no sidecar.
pub fn try_load_selections(folder: &Path) -> Result<Option<Selections>> {
    let path = sidecar_path(folder);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(Error::io(path, err)),
    };
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|source| Error::Json { path, source })
}

/// Overwrites the sidecar for `folder` with the full `selections` mapping.
///
/// The data is written to a temporary file next to the sidecar and renamed
/// over it, so a crash mid-write never leaves a truncated file behind.
pub fn save_selections(folder: &Path, selections: &Selections) -> Result<()> {
    let path = sidecar_path(folder);
    let tmp_path = folder.join(format!("{SIDECAR_FILE_NAME}.tmp"));

    let json = serde_json::to_string_pretty(selections).map_err(|source| Error::Json {
        path: path.clone(),
        source,
    })?;

    let write_tmp = || -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()
    };
    write_tmp().map_err(|err| Error::io(&tmp_path, err))?;
    std::fs::rename(&tmp_path, &path).map_err(|err| Error::io(&path, err))?;

    debug!(?path, count = selections.len(), "Saved selections");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;
    use tempfile::tempdir;

    #[test]
    fn test_missing_sidecar_is_empty() {
        let dir = tempdir().unwrap();
        assert!(load_selections(dir.path()).is_empty());
        assert!(try_load_selections(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_sidecar_is_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(sidecar_path(dir.path()), "{ not json").unwrap();

        assert!(load_selections(dir.path()).is_empty());
        assert!(matches!(
            try_load_selections(dir.path()),
            Err(Error::Json { .. })
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.png");

        let mut selections = Selections::new();
        selections.toggle(&a, Tag::Copy);
        selections.toggle(&b, Tag::Delete);
        save_selections(dir.path(), &selections).unwrap();

        let loaded = load_selections(dir.path());
        assert_eq!(loaded.get(&a), Some(Tag::Copy));
        assert_eq!(loaded.get(&b), Some(Tag::Delete));
        assert!(!dir.path().join(format!("{SIDECAR_FILE_NAME}.tmp")).exists());
    }

    #[test]
    fn test_save_overwrites_previous_contents() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.jpg");

        let mut selections = Selections::new();
        selections.toggle(&a, Tag::Copy);
        save_selections(dir.path(), &selections).unwrap();

        selections.toggle(&a, Tag::Copy);
        save_selections(dir.path(), &selections).unwrap();

        let raw = std::fs::read_to_string(sidecar_path(dir.path())).unwrap();
        assert_eq!(raw.trim(), "{}");
        assert!(load_selections(dir.path()).is_empty());
    }

    #[test]
    fn test_sidecar_is_pretty_printed() {
        let dir = tempdir().unwrap();
        let mut selections = Selections::new();
        selections.toggle(Path::new("/x/a.jpg"), Tag::Copy);
        save_selections(dir.path(), &selections).unwrap();

        let raw = std::fs::read_to_string(sidecar_path(dir.path())).unwrap();
        assert_eq!(raw, "{\n  \"/x/a.jpg\": \"copy\"\n}");
    }

    #[cfg(unix)]
    #[test]
    fn test_path_that_is_not_utf8_does_not_block_saving() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let good = dir.path().join("good.jpg");
        let bad = dir.path().join(OsStr::from_bytes(b"bad\xff.jpg"));

        let mut selections = Selections::new();
        selections.toggle(&good, Tag::Copy);
        selections.toggle(&bad, Tag::Delete);
        save_selections(dir.path(), &selections).unwrap();

        let loaded = load_selections(dir.path());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(&good), Some(Tag::Copy));
    }

    #[test]
    fn test_save_into_missing_folder_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        let err = save_selections(&missing, &Selections::new()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
