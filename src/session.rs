//! State of one triage session: the folder, its images, the cursor, and the
//! per-image tags.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fileops::BatchReport;
use crate::models::{sidecar, Selections, Tag, ToggleOutcome};
use crate::scanner::{self, ScanConfig};

/// Collaborators the session reads images and tags from.
pub trait TriageBackend {
    fn list_images(&self, folder: &Path) -> Vec<PathBuf>;
    fn load_selections(&self, folder: &Path) -> Selections;
    fn save_selections(&self, folder: &Path, selections: &Selections) -> Result<()>;
}

/// Filesystem backend: walkdir listing plus the JSON sidecar.
#[derive(Debug, Clone, Default)]
pub struct FsBackend {
    pub scan: ScanConfig,
}

impl FsBackend {
    pub fn new(scan: ScanConfig) -> Self {
        Self { scan }
    }
}

impl TriageBackend for FsBackend {
    fn list_images(&self, folder: &Path) -> Vec<PathBuf> {
        scanner::list_images(folder, &self.scan)
    }

    fn load_selections(&self, folder: &Path) -> Selections {
        sidecar::load_selections(folder)
    }

    fn save_selections(&self, folder: &Path, selections: &Selections) -> Result<()> {
        sidecar::save_selections(folder, selections)
    }
}

/// What happened when the current image was tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagAction {
    pub outcome: ToggleOutcome,
    /// The caller should move to the next image (after its advance delay).
    pub advance: bool,
}

pub struct TriageSession<B: TriageBackend = FsBackend> {
    backend: B,
    folder: Option<PathBuf>,
    images: Vec<PathBuf>,
    current: usize,
    selections: Selections,
    auto_advance: bool,
}

impl<B: TriageBackend> TriageSession<B> {
    pub fn new(backend: B, auto_advance: bool) -> Self {
        Self {
            backend,
            folder: None,
            images: Vec::new(),
            current: 0,
            selections: Selections::new(),
            auto_advance,
        }
    }

    /// Loads `folder`: lists its images, restores saved tags, rewinds to the first image.
    pub fn open_folder(&mut self, folder: &Path) {
        self.images = self.backend.list_images(folder);
        self.selections = self.backend.load_selections(folder);
        self.folder = Some(folder.to_path_buf());
        self.current = 0;
        info!(
            ?folder,
            images = self.images.len(),
            tagged = self.selections.len(),
            "Opened folder"
        );
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_image(&self) -> Option<&Path> {
        self.images.get(self.current).map(PathBuf::as_path)
    }

    /// 1-based position and total, for "3 / 120" style labels.
    pub fn position(&self) -> (usize, usize) {
        if self.images.is_empty() {
            (0, 0)
        } else {
            (self.current + 1, self.images.len())
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current > 0
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.images.len()
    }

    /// Moves one image back. Returns false at the first image.
    pub fn go_prev(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Moves one image forward. Returns false at the last image.
    pub fn go_next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Delayed auto-advance step; same as `go_next`.
    pub fn advance(&mut self) -> bool {
        self.go_next()
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    pub fn set_auto_advance(&mut self, enabled: bool) {
        self.auto_advance = enabled;
    }

    pub fn toggle_auto_advance(&mut self) -> bool {
        self.auto_advance = !self.auto_advance;
        self.auto_advance
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn tag_of(&self, path: &Path) -> Option<Tag> {
        self.selections.get(path)
    }

    /// Images carrying `tag`, in the order they were tagged.
    pub fn pending(&self, tag: Tag) -> Vec<PathBuf> {
        self.selections.paths_with(tag)
    }

    pub fn count(&self, tag: Tag) -> usize {
        self.selections.count(tag)
    }

    /// Toggles `tag` on `path` and persists the full mapping.
    ///
    /// A failed save is logged; the in-memory change stands.
    pub fn toggle(&mut self, path: &Path, tag: Tag) -> ToggleOutcome {
        let outcome = self.selections.toggle(path, tag);
        debug!(?path, %tag, ?outcome, "Toggled tag");
        self.persist();
        outcome
    }

    /// Toggles `tag` on the current image.
    ///
    /// Returns `None` when no image is loaded. `advance` is set only when the
    /// toggle selected the tag, auto-advance is on, and this is not the last image.
    pub fn toggle_current(&mut self, tag: Tag) -> Option<TagAction> {
        let path = self.current_image()?.to_path_buf();
        let outcome = self.toggle(&path, tag);
        let advance = self.auto_advance && outcome.is_selected() && self.has_next();
        Some(TagAction { outcome, advance })
    }

    /// Applies a finished batch: drops the tags of every file that succeeded.
    ///
    /// Files that failed keep their tag so the batch can be retried. For
    /// deletes, successfully deleted files also leave the image list.
    /// Returns how many tags were cleared.
    pub fn apply_batch(&mut self, report: &BatchReport) -> usize {
        let cleared = self.selections.remove_all(report.succeeded());

        if report.action == Tag::Delete {
            let current_path = self.current_image().map(Path::to_path_buf);
            let deleted: std::collections::HashSet<&Path> = report.succeeded().collect();
            self.images.retain(|p| !deleted.contains(p.as_path()));
            self.current = match current_path {
                Some(path) => self
                    .images
                    .iter()
                    .position(|p| *p == path)
                    .unwrap_or(self.current),
                None => self.current,
            }
            .min(self.images.len().saturating_sub(1));
        }

        if report.failure_count() > 0 {
            warn!(
                failed = report.failure_count(),
                "Some files failed; their tags are kept"
            );
        }
        self.persist();
        cleared
    }

    fn persist(&self) {
        let Some(folder) = self.folder.as_deref() else {
            return;
        };
        if let Err(err) = self.backend.save_selections(folder, &self.selections) {
            warn!(error = %err, "Failed to save selections");
        }
    }
}

impl TriageSession<FsBackend> {
    pub fn with_fs(scan: ScanConfig, auto_advance: bool) -> Self {
        Self::new(FsBackend::new(scan), auto_advance)
    }
}
