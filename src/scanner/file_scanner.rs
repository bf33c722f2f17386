//! Image discovery for a triage folder.
//!
//! Lists files whose extension is one of the supported raster formats
//! (case-insensitive). The default is a flat listing of the folder itself;
//! recursive scanning is opt-in.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Extensions accepted as images, lowercase and without the dot.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff"];

/// Returns true if `path` has one of the [`IMAGE_EXTENSIONS`].
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Configuration for the file scanner.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to descend into subfolders.
    pub recursive: bool,
    /// Maximum directory depth when recursive (0 = unlimited).
    pub max_depth: usize,
    /// Whether dot-files and dot-folders are listed.
    pub include_hidden: bool,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            max_depth: 0, // unlimited
            include_hidden: true,
            follow_symlinks: false,
        }
    }
}

/// Directory scanner for triage folders.
pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    /// Creates a new file scanner with default configuration.
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    /// Creates a new file scanner with custom configuration.
    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Discovers image files under `dir`, sorted by path.
    ///
    /// Fails only when `dir` itself cannot be read; unreadable entries below
    /// it are skipped with a warning.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut walker = WalkDir::new(dir).follow_links(self.config.follow_symlinks);

        if !self.config.recursive {
            walker = walker.max_depth(1);
        } else if self.config.max_depth > 0 {
            walker = walker.max_depth(self.config.max_depth);
        }

        let include_hidden = self.config.include_hidden;
        let mut paths = Vec::new();

        for entry in walker
            .into_iter()
            .filter_entry(|entry| include_hidden || entry.depth() == 0 || !is_hidden(entry))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(err).with_context(|| format!("Failed to read folder: {:?}", dir));
                }
                Err(err) => {
                    warn!("Skipping unreadable entry under {:?}: {}", dir, err);
                    continue;
                }
            };

            if entry.depth() == 0 && !entry.file_type().is_dir() {
                anyhow::bail!("Not a folder: {:?}", dir);
            }

            if entry.file_type().is_dir() || !is_image_path(entry.path()) {
                continue;
            }

            paths.push(entry.into_path());
        }

        // Sort by path for consistent ordering
        paths.sort();

        debug!(?dir, count = paths.len(), "Discovered images");
        Ok(paths)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Lists the images in `folder`, returning an empty list if it can't be read.
pub fn list_images(folder: &Path, config: &ScanConfig) -> Vec<PathBuf> {
    match FileScanner::with_config(config.clone()).discover(folder) {
        Ok(paths) => {
            info!("Found {} images in {:?}", paths.len(), folder);
            paths
        }
        Err(err) => {
            warn!(error = ?err, "Error reading folder");
            Vec::new()
        }
    }
}
