//! Runtime configuration for the triage app.
//!
//! Everything has a sensible default; the binary only overrides the start
//! folder (from the command line) and the log filter (from `RUST_LOG`).

use std::path::PathBuf;
use std::time::Duration;

use crate::layout::GridParams;
use crate::scanner::ScanConfig;

/// Layout constants for the confirmation grid.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Tiles per row (default: 3)
    pub columns: usize,
    /// Height of one row including the inter-row gap (default: 156)
    pub row_height: f64,
    /// Rows materialized beyond the viewport on each side (default: 3)
    pub buffer_rows: usize,
    /// Rows assumed visible before the container has been measured (default: 6)
    pub fallback_visible_rows: usize,
    /// Maximum height of the scroll container in pixels (default: 384)
    pub max_viewport_height: i32,
    /// Gap between tiles in pixels (default: 16)
    pub tile_gap: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            row_height: 156.0,
            buffer_rows: 3,
            fallback_visible_rows: 6,
            max_viewport_height: 384,
            tile_gap: 16,
        }
    }
}

impl GridConfig {
    /// Converts to validated layout parameters.
    ///
    /// # Panics
    /// Panics if the configuration violates the [`GridParams`] preconditions.
    pub fn params(&self) -> GridParams {
        GridParams::new(self.columns, self.row_height, self.buffer_rows)
            .with_fallback_visible_rows(self.fallback_visible_rows)
    }

    /// Height of the tile body: one row minus the gap that separates rows.
    pub fn tile_height(&self) -> i32 {
        (self.row_height as i32 - self.tile_gap).max(1)
    }
}

#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub grid: GridConfig,
    pub scan: ScanConfig,
    /// Move to the next image after tagging the current one (default: on)
    pub auto_advance: bool,
    pub auto_advance_delay: Duration,
    /// Longest edge of decoded tile previews in pixels
    pub preview_size: u32,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            scan: ScanConfig::default(),
            auto_advance: true,
            auto_advance_delay: Duration::from_millis(200),
            preview_size: 256,
        }
    }
}

impl TriageConfig {
    /// Folder the folder picker opens in: the user's pictures directory, then home.
    pub fn default_start_dir() -> Option<PathBuf> {
        let dirs = directories::UserDirs::new()?;
        dirs.picture_dir()
            .map(|p| p.to_path_buf())
            .or_else(|| Some(dirs.home_dir().to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_config_default() {
        let config = GridConfig::default();
        assert_eq!(config.columns, 3);
        assert_eq!(config.row_height, 156.0);
        assert_eq!(config.buffer_rows, 3);
        assert_eq!(config.tile_height(), 140);
    }

    #[test]
    fn test_grid_config_params() {
        let params = GridConfig::default().params();
        assert_eq!(params.columns(), 3);
        assert_eq!(params.buffer_rows(), 3);
        assert_eq!(params.fallback_visible_rows(), 6);
    }

    #[test]
    fn test_triage_config_default() {
        let config = TriageConfig::default();
        assert!(config.auto_advance);
        assert_eq!(config.auto_advance_delay, Duration::from_millis(200));
        assert!(!config.scan.recursive);
    }
}
