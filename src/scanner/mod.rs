//! Folder scanning for triage sessions.
//!
//! This module provides:
//! - `ScanConfig` - Flat or recursive listing options
//! - `FileScanner` - walkdir-based discovery of supported image files
//! - `list_images` - Infallible listing used by the session

pub mod file_scanner;

pub use file_scanner::*;
