//! Image triage core: flip through a folder, tag images for copy or delete,
//! review the tagged set in a virtualized grid, then run the batch.
//!
//! This crate provides:
//! - `layout` - Window calculation for the virtualized grid
//! - `viewport` - Scroll/resize tracking of a scroll container
//! - `models` - Tags, per-folder selections, and their JSON sidecar
//! - `scanner` - Image discovery in a folder
//! - `fileops` - Batch copy and delete with per-file outcomes
//! - `session` - The triage session tying these together
//! - `image_loader` / `thumbnails` - Preview decoding for grid tiles

pub mod config;
pub mod error;
pub mod fileops;
pub mod image_loader;
pub mod layout;
pub mod models;
pub mod scanner;
pub mod session;
pub mod thumbnails;
pub mod viewport;

pub use error::{Error, Result};
