//! Window calculation for the virtualized confirmation grid.
//!
//! This module provides:
//! - `GridParams` - Validated row height / column / buffer constants
//! - `RenderWindow` - The materialized index range plus spacer heights
//! - `compute_window` - Pure mapping from viewport state to a `RenderWindow`

pub mod grid_window;

pub use grid_window::*;
