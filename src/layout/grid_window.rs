use std::ops::Range;

use crate::viewport::ViewportState;

/// Layout parameters for a fixed-row-height, fixed-column grid.
///
/// Fields are private so a `GridParams` is always valid once constructed;
/// `compute_window` never has to re-check them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridParams {
    columns: usize,
    row_height: f64,
    buffer_rows: usize,
    fallback_visible_rows: usize,
}

impl GridParams {
    /// Rows assumed visible while the container height is still unknown.
    pub const DEFAULT_FALLBACK_VISIBLE_ROWS: usize = 6;

    /// Creates grid parameters.
    ///
    /// # Panics
    /// Panics if `columns` is zero or `row_height` is not a positive finite
    /// number. Both are wiring mistakes, not runtime conditions.
    pub fn new(columns: usize, row_height: f64, buffer_rows: usize) -> Self {
        assert!(columns >= 1, "grid needs at least one column");
        assert!(
            row_height.is_finite() && row_height > 0.0,
            "row height must be positive and finite, got {row_height}"
        );
        Self {
            columns,
            row_height,
            buffer_rows,
            fallback_visible_rows: Self::DEFAULT_FALLBACK_VISIBLE_ROWS,
        }
    }

    /// Overrides the cold-start row count.
    ///
    /// # Panics
    /// Panics if `rows` is zero; the first render would be empty.
    pub fn with_fallback_visible_rows(mut self, rows: usize) -> Self {
        assert!(rows >= 1, "fallback visible rows must be at least one");
        self.fallback_visible_rows = rows;
        self
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    pub fn buffer_rows(&self) -> usize {
        self.buffer_rows
    }

    pub fn fallback_visible_rows(&self) -> usize {
        self.fallback_visible_rows
    }

    /// Number of rows needed for `item_count` items.
    pub fn total_rows(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.columns)
    }

    /// Height the collection would occupy if every row were rendered.
    pub fn total_height(&self, item_count: usize) -> f64 {
        self.total_rows(item_count) as f64 * self.row_height
    }

    /// Row containing the item at `index`.
    pub fn row_of(&self, index: usize) -> usize {
        index / self.columns
    }

    /// Scroll offset at which the row containing `index` starts.
    pub fn row_top(&self, index: usize) -> f64 {
        self.row_of(index) as f64 * self.row_height
    }

    fn visible_rows(&self, viewport_height: f64) -> usize {
        let rows = (viewport_height / self.row_height).ceil();
        if rows.is_finite() && rows >= 1.0 {
            rows as usize
        } else {
            self.fallback_visible_rows
        }
    }
}

/// The slice of the collection to materialize, plus the spacer heights that
/// stand in for the rows that are not rendered.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderWindow {
    /// First item index (inclusive), always a multiple of the column count
    pub start_index: usize,
    /// Last item index (exclusive)
    pub end_index: usize,
    pub start_row: usize,
    pub end_row: usize,
    /// Height reserved above the rendered rows
    pub top_spacer: f64,
    /// Height reserved below the rendered rows
    pub bottom_spacer: f64,
}

impl RenderWindow {
    pub fn indices(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    pub fn rendered_rows(&self) -> usize {
        self.end_row - self.start_row
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices().contains(&index)
    }
}

/// Maps the current viewport onto the range of items to render.
///
/// # Algorithm
/// 1. `total_rows = ceil(N / columns)`.
/// 2. `visible_rows = ceil(viewport_height / row_height)`, or the fallback row
///    count when the height has not been measured yet.
/// 3. The first visible row is `floor(scroll_offset / row_height)`, pinned to
///    the last full page so an offset past the end still shows the final rows.
///    `buffer_rows` are then added above it.
/// 4. `end_row = min(total_rows, start_row + visible_rows + 2 * buffer_rows)`.
/// 5. Rows are converted to item indices and spacer heights.
///
/// The result depends only on the arguments, so it can be recomputed from the
/// latest sampled viewport after any number of dropped scroll events.
pub fn compute_window(state: ViewportState, item_count: usize, params: &GridParams) -> RenderWindow {
    if item_count == 0 {
        return RenderWindow::default();
    }

    let total_rows = params.total_rows(item_count);
    let visible_rows = params.visible_rows(state.viewport_height);

    // `as` saturates, so a huge offset lands on usize::MAX and is clamped below.
    let first_row = (state.scroll_offset / params.row_height).floor().max(0.0) as usize;
    let first_row = first_row.min(total_rows.saturating_sub(visible_rows));

    let start_row = first_row.saturating_sub(params.buffer_rows);
    let span = visible_rows.saturating_add(params.buffer_rows.saturating_mul(2));
    let end_row = total_rows.min(start_row.saturating_add(span));

    RenderWindow {
        start_index: start_row * params.columns,
        end_index: item_count.min(end_row * params.columns),
        start_row,
        end_row,
        top_spacer: start_row as f64 * params.row_height,
        bottom_spacer: (total_rows - end_row) as f64 * params.row_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(scroll_offset: f64, viewport_height: f64) -> ViewportState {
        ViewportState {
            scroll_offset,
            viewport_height,
        }
    }

    fn check_invariants(window: &RenderWindow, n: usize, params: &GridParams) {
        assert!(window.start_index <= window.end_index);
        assert!(window.end_index <= n);
        assert_eq!(window.start_index % params.columns(), 0);
        let rendered = window.rendered_rows() as f64 * params.row_height();
        let total = window.top_spacer + rendered + window.bottom_spacer;
        assert!(
            (total - params.total_height(n)).abs() < 1e-6,
            "height not conserved: {total} vs {}",
            params.total_height(n)
        );
    }

    #[test]
    fn test_reference_scenario() {
        let params = GridParams::new(3, 156.0, 3);
        let window = compute_window(state(1560.0, 624.0), 100, &params);

        assert_eq!(params.total_rows(100), 34);
        assert_eq!(window.start_row, 7);
        assert_eq!(window.end_row, 17);
        assert_eq!(window.start_index, 21);
        assert_eq!(window.end_index, 51);
        assert_eq!(window.top_spacer, 1092.0);
        assert_eq!(window.bottom_spacer, 2652.0);
    }

    #[test]
    fn test_empty_collection() {
        let params = GridParams::new(3, 156.0, 3);
        let window = compute_window(state(5000.0, 624.0), 0, &params);
        assert_eq!(window, RenderWindow::default());
        assert!(window.is_empty());
        assert_eq!(window.top_spacer, 0.0);
        assert_eq!(window.bottom_spacer, 0.0);
    }

    #[test]
    fn test_cold_start_uses_fallback_rows() {
        let params = GridParams::new(3, 156.0, 3);
        let window = compute_window(state(0.0, 0.0), 100, &params);

        // 6 fallback rows + 2 * 3 buffer rows
        assert_eq!(window.start_row, 0);
        assert_eq!(window.end_row, 12);
        assert_eq!(window.end_index, 36);
        assert!(!window.is_empty());
    }

    #[test]
    fn test_non_finite_height_uses_fallback_rows() {
        let params = GridParams::new(2, 100.0, 0).with_fallback_visible_rows(4);
        let window = compute_window(state(0.0, f64::NAN), 50, &params);
        assert_eq!(window.end_row, 4);
    }

    #[test]
    fn test_scroll_past_end_clamps_to_final_rows() {
        let params = GridParams::new(3, 156.0, 3);
        let window = compute_window(state(1.0e9, 624.0), 100, &params);

        assert_eq!(window.end_row, 34);
        assert_eq!(window.end_index, 100);
        assert!(!window.is_empty());
        assert!(window.contains(99));
        check_invariants(&window, 100, &params);
    }

    #[test]
    fn test_scroll_past_end_after_shrink() {
        // Offset that was valid for 1000 items, collection now holds 10.
        let params = GridParams::new(3, 156.0, 3);
        let window = compute_window(state(40_000.0, 624.0), 10, &params);
        assert_eq!(window.start_index, 0);
        assert_eq!(window.end_index, 10);
        check_invariants(&window, 10, &params);
    }

    #[test]
    fn test_partial_last_row() {
        let params = GridParams::new(4, 50.0, 1);
        let window = compute_window(state(0.0, 1000.0), 10, &params);
        assert_eq!(params.total_rows(10), 3);
        assert_eq!(window.end_row, 3);
        assert_eq!(window.end_index, 10);
        assert_eq!(window.bottom_spacer, 0.0);
    }

    #[test]
    fn test_idempotent() {
        let params = GridParams::new(3, 156.0, 3);
        let a = compute_window(state(777.0, 500.0), 1234, &params);
        let b = compute_window(state(777.0, 500.0), 1234, &params);
        assert_eq!(a, b);
    }

    #[test]
    fn test_invariants_hold_across_inputs() {
        for &columns in &[1usize, 2, 3, 7] {
            for &buffer in &[0usize, 1, 3] {
                let params = GridParams::new(columns, 156.0, buffer);
                for &n in &[0usize, 1, 5, 100, 1001] {
                    for &height in &[0.0, 100.0, 624.0, 5000.0] {
                        for step in 0..60 {
                            let offset = step as f64 * 313.7;
                            let window = compute_window(state(offset, height), n, &params);
                            check_invariants(&window, n, &params);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_start_index_monotonic_in_scroll_offset() {
        let params = GridParams::new(3, 156.0, 3);
        let mut last_start = 0;
        for step in 0..400 {
            let window = compute_window(state(step as f64 * 40.0, 624.0), 500, &params);
            assert!(window.start_index >= last_start);
            last_start = window.start_index;
        }
    }

    #[test]
    fn test_row_helpers() {
        let params = GridParams::new(3, 156.0, 3);
        assert_eq!(params.row_of(0), 0);
        assert_eq!(params.row_of(5), 1);
        assert_eq!(params.row_top(7), 312.0);
        assert_eq!(params.total_height(100), 34.0 * 156.0);
    }

    #[test]
    #[should_panic(expected = "at least one column")]
    fn test_zero_columns_panics() {
        let _ = GridParams::new(0, 156.0, 3);
    }

    #[test]
    #[should_panic(expected = "row height")]
    fn test_zero_row_height_panics() {
        let _ = GridParams::new(3, 0.0, 3);
    }
}
