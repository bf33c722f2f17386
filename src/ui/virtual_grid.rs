// Virtualized fixed-row grid for the confirmation dialog
// Only the rows around the viewport are built; spacers stand in for the rest

use glib::SignalHandlerId;
use gtk4::prelude::*;
use gtk4::{Adjustment, Box as GtkBox, Grid, Orientation, PolicyType, ScrolledWindow};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use imgtriage::config::GridConfig;
use imgtriage::layout::{compute_window, GridParams, RenderWindow};
use imgtriage::models::Tag;
use imgtriage::viewport::{ScrollContainer, ViewportState, ViewportSubscription, ViewportTracker};

use super::preview_cache::PreviewLoader;
use super::tile::Tile;

/// Vertical adjustment of a `ScrolledWindow` seen as a scroll container.
#[derive(Clone)]
pub struct ScrollAdjustment(Adjustment);

impl ScrollContainer for ScrollAdjustment {
    type Listener = SignalHandlerId;

    fn scroll_offset(&self) -> f64 {
        self.0.value()
    }

    fn viewport_height(&self) -> f64 {
        self.0.page_size()
    }

    fn connect_scroll(&self, handler: Box<dyn Fn(f64)>) -> SignalHandlerId {
        self.0
            .connect_value_changed(move |adjustment| handler(adjustment.value()))
    }

    // page-size updates after an allocation arrive through "changed"
    fn connect_resize(&self, handler: Box<dyn Fn(f64)>) -> SignalHandlerId {
        self.0
            .connect_changed(move |adjustment| handler(adjustment.page_size()))
    }

    fn disconnect(&self, listener: SignalHandlerId) {
        self.0.disconnect(listener);
    }
}

/// Grid cell of `index` relative to the first rendered row.
fn grid_slot(index: usize, window: &RenderWindow, columns: usize) -> (i32, i32) {
    let col = index % columns;
    let row = index / columns - window.start_row;
    (col as i32, row as i32)
}

/// Adjustment value that shows `target` at the top, or `None` while the
/// container has not been measured.
fn scroll_value(target: f64, upper: f64, page_size: f64) -> Option<f64> {
    if page_size <= 0.0 || !page_size.is_finite() {
        return None;
    }
    Some(target.min((upper - page_size).max(0.0)).max(0.0))
}

type TagLookup = Box<dyn Fn(&Path) -> Option<Tag>>;
type ToggleCallback = Rc<dyn Fn(&Path)>;

pub struct VirtualGrid {
    scroller: ScrolledWindow,
    top_spacer: GtkBox,
    bottom_spacer: GtkBox,
    grid: Grid,
    params: GridParams,
    tile_height: i32,
    items: Vec<PathBuf>,
    tag_of: TagLookup,
    on_toggle: Rc<RefCell<Option<ToggleCallback>>>,
    tiles: RefCell<HashMap<usize, Tile>>,
    window: Cell<Option<RenderWindow>>,
    scroll_target: Cell<Option<f64>>,
    tracker: ViewportTracker,
    subscription: RefCell<Option<ViewportSubscription<ScrollAdjustment>>>,
    loader: Rc<PreviewLoader>,
}

impl VirtualGrid {
    /// Builds the grid over a fixed `items` collection and starts tracking its viewport.
    pub fn new<F>(
        config: &GridConfig,
        items: Vec<PathBuf>,
        loader: Rc<PreviewLoader>,
        tag_of: F,
    ) -> Rc<Self>
    where
        F: Fn(&Path) -> Option<Tag> + 'static,
    {
        let scroller = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Never)
            .vscrollbar_policy(PolicyType::Automatic)
            .max_content_height(config.max_viewport_height)
            .propagate_natural_height(true)
            .hexpand(true)
            .build();
        scroller.add_css_class("grid-scroll");

        let content = GtkBox::new(Orientation::Vertical, 0);
        let top_spacer = GtkBox::new(Orientation::Vertical, 0);
        let bottom_spacer = GtkBox::new(Orientation::Vertical, 0);

        let grid = Grid::new();
        grid.set_column_homogeneous(true);
        grid.set_column_spacing(config.tile_gap.max(0) as u32);
        grid.set_row_spacing(config.tile_gap.max(0) as u32);
        // GtkGrid puts no spacing after its last row
        grid.set_margin_bottom(config.tile_gap.max(0));

        content.append(&top_spacer);
        content.append(&grid);
        content.append(&bottom_spacer);
        scroller.set_child(Some(&content));

        let virtual_grid = Rc::new(Self {
            scroller,
            top_spacer,
            bottom_spacer,
            grid,
            params: config.params(),
            tile_height: config.tile_height(),
            items,
            tag_of: Box::new(tag_of),
            on_toggle: Rc::new(RefCell::new(None)),
            tiles: RefCell::new(HashMap::new()),
            window: Cell::new(None),
            scroll_target: Cell::new(None),
            tracker: ViewportTracker::new(),
            subscription: RefCell::new(None),
            loader,
        });

        let grid_weak = Rc::downgrade(&virtual_grid);
        let adjustment = ScrollAdjustment(virtual_grid.scroller.vadjustment());
        let subscription = virtual_grid.tracker.attach(&adjustment, move |state| {
            if let Some(grid) = grid_weak.upgrade() {
                grid.render(state);
            }
        });
        *virtual_grid.subscription.borrow_mut() = Some(subscription);

        virtual_grid
    }

    pub fn widget(&self) -> &ScrolledWindow {
        &self.scroller
    }

    /// Called with the path whose badge was clicked.
    pub fn connect_toggle<F>(&self, callback: F)
    where
        F: Fn(&Path) + 'static,
    {
        *self.on_toggle.borrow_mut() = Some(Rc::new(callback));
    }

    /// Re-reads the tag of every materialized tile.
    pub fn refresh_tags(&self) {
        for tile in self.tiles.borrow().values() {
            tile.set_tag((self.tag_of)(tile.path()));
        }
    }

    /// Scrolls so the row holding `index` is at the top once the grid has a size.
    pub fn scroll_to_index(&self, index: usize) {
        if index >= self.items.len() {
            return;
        }
        self.scroll_target.set(Some(self.params.row_top(index)));
        self.apply_scroll_target();
    }

    /// Stops following the scroll container. Safe to call more than once.
    pub fn detach(&self) {
        if let Some(subscription) = self.subscription.borrow().as_ref() {
            if subscription.is_attached() {
                subscription.detach();
                tracing::trace!(items = self.items.len(), "Grid detached");
            }
        }
    }

    /// Returns true when the adjustment moved; the resulting scroll event has
    /// already rendered the new window.
    fn apply_scroll_target(&self) -> bool {
        let Some(target) = self.scroll_target.get() else {
            return false;
        };
        let adjustment = self.scroller.vadjustment();
        let Some(value) = scroll_value(target, adjustment.upper(), adjustment.page_size()) else {
            return false;
        };
        self.scroll_target.set(None);
        if (adjustment.value() - value).abs() < 0.5 {
            return false;
        }
        adjustment.set_value(value);
        true
    }

    fn render(&self, state: ViewportState) {
        if self.apply_scroll_target() {
            return;
        }
        let window = compute_window(state, self.items.len(), &self.params);
        if self.window.get() == Some(window) {
            return;
        }
        self.window.set(Some(window));
        tracing::trace!(
            start = window.start_index,
            end = window.end_index,
            top = window.top_spacer,
            bottom = window.bottom_spacer,
            "Grid window changed"
        );

        self.top_spacer
            .set_size_request(-1, window.top_spacer.round() as i32);
        self.bottom_spacer
            .set_size_request(-1, window.bottom_spacer.round() as i32);

        let mut tiles = self.tiles.borrow_mut();
        for tile in tiles.values() {
            self.grid.remove(tile.widget());
        }
        tiles.retain(|index, tile| {
            let keep = window.contains(*index);
            if !keep {
                self.loader.cancel(tile.path());
            }
            keep
        });

        let columns = self.params.columns();
        for index in window.indices() {
            let Some(path) = self.items.get(index) else {
                break;
            };
            let tile = tiles.entry(index).or_insert_with(|| self.build_tile(path));
            let (col, row) = grid_slot(index, &window, columns);
            self.grid.attach(tile.widget(), col, row, 1, 1);
        }
    }

    fn build_tile(&self, path: &Path) -> Tile {
        let tile = Tile::new(path, -1, self.tile_height, &self.loader);
        tile.set_tag((self.tag_of)(path));
        let on_toggle = self.on_toggle.clone();
        tile.connect_toggle(move |path| {
            let callback = on_toggle.borrow().clone();
            if let Some(callback) = callback {
                callback(path);
            }
        });
        tile
    }
}

impl Drop for VirtualGrid {
    fn drop(&mut self) {
        self.detach();
    }
}
