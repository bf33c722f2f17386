mod confirm_dialog;
mod keybindings;
mod preview_cache;
mod style;
mod tile;
mod virtual_grid;
mod window;

pub use window::MainWindow;
