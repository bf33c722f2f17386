// Stylesheet for the triage window and confirmation grid

use gdk4::Display;
use gtk4::{CssProvider, STYLE_PROVIDER_PRIORITY_APPLICATION};

const APP_CSS: &str = r#"
window {
    background-color: #111827;
    color: #e5e7eb;
}

.header-bar {
    padding: 8px 12px;
    border-bottom: 1px solid #1f2937;
}

.folder-label {
    font-family: monospace;
    color: #9ca3af;
}

.badge {
    padding: 2px 8px;
    border-radius: 999px;
    font-size: 12px;
    font-weight: bold;
}

.badge-copy {
    background-color: rgba(59, 130, 246, 0.25);
    color: #93c5fd;
}

.badge-delete {
    background-color: rgba(239, 68, 68, 0.25);
    color: #fca5a5;
}

.muted {
    color: #6b7280;
}

.image-frame {
    border: 4px solid transparent;
    border-radius: 8px;
    padding: 4px;
}

.image-frame.ring-copy {
    border-color: #3b82f6;
}

.image-frame.ring-delete {
    border-color: #ef4444;
}

button.btn-copy.active {
    background: #2563eb;
    color: #ffffff;
}

button.btn-delete.active {
    background: #dc2626;
    color: #ffffff;
}

.dialog-title {
    font-size: 18px;
    font-weight: bold;
}

.grid-scroll {
    background-color: #0b1220;
    border-radius: 6px;
}

.tile {
    background-color: #1f2937;
    border-radius: 6px;
    padding: 4px;
}

.tile-name {
    font-size: 11px;
    color: #d1d5db;
}

.tile-badge {
    min-width: 24px;
    min-height: 24px;
    padding: 0;
    border-radius: 999px;
}

.tile-badge.tag-copy {
    background: #2563eb;
}

.tile-badge.tag-delete {
    background: #dc2626;
}
"#;

/// Installs the application stylesheet on the default display.
pub fn load_css() {
    let provider = CssProvider::new();
    provider.load_from_string(APP_CSS);

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
        tracing::debug!("Loaded application CSS");
    } else {
        tracing::warn!("No display available; skipping CSS");
    }
}
