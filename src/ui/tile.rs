// One tile of the confirmation grid: preview, file name, tag badge

use gtk4::prelude::*;
use gtk4::{Align, Box as GtkBox, Button, ContentFit, Label, Orientation, Picture};
use std::path::{Path, PathBuf};

use imgtriage::models::Tag;

use super::preview_cache::PreviewLoader;

const BADGE_CLASSES: [&str; 2] = ["tag-copy", "tag-delete"];

fn badge_class(tag: Tag) -> &'static str {
    match tag {
        Tag::Copy => "tag-copy",
        Tag::Delete => "tag-delete",
    }
}

fn badge_icon(tag: Option<Tag>) -> &'static str {
    match tag {
        Some(Tag::Copy) => "📋",
        Some(Tag::Delete) => "🗑",
        None => "✓",
    }
}

pub struct Tile {
    root: GtkBox,
    picture: Picture,
    badge: Button,
    path: PathBuf,
}

impl Tile {
    pub fn new(path: &Path, width: i32, height: i32, loader: &PreviewLoader) -> Self {
        let root = GtkBox::new(Orientation::Vertical, 4);
        root.add_css_class("tile");
        root.set_size_request(width, height);

        let overlay = gtk4::Overlay::new();
        let picture = Picture::new();
        picture.set_content_fit(ContentFit::Cover);
        picture.set_can_shrink(true);
        picture.set_vexpand(true);
        picture.set_hexpand(true);
        overlay.set_child(Some(&picture));

        let badge = Button::with_label(badge_icon(None));
        badge.add_css_class("tile-badge");
        badge.set_halign(Align::End);
        badge.set_valign(Align::Start);
        badge.set_margin_top(4);
        badge.set_margin_end(4);
        overlay.add_overlay(&badge);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let label = Label::new(Some(&name));
        label.add_css_class("tile-name");
        label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
        label.set_tooltip_text(Some(&path.display().to_string()));

        root.append(&overlay);
        root.append(&label);

        loader.load_into(&picture, path);

        Self {
            root,
            picture,
            badge,
            path: path.to_path_buf(),
        }
    }

    pub fn widget(&self) -> &GtkBox {
        &self.root
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reflects `tag` on the badge. `None` means the item was untoggled.
    pub fn set_tag(&self, tag: Option<Tag>) {
        for class in BADGE_CLASSES {
            self.badge.remove_css_class(class);
        }
        self.badge.set_label(badge_icon(tag));
        match tag {
            Some(tag) => {
                self.badge.add_css_class(badge_class(tag));
                self.badge
                    .set_tooltip_text(Some(&format!("Tagged for {}; click to untag", tag)));
                self.picture.set_opacity(1.0);
            }
            None => {
                self.badge.set_tooltip_text(Some("Not tagged; click to tag again"));
                self.picture.set_opacity(0.4);
            }
        }
    }

    pub fn connect_toggle<F>(&self, callback: F)
    where
        F: Fn(&Path) + 'static,
    {
        let path = self.path.clone();
        self.badge.connect_clicked(move |_| callback(&path));
    }
}
