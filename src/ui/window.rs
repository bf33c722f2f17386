// Main window for the image triage app
// Shows one image at a time with tag buttons, counts and the proceed actions

use gtk4::prelude::*;
use gtk4::{
    gio, glib, Align, Application, ApplicationWindow, Box as GtkBox, Button, CheckButton,
    ContentFit, Label, Orientation, Picture, Settings, Stack, StackTransitionType,
};
use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};

use imgtriage::config::TriageConfig;
use imgtriage::models::Tag;
use imgtriage::session::TriageSession;

use super::confirm_dialog::ConfirmDialog;
use super::keybindings::{Direction, Keybindings};
use super::preview_cache::PreviewLoader;
use super::style;

const RING_CLASSES: [&str; 2] = ["ring-copy", "ring-delete"];

fn ring_class(tag: Tag) -> &'static str {
    match tag {
        Tag::Copy => "ring-copy",
        Tag::Delete => "ring-delete",
    }
}

fn badge_text(tag: Tag, count: usize) -> String {
    let icon = match tag {
        Tag::Copy => "📋",
        Tag::Delete => "🗑",
    };
    format!("{icon} {count}")
}

fn proceed_label(tag: Tag, count: usize) -> String {
    format!("Proceed to {} ({count})", tag.verb())
}

fn position_text((position, total): (usize, usize)) -> String {
    format!("{position} / {total}")
}

/// Widgets of the "Add to ..." and "Proceed to ..." pair for one tag.
struct TagControls {
    tag: Tag,
    badge: Label,
    add_button: Button,
    proceed_button: Button,
}

impl TagControls {
    fn new(tag: Tag) -> Self {
        let badge = Label::new(Some(&badge_text(tag, 0)));
        badge.add_css_class("badge");
        badge.add_css_class(match tag {
            Tag::Copy => "badge-copy",
            Tag::Delete => "badge-delete",
        });

        let shortcut = match tag {
            Tag::Copy => "c",
            Tag::Delete => "d",
        };
        let add_button = Button::with_label(&format!("Add to {} ({shortcut})", tag.verb()));
        add_button.add_css_class(match tag {
            Tag::Copy => "btn-copy",
            Tag::Delete => "btn-delete",
        });

        let proceed_button = Button::with_label(&proceed_label(tag, 0));

        Self {
            tag,
            badge,
            add_button,
            proceed_button,
        }
    }

    fn update(&self, count: usize, current: Option<Tag>) {
        self.badge.set_text(&badge_text(self.tag, count));
        self.proceed_button.set_label(&proceed_label(self.tag, count));
        self.proceed_button.set_sensitive(count > 0);
        if current == Some(self.tag) {
            self.add_button.add_css_class("active");
        } else {
            self.add_button.remove_css_class("active");
        }
    }
}

/// Main window of the triage app
pub struct MainWindow {
    self_weak: RefCell<Weak<MainWindow>>,
    window: ApplicationWindow,
    stack: Stack,
    config: TriageConfig,
    session: Rc<RefCell<TriageSession>>,
    loader: Rc<PreviewLoader>,
    keybindings: Keybindings,
    empty_label: Label,
    folder_label: Label,
    position_label: Label,
    name_label: Label,
    auto_advance_toggle: CheckButton,
    image_frame: GtkBox,
    picture: Picture,
    prev_button: Button,
    next_button: Button,
    copy_controls: TagControls,
    delete_controls: TagControls,
    pending_advance: RefCell<Option<glib::SourceId>>,
}

impl MainWindow {
    pub fn new(app: &Application, config: TriageConfig, initial_path: Option<&Path>) -> Rc<Self> {
        // Load CSS before creating widgets
        style::load_css();
        if let Some(settings) = Settings::default() {
            settings.set_gtk_application_prefer_dark_theme(true);
        }

        let window = ApplicationWindow::builder()
            .application(app)
            .title("Image Triage")
            .default_width(1000)
            .default_height(800)
            .build();

        let stack = Stack::new();
        stack.set_transition_type(StackTransitionType::Crossfade);

        // Empty state
        let empty_page = GtkBox::new(Orientation::Vertical, 12);
        empty_page.set_valign(Align::Center);
        empty_page.set_halign(Align::Center);
        let empty_label = Label::new(Some("Select a folder of images to start triaging"));
        empty_label.add_css_class("muted");
        let select_button = Button::with_label("Select Folder");
        select_button.add_css_class("suggested-action");
        empty_page.append(&empty_label);
        empty_page.append(&select_button);
        stack.add_named(&empty_page, Some("empty"));

        // Triage page
        let page = GtkBox::new(Orientation::Vertical, 8);

        let header = GtkBox::new(Orientation::Horizontal, 12);
        header.add_css_class("header-bar");
        let folder_label = Label::new(None);
        folder_label.add_css_class("folder-label");
        folder_label.set_hexpand(true);
        folder_label.set_halign(Align::Start);
        folder_label.set_ellipsize(gtk4::pango::EllipsizeMode::Start);
        let copy_controls = TagControls::new(Tag::Copy);
        let delete_controls = TagControls::new(Tag::Delete);
        let position_label = Label::new(None);
        let auto_advance_toggle = CheckButton::with_label("Auto-advance");
        auto_advance_toggle.set_active(config.auto_advance);
        let change_folder_button = Button::with_label("Open (o)");
        header.append(&folder_label);
        header.append(&copy_controls.badge);
        header.append(&delete_controls.badge);
        header.append(&position_label);
        header.append(&auto_advance_toggle);
        header.append(&change_folder_button);

        let image_frame = GtkBox::new(Orientation::Vertical, 0);
        image_frame.add_css_class("image-frame");
        image_frame.set_vexpand(true);
        image_frame.set_margin_start(16);
        image_frame.set_margin_end(16);
        let picture = Picture::new();
        picture.set_content_fit(ContentFit::Contain);
        picture.set_can_shrink(true);
        picture.set_vexpand(true);
        image_frame.append(&picture);

        let nav_row = GtkBox::new(Orientation::Horizontal, 8);
        nav_row.set_margin_start(16);
        nav_row.set_margin_end(16);
        let prev_button = Button::with_label("← Previous");
        let next_button = Button::with_label("Next →");
        let name_label = Label::new(None);
        name_label.set_hexpand(true);
        name_label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
        nav_row.append(&prev_button);
        nav_row.append(&name_label);
        nav_row.append(&next_button);

        let tag_row = GtkBox::new(Orientation::Horizontal, 8);
        tag_row.set_halign(Align::Center);
        tag_row.append(&copy_controls.add_button);
        tag_row.append(&delete_controls.add_button);

        let proceed_row = GtkBox::new(Orientation::Horizontal, 8);
        proceed_row.set_halign(Align::Center);
        proceed_row.set_margin_bottom(16);
        proceed_row.append(&copy_controls.proceed_button);
        proceed_row.append(&delete_controls.proceed_button);

        page.append(&header);
        page.append(&image_frame);
        page.append(&nav_row);
        page.append(&tag_row);
        page.append(&proceed_row);
        stack.add_named(&page, Some("triage"));
        stack.set_visible_child_name("empty");

        window.set_child(Some(&stack));

        let session = Rc::new(RefCell::new(TriageSession::with_fs(
            config.scan.clone(),
            config.auto_advance,
        )));
        let loader = PreviewLoader::new(config.preview_size);

        let main_window = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            stack,
            config,
            session,
            loader,
            keybindings: Keybindings::new(),
            empty_label,
            folder_label,
            position_label,
            name_label,
            auto_advance_toggle,
            image_frame,
            picture,
            prev_button,
            next_button,
            copy_controls,
            delete_controls,
            pending_advance: RefCell::new(None),
        });
        *main_window.self_weak.borrow_mut() = Rc::downgrade(&main_window);

        main_window.connect_buttons(&select_button, &change_folder_button);
        main_window.setup_keybindings();

        if let Some(path) = initial_path {
            main_window.load_folder(path);
        }

        main_window
    }

    fn connect_buttons(&self, select_button: &Button, change_folder_button: &Button) {
        for button in [select_button, change_folder_button] {
            let window_weak = self.self_weak.borrow().clone();
            button.connect_clicked(move |_| {
                if let Some(window) = window_weak.upgrade() {
                    window.prompt_open_folder();
                }
            });
        }

        let window_weak = self.self_weak.borrow().clone();
        self.prev_button.connect_clicked(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.navigate(Direction::Previous);
            }
        });

        let window_weak = self.self_weak.borrow().clone();
        self.next_button.connect_clicked(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.navigate(Direction::Next);
            }
        });

        let window_weak = self.self_weak.borrow().clone();
        self.auto_advance_toggle.connect_toggled(move |toggle| {
            if let Some(window) = window_weak.upgrade() {
                window.session.borrow_mut().set_auto_advance(toggle.is_active());
                if !toggle.is_active() {
                    window.cancel_pending_advance();
                }
            }
        });

        for controls in [&self.copy_controls, &self.delete_controls] {
            let tag = controls.tag;

            let window_weak = self.self_weak.borrow().clone();
            controls.add_button.connect_clicked(move |_| {
                if let Some(window) = window_weak.upgrade() {
                    window.toggle_tag(tag);
                }
            });

            let window_weak = self.self_weak.borrow().clone();
            controls.proceed_button.connect_clicked(move |_| {
                if let Some(window) = window_weak.upgrade() {
                    window.open_confirmation(tag);
                }
            });
        }
    }

    fn setup_keybindings(&self) {
        self.keybindings.attach(&self.window);

        let window_weak = self.self_weak.borrow().clone();
        self.keybindings.connect_navigate(move |direction| {
            if let Some(window) = window_weak.upgrade() {
                window.navigate(direction);
            }
        });

        let window_weak = self.self_weak.borrow().clone();
        self.keybindings.connect_toggle_tag(move |tag| {
            if let Some(window) = window_weak.upgrade() {
                window.toggle_tag(tag);
            }
        });

        let window_weak = self.self_weak.borrow().clone();
        self.keybindings.connect_open_folder(move || {
            if let Some(window) = window_weak.upgrade() {
                window.prompt_open_folder();
            }
        });
    }

    fn prompt_open_folder(&self) {
        let dialog = gtk4::FileDialog::builder()
            .title("Select Image Folder")
            .modal(true)
            .build();
        let start = self
            .session
            .borrow()
            .folder()
            .map(Path::to_path_buf)
            .or_else(TriageConfig::default_start_dir);
        if let Some(dir) = start {
            dialog.set_initial_folder(Some(&gio::File::for_path(dir)));
        }

        let window_weak = self.self_weak.borrow().clone();
        dialog.select_folder(Some(&self.window), gio::Cancellable::NONE, move |result| {
            let Some(window) = window_weak.upgrade() else {
                return;
            };
            match result {
                Ok(folder) => match folder.path() {
                    Some(path) => window.load_folder(&path),
                    None => tracing::warn!(uri = %folder.uri(), "Selected folder has no local path"),
                },
                Err(err) => tracing::debug!(error = %err, "Folder selection cancelled"),
            }
        });
    }

    pub fn load_folder(&self, path: &Path) {
        self.cancel_pending_advance();
        self.session.borrow_mut().open_folder(path);
        self.refresh();
    }

    fn navigate(&self, direction: Direction) {
        self.cancel_pending_advance();
        let moved = {
            let mut session = self.session.borrow_mut();
            match direction {
                Direction::Previous => session.go_prev(),
                Direction::Next => session.go_next(),
            }
        };
        if moved {
            self.refresh();
        }
    }

    fn toggle_tag(&self, tag: Tag) {
        self.cancel_pending_advance();
        let action = self.session.borrow_mut().toggle_current(tag);
        let Some(action) = action else {
            return;
        };
        self.refresh();
        if action.advance {
            self.schedule_advance();
        }
    }

    fn schedule_advance(&self) {
        let window_weak = self.self_weak.borrow().clone();
        let source = glib::timeout_add_local_once(self.config.auto_advance_delay, move || {
            let Some(window) = window_weak.upgrade() else {
                return;
            };
            // The source is finished; forget it so it is never removed twice.
            window.pending_advance.borrow_mut().take();
            if window.session.borrow_mut().advance() {
                window.refresh();
            }
        });
        *self.pending_advance.borrow_mut() = Some(source);
    }

    fn cancel_pending_advance(&self) {
        if let Some(source) = self.pending_advance.borrow_mut().take() {
            source.remove();
        }
    }

    fn open_confirmation(&self, tag: Tag) {
        if self.session.borrow().count(tag) == 0 {
            return;
        }
        self.cancel_pending_advance();

        let window_weak = self.self_weak.borrow().clone();
        let on_changed: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(window) = window_weak.upgrade() {
                window.refresh();
            }
        });

        ConfirmDialog::present(
            &self.window,
            tag,
            self.session.clone(),
            &self.config,
            self.loader.clone(),
            on_changed,
        );
    }

    /// Re-renders every widget from the session state.
    fn refresh(&self) {
        let session = self.session.borrow();

        let Some(folder) = session.folder() else {
            self.stack.set_visible_child_name("empty");
            return;
        };

        if session.is_empty() {
            self.empty_label
                .set_text(&format!("No images found in {}", folder.display()));
            self.stack.set_visible_child_name("empty");
            return;
        }

        self.folder_label.set_text(&folder.display().to_string());
        self.position_label.set_text(&position_text(session.position()));
        self.prev_button.set_sensitive(session.has_prev());
        self.next_button.set_sensitive(session.has_next());

        let current = session.current_image();
        let current_tag = current.and_then(|path| session.tag_of(path));

        for class in RING_CLASSES {
            self.image_frame.remove_css_class(class);
        }
        if let Some(tag) = current_tag {
            self.image_frame.add_css_class(ring_class(tag));
        }

        match current {
            Some(path) => {
                self.picture.set_filename(Some(path));
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.name_label.set_text(&name);
            }
            None => {
                self.picture.set_paintable(None::<&gtk4::gdk::Paintable>);
                self.name_label.set_text("");
            }
        }

        self.copy_controls
            .update(session.count(Tag::Copy), current_tag);
        self.delete_controls
            .update(session.count(Tag::Delete), current_tag);

        self.stack.set_visible_child_name("triage");
    }

    /// Present the window
    pub fn present(&self) {
        self.window.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(proceed_label(Tag::Copy, 3), "Proceed to Copy (3)");
        assert_eq!(proceed_label(Tag::Delete, 0), "Proceed to Delete (0)");
        assert_eq!(badge_text(Tag::Delete, 7), "🗑 7");
        assert_eq!(position_text((3, 120)), "3 / 120");
        assert_eq!(position_text((0, 0)), "0 / 0");
    }

    #[test]
    fn test_ring_class_per_tag() {
        for tag in Tag::ALL {
            assert!(RING_CLASSES.contains(&ring_class(tag)));
        }
    }
}
