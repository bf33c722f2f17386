// Confirmation dialog for a batch copy or delete
// Lists the tagged images in a virtual grid and runs the batch off the main thread

use gtk4::prelude::*;
use gtk4::{
    gio, glib, Align, AlertDialog, ApplicationWindow, Box as GtkBox, Button, FileDialog, Label,
    Orientation, Window,
};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use imgtriage::config::TriageConfig;
use imgtriage::fileops::{self, BatchReport};
use imgtriage::models::Tag;
use imgtriage::session::TriageSession;

use super::preview_cache::PreviewLoader;
use super::virtual_grid::VirtualGrid;

const DIALOG_MARGIN: i32 = 16;
const MAX_LISTED_FAILURES: usize = 10;

fn selected_label(count: usize) -> String {
    if count == 1 {
        "1 image selected".to_string()
    } else {
        format!("{count} images selected")
    }
}

fn failure_detail(report: &BatchReport) -> Option<String> {
    if report.is_complete_success() {
        return None;
    }
    let mut lines: Vec<String> = report
        .failed()
        .take(MAX_LISTED_FAILURES)
        .map(|outcome| {
            let name = outcome
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| outcome.path.display().to_string());
            match &outcome.result {
                Err(err) => format!("{name}: {err}"),
                Ok(()) => name,
            }
        })
        .collect();
    let hidden = report.failure_count().saturating_sub(MAX_LISTED_FAILURES);
    if hidden > 0 {
        lines.push(format!("... and {hidden} more"));
    }
    Some(lines.join("\n"))
}

pub type ChangedCallback = Rc<dyn Fn()>;

/// A strong reference that can be dropped from inside the value it points to.
///
/// Holding an `Rc<T>` inside `T` is a cycle; `release` breaks it.
struct KeepAlive<T>(RefCell<Option<Rc<T>>>);

impl<T> KeepAlive<T> {
    fn new() -> Self {
        Self(RefCell::new(None))
    }

    fn hold(&self, value: Rc<T>) {
        *self.0.borrow_mut() = Some(value);
    }

    fn release(&self) -> Option<Rc<T>> {
        self.0.borrow_mut().take()
    }
}

pub struct ConfirmDialog {
    self_weak: Weak<ConfirmDialog>,
    parent: ApplicationWindow,
    window: Window,
    action: Tag,
    session: Rc<RefCell<TriageSession>>,
    grid: Rc<VirtualGrid>,
    count_label: Label,
    cancel_button: Button,
    confirm_button: Button,
    processing: Cell<bool>,
    on_changed: ChangedCallback,
    /// Keeps the dialog alive while its window is open.
    keep_alive: KeepAlive<ConfirmDialog>,
}

impl ConfirmDialog {
    /// Opens the dialog for every image currently tagged with `action`.
    ///
    /// The listed collection stays fixed while the dialog is open; untagged
    /// tiles remain so they can be tagged again. The grid starts at the image
    /// shown in the main window when that image is listed.
    pub fn present(
        parent: &ApplicationWindow,
        action: Tag,
        session: Rc<RefCell<TriageSession>>,
        config: &TriageConfig,
        loader: Rc<PreviewLoader>,
        on_changed: ChangedCallback,
    ) -> Rc<Self> {
        let items = session.borrow().pending(action);
        let focused = {
            let session = session.borrow();
            session
                .current_image()
                .and_then(|current| items.iter().position(|path| path == current))
        };
        tracing::debug!(%action, items = items.len(), "Opening confirmation dialog");

        let window = Window::builder()
            .title(format!("Confirm {}", action.verb()))
            .transient_for(parent)
            .modal(true)
            .default_width(560)
            .build();

        let content = GtkBox::new(Orientation::Vertical, 12);
        content.set_margin_top(DIALOG_MARGIN);
        content.set_margin_bottom(DIALOG_MARGIN);
        content.set_margin_start(DIALOG_MARGIN);
        content.set_margin_end(DIALOG_MARGIN);

        let title = Label::new(Some(&format!("Confirm {}", action.verb())));
        title.add_css_class("dialog-title");
        title.set_halign(Align::Start);

        let count_label = Label::new(Some(&selected_label(items.len())));
        count_label.add_css_class("muted");
        count_label.set_halign(Align::Start);

        let session_weak = Rc::downgrade(&session);
        let grid = VirtualGrid::new(&config.grid, items, loader, move |path: &Path| {
            session_weak
                .upgrade()
                .and_then(|session| session.borrow().tag_of(path))
                .filter(|tag| *tag == action)
        });

        let buttons = GtkBox::new(Orientation::Horizontal, 8);
        buttons.set_halign(Align::End);
        let cancel_button = Button::with_label("Cancel");
        let confirm_button = Button::with_label(action.verb());
        confirm_button.add_css_class(match action {
            Tag::Copy => "suggested-action",
            Tag::Delete => "destructive-action",
        });
        buttons.append(&cancel_button);
        buttons.append(&confirm_button);

        content.append(&title);
        content.append(&count_label);
        content.append(grid.widget());
        content.append(&buttons);
        window.set_child(Some(&content));

        let dialog = Rc::new_cyclic(|self_weak| Self {
            self_weak: self_weak.clone(),
            parent: parent.clone(),
            window,
            action,
            session,
            grid,
            count_label,
            cancel_button,
            confirm_button,
            processing: Cell::new(false),
            on_changed,
            keep_alive: KeepAlive::new(),
        });
        dialog.keep_alive.hold(dialog.clone());
        dialog.connect_signals();
        dialog.update_count();
        dialog.window.present();
        if let Some(index) = focused {
            dialog.grid.scroll_to_index(index);
        }
        dialog
    }

    fn connect_signals(&self) {
        let weak = self.self_weak.clone();
        self.grid.connect_toggle(move |path| {
            if let Some(dialog) = weak.upgrade() {
                dialog.toggle(path);
            }
        });

        let weak = self.self_weak.clone();
        self.cancel_button.connect_clicked(move |_| {
            if let Some(dialog) = weak.upgrade() {
                dialog.window.close();
            }
        });

        let weak = self.self_weak.clone();
        self.confirm_button.connect_clicked(move |_| {
            if let Some(dialog) = weak.upgrade() {
                dialog.confirm();
            }
        });

        let weak = self.self_weak.clone();
        self.window.connect_close_request(move |_| {
            let Some(dialog) = weak.upgrade() else {
                return glib::Propagation::Proceed;
            };
            if dialog.processing.get() {
                return glib::Propagation::Stop;
            }
            dialog.grid.detach();
            // The dialog is freed once this handler returns.
            dialog.keep_alive.release();
            tracing::debug!(action = %dialog.action, "Confirmation dialog closed");
            glib::Propagation::Proceed
        });
    }

    fn toggle(&self, path: &Path) {
        if self.processing.get() {
            return;
        }
        self.session.borrow_mut().toggle(path, self.action);
        self.grid.refresh_tags();
        self.update_count();
        (self.on_changed)();
    }

    fn update_count(&self) {
        let count = self.session.borrow().count(self.action);
        self.count_label.set_text(&selected_label(count));
        self.confirm_button.set_sensitive(count > 0);
    }

    fn set_busy(&self, busy: bool) {
        self.processing.set(busy);
        self.cancel_button.set_sensitive(!busy);
        self.confirm_button.set_sensitive(!busy);
        if busy {
            self.confirm_button.set_label("Processing...");
        } else {
            self.confirm_button.set_label(self.action.verb());
            self.update_count();
        }
    }

    fn confirm(&self) {
        match self.action {
            Tag::Delete => self.run_batch(None),
            Tag::Copy => self.choose_destination(),
        }
    }

    fn choose_destination(&self) {
        let file_dialog = FileDialog::builder()
            .title("Choose Destination Folder")
            .modal(true)
            .build();
        if let Some(dir) = TriageConfig::default_start_dir() {
            file_dialog.set_initial_folder(Some(&gio::File::for_path(dir)));
        }

        // Buttons stay disabled while the picker is open.
        self.cancel_button.set_sensitive(false);
        self.confirm_button.set_sensitive(false);

        let weak = self.self_weak.clone();
        file_dialog.select_folder(
            Some(&self.window),
            gio::Cancellable::NONE,
            move |result| {
                let Some(dialog) = weak.upgrade() else {
                    return;
                };
                match result.ok().and_then(|folder| folder.path()) {
                    Some(destination) => dialog.run_batch(Some(destination)),
                    None => {
                        tracing::debug!("Destination prompt cancelled");
                        dialog.set_busy(false);
                    }
                }
            },
        );
    }

    fn run_batch(&self, destination: Option<PathBuf>) {
        let paths = self.session.borrow().pending(self.action);
        if paths.is_empty() {
            self.set_busy(false);
            return;
        }
        self.set_busy(true);

        let action = self.action;
        let (tx, rx) = async_channel::bounded::<Option<BatchReport>>(1);
        let spawned = std::thread::Builder::new()
            .name(format!("batch-{action}"))
            .spawn(move || {
                let report = fileops::execute(action, &paths, destination.as_deref());
                let _ = tx.send_blocking(report);
            });
        if let Err(err) = spawned {
            tracing::error!(error = %err, "Failed to start batch worker");
            self.set_busy(false);
            return;
        }

        let weak = self.self_weak.clone();
        glib::spawn_future_local(async move {
            let report = rx.recv().await.ok().flatten();
            let Some(dialog) = weak.upgrade() else {
                return;
            };
            match report {
                Some(report) => dialog.finish(&report),
                None => {
                    tracing::error!("Batch worker ended without a report");
                    dialog.set_busy(false);
                }
            }
        });
    }

    fn finish(&self, report: &BatchReport) {
        self.session.borrow_mut().apply_batch(report);
        (self.on_changed)();

        let mut alert = AlertDialog::builder()
            .message(report.summary())
            .modal(true);
        if let Some(detail) = failure_detail(report) {
            alert = alert.detail(detail);
        }
        alert.build().show(Some(&self.parent));

        self.processing.set(false);
        self.window.close();
    }
}
