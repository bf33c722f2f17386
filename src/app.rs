use gtk4::prelude::*;
use gtk4::{gio, Application};
use std::path::Path;
use std::rc::Rc;

use imgtriage::config::TriageConfig;

use crate::ui::MainWindow;

const APP_ID: &str = "com.imgtriage.ImageTriage";
const WINDOW_KEY: &str = "main-window";

pub struct TriageApp {
    app: Application,
}

impl TriageApp {
    pub fn new() -> Self {
        let app = Application::builder()
            .application_id(APP_ID)
            .flags(gio::ApplicationFlags::HANDLES_OPEN)
            .build();

        app.connect_activate(|app| Self::show_window(app, None));
        app.connect_open(|app, files, _hint| {
            // Only the first folder is triaged; extra arguments are ignored.
            let folder = files.first().and_then(|f| f.path());
            if files.len() > 1 {
                tracing::info!(ignored = files.len() - 1, "Opening only the first folder");
            }
            Self::show_window(app, folder.as_deref());
        });

        Self { app }
    }

    pub fn run(&self) -> i32 {
        self.app.run().into()
    }

    /// Presents the single main window, creating it on first use.
    ///
    /// A second launch with a folder argument loads that folder into the
    /// existing window instead of opening another one.
    fn show_window(app: &Application, folder: Option<&Path>) {
        // SAFETY: the key is only ever stored with an `Rc<MainWindow>`.
        let existing = unsafe {
            app.data::<Rc<MainWindow>>(WINDOW_KEY)
                .map(|ptr| ptr.as_ref().clone())
        };

        if let Some(window) = existing {
            if let Some(folder) = folder {
                window.load_folder(folder);
            }
            window.present();
            return;
        }

        let window = MainWindow::new(app, TriageConfig::default(), folder);
        window.present();
        // Keep the window alive by storing it on the Application.
        unsafe {
            app.set_data(WINDOW_KEY, window);
        }
    }
}

impl Default for TriageApp {
    fn default() -> Self {
        Self::new()
    }
}
