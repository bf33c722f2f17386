// Keybindings for the triage window
//
// Keybindings:
// - Left / Right: Previous / next image
// - c / C: Toggle the copy tag on the current image
// - d / D: Toggle the delete tag on the current image
// - o / O: Open a folder
//
// Keys with Ctrl, Alt or Super held are left to the toolkit.

use gdk4::{Key, ModifierType};
use gtk4::prelude::*;
use gtk4::{glib, EventControllerKey, PropagationPhase, Widget};
use std::cell::RefCell;
use std::rc::Rc;

use imgtriage::models::Tag;

/// Navigation direction between images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Action bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Navigate(Direction),
    ToggleTag(Tag),
    OpenFolder,
}

/// Maps a key press to its shortcut, if any.
pub fn shortcut_for(keyval: Key, state: ModifierType) -> Option<Shortcut> {
    let blocking =
        ModifierType::CONTROL_MASK | ModifierType::ALT_MASK | ModifierType::SUPER_MASK;
    if state.intersects(blocking) {
        return None;
    }

    match keyval {
        Key::Left => Some(Shortcut::Navigate(Direction::Previous)),
        Key::Right => Some(Shortcut::Navigate(Direction::Next)),
        Key::c | Key::C => Some(Shortcut::ToggleTag(Tag::Copy)),
        Key::d | Key::D => Some(Shortcut::ToggleTag(Tag::Delete)),
        Key::o | Key::O => Some(Shortcut::OpenFolder),
        _ => None,
    }
}

/// Callback type for image navigation
pub type NavigateCallback = Box<dyn Fn(Direction)>;
/// Callback type for toggling a tag on the current image
pub type ToggleTagCallback = Box<dyn Fn(Tag)>;
/// Callback type for the open folder prompt
pub type OpenFolderCallback = Box<dyn Fn()>;

#[derive(Default)]
struct Callbacks {
    navigate: RefCell<Option<NavigateCallback>>,
    toggle_tag: RefCell<Option<ToggleTagCallback>>,
    open_folder: RefCell<Option<OpenFolderCallback>>,
}

impl Callbacks {
    fn dispatch(&self, shortcut: Shortcut) -> bool {
        match shortcut {
            Shortcut::Navigate(direction) => match *self.navigate.borrow() {
                Some(ref callback) => {
                    callback(direction);
                    true
                }
                None => false,
            },
            Shortcut::ToggleTag(tag) => match *self.toggle_tag.borrow() {
                Some(ref callback) => {
                    callback(tag);
                    true
                }
                None => false,
            },
            Shortcut::OpenFolder => match *self.open_folder.borrow() {
                Some(ref callback) => {
                    callback();
                    true
                }
                None => false,
            },
        }
    }
}

/// Keybinding manager for the main window
pub struct Keybindings {
    controller: EventControllerKey,
    callbacks: Rc<Callbacks>,
}

impl Keybindings {
    pub fn new() -> Self {
        let controller = EventControllerKey::new();
        controller.set_propagation_phase(PropagationPhase::Capture);

        let callbacks = Rc::new(Callbacks::default());

        let callbacks_clone = callbacks.clone();
        controller.connect_key_pressed(move |_controller, keyval, _keycode, state| {
            let handled = shortcut_for(keyval, state)
                .map(|shortcut| {
                    tracing::trace!(?shortcut, "Shortcut");
                    callbacks_clone.dispatch(shortcut)
                })
                .unwrap_or(false);

            if handled {
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });

        Self {
            controller,
            callbacks,
        }
    }

    /// Attach keybindings to a widget (typically the main window)
    pub fn attach(&self, widget: &impl IsA<Widget>) {
        widget.add_controller(self.controller.clone());
    }

    pub fn connect_navigate<F>(&self, callback: F)
    where
        F: Fn(Direction) + 'static,
    {
        *self.callbacks.navigate.borrow_mut() = Some(Box::new(callback));
    }

    pub fn connect_toggle_tag<F>(&self, callback: F)
    where
        F: Fn(Tag) + 'static,
    {
        *self.callbacks.toggle_tag.borrow_mut() = Some(Box::new(callback));
    }

    pub fn connect_open_folder<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        *self.callbacks.open_folder.borrow_mut() = Some(Box::new(callback));
    }
}

impl Default for Keybindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_arrow_keys_navigate() {
        assert_eq!(
            shortcut_for(Key::Left, ModifierType::empty()),
            Some(Shortcut::Navigate(Direction::Previous))
        );
        assert_eq!(
            shortcut_for(Key::Right, ModifierType::empty()),
            Some(Shortcut::Navigate(Direction::Next))
        );
        assert_eq!(shortcut_for(Key::Up, ModifierType::empty()), None);
    }

    #[test]
    fn test_tag_keys_ignore_case() {
        for key in [Key::c, Key::C] {
            assert_eq!(
                shortcut_for(key, ModifierType::SHIFT_MASK),
                Some(Shortcut::ToggleTag(Tag::Copy))
            );
        }
        for key in [Key::d, Key::D] {
            assert_eq!(
                shortcut_for(key, ModifierType::empty()),
                Some(Shortcut::ToggleTag(Tag::Delete))
            );
        }
        assert_eq!(
            shortcut_for(Key::o, ModifierType::empty()),
            Some(Shortcut::OpenFolder)
        );
    }

    #[test]
    fn test_modifiers_block_shortcuts() {
        // Ctrl+C stays a copy-to-clipboard, not a tag toggle.
        assert_eq!(shortcut_for(Key::c, ModifierType::CONTROL_MASK), None);
        assert_eq!(shortcut_for(Key::Right, ModifierType::ALT_MASK), None);
    }

    #[test]
    fn test_dispatch_without_callback_is_unhandled() {
        let callbacks = Callbacks::default();
        assert!(!callbacks.dispatch(Shortcut::OpenFolder));

        let seen = Rc::new(Cell::new(None));
        let seen_clone = seen.clone();
        *callbacks.toggle_tag.borrow_mut() = Some(Box::new(move |tag| seen_clone.set(Some(tag))));
        assert!(callbacks.dispatch(Shortcut::ToggleTag(Tag::Delete)));
        assert_eq!(seen.get(), Some(Tag::Delete));
    }
}
