use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use super::Tag;

/// Result of toggling a tag on one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The image had no tag and now has the requested one.
    Tagged,
    /// The image had the other tag, which was replaced.
    Retagged { previous: Tag },
    /// The image already had the requested tag, which was removed.
    Untagged,
}

impl ToggleOutcome {
    /// True when the toggle left the requested tag set.
    pub fn is_selected(self) -> bool {
        !matches!(self, Self::Untagged)
    }
}

/// Per-image tags, in the order they were first set.
///
/// Serializes as a flat JSON object `{ "<path>": "copy" | "delete" }`.
/// Paths that are not valid UTF-8 cannot be JSON keys and are left out.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Selections {
    tags: IndexMap<PathBuf, Tag>,
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Tag> {
        self.tags.get(path).copied()
    }

    /// Sets `tag` on `path`, or clears it when `path` already carries `tag`.
    ///
    /// Switching between tags needs no intermediate unset; the entry keeps its
    /// original position.
    pub fn toggle(&mut self, path: &Path, tag: Tag) -> ToggleOutcome {
        match self.get(path) {
            Some(current) if current == tag => {
                self.tags.shift_remove(path);
                ToggleOutcome::Untagged
            }
            Some(previous) => {
                // Overwriting an existing key keeps its index.
                self.tags.insert(path.to_path_buf(), tag);
                ToggleOutcome::Retagged { previous }
            }
            None => {
                self.tags.insert(path.to_path_buf(), tag);
                ToggleOutcome::Tagged
            }
        }
    }

    /// Removes every listed path, returning how many entries were dropped.
    pub fn remove_all<'a, I>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = &'a Path>,
    {
        paths
            .into_iter()
            .filter(|path| self.tags.shift_remove(*path).is_some())
            .count()
    }

    /// Paths carrying `tag`, in insertion order.
    pub fn paths_with(&self, tag: Tag) -> Vec<PathBuf> {
        self.tags
            .iter()
            .filter(|(_, t)| **t == tag)
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn count(&self, tag: Tag) -> usize {
        self.tags.values().filter(|t| **t == tag).count()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Serialize for Selections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (path, tag) in &self.tags {
            match path.to_str() {
                Some(key) => map.serialize_entry(key, tag)?,
                None => warn!(?path, "Not persisting tag of a path that is not UTF-8"),
            }
        }
        map.end()
    }
}

impl FromIterator<(PathBuf, Tag)> for Selections {
    fn from_iter<I: IntoIterator<Item = (PathBuf, Tag)>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_sets_then_clears() {
        let mut selections = Selections::new();
        let path = Path::new("/pics/a.jpg");

        assert_eq!(selections.toggle(path, Tag::Copy), ToggleOutcome::Tagged);
        assert_eq!(selections.get(path), Some(Tag::Copy));

        assert_eq!(selections.toggle(path, Tag::Copy), ToggleOutcome::Untagged);
        assert_eq!(selections.get(path), None);
        assert!(selections.is_empty());
    }

    #[test]
    fn test_toggle_other_tag_replaces() {
        let mut selections = Selections::new();
        let path = Path::new("/pics/a.jpg");

        selections.toggle(path, Tag::Copy);
        let outcome = selections.toggle(path, Tag::Delete);

        assert_eq!(
            outcome,
            ToggleOutcome::Retagged {
                previous: Tag::Copy
            }
        );
        assert!(outcome.is_selected());
        assert_eq!(selections.get(path), Some(Tag::Delete));
        assert_eq!(selections.len(), 1);
    }

    #[test]
    fn test_paths_with_keeps_insertion_order() {
        let mut selections = Selections::new();
        selections.toggle(Path::new("c.jpg"), Tag::Copy);
        selections.toggle(Path::new("a.jpg"), Tag::Delete);
        selections.toggle(Path::new("b.jpg"), Tag::Copy);
        // Retagging keeps the original slot.
        selections.toggle(Path::new("c.jpg"), Tag::Delete);
        selections.toggle(Path::new("c.jpg"), Tag::Copy);

        assert_eq!(
            selections.paths_with(Tag::Copy),
            vec![PathBuf::from("c.jpg"), PathBuf::from("b.jpg")]
        );
        assert_eq!(selections.count(Tag::Delete), 1);
    }

    #[test]
    fn test_remove_all_counts_only_present_paths() {
        let mut selections: Selections = [
            (PathBuf::from("a.jpg"), Tag::Copy),
            (PathBuf::from("b.jpg"), Tag::Copy),
        ]
        .into_iter()
        .collect();

        let removed = selections.remove_all([Path::new("a.jpg"), Path::new("zzz.jpg")]);
        assert_eq!(removed, 1);
        assert_eq!(selections.paths_with(Tag::Copy), vec![PathBuf::from("b.jpg")]);
    }

    #[test]
    fn test_json_shape_is_flat_object() {
        let mut selections = Selections::new();
        selections.toggle(Path::new("/p/a.jpg"), Tag::Copy);
        selections.toggle(Path::new("/p/b.png"), Tag::Delete);

        let json = serde_json::to_string(&selections).unwrap();
        assert_eq!(json, r#"{"/p/a.jpg":"copy","/p/b.png":"delete"}"#);

        let back: Selections = serde_json::from_str(&json).unwrap();
        assert_eq!(back, selections);
    }

    #[cfg(unix)]
    #[test]
    fn test_json_skips_paths_that_are_not_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut selections = Selections::new();
        selections.toggle(Path::new("/p/a.jpg"), Tag::Copy);
        selections.toggle(Path::new(OsStr::from_bytes(b"/p/bad\xff.jpg")), Tag::Delete);
        selections.toggle(Path::new("/p/c.jpg"), Tag::Delete);

        let json = serde_json::to_string(&selections).unwrap();
        assert_eq!(json, r#"{"/p/a.jpg":"copy","/p/c.jpg":"delete"}"#);
        // The in-memory tag is untouched.
        assert_eq!(selections.len(), 3);
    }
}
