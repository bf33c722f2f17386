use serde::{Deserialize, Serialize};

/// What the user wants done with an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Copy,
    Delete,
}

impl Tag {
    pub const ALL: [Tag; 2] = [Tag::Copy, Tag::Delete];

    /// Lowercase name as stored in the sidecar file.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Delete => "delete",
        }
    }

    /// Title-case verb for buttons and dialog titles.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Copy => "Copy",
            Self::Delete => "Delete",
        }
    }

    /// Past tense for result summaries.
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Copy => "copied",
            Self::Delete => "deleted",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
