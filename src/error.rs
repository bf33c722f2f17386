use std::path::PathBuf;

/// Errors surfaced by the triage library.
///
/// Most collaborators recover locally (empty listings, empty selections); this
/// type is what they log before recovering, and what the sidecar writer and
/// per-file batch operations report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid selection data in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("path has no file name: {0:?}")]
    NoFileName(PathBuf),

    #[error("source and destination are the same file: {0:?}")]
    SameFile(PathBuf),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
