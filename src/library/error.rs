use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("track has no path")]
    NoPath,

    #[error("unsupported file extension [{ext}]: {}", .path.display())]
    UnsupportedExtension { ext: String, path: PathBuf },

    #[error("library root does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("could not access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read or write tags of {}: {source}", .path.display())]
    Tag {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn tag(path: impl Into<PathBuf>, source: lofty::error::LoftyError) -> Self {
        Self::Tag {
            path: path.into(),
            source,
        }
    }
}
