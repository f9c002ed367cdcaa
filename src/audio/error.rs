use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("could not open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no decoder for {}", .0.display())]
    UnsupportedFileType(PathBuf),

    #[error("could not decode stream: {0}")]
    Decode(String),

    #[error("audio output unavailable: {0}")]
    Device(String),

    #[error("seek failed: {0}")]
    Seek(String),

    #[error("nothing is loaded")]
    NoStream,
}
