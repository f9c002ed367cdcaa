//! In-memory shelf used by tests that do not care about files.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use super::error::LibraryError;
use super::model::{FileKind, Track};
use super::shelf::Shelf;

#[derive(Default)]
pub struct MemoryShelf {
    tracks: Vec<Track>,
    pub saved: RefCell<Vec<Track>>,
    pub deleted: RefCell<Vec<PathBuf>>,
    pub fail_writes: bool,
    pub read_only: bool,
}

impl MemoryShelf {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            ..Self::default()
        }
    }

    /// One WAV track per title under `dir`, with the files created empty.
    pub fn with_files(dir: &Path, titles: &[&str]) -> Self {
        let tracks = titles
            .iter()
            .map(|title| {
                let path = dir.join(format!("{title}.wav"));
                std::fs::write(&path, b"RIFF").unwrap();
                let mut t = Track::new(path);
                t.title = title.to_string();
                t.file_type = Some(FileKind::Wav);
                t
            })
            .collect();
        Self::new(tracks)
    }
}

impl Shelf for MemoryShelf {
    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn load_tracks(&mut self) -> Result<usize, LibraryError> {
        Ok(self.tracks.len())
    }

    fn load_track(&self, path: &Path) -> Result<Track, LibraryError> {
        self.tracks
            .iter()
            .find(|t| t.path == path)
            .cloned()
            .ok_or_else(|| {
                LibraryError::io(path, std::io::Error::from(std::io::ErrorKind::NotFound))
            })
    }

    fn save_track(&self, _previous: &Track, track: &Track) -> Result<Track, LibraryError> {
        if self.fail_writes {
            return Err(LibraryError::io(
                &track.path,
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ));
        }
        self.saved.borrow_mut().push(track.clone());
        Ok(track.clone())
    }

    fn delete_track(&self, track: &Track) -> Result<(), LibraryError> {
        if track.path.as_os_str().is_empty() {
            return Err(LibraryError::NoPath);
        }
        if self.fail_writes {
            return Err(LibraryError::io(
                &track.path,
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ));
        }
        self.deleted.borrow_mut().push(track.path.clone());
        Ok(())
    }

    fn can_save(&self, _track: &Track) -> bool {
        !self.read_only
    }
}
