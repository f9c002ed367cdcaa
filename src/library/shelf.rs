use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::codec::{CodecRegistry, normalize_extension};
use super::error::LibraryError;
use super::model::Track;

/// A collection of tracks from one source.
///
/// The track list is a snapshot of the last [`Shelf::load_tracks`]; saving
/// or deleting a track does not touch it, callers keep their own copy in sync.
pub trait Shelf {
    fn tracks(&self) -> &[Track];

    /// Fill the shelf, returning how many tracks were loaded.
    fn load_tracks(&mut self) -> Result<usize, LibraryError>;

    fn load_track(&self, path: &Path) -> Result<Track, LibraryError>;

    fn save_track(&self, previous: &Track, track: &Track) -> Result<Track, LibraryError>;

    fn delete_track(&self, track: &Track) -> Result<(), LibraryError>;

    /// Whether edits to `track` are written back to the file.
    fn can_save(&self, track: &Track) -> bool;
}

/// Tracks stored under one directory of the local filesystem.
pub struct LocalShelf {
    root: PathBuf,
    settings: LibrarySettings,
    codecs: CodecRegistry,
    tracks: Vec<Track>,
}

impl LocalShelf {
    pub fn new(root: impl Into<PathBuf>, settings: LibrarySettings, codecs: CodecRegistry) -> Self {
        Self {
            root: root.into(),
            settings,
            codecs,
            tracks: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` looks like audio according to the configured extensions.
    pub fn should_include(&self, path: &Path) -> bool {
        is_audio_file(path, &self.settings)
    }

    /// Every file under the root that passes the extension filter.
    fn scan_paths(&self) -> Vec<PathBuf> {
        let settings = &self.settings;
        let mut walker = WalkDir::new(&self.root)
            .follow_links(settings.follow_links)
            .sort_by_file_name();

        // Non-recursive = only the root directory.
        let depth_cap = if settings.recursive {
            settings.max_depth
        } else {
            Some(1)
        };
        if let Some(d) = depth_cap {
            walker = walker.max_depth(d);
        }

        let mut paths = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "could not walk path");
                    continue;
                }
            };
            let path = entry.path();
            trace!(path = %path.display(), "walking path");

            if !entry.file_type().is_file() && !path.is_file() {
                continue;
            }
            if !self.should_include(path) {
                debug!(path = %path.display(), "discarding path");
                continue;
            }
            paths.push(path.to_path_buf());
        }
        paths
    }
}

impl Shelf for LocalShelf {
    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn load_tracks(&mut self) -> Result<usize, LibraryError> {
        if !self.root.exists() {
            return Err(LibraryError::MissingRoot(self.root.clone()));
        }

        let paths = self.scan_paths();
        debug!(count = paths.len(), "paths scanned");

        let mut tracks = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load_track(&path) {
                Ok(track) => tracks.push(track),
                Err(err) => warn!(path = %path.display(), error = %err, "could not load track"),
            }
        }

        self.tracks = tracks;
        info!(count = self.tracks.len(), root = %self.root.display(), "loaded library");
        Ok(self.tracks.len())
    }

    fn load_track(&self, path: &Path) -> Result<Track, LibraryError> {
        self.codecs.resolve(path)?.load(path)
    }

    fn save_track(&self, previous: &Track, track: &Track) -> Result<Track, LibraryError> {
        if previous.rating != track.rating {
            debug!(
                path = %track.path.display(),
                from = previous.rating,
                to = track.rating,
                "rating changed"
            );
        }
        self.codecs.resolve(&track.path)?.save(track)
    }

    fn delete_track(&self, track: &Track) -> Result<(), LibraryError> {
        if track.path.as_os_str().is_empty() {
            return Err(LibraryError::NoPath);
        }
        fs::remove_file(&track.path).map_err(|e| LibraryError::io(&track.path, e))?;
        info!(path = %track.path.display(), "deleted track");
        Ok(())
    }

    fn can_save(&self, track: &Track) -> bool {
        self.codecs
            .resolve(&track.path)
            .map(|codec| codec.writable())
            .unwrap_or(false)
    }
}

/// Case-insensitive extension match against `settings.extensions`.
pub fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = normalize_extension(ext);
    settings
        .extensions
        .iter()
        .map(|e| normalize_extension(e))
        .any(|e| !e.is_empty() && e == ext)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::codec::default_registry;
    use std::fs;
    use tempfile::tempdir;

    fn shelf(root: &Path, settings: LibrarySettings) -> LocalShelf {
        LocalShelf::new(root, settings, default_registry("shellac"))
    }

    fn names(shelf: &LocalShelf) -> Vec<String> {
        shelf
            .tracks()
            .iter()
            .map(|t| t.file_stem().to_string())
            .collect()
    }

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_audio_file(Path::new("song.mp3"), &settings));
        assert!(is_audio_file(Path::new("SONG.FLAC"), &settings));
        assert!(is_audio_file(Path::new("track.wav"), &settings));
        assert!(is_audio_file(Path::new("track.ogg"), &settings));
        assert!(is_audio_file(Path::new("my-dir/99-11-glimmer.MP3"), &settings));
        assert!(!is_audio_file(Path::new("cover.jpg"), &settings));
        assert!(!is_audio_file(Path::new("my-dir/"), &settings));
        assert!(!is_audio_file(Path::new("my-dir"), &settings));
        assert!(!is_audio_file(Path::new("."), &settings));
        assert!(!is_audio_file(Path::new(".."), &settings));
    }

    #[test]
    fn load_tracks_counts_only_loadable_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.wav"), b"RIFF").unwrap();
        fs::write(dir.path().join("b.WAV"), b"RIFF").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("c.wav"), b"RIFF").unwrap();
        fs::write(dir.path().join("cover.jpg"), b"jpeg").unwrap();
        // Passes the filter but has no codec: logged and skipped.
        fs::write(dir.path().join("clip.aac"), b"aac").unwrap();

        let settings = LibrarySettings {
            extensions: vec!["wav".into(), "aac".into()],
            ..LibrarySettings::default()
        };
        let mut shelf = shelf(dir.path(), settings);

        assert_eq!(shelf.load_tracks().unwrap(), 3);
        assert_eq!(names(&shelf), vec!["a", "b", "c"]);
        assert!(shelf.tracks().iter().all(|t| !t.path.as_os_str().is_empty()));
    }

    #[test]
    fn unparseable_files_are_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.wav"), b"RIFF").unwrap();
        fs::write(dir.path().join("bad.flac"), b"not flac at all").unwrap();

        let mut shelf = shelf(dir.path(), LibrarySettings::default());
        assert_eq!(shelf.load_tracks().unwrap(), 1);
        assert_eq!(names(&shelf), vec!["good"]);
    }

    #[test]
    fn load_track_on_unsupported_path_is_an_error() {
        let dir = tempdir().unwrap();
        let shelf = shelf(dir.path(), LibrarySettings::default());
        assert!(matches!(
            shelf.load_track(&dir.path().join("notes.txt")),
            Err(LibraryError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let mut shelf = shelf(&dir.path().join("nope"), LibrarySettings::default());
        assert!(matches!(
            shelf.load_tracks(),
            Err(LibraryError::MissingRoot(_))
        ));
    }

    #[test]
    fn single_file_root_loads_that_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("only.wav");
        fs::write(&file, b"RIFF").unwrap();

        let mut shelf = shelf(&file, LibrarySettings::default());
        assert_eq!(shelf.load_tracks().unwrap(), 1);
    }

    #[test]
    fn scan_respects_include_hidden_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.wav"), b"RIFF").unwrap();
        fs::write(dir.path().join("visible.wav"), b"RIFF").unwrap();

        let settings = LibrarySettings {
            include_hidden: false,
            ..LibrarySettings::default()
        };
        let mut shelf = shelf(dir.path(), settings);
        shelf.load_tracks().unwrap();
        assert_eq!(names(&shelf), vec!["visible"]);
    }

    #[test]
    fn scan_respects_recursive_false_and_max_depth() {
        let dir = tempdir().unwrap();
        let d1 = dir.path().join("d1");
        let d2 = d1.join("d2");
        fs::create_dir_all(&d2).unwrap();
        fs::write(dir.path().join("root.wav"), b"RIFF").unwrap();
        fs::write(d1.join("one.wav"), b"RIFF").unwrap();
        fs::write(d2.join("two.wav"), b"RIFF").unwrap();

        let flat = LibrarySettings {
            recursive: false,
            ..LibrarySettings::default()
        };
        let mut s = shelf(dir.path(), flat);
        s.load_tracks().unwrap();
        assert_eq!(names(&s), vec!["root"]);

        // WalkDir depth counts root as 0, children as 1, grandchildren as 2.
        let capped = LibrarySettings {
            max_depth: Some(2),
            ..LibrarySettings::default()
        };
        let mut s = shelf(dir.path(), capped);
        s.load_tracks().unwrap();
        let got = names(&s);
        assert!(got.contains(&"root".to_string()));
        assert!(got.contains(&"one".to_string()));
        assert!(!got.contains(&"two".to_string()));
    }

    #[test]
    fn delete_requires_a_path() {
        let dir = tempdir().unwrap();
        let shelf = shelf(dir.path(), LibrarySettings::default());
        assert!(matches!(
            shelf.delete_track(&Track::new("")),
            Err(LibraryError::NoPath)
        ));
    }

    #[test]
    fn delete_removes_the_file_and_reports_io_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bye.wav");
        fs::write(&path, b"RIFF").unwrap();
        let shelf = shelf(dir.path(), LibrarySettings::default());

        let track = shelf.load_track(&path).unwrap();
        shelf.delete_track(&track).unwrap();
        assert!(!path.exists());

        // Second delete races with nothing: the file is already gone.
        assert!(matches!(
            shelf.delete_track(&track),
            Err(LibraryError::Io { .. })
        ));
    }

    #[test]
    fn read_only_formats_report_they_cannot_save() {
        let dir = tempdir().unwrap();
        let shelf = shelf(dir.path(), LibrarySettings::default());
        assert!(shelf.can_save(&Track::new("x.mp3")));
        assert!(!shelf.can_save(&Track::new("x.flac")));
        assert!(!shelf.can_save(&Track::new("x.wav")));
    }
}
