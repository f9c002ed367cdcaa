use std::path::PathBuf;

use serde::Deserialize;

use crate::library::DEFAULT_RATING_TAG;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/shellac/config.toml` or `~/.config/shellac/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SHELLAC__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub rating: RatingSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Loop every started track forever instead of advancing.
    pub repeat: bool,
    /// How often the progress monitor samples the playing track (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            repeat: false,
            poll_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    /// Attribution written into new popularity frames.
    pub attribution_tag: String,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            attribution_tag: DEFAULT_RATING_TAG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Columns of the track table, left to right.
    pub columns: Vec<TrackColumn>,

    /// Which track fields to show in the now-playing title line, and in what order.
    ///
    /// Example: ["artist", "title", "album"]
    pub now_playing_fields: Vec<TrackDisplayField>,

    /// Separator used to join `now_playing_fields`.
    pub now_playing_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ shellac ~ ".to_string(),
            columns: vec![
                TrackColumn::Artist,
                TrackColumn::Album,
                TrackColumn::Title,
                TrackColumn::Rating,
            ],
            now_playing_fields: vec![TrackDisplayField::Title],
            now_playing_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset, e.g. `"info"` or `"shellac=debug"`.
    pub level: String,
    /// Append log lines to this file as well.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackColumn {
    Artist,
    Album,
    Title,
    #[serde(alias = "score")]
    Rating,
    Genre,
    Year,
    #[serde(alias = "file")]
    Filename,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// "artist - title" when an artist is known.
    Display,
    Title,
    Artist,
    Album,
    Filename,
    Path,
}
