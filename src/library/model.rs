use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Attribution written into the popularity frame when nothing else set the rating.
pub const DEFAULT_RATING_TAG: &str = "shellac";

/// Container families the player knows how to decode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FileKind {
    Mp3,
    Flac,
    Ogg,
    Wav,
}

impl FileKind {
    /// Extension used as a decoder hint.
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Mp3 => "mp3",
            FileKind::Flac => "flac",
            FileKind::Ogg => "ogg",
            FileKind::Wav => "wav",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            FileKind::Mp3 => "audio/mpeg",
            FileKind::Flac => "audio/flac",
            FileKind::Ogg => "audio/ogg",
            FileKind::Wav => "audio/wav",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileKind::Mp3 => "MP3",
            FileKind::Flac => "FLAC",
            FileKind::Ogg => "OGG",
            FileKind::Wav => "WAV",
        };
        f.write_str(s)
    }
}

/// One audio file and the metadata its codec could read.
///
/// `path` is the identity of a track within a shelf; everything else is
/// optional and may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub composer: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u32>,
    pub comment: Option<String>,
    pub lyrics: Option<String>,
    pub disc_number: Option<u32>,
    pub disc_total: Option<u32>,
    pub track_number: Option<u32>,
    pub track_total: Option<u32>,
    pub file_type: Option<FileKind>,
    pub mime_type: Option<String>,
    pub length: Option<Duration>,
    pub rating: u8,
    pub rating_tag: String,
    pub play_count: u64,
}

impl Track {
    /// A track with nothing but its path filled in.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            title: String::new(),
            artist: None,
            album: None,
            album_artist: None,
            composer: None,
            genre: None,
            year: None,
            comment: None,
            lyrics: None,
            disc_number: None,
            disc_total: None,
            track_number: None,
            track_total: None,
            file_type: None,
            mime_type: None,
            length: None,
            rating: 0,
            rating_tag: DEFAULT_RATING_TAG.to_string(),
            play_count: 0,
        }
    }

    /// File stem, used wherever a title is missing.
    pub fn file_stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
    }

    /// Title, falling back to the file stem.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            self.file_stem()
        } else {
            self.title.trim()
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
