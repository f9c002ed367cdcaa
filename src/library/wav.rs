use std::path::Path;

use super::codec::Codec;
use super::error::LibraryError;
use super::model::{FileKind, Track};

/// WAV files carry no tags we read; the title comes from the file name.
pub struct WavCodec;

impl Codec for WavCodec {
    fn load(&self, path: &Path) -> Result<Track, LibraryError> {
        let mut track = Track::new(path);
        track.title = track.file_stem().to_string();
        track.file_type = Some(FileKind::Wav);
        track.mime_type = Some(FileKind::Wav.mime_type().to_string());
        Ok(track)
    }

    fn save(&self, track: &Track) -> Result<Track, LibraryError> {
        Ok(track.clone())
    }
}
