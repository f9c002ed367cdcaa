//! Read-only tag reader for the compressed formats lofty understands.

use std::path::Path;

use lofty::file::FileType;
use lofty::prelude::{Accessor, AudioFile, ItemKey, TaggedFileExt};
use lofty::tag::Tag;
use tracing::debug;

use super::codec::Codec;
use super::error::LibraryError;
use super::model::{FileKind, Track};

/// Tag reader for FLAC and Ogg files. Saving is not supported for these
/// formats and silently keeps the file as it is.
pub struct TagCodec;

impl Codec for TagCodec {
    fn load(&self, path: &Path) -> Result<Track, LibraryError> {
        let tagged = lofty::read_from_path(path).map_err(|e| LibraryError::tag(path, e))?;

        let mut track = Track::new(path);
        track.file_type = file_kind(tagged.file_type());
        track.mime_type = track.file_type.map(|k| k.mime_type().to_string());
        track.length = Some(tagged.properties().duration()).filter(|d| !d.is_zero());

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            fill_from_tag(tag, &mut track);
        }

        Ok(track)
    }

    fn save(&self, track: &Track) -> Result<Track, LibraryError> {
        debug!(path = %track.path.display(), "format is read-only, not saving");
        Ok(track.clone())
    }
}

pub(super) fn file_kind(file_type: FileType) -> Option<FileKind> {
    match file_type {
        FileType::Mpeg => Some(FileKind::Mp3),
        FileType::Flac => Some(FileKind::Flac),
        FileType::Vorbis | FileType::Opus | FileType::Speex => Some(FileKind::Ogg),
        FileType::Wav => Some(FileKind::Wav),
        _ => None,
    }
}

fn non_empty(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Copy every descriptive field `tag` carries into `track`.
pub(super) fn fill_from_tag(tag: &Tag, track: &mut Track) {
    if let Some(v) = non_empty(tag.title().as_deref()) {
        track.title = v;
    }
    track.artist = non_empty(tag.artist().as_deref());
    track.album = non_empty(tag.album().as_deref());
    track.genre = non_empty(tag.genre().as_deref());
    track.comment = non_empty(tag.comment().as_deref());
    track.album_artist = non_empty(tag.get_string(&ItemKey::AlbumArtist));
    track.composer = non_empty(tag.get_string(&ItemKey::Composer));
    track.lyrics = non_empty(tag.get_string(&ItemKey::Lyrics));
    track.year = tag
        .get_string(&ItemKey::Year)
        .or_else(|| tag.get_string(&ItemKey::RecordingDate))
        .and_then(parse_year);
    track.track_number = tag.track();
    track.track_total = tag.track_total();
    track.disc_number = tag.disk();
    track.disc_total = tag.disk_total();
}

/// First run of up to four digits, e.g. `"2004-05-01"` -> 2004.
fn parse_year(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .take(4)
        .collect();
    digits.parse().ok()
}
