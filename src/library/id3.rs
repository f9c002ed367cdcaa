//! Read/write handler for MP3 files.
//!
//! Besides the usual text frames this keeps the ID3v2 popularimeter
//! (`POPM`) frame in sync with [`Track::rating`], [`Track::rating_tag`] and
//! [`Track::play_count`].

use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

use lofty::config::{ParseOptions, WriteOptions};
use lofty::id3::v2::{Frame, FrameId, Id3v2Tag, PopularimeterFrame};
use lofty::mpeg::MpegFile;
use lofty::prelude::{Accessor, AudioFile, TagExt};
use lofty::tag::Tag;
use tracing::debug;

use super::codec::Codec;
use super::error::LibraryError;
use super::model::{FileKind, Track};
use super::tags::fill_from_tag;

const POPM: &str = "POPM";

fn popm_id() -> FrameId<'static> {
    FrameId::Valid(Cow::Borrowed(POPM))
}

pub struct Id3Codec {
    /// Attribution used when a file has no popularity frame yet.
    default_rating_tag: String,
}

impl Id3Codec {
    pub fn new(default_rating_tag: &str) -> Self {
        Self {
            default_rating_tag: default_rating_tag.to_string(),
        }
    }

    fn read(path: &Path) -> Result<MpegFile, LibraryError> {
        let mut file = File::open(path).map_err(|e| LibraryError::io(path, e))?;
        MpegFile::read_from(&mut file, ParseOptions::new()).map_err(|e| LibraryError::tag(path, e))
    }
}

/// `(email, rating, counter)` of the popularity frame, if any.
fn popularity(tag: &Id3v2Tag) -> Option<(String, u8, u64)> {
    match tag.get(&popm_id()) {
        Some(Frame::Popularimeter(popm)) => {
            Some((popm.email.to_string(), popm.rating, popm.counter))
        }
        _ => None,
    }
}

impl Codec for Id3Codec {
    fn load(&self, path: &Path) -> Result<Track, LibraryError> {
        let mpeg = Self::read(path)?;

        let mut track = Track::new(path);
        track.file_type = Some(FileKind::Mp3);
        track.mime_type = Some(FileKind::Mp3.mime_type().to_string());
        track.length = Some(mpeg.properties().duration()).filter(|d| !d.is_zero());
        track.rating_tag = self.default_rating_tag.clone();

        if let Some(id3) = mpeg.id3v2() {
            fill_from_tag(&Tag::from(id3.clone()), &mut track);

            if let Some((email, rating, counter)) = popularity(id3) {
                track.rating = rating;
                track.rating_tag = email;
                track.play_count = counter;
            }
        }

        Ok(track)
    }

    fn save(&self, track: &Track) -> Result<Track, LibraryError> {
        debug!(
            path = %track.path.display(),
            title = %track.title,
            rating = track.rating,
            "saving track"
        );

        let mpeg = Self::read(&track.path)?;
        let mut tag = mpeg.id3v2().cloned().unwrap_or_default();

        if let Some((prev_email, prev_rating, _)) = popularity(&tag) {
            debug!(
                path = %track.path.display(),
                prev_rating,
                prev_email = %prev_email,
                "popularity frame already set"
            );
        }

        tag.set_title(track.title.clone());
        match track.album.as_deref() {
            Some(album) => tag.set_album(album.to_string()),
            None => tag.remove_album(),
        }
        match track.artist.as_deref() {
            Some(artist) => tag.set_artist(artist.to_string()),
            None => tag.remove_artist(),
        }

        let email = if track.rating_tag.is_empty() {
            self.default_rating_tag.clone()
        } else {
            track.rating_tag.clone()
        };
        debug!(
            path = %track.path.display(),
            rating = track.rating,
            email = %email,
            "setting popularity frame"
        );

        // Only one popularity frame is kept so loading sees the one just written.
        tag.retain(|frame| !matches!(frame, Frame::Popularimeter(_)));
        tag.insert(Frame::Popularimeter(PopularimeterFrame::new(
            email.clone().into(),
            track.rating,
            track.play_count,
        )));

        tag.save_to_path(&track.path, WriteOptions::default())
            .map_err(|e| LibraryError::tag(&track.path, e))?;

        let mut saved = track.clone();
        saved.rating_tag = email;
        Ok(saved)
    }

    fn writable(&self) -> bool {
        true
    }
}
