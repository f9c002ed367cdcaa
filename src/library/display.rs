use crate::config::{TrackColumn, TrackDisplayField};

use super::model::Track;
use super::score::score;

fn trimmed(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// Build a display string for a track according to the provided `fields` and separator.
///
/// Fields without a value are skipped; falls back to the title (or file
/// stem) when nothing was produced.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let title = track.title.trim();

    for f in fields {
        match f {
            TrackDisplayField::Display => {
                if let Some(a) = trimmed(track.artist.as_deref()) {
                    parts.push(a.to_string());
                }
                parts.push(track.display_title().to_string());
            }
            TrackDisplayField::Title => {
                if !title.is_empty() {
                    parts.push(title.to_string());
                }
            }
            TrackDisplayField::Artist => {
                if let Some(a) = trimmed(track.artist.as_deref()) {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Album => {
                if let Some(a) = trimmed(track.album.as_deref()) {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Filename => parts.push(track.file_stem().to_string()),
            TrackDisplayField::Path => parts.push(track.path.display().to_string()),
        }
    }

    if parts.is_empty() {
        track.display_title().to_string()
    } else {
        parts.join(sep)
    }
}

pub fn column_title(column: TrackColumn) -> &'static str {
    match column {
        TrackColumn::Artist => "Artist",
        TrackColumn::Album => "Album",
        TrackColumn::Title => "Title",
        TrackColumn::Rating => "Rating",
        TrackColumn::Genre => "Genre",
        TrackColumn::Year => "Year",
        TrackColumn::Filename => "File",
    }
}

/// Cell text of `column` for `track`; missing values are empty.
pub fn column_text(track: &Track, column: TrackColumn) -> String {
    match column {
        TrackColumn::Artist => track.artist.clone().unwrap_or_default(),
        TrackColumn::Album => track.album.clone().unwrap_or_default(),
        TrackColumn::Title => track.display_title().to_string(),
        TrackColumn::Rating => score(track.rating).to_string(),
        TrackColumn::Genre => track.genre.clone().unwrap_or_default(),
        TrackColumn::Year => track.year.map(|y| y.to_string()).unwrap_or_default(),
        TrackColumn::Filename => track
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string(),
    }
}
