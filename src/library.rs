//! The track catalog: the `Track` model, per-format metadata codecs and the
//! shelf that loads a directory of audio files through them.

mod codec;
mod display;
mod error;
mod id3;
mod model;
mod score;
mod shelf;
mod tags;
mod wav;

pub use codec::{Codec, CodecRegistry, default_registry};
pub use display::{column_text, column_title, display_from_fields};
pub use error::LibraryError;
pub use model::{DEFAULT_RATING_TAG, FileKind, Track};
pub use score::{RATINGS, SCORES, rating, score, score_index};
pub use shelf::{LocalShelf, Shelf, is_audio_file};

#[cfg(test)]
pub(crate) mod testing;
