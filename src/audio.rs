//! Audio playback: the engine contract, its rodio implementation, playback
//! sessions and the progress monitor.

mod engine;
mod error;
mod monitor;
mod output;
mod player;
mod session;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{Backend, Decoded, FormatInfo, Output, SampleStream};
pub use error::PlayerError;
pub use monitor::{CancelToken, MonitorEvent, NowPlaying, NowPlayingHandle, ProgressMonitor};
pub use player::Player;
pub use session::{Chunk, Controller, Voice};
pub use types::{PlayState, PlaybackStatus};
