use std::fs::File;
use std::sync::OnceLock;

use tracing::{debug, info, warn};

use crate::library::Track;

use super::engine::{Backend, Output};
use super::error::PlayerError;
use super::output::RodioBackend;
use super::session::Controller;

/// Starts playback sessions. The output device is opened on the first
/// [`Player::play`] and kept for the life of the player.
pub struct Player {
    backend: Box<dyn Backend>,
    output: OnceLock<Result<Box<dyn Output>, String>>,
}

impl Player {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            output: OnceLock::new(),
        }
    }

    /// Player on the default system output.
    pub fn system() -> Self {
        Self::new(Box::new(RodioBackend))
    }

    fn output(&self) -> Result<&dyn Output, PlayerError> {
        let opened = self.output.get_or_init(|| {
            debug!("opening audio output");
            self.backend.open_output().map_err(|err| {
                warn!(error = %err, "could not open audio output");
                err.to_string()
            })
        });
        match opened {
            Ok(output) => Ok(output.as_ref()),
            Err(msg) => Err(PlayerError::Device(msg.clone())),
        }
    }

    /// Start a new session for `track`. With `repeat` the track loops forever.
    ///
    /// On error no session exists; the caller is expected to have stopped any
    /// previous session already.
    pub fn play(&self, track: &Track, repeat: bool) -> Result<Controller, PlayerError> {
        let kind = track
            .file_type
            .ok_or_else(|| PlayerError::UnsupportedFileType(track.path.clone()))?;
        let file = File::open(&track.path).map_err(|source| PlayerError::Io {
            path: track.path.clone(),
            source,
        })?;

        let decoded = self.backend.decode(file, kind, track.length)?;
        let output = self.output()?;

        let controller = Controller::new(&track.path, decoded, repeat);
        output.play(controller.voice())?;

        info!(path = %track.path.display(), %kind, repeat, "playing");
        Ok(controller)
    }
}
