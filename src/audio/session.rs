//! One playback session: the controller the UI drives and the voice the
//! output device pulls samples from. Both share a single mutex.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use super::engine::{Decoded, FormatInfo, SampleStream};
use super::error::PlayerError;
use super::types::{PlayState, PlaybackStatus, mmss};

const SEEK_STEP: Duration = Duration::from_secs(5);
const VOLUME_STEP: f64 = 0.1;
const SPEED_UP: f64 = 16.0 / 15.0;
const SPEED_DOWN: f64 = 15.0 / 16.0;

struct SessionState {
    format: FormatInfo,
    stream: Option<Box<dyn SampleStream>>,
    paused: bool,
    /// Exponent of a base-2 gain; 0.0 is unity.
    volume: f64,
    speed: f64,
    finished: bool,
    repeat: bool,
}

impl SessionState {
    fn new(format: FormatInfo, stream: Option<Box<dyn SampleStream>>, repeat: bool) -> Self {
        Self {
            format,
            stream,
            paused: false,
            volume: 0.0,
            speed: 1.0,
            finished: false,
            repeat,
        }
    }

    fn release(&mut self) {
        self.finished = true;
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a playback session. Clones share the same session.
#[derive(Clone)]
pub struct Controller {
    path: PathBuf,
    state: Arc<Mutex<SessionState>>,
}

impl Controller {
    pub fn new(path: impl Into<PathBuf>, decoded: Decoded, repeat: bool) -> Self {
        Self {
            path: path.into(),
            state: Arc::new(Mutex::new(SessionState::new(
                decoded.format,
                Some(decoded.stream),
                repeat,
            ))),
        }
    }

    /// A controller with nothing loaded.
    pub fn idle() -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(Mutex::new(SessionState::new(
                FormatInfo::default(),
                None,
                false,
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The renderer for this session. Its finish callback stops the session.
    pub fn voice(&self) -> Voice {
        let state = Arc::clone(&self.state);
        let path = self.path.clone();
        Voice {
            state: Arc::clone(&self.state),
            on_finish: Some(Box::new(move || {
                debug!(path = %path.display(), "stream exhausted");
                lock(&state).release();
            })),
        }
    }

    pub fn state(&self) -> PlaybackStatus {
        let state = lock(&self.state);
        if state.finished {
            PlaybackStatus::Stopped
        } else if state.stream.is_none() {
            PlaybackStatus::Idle
        } else if state.paused {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Playing
        }
    }

    /// Flip pause and return whether the session is now paused.
    pub fn pause_toggle(&self) -> bool {
        let mut state = lock(&self.state);
        state.paused = !state.paused;
        state.paused
    }

    pub fn progress(&self) -> PlayState {
        let state = lock(&self.state);
        let (position, len) = state
            .stream
            .as_ref()
            .map(|s| (s.position(), s.len()))
            .unwrap_or((0, 0));
        let progress = if len == 0 {
            0.0
        } else {
            (position as f64 / len as f64).clamp(0.0, 1.0) as f32
        };

        PlayState {
            finished: state.finished,
            progress,
            position: format!(
                "{} / {}",
                mmss(state.format.duration_of(position)),
                mmss(state.format.duration_of(len))
            ),
            volume: format!("{:.1}", state.volume),
            speed: format!("{:.3}x", state.speed),
        }
    }

    pub fn seek_forward(&self) -> Result<(), PlayerError> {
        self.seek_by(true)
    }

    pub fn seek_backward(&self) -> Result<(), PlayerError> {
        self.seek_by(false)
    }

    fn seek_by(&self, forward: bool) -> Result<(), PlayerError> {
        let mut state = lock(&self.state);
        let step = state.format.frames_for(SEEK_STEP);
        let stream = state.stream.as_mut().ok_or(PlayerError::NoStream)?;

        let position = stream.position();
        let target = if forward {
            position.saturating_add(step)
        } else {
            position.saturating_sub(step)
        };
        // A zero length means the decoder could not tell; only clamp known lengths.
        let target = match stream.len() {
            0 => target,
            len => target.min(len - 1),
        };
        stream.seek(target)
    }

    pub fn volume_up(&self) {
        lock(&self.state).volume += VOLUME_STEP;
    }

    pub fn volume_down(&self) {
        lock(&self.state).volume -= VOLUME_STEP;
    }

    pub fn speed_up(&self) {
        lock(&self.state).speed *= SPEED_UP;
    }

    pub fn speed_down(&self) {
        lock(&self.state).speed *= SPEED_DOWN;
    }

    /// End the session. Safe to call repeatedly or with nothing loaded.
    pub fn stop(&self) {
        lock(&self.state).release();
    }
}

/// One rendered chunk.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Chunk {
    /// Samples written to the buffer.
    pub samples: usize,
    /// Playback rate with the speed ratio applied.
    pub sample_rate: u32,
}

/// The rendering side of a session, owned by the output device.
pub struct Voice {
    state: Arc<Mutex<SessionState>>,
    on_finish: Option<Box<dyn FnOnce() + Send>>,
}

impl Voice {
    pub fn format(&self) -> FormatInfo {
        lock(&self.state).format
    }

    /// Render the next chunk into `buf`; `None` once the session is over.
    ///
    /// The finish callback runs exactly once, after the session lock is released.
    pub fn render(&mut self, buf: &mut [f32]) -> Option<Chunk> {
        let chunk = {
            let mut guard = lock(&self.state);
            let state = &mut *guard;
            let rate = (f64::from(state.format.sample_rate) * state.speed)
                .round()
                .max(1.0) as u32;
            let gain = 2f64.powf(state.volume) as f32;

            match state.stream.as_mut() {
                _ if state.finished => None,
                None => None,
                Some(_) if state.paused => {
                    buf.fill(0.0);
                    Some(Chunk {
                        samples: buf.len(),
                        sample_rate: rate,
                    })
                }
                Some(stream) => {
                    let mut n = stream.read(buf);
                    if n == 0 && state.repeat && stream.len() > 0 {
                        match stream.seek(0) {
                            Ok(()) => n = stream.read(buf),
                            Err(err) => warn!(error = %err, "could not rewind for repeat"),
                        }
                    }
                    if n == 0 {
                        None
                    } else {
                        for sample in &mut buf[..n] {
                            *sample *= gain;
                        }
                        Some(Chunk {
                            samples: n,
                            sample_rate: rate,
                        })
                    }
                }
            }
        };

        if chunk.is_none() {
            if let Some(on_finish) = self.on_finish.take() {
                on_finish();
            }
        }
        chunk
    }
}
