//! Snapshot types handed from the audio subsystem to the UI.

use std::fmt;
use std::time::Duration;

/// Lifecycle of one playback session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Nothing was ever loaded.
    Idle,
    Playing,
    Paused,
    /// Stopped or played to the end. Terminal.
    Stopped,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Progress of the current session at one instant.
pub struct PlayState {
    pub finished: bool,
    /// Fraction played, 0.0 to 1.0.
    pub progress: f32,
    /// `"m:ss / m:ss"`.
    pub position: String,
    /// Gain exponent, `"%.1f"`.
    pub volume: String,
    /// Ratio to the native rate, `"%.3fx"`.
    pub speed: String,
}

impl Default for PlayState {
    fn default() -> Self {
        Self {
            finished: false,
            progress: 0.0,
            position: format!("{} / {}", mmss(Duration::ZERO), mmss(Duration::ZERO)),
            volume: format!("{:.1}", 0.0),
            speed: format!("{:.3}x", 1.0),
        }
    }
}

pub(crate) fn mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
