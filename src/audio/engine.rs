//! Contract between the playback session and whatever decodes and renders audio.
//!
//! Positions and lengths are counted in frames (one sample per channel).

use std::fs::File;
use std::time::Duration;

use crate::library::FileKind;

use super::error::PlayerError;
use super::session::Voice;

/// Sample rate and channel layout of a decoded stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FormatInfo {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for FormatInfo {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
        }
    }
}

impl FormatInfo {
    pub fn frames_for(&self, duration: Duration) -> u64 {
        (duration.as_secs_f64() * f64::from(self.sample_rate)).round() as u64
    }

    pub fn duration_of(&self, frames: u64) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }
}

/// A decoded, seekable stream of interleaved `f32` samples.
pub trait SampleStream: Send {
    /// Current frame.
    fn position(&self) -> u64;

    /// Total frames, 0 when unknown.
    fn len(&self) -> u64;

    fn seek(&mut self, frame: u64) -> Result<(), PlayerError>;

    /// Fill `buf` with interleaved samples and return how many were written.
    /// 0 means the stream is exhausted.
    fn read(&mut self, buf: &mut [f32]) -> usize;

    /// Release the underlying decoder. Reads afterwards return 0.
    fn close(&mut self);
}

pub struct Decoded {
    pub stream: Box<dyn SampleStream>,
    pub format: FormatInfo,
}

/// Factory for decoders and the output device.
pub trait Backend: Send + Sync {
    /// `length_hint` is used when the container does not report its own length.
    fn decode(
        &self,
        file: File,
        kind: FileKind,
        length_hint: Option<Duration>,
    ) -> Result<Decoded, PlayerError>;

    fn open_output(&self) -> Result<Box<dyn Output>, PlayerError>;
}

/// An opened output device.
pub trait Output: Send + Sync {
    /// Start rendering `voice` in the background.
    fn play(&self, voice: Voice) -> Result<(), PlayerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_and_durations_convert_at_the_stream_rate() {
        let format = FormatInfo {
            sample_rate: 48_000,
            channels: 2,
        };
        assert_eq!(format.frames_for(Duration::from_secs(5)), 240_000);
        assert_eq!(format.duration_of(24_000), Duration::from_millis(500));

        let broken = FormatInfo {
            sample_rate: 0,
            channels: 1,
        };
        assert_eq!(broken.duration_of(1_000), Duration::ZERO);
    }
}
