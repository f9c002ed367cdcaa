//! `rodio`-backed decoding and output.
//!
//! The `OutputStream` lives on its own thread for the rest of the process;
//! voices are handed to it over a channel and mixed by rodio.

use std::fs::File;
use std::io::BufReader;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use rodio::source::SeekError;
use rodio::{Decoder, OutputStreamBuilder, Source};
use tracing::{debug, info, warn};

use crate::library::FileKind;

use super::engine::{Backend, Decoded, FormatInfo, Output, SampleStream};
use super::error::PlayerError;
use super::session::Voice;

/// Frames rendered per lock of the session.
const CHUNK_FRAMES: usize = 512;

pub struct RodioBackend;

impl Backend for RodioBackend {
    fn decode(
        &self,
        file: File,
        kind: FileKind,
        length_hint: Option<Duration>,
    ) -> Result<Decoded, PlayerError> {
        let byte_len = file.metadata().map(|m| m.len()).ok();

        let mut builder = Decoder::builder()
            .with_data(BufReader::new(file))
            .with_hint(kind.extension())
            .with_seekable(true);
        if let Some(len) = byte_len {
            builder = builder.with_byte_len(len);
        }
        let decoder = builder
            .build()
            .map_err(|e| PlayerError::Decode(e.to_string()))?;

        let format = FormatInfo {
            sample_rate: decoder.sample_rate(),
            channels: decoder.channels(),
        };
        let len = decoder
            .total_duration()
            .or(length_hint)
            .map(|d| format.frames_for(d))
            .unwrap_or(0);
        debug!(%kind, rate = format.sample_rate, channels = format.channels, len, "decoder ready");

        Ok(Decoded {
            stream: Box::new(DecoderStream {
                decoder: Some(decoder),
                format,
                position: 0,
                len,
            }),
            format,
        })
    }

    fn open_output(&self) -> Result<Box<dyn Output>, PlayerError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();
        let (voice_tx, voice_rx) = mpsc::channel::<VoiceSource>();

        thread::Builder::new()
            .name("audio-device".into())
            .spawn(move || {
                let mut stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => stream,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };
                // rodio logs to stderr when OutputStream is dropped, which garbles the TUI.
                stream.log_on_drop(false);
                let _ = ready_tx.send(Ok(()));

                for voice in voice_rx {
                    stream.mixer().add(voice);
                }
                debug!("audio device thread exiting");
            })
            .map_err(|e| PlayerError::Device(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("audio output opened");
                Ok(Box::new(RodioOutput { voices: voice_tx }))
            }
            Ok(Err(msg)) => Err(PlayerError::Device(msg)),
            Err(_) => Err(PlayerError::Device("audio device thread exited".into())),
        }
    }
}

struct RodioOutput {
    voices: Sender<VoiceSource>,
}

impl Output for RodioOutput {
    fn play(&self, voice: Voice) -> Result<(), PlayerError> {
        self.voices
            .send(VoiceSource::new(voice))
            .map_err(|_| PlayerError::Device("audio device thread is gone".into()))
    }
}

type FileDecoder = Decoder<BufReader<File>>;

struct DecoderStream {
    decoder: Option<FileDecoder>,
    format: FormatInfo,
    position: u64,
    len: u64,
}

impl SampleStream for DecoderStream {
    fn position(&self) -> u64 {
        self.position
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn seek(&mut self, frame: u64) -> Result<(), PlayerError> {
        let decoder = self.decoder.as_mut().ok_or(PlayerError::NoStream)?;
        decoder
            .try_seek(self.format.duration_of(frame))
            .map_err(|e| PlayerError::Seek(e.to_string()))?;
        self.position = frame;
        Ok(())
    }

    fn read(&mut self, buf: &mut [f32]) -> usize {
        let Some(decoder) = self.decoder.as_mut() else {
            return 0;
        };
        let mut written = 0;
        for slot in buf.iter_mut() {
            match decoder.next() {
                Some(sample) => {
                    *slot = sample;
                    written += 1;
                }
                None => break,
            }
        }
        let channels = usize::from(self.format.channels.max(1));
        self.position += (written / channels) as u64;
        if self.position > self.len && self.len > 0 {
            warn!(position = self.position, len = self.len, "stream ran past its reported length");
            self.len = self.position;
        }
        written
    }

    fn close(&mut self) {
        self.decoder = None;
    }
}

/// Adapts a [`Voice`] to rodio's pull model, one chunk at a time.
struct VoiceSource {
    voice: Voice,
    buf: Vec<f32>,
    pos: usize,
    filled: usize,
    channels: u16,
    sample_rate: u32,
}

impl VoiceSource {
    fn new(voice: Voice) -> Self {
        let format = voice.format();
        let channels = format.channels.max(1);
        let mut source = Self {
            voice,
            buf: vec![0.0; CHUNK_FRAMES * usize::from(channels)],
            pos: 0,
            filled: 0,
            channels,
            sample_rate: format.sample_rate,
        };
        source.refill();
        source
    }

    fn refill(&mut self) {
        self.pos = 0;
        self.filled = match self.voice.render(&mut self.buf) {
            Some(chunk) => {
                self.sample_rate = chunk.sample_rate;
                chunk.samples
            }
            None => 0,
        };
    }
}

impl Iterator for VoiceSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.pos >= self.filled {
            return None;
        }
        let sample = self.buf[self.pos];
        self.pos += 1;
        // Refill eagerly so the span length below always describes the next sample.
        if self.pos >= self.filled {
            self.refill();
        }
        Some(sample)
    }
}

impl Source for VoiceSource {
    fn current_span_len(&self) -> Option<usize> {
        Some(self.filled - self.pos)
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }

    // Seeking goes through the controller, never through the mixer.
    fn try_seek(&mut self, _pos: Duration) -> Result<(), SeekError> {
        Err(SeekError::NotSupported {
            underlying_source: std::any::type_name::<Self>(),
        })
    }
}
