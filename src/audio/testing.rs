//! In-memory backend used by tests in place of a real audio device.

use std::fs::File;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::library::FileKind;

use super::engine::{Backend, Decoded, FormatInfo, Output, SampleStream};
use super::error::PlayerError;
use super::session::Voice;

struct Script {
    position: u64,
    len: u64,
    channels: u16,
    fail_seeks: bool,
    closed: bool,
}

/// A stream of constant samples. Clones observe the same stream.
#[derive(Clone)]
pub struct ScriptedStream {
    script: Arc<Mutex<Script>>,
}

impl ScriptedStream {
    pub const SAMPLE: f32 = 0.25;

    pub fn new(len: u64, channels: u16) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                position: 0,
                len,
                channels,
                fail_seeks: false,
                closed: false,
            })),
        }
    }

    /// Start reading from `frame` instead of 0.
    pub fn at(self, frame: u64) -> Self {
        self.script.lock().unwrap().position = frame;
        self
    }

    pub fn failing_seeks(self) -> Self {
        self.script.lock().unwrap().fail_seeks = true;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.script.lock().unwrap().closed
    }
}

impl SampleStream for ScriptedStream {
    fn position(&self) -> u64 {
        self.script.lock().unwrap().position
    }

    fn len(&self) -> u64 {
        self.script.lock().unwrap().len
    }

    fn seek(&mut self, frame: u64) -> Result<(), PlayerError> {
        let mut script = self.script.lock().unwrap();
        if script.fail_seeks {
            return Err(PlayerError::Seek("scripted failure".into()));
        }
        script.position = frame;
        Ok(())
    }

    fn read(&mut self, buf: &mut [f32]) -> usize {
        let mut script = self.script.lock().unwrap();
        if script.closed {
            return 0;
        }
        let channels = usize::from(script.channels.max(1));
        let left = script.len.saturating_sub(script.position) as usize;
        let frames = (buf.len() / channels).min(left);
        let samples = frames * channels;
        buf[..samples].fill(Self::SAMPLE);
        script.position += frames as u64;
        samples
    }

    fn close(&mut self) {
        self.script.lock().unwrap().closed = true;
    }
}

/// Counters and voices shared between a [`FakeBackend`] and the test holding it.
#[derive(Clone, Default)]
pub struct Probe {
    pub opens: Arc<AtomicUsize>,
    pub decodes: Arc<AtomicUsize>,
    pub voices: Arc<Mutex<Vec<Voice>>>,
}

impl Probe {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }

    /// Render every voice handed to the output until it finishes.
    pub fn drain_voices(&self) {
        let mut voices = self.voices.lock().unwrap();
        let mut buf = [0.0f32; 1024];
        for voice in voices.iter_mut() {
            while voice.render(&mut buf).is_some() {}
        }
    }
}

pub struct FakeBackend {
    frames: u64,
    fail_output: bool,
    fail_decode: bool,
    probe: Probe,
}

impl FakeBackend {
    pub const RATE: u32 = 1_000;

    /// Every decoded stream is `frames` long at [`Self::RATE`] in stereo.
    pub fn new(frames: u64) -> Self {
        Self {
            frames,
            fail_output: false,
            fail_decode: false,
            probe: Probe::default(),
        }
    }

    pub fn failing_output(mut self) -> Self {
        self.fail_output = true;
        self
    }

    pub fn failing_decode(mut self) -> Self {
        self.fail_decode = true;
        self
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }
}

impl Backend for FakeBackend {
    fn decode(
        &self,
        _file: File,
        _kind: FileKind,
        _length_hint: Option<Duration>,
    ) -> Result<Decoded, PlayerError> {
        self.probe.decodes.fetch_add(1, Ordering::SeqCst);
        if self.fail_decode {
            return Err(PlayerError::Decode("scripted failure".into()));
        }
        Ok(Decoded {
            stream: Box::new(ScriptedStream::new(self.frames, 2)),
            format: FormatInfo {
                sample_rate: Self::RATE,
                channels: 2,
            },
        })
    }

    fn open_output(&self) -> Result<Box<dyn Output>, PlayerError> {
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_output {
            return Err(PlayerError::Device("no device in tests".into()));
        }
        Ok(Box::new(FakeOutput {
            voices: Arc::clone(&self.probe.voices),
        }))
    }
}

struct FakeOutput {
    voices: Arc<Mutex<Vec<Voice>>>,
}

impl Output for FakeOutput {
    fn play(&self, voice: Voice) -> Result<(), PlayerError> {
        self.voices.lock().unwrap().push(voice);
        Ok(())
    }
}
