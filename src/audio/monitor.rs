//! Background loop that samples the playing session and reports to the UI.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SendError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

use crate::library::Track;
use crate::playlist::next_index;

use super::session::Controller;
use super::types::PlayState;

/// Shared stop flag for a background loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The session currently occupying the player.
#[derive(Clone)]
pub struct NowPlaying {
    /// Distinguishes sessions that happen to play the same row.
    pub id: u64,
    /// 1-based row of the track.
    pub row: usize,
    /// Rows in the list when the session started.
    pub total: usize,
    pub track: Track,
    pub controller: Controller,
}

pub type NowPlayingHandle = Arc<Mutex<Option<NowPlaying>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Progress { row: usize, state: PlayState },
    /// The session on `row` ended by itself; `next_row` should start.
    Finished { row: usize, next_row: usize },
}

pub struct ProgressMonitor {
    now_playing: NowPlayingHandle,
    events: Sender<MonitorEvent>,
    interval: Duration,
    cancel: CancelToken,
}

impl ProgressMonitor {
    pub fn new(
        now_playing: NowPlayingHandle,
        events: Sender<MonitorEvent>,
        interval: Duration,
        cancel: CancelToken,
    ) -> Self {
        Self {
            now_playing,
            events,
            interval,
            cancel,
        }
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("progress-monitor".into())
            .spawn(move || self.run())
    }

    fn run(self) {
        debug!(interval_ms = self.interval.as_millis() as u64, "progress monitor started");
        loop {
            if self.cancel.is_cancelled() {
                debug!("progress monitor cancelled");
                break;
            }
            if self.tick().is_err() {
                debug!("event receiver gone, progress monitor exiting");
                break;
            }
            thread::sleep(self.interval);
        }
    }

    /// Sample the current session once.
    ///
    /// Errors only when the receiving side of the event channel is gone.
    pub fn tick(&self) -> Result<(), SendError<MonitorEvent>> {
        let current = self
            .now_playing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|np| (np.id, np.row, np.total, np.controller.clone()));
        let Some((id, row, total, controller)) = current else {
            return Ok(());
        };

        // Sampled outside the slot lock; the session has its own.
        let state = controller.progress();
        let finished = state.finished;
        self.events.send(MonitorEvent::Progress { row, state })?;

        if finished && self.take_if_current(id) {
            let next_row = next_index(row, total, 1);
            info!(row, next_row, "track finished");
            self.events.send(MonitorEvent::Finished { row, next_row })?;
        }
        Ok(())
    }

    fn take_if_current(&self, id: u64) -> bool {
        let mut slot = self
            .now_playing
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|np| np.id == id) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::{Decoded, FormatInfo};
    use crate::audio::testing::ScriptedStream;
    use std::sync::mpsc;
    use std::time::Instant;

    fn now_playing(id: u64, row: usize, total: usize) -> NowPlaying {
        let decoded = Decoded {
            stream: Box::new(ScriptedStream::new(1_000, 2)),
            format: FormatInfo {
                sample_rate: 1_000,
                channels: 2,
            },
        };
        NowPlaying {
            id,
            row,
            total,
            track: Track::new(format!("/music/{row}.wav")),
            controller: Controller::new(format!("/music/{row}.wav"), decoded, false),
        }
    }

    fn monitor(
        slot: &NowPlayingHandle,
        interval: Duration,
    ) -> (ProgressMonitor, mpsc::Receiver<MonitorEvent>, CancelToken) {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        (
            ProgressMonitor::new(Arc::clone(slot), tx, interval, cancel.clone()),
            rx,
            cancel,
        )
    }

    #[test]
    fn empty_slot_is_a_quiet_noop() {
        let slot: NowPlayingHandle = Arc::new(Mutex::new(None));
        let (m, rx, _) = monitor(&slot, Duration::from_millis(50));
        m.tick().unwrap();
        m.tick().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn playing_session_reports_progress_only() {
        let slot: NowPlayingHandle = Arc::new(Mutex::new(Some(now_playing(1, 2, 5))));
        let (m, rx, _) = monitor(&slot, Duration::from_millis(50));

        m.tick().unwrap();
        match rx.try_recv().unwrap() {
            MonitorEvent::Progress { row, state } => {
                assert_eq!(row, 2);
                assert!(!state.finished);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(rx.try_recv().is_err());
        assert!(slot.lock().unwrap().is_some());
    }

    #[test]
    fn finished_session_is_cleared_and_advances_with_wraparound() {
        let np = now_playing(7, 5, 5);
        np.controller.stop();
        let slot: NowPlayingHandle = Arc::new(Mutex::new(Some(np)));
        let (m, rx, _) = monitor(&slot, Duration::from_millis(50));

        m.tick().unwrap();
        assert!(matches!(
            rx.try_recv().unwrap(),
            MonitorEvent::Progress { row: 5, .. }
        ));
        assert_eq!(
            rx.try_recv().unwrap(),
            MonitorEvent::Finished {
                row: 5,
                next_row: 1
            }
        );
        assert!(slot.lock().unwrap().is_none());

        // Nothing left to report.
        m.tick().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn replaced_session_is_not_taken() {
        let old = now_playing(1, 3, 5);
        let slot: NowPlayingHandle = Arc::new(Mutex::new(Some(old.clone())));
        let (m, _rx, _) = monitor(&slot, Duration::from_millis(50));

        old.controller.stop();
        *slot.lock().unwrap() = Some(now_playing(2, 4, 5));

        assert!(!m.take_if_current(1));
        assert_eq!(slot.lock().unwrap().as_ref().map(|np| np.id), Some(2));
    }

    #[test]
    fn tick_fails_once_the_receiver_is_gone() {
        let slot: NowPlayingHandle = Arc::new(Mutex::new(Some(now_playing(1, 1, 1))));
        let (m, rx, _) = monitor(&slot, Duration::from_millis(50));
        drop(rx);
        assert!(m.tick().is_err());
    }

    #[test]
    fn cancelled_monitor_thread_exits() {
        let slot: NowPlayingHandle = Arc::new(Mutex::new(None));
        let (m, _rx, cancel) = monitor(&slot, Duration::from_millis(50));
        let handle = m.spawn().unwrap();

        cancel.cancel();
        let started = Instant::now();
        handle.join().unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn monitor_thread_exits_when_the_receiver_is_dropped() {
        let slot: NowPlayingHandle = Arc::new(Mutex::new(Some(now_playing(1, 1, 2))));
        let (m, rx, _cancel) = monitor(&slot, Duration::from_millis(50));
        let handle = m.spawn().unwrap();
        drop(rx);
        handle.join().unwrap();
    }
}
