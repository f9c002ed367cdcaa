//! Application model types: `App`, `View` and `EditForm`.
//!
//! `App` owns the track list shown by the UI, the selection and the shared
//! now-playing slot. Operations that touch the player or the shelf take them
//! as arguments so the model itself stays free of I/O.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::audio::{
    Controller, MonitorEvent, NowPlaying, NowPlayingHandle, PlayState, PlaybackStatus, Player,
    PlayerError,
};
use crate::library::{LibraryError, Shelf, Track, score};
use crate::playlist::next_index;

/// Which screen or popup has the keyboard.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Tracks,
    Help,
    Logs,
    Describe,
    Edit(EditForm),
    ConfirmDelete,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EditField {
    Title,
    Artist,
    Album,
}

impl EditField {
    pub const ALL: [EditField; 3] = [EditField::Title, EditField::Artist, EditField::Album];

    pub fn label(self) -> &'static str {
        match self {
            EditField::Title => "Title",
            EditField::Artist => "Artist",
            EditField::Album => "Album",
        }
    }
}

/// Pending edits of the playing track's text tags.
#[derive(Debug, Clone, PartialEq)]
pub struct EditForm {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub focus: EditField,
}

impl EditForm {
    pub fn from_track(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            artist: track.artist.clone().unwrap_or_default(),
            album: track.album.clone().unwrap_or_default(),
            focus: EditField::Title,
        }
    }

    pub fn value(&self, field: EditField) -> &str {
        match field {
            EditField::Title => &self.title,
            EditField::Artist => &self.artist,
            EditField::Album => &self.album,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            EditField::Title => &mut self.title,
            EditField::Artist => &mut self.artist,
            EditField::Album => &mut self.album,
        }
    }

    pub fn push(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    pub fn pop(&mut self) {
        self.focused_mut().pop();
    }

    /// Move focus to the next field, wrapping around.
    pub fn cycle(&mut self) {
        self.focus = match self.focus {
            EditField::Title => EditField::Artist,
            EditField::Artist => EditField::Album,
            EditField::Album => EditField::Title,
        };
    }

    /// `track` with the form's values applied; blank artist/album clear the tag.
    pub fn apply(&self, track: &Track) -> Track {
        let blank_to_none = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        let mut edited = track.clone();
        edited.title = self.title.trim().to_string();
        edited.artist = blank_to_none(&self.artist);
        edited.album = blank_to_none(&self.album);
        edited
    }
}

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    /// 0-based index into `tracks`.
    pub selected: usize,
    pub now_playing: NowPlayingHandle,
    /// Last snapshot reported for the playing session.
    pub progress: PlayState,
    pub view: View,
    /// Last user-facing message, shown in the status line.
    pub status: Option<String>,
    pub repeat: bool,
    pub should_quit: bool,
    next_session: u64,
}

impl App {
    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<Track>, repeat: bool) -> Self {
        Self {
            tracks,
            selected: 0,
            now_playing: Arc::new(Mutex::new(None)),
            progress: PlayState::default(),
            view: View::Tracks,
            status: None,
            repeat,
            should_quit: false,
            next_session: 1,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<NowPlaying>> {
        self.now_playing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the now-playing slot.
    pub fn playing(&self) -> Option<NowPlaying> {
        self.slot().clone()
    }

    fn controller(&self) -> Option<Controller> {
        self.slot().as_ref().map(|np| np.controller.clone())
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        self.controller().unwrap_or_else(Controller::idle).state()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    /// Move selection to the next track, wrapping around.
    pub fn next(&mut self) {
        if !self.tracks.is_empty() {
            self.selected = next_index(self.selected + 1, self.tracks.len(), 1) - 1;
        }
    }

    /// Move selection to the previous track, wrapping around.
    pub fn prev(&mut self) {
        if !self.tracks.is_empty() {
            self.selected = next_index(self.selected + 1, self.tracks.len(), -1) - 1;
        }
    }

    /// Stop whatever is playing and start the track on 1-based `row`.
    pub fn play_row(&mut self, player: &Player, row: usize) -> Result<(), PlayerError> {
        self.stop();

        let Some(track) = row.checked_sub(1).and_then(|i| self.tracks.get(i)).cloned() else {
            return Ok(());
        };

        let controller = match player.play(&track, self.repeat) {
            Ok(c) => c,
            Err(err) => {
                warn!(row, path = %track.path.display(), error = %err, "could not play track");
                self.set_status(format!("Could not play {}: {err}", track.display_title()));
                return Err(err);
            }
        };

        let id = self.next_session;
        self.next_session += 1;
        self.progress = controller.progress();
        self.selected = row - 1;
        self.status = None;
        *self.slot() = Some(NowPlaying {
            id,
            row,
            total: self.tracks.len(),
            track,
            controller,
        });
        Ok(())
    }

    pub fn play_selected(&mut self, player: &Player) -> Result<(), PlayerError> {
        self.play_row(player, self.selected + 1)
    }

    /// Stop the current session, if any.
    pub fn stop(&mut self) {
        // Empty the slot first so the monitor never reports this stop as a natural finish.
        let taken = self.slot().take();
        if let Some(np) = taken {
            np.controller.stop();
            info!(row = np.row, path = %np.controller.path().display(), "stopped");
        }
        self.progress = PlayState::default();
    }

    /// Play `delta` rows away from the playing (or selected) row.
    pub fn skip(&mut self, player: &Player, delta: isize) -> Result<(), PlayerError> {
        if self.tracks.is_empty() {
            return Ok(());
        }
        let current = self
            .slot()
            .as_ref()
            .map(|np| np.row)
            .unwrap_or(self.selected + 1);
        let row = next_index(current, self.tracks.len(), delta);
        self.play_row(player, row)
    }

    /// Returns the new paused state, or `None` when nothing is playing.
    pub fn pause_toggle(&mut self) -> Option<bool> {
        let paused = self.controller().map(|c| c.pause_toggle());
        if let Some(c) = self.controller() {
            self.progress = c.progress();
        }
        paused
    }

    pub fn seek_forward(&mut self) -> Result<(), PlayerError> {
        self.controller()
            .ok_or(PlayerError::NoStream)?
            .seek_forward()
    }

    pub fn seek_backward(&mut self) -> Result<(), PlayerError> {
        self.controller()
            .ok_or(PlayerError::NoStream)?
            .seek_backward()
    }

    /// Apply `f` to the playing session and refresh the snapshot.
    pub fn adjust(&mut self, f: impl FnOnce(&Controller)) {
        if let Some(c) = self.controller() {
            f(&c);
            self.progress = c.progress();
        }
    }

    /// React to a report from the progress monitor.
    pub fn handle_monitor_event(&mut self, player: &Player, event: MonitorEvent) {
        match event {
            MonitorEvent::Progress { row, state } => {
                let current = self.slot().as_ref().map(|np| np.row);
                if current == Some(row) {
                    self.progress = state;
                }
            }
            MonitorEvent::Finished { row, next_row } => {
                // Something else started meanwhile; it wins.
                if self.slot().is_some() {
                    return;
                }
                info!(row, next_row, "advancing");
                if let Err(err) = self.play_row(player, next_row) {
                    warn!(row = next_row, error = %err, "auto-advance failed");
                }
            }
        }
    }

    /// Save `edited` (a changed copy of `previous`) and update every cached copy.
    ///
    /// Returns whether the change reached the file; every outcome leaves a status message.
    fn save(&mut self, shelf: &dyn Shelf, previous: &Track, edited: Track) -> Result<bool, LibraryError> {
        let saved = match shelf.save_track(previous, &edited) {
            Ok(saved) => saved,
            Err(err) => {
                warn!(path = %previous.path.display(), error = %err, "could not save track");
                self.set_status(format!("Could not save {}: {err}", previous.display_title()));
                return Err(err);
            }
        };
        for t in self.tracks.iter_mut().filter(|t| t.path == saved.path) {
            *t = saved.clone();
        }
        if let Some(np) = self.slot().as_mut().filter(|np| np.track.path == saved.path) {
            np.track = saved.clone();
        }

        let written = shelf.can_save(&saved);
        if written {
            self.set_status(format!("Saved {}", saved.display_title()));
        } else {
            self.set_status(format!(
                "{} files are read-only; change not written",
                saved.file_type.map(|k| k.to_string()).unwrap_or_default()
            ));
        }
        Ok(written)
    }

    /// Set the rating of the playing track and persist it.
    pub fn set_rating(&mut self, shelf: &dyn Shelf, rating: u8) -> Result<(), LibraryError> {
        let Some(np) = self.playing() else {
            self.set_status("Nothing is playing");
            return Ok(());
        };
        let mut edited = np.track.clone();
        edited.rating = rating;
        if self.save(shelf, &np.track, edited)? {
            self.set_status(format!("Rated {}", score(rating)));
        }
        Ok(())
    }

    /// Open the edit form for the playing track.
    pub fn begin_edit(&mut self) {
        match self.playing() {
            Some(np) => self.view = View::Edit(EditForm::from_track(&np.track)),
            None => self.set_status("Nothing is playing"),
        }
    }

    /// Persist the open edit form and close it.
    pub fn save_edit(&mut self, shelf: &dyn Shelf) -> Result<(), LibraryError> {
        let View::Edit(form) = std::mem::replace(&mut self.view, View::Tracks) else {
            return Ok(());
        };
        let Some(np) = self.playing() else {
            self.set_status("Nothing is playing");
            return Ok(());
        };
        let edited = form.apply(&np.track);
        self.save(shelf, &np.track, edited).map(|_| ())
    }

    /// Delete the selected track's file and drop it from the list.
    ///
    /// Playback of the deleted track stops once the file is gone; a later
    /// playing row moves up by one. A failed delete leaves playback alone.
    pub fn delete_selected(&mut self, shelf: &dyn Shelf) -> Result<(), LibraryError> {
        let Some(track) = self.selected_track().cloned() else {
            return Ok(());
        };
        let row = self.selected + 1;

        if let Err(err) = shelf.delete_track(&track) {
            warn!(path = %track.path.display(), error = %err, "could not delete track");
            self.set_status(format!("Could not delete {}: {err}", track.display_title()));
            return Err(err);
        }

        let playing_row = self.slot().as_ref().map(|np| np.row);
        if playing_row == Some(row) {
            self.stop();
        }

        self.tracks.remove(self.selected);
        let total = self.tracks.len();
        if let Some(np) = self.slot().as_mut() {
            if np.row > row {
                np.row -= 1;
            }
            np.total = total;
        }
        if self.selected >= total {
            self.selected = total.saturating_sub(1);
        }

        info!(row, path = %track.path.display(), "track deleted");
        self.set_status(format!("Deleted {}", track.display_title()));
        Ok(())
    }
}
