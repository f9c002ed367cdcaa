use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::warn;

use crate::app::{App, View};
use crate::audio::{MonitorEvent, Player};
use crate::config;
use crate::library::{SCORES, Shelf, rating};
use crate::runtime::logging::StatusLog;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: drains monitor events, draws, and handles input.
/// Returns `Ok(())` when the user quits.
#[allow(clippy::too_many_arguments)]
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &Player,
    shelf: &dyn Shelf,
    events: &Receiver<MonitorEvent>,
    log: &StatusLog,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(ev) = events.try_recv() {
            app.handle_monitor_event(player, ev);
        }

        terminal.draw(|f| ui::draw(f, app, &settings.ui, log))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                handle_key_event(key, app, player, shelf, state);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Rating set by a rating key: digits are whole stars, their shifted
/// symbols the half star above.
fn rating_for_key(c: char) -> Option<u8> {
    let step = match c {
        '0'..='5' => (c as usize - '0' as usize) * 2,
        ')' => 1,
        '!' => 3,
        '@' => 5,
        '#' => 7,
        '$' => 9,
        _ => return None,
    };
    SCORES.get(step).map(|s| rating(s))
}

fn report<E: std::fmt::Display>(app: &mut App, what: &str, result: Result<(), E>) {
    if let Err(err) = result {
        warn!(error = %err, "{what} failed");
        app.set_status(format!("{what} failed: {err}"));
    }
}

pub(crate) fn handle_key_event(
    key: KeyEvent,
    app: &mut App,
    player: &Player,
    shelf: &dyn Shelf,
    state: &mut EventLoopState,
) {
    match &mut app.view {
        View::Tracks => {}
        View::Edit(form) => {
            match key.code {
                KeyCode::Esc => app.view = View::Tracks,
                KeyCode::Tab => form.cycle(),
                KeyCode::Backspace => form.pop(),
                KeyCode::Char(c) if !c.is_control() => form.push(c),
                KeyCode::Enter => {
                    // Failures are already in the status line.
                    let _ = app.save_edit(shelf);
                }
                _ => {}
            }
            return;
        }
        View::ConfirmDelete => {
            app.view = View::Tracks;
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                let _ = app.delete_selected(shelf);
            }
            return;
        }
        View::Help | View::Logs | View::Describe => {
            if matches!(
                key.code,
                KeyCode::Esc
                    | KeyCode::Enter
                    | KeyCode::Char('q')
                    | KeyCode::Char('?')
                    | KeyCode::Char('L')
                    | KeyCode::Char('d')
            ) {
                app.view = View::Tracks;
            }
            return;
        }
    }

    let was_g = std::mem::take(&mut state.pending_gg);

    match key.code {
        KeyCode::Char('q') => {
            app.stop();
            app.should_quit = true;
        }
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Char('g') => {
            if was_g {
                app.selected = 0;
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.selected = app.tracks.len().saturating_sub(1),
        KeyCode::Enter => {
            let _ = app.play_selected(player);
        }
        KeyCode::Esc => app.stop(),
        KeyCode::Char(' ') => {
            if app.pause_toggle().is_none() {
                app.set_status("Nothing is playing");
            }
        }
        KeyCode::Right => {
            let r = app.seek_forward();
            report(app, "Seek", r);
        }
        KeyCode::Left => {
            let r = app.seek_backward();
            report(app, "Seek", r);
        }
        KeyCode::Char('=') => app.adjust(|c| c.volume_up()),
        KeyCode::Char('-') => app.adjust(|c| c.volume_down()),
        KeyCode::Char('+') => app.adjust(|c| c.speed_up()),
        KeyCode::Char('_') => app.adjust(|c| c.speed_down()),
        KeyCode::Char(']') => {
            let _ = app.skip(player, 1);
        }
        KeyCode::Char('[') => {
            let _ = app.skip(player, -1);
        }
        KeyCode::Char('d') => app.view = View::Describe,
        KeyCode::Char('e') => app.begin_edit(),
        KeyCode::Delete => {
            if app.selected_track().is_some() {
                app.view = View::ConfirmDelete;
            }
        }
        KeyCode::Char('L') => app.view = View::Logs,
        KeyCode::Char('?') => app.view = View::Help,
        KeyCode::Char(c) => {
            if let Some(value) = rating_for_key(c) {
                // set_rating leaves its outcome in the status line.
                let _ = app.set_rating(shelf, value);
            }
        }
        _ => {}
    }
}
