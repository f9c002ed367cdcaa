use std::env;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{CancelToken, MonitorEvent, Player, ProgressMonitor};
use crate::library::{LocalShelf, Shelf, default_registry};

mod event_loop;
mod logging;
mod settings;

pub use logging::StatusLog;

const USAGE: &str = "usage: shellac <file or directory>";

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let Some(target) = env::args_os().nth(1) else {
        println!("{USAGE}");
        std::process::exit(2);
    };

    let (settings, config_problem) = settings::load_settings();
    let logging = logging::init(&settings.logging)?;
    if let Some(problem) = config_problem {
        warn!("{problem}");
    }

    let mut shelf = LocalShelf::new(
        PathBuf::from(target),
        settings.library.clone(),
        default_registry(&settings.rating.attribution_tag),
    );
    let count = shelf.load_tracks()?;
    info!(count, root = %shelf.root().display(), "library ready");

    let player = Player::system();
    let mut app = App::new(shelf.tracks().to_vec(), settings.playback.repeat);

    let (events_tx, events_rx) = mpsc::channel::<MonitorEvent>();
    let cancel = CancelToken::new();
    let monitor = ProgressMonitor::new(
        Arc::clone(&app.now_playing),
        events_tx,
        Duration::from_millis(settings.playback.poll_interval_ms),
        cancel.clone(),
    )
    .spawn()?;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &player,
        &shelf,
        &events_rx,
        &logging.status,
        &mut state,
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.stop();
    cancel.cancel();
    drop(events_rx);
    if monitor.join().is_err() {
        warn!("progress monitor panicked");
    }

    run_result
}
