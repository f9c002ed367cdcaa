//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, Borders, Cell, Clear, Gauge, Padding, Paragraph, Row, Table, TableState, Wrap},
};

use crate::app::{App, EditField, View};
use crate::audio::PlaybackStatus;
use crate::config::{TrackColumn, UiSettings};
use crate::library::{Track, column_text, column_title, display_from_fields, score, score_index};
use crate::runtime::StatusLog;

/// Key bindings in display order.
const CONTROLS: [(&str, &str); 17] = [
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "play selected"),
    ("esc", "stop"),
    ("space", "pause"),
    ("←/→", "seek -/+5s"),
    ("-/=", "volume"),
    ("_/+", "speed"),
    ("[/]", "prev/next"),
    ("0-5", "rate"),
    (")!@#$", "rate half stars"),
    ("d", "describe"),
    ("e", "edit"),
    ("del", "delete"),
    ("L", "logs"),
    ("?", "help"),
    ("q", "quit"),
];

/// Short controls line for the footer.
fn controls_text() -> String {
    CONTROLS
        .iter()
        .filter(|(k, _)| !matches!(*k, "gg/G" | ")!@#$" | "del" | "e"))
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect::<Vec<String>>()
        .join(" | ")
}

fn padded_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn score_color(rating: u8) -> Color {
    match score_index(rating) {
        0 => Color::DarkGray,
        1..=3 => Color::Red,
        4..=5 => Color::Yellow,
        6..=7 => Color::Cyan,
        _ => Color::Green,
    }
}

fn or_dash(v: Option<&str>) -> &str {
    v.filter(|s| !s.trim().is_empty()).unwrap_or("-")
}

fn numbered(n: Option<u32>, total: Option<u32>) -> String {
    match (n, total) {
        (Some(n), Some(t)) => format!("{n}/{t}"),
        (Some(n), None) => n.to_string(),
        _ => "-".to_string(),
    }
}

/// Every known field of `track`, one `label: value` line each.
fn describe_lines(track: &Track) -> Vec<String> {
    let length = track
        .length
        .map(|d| {
            let secs = d.as_secs();
            format!("{}:{:02}", secs / 60, secs % 60)
        })
        .unwrap_or_else(|| "-".to_string());
    vec![
        format!("Title: {}", track.display_title()),
        format!("Artist: {}", or_dash(track.artist.as_deref())),
        format!("Album: {}", or_dash(track.album.as_deref())),
        format!("Album artist: {}", or_dash(track.album_artist.as_deref())),
        format!("Composer: {}", or_dash(track.composer.as_deref())),
        format!("Genre: {}", or_dash(track.genre.as_deref())),
        format!(
            "Year: {}",
            track.year.map(|y| y.to_string()).unwrap_or_else(|| "-".into())
        ),
        format!("Track: {}", numbered(track.track_number, track.track_total)),
        format!("Disc: {}", numbered(track.disc_number, track.disc_total)),
        format!("Length: {length}"),
        format!(
            "Type: {} ({})",
            track.file_type.map(|k| k.to_string()).unwrap_or_else(|| "-".into()),
            or_dash(track.mime_type.as_deref())
        ),
        format!(
            "Rating: {} ({} by {})",
            score(track.rating),
            track.rating,
            track.rating_tag
        ),
        format!("Plays: {}", track.play_count),
        format!("Comment: {}", or_dash(track.comment.as_deref())),
        format!("Lyrics: {}", or_dash(track.lyrics.as_deref())),
        format!("Path: {}", track.path.display()),
    ]
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings, log: &StatusLog) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" shellac ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let playing = app.playing();
    let status = app.playback_status();

    draw_now_playing(frame, chunks[1], app, ui_settings, playing.as_ref().map(|np| &np.track), status);
    draw_tracks(frame, chunks[2], app, ui_settings, playing.as_ref().map(|np| np.row), status);

    // Status line: the app's own message wins over the log tail.
    let status_text = app
        .status
        .clone()
        .or_else(|| log.latest())
        .unwrap_or_default();
    let status_par = Paragraph::new(status_text)
        .block(padded_block(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[3]);

    let footer = Paragraph::new(controls_text())
        .block(padded_block(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);

    draw_popup(frame, chunks[2], app, log);
}

fn draw_now_playing(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    ui_settings: &UiSettings,
    track: Option<&Track>,
    status: PlaybackStatus,
) {
    let block = padded_block(" now playing ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let text = match track {
        Some(track) => {
            let p = &app.progress;
            vec![
                format!(
                    "Title: {}",
                    display_from_fields(
                        track,
                        &ui_settings.now_playing_fields,
                        &ui_settings.now_playing_separator
                    )
                ),
                format!("Album: {}", or_dash(track.album.as_deref())),
                format!("Artist: {}", or_dash(track.artist.as_deref())),
                format!(
                    "{status} • {} • Volume: {} • Speed: {} • {}",
                    p.position,
                    p.volume,
                    p.speed,
                    track.path.display()
                ),
            ]
            .join("\n")
        }
        None => "Stopped".to_string(),
    };
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), rows[0]);

    let ratio = if track.is_some() {
        f64::from(app.progress.progress).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label(format!("{:.0}%", ratio * 100.0));
    frame.render_widget(gauge, rows[1]);
}

fn draw_tracks(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    ui_settings: &UiSettings,
    playing_row: Option<usize>,
    status: PlaybackStatus,
) {
    let columns = &ui_settings.columns;

    let header = Row::new(
        std::iter::once(Cell::from(""))
            .chain(columns.iter().map(|c| Cell::from(column_title(*c))))
            .collect::<Vec<_>>(),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    // Only build rows for the visible window, centered on the selection when possible.
    let total = app.tracks.len();
    let height = area.height.saturating_sub(3) as usize;
    let (start, end) = if total <= height || height == 0 {
        (0, total)
    } else {
        let half = height / 2;
        let start = app.selected.saturating_sub(half).min(total - height);
        (start, start + height)
    };

    let rows: Vec<Row> = app.tracks[start..end]
        .iter()
        .enumerate()
        .map(|(offset, track)| {
            let row_no = start + offset + 1;
            let marker = match (playing_row == Some(row_no), status) {
                (true, PlaybackStatus::Paused) => "‖",
                (true, _) => "▶",
                _ => "",
            };
            let cells = std::iter::once(Cell::from(marker)).chain(columns.iter().map(|c| {
                let cell = Cell::from(column_text(track, *c));
                if matches!(c, TrackColumn::Rating) {
                    cell.style(Style::default().fg(score_color(track.rating)))
                } else {
                    cell
                }
            }));
            Row::new(cells.collect::<Vec<_>>())
        })
        .collect();

    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(1))
        .chain(columns.iter().map(|c| match c {
            TrackColumn::Rating => Constraint::Length(6),
            TrackColumn::Year => Constraint::Length(4),
            _ => Constraint::Fill(1),
        }))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!(" tracks ({total}) ")))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = TableState::default();
    if total > 0 {
        state.select(Some(app.selected.saturating_sub(start)));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_popup(frame: &mut Frame, list_area: Rect, app: &App, log: &StatusLog) {
    let (title, body, width, height): (&str, String, u16, u16) = match &app.view {
        View::Tracks => return,
        View::Help => (
            " help (esc closes) ",
            CONTROLS
                .iter()
                .map(|(k, v)| format!("{k:>7}  {v}"))
                .collect::<Vec<_>>()
                .join("\n"),
            44,
            CONTROLS.len() as u16 + 2,
        ),
        View::Logs => {
            let lines = log.lines();
            let visible = list_area.height.saturating_sub(4) as usize;
            let skip = lines.len().saturating_sub(visible);
            (
                " logs (esc closes) ",
                lines[skip..].join("\n"),
                list_area.width,
                list_area.height,
            )
        }
        View::Describe => (
            " track (esc closes) ",
            app.selected_track()
                .map(|t| describe_lines(t).join("\n"))
                .unwrap_or_else(|| "No track selected".to_string()),
            80,
            18,
        ),
        View::Edit(form) => (
            " edit (tab next field, enter saves, esc cancels) ",
            EditField::ALL
                .iter()
                .map(|f| {
                    let cursor = if *f == form.focus { "_" } else { "" };
                    let marker = if *f == form.focus { ">" } else { " " };
                    format!("{marker} {:<7}{}{cursor}", f.label(), form.value(*f))
                })
                .collect::<Vec<_>>()
                .join("\n"),
            64,
            5,
        ),
        View::ConfirmDelete => (
            " delete ",
            format!(
                "Delete {} from disk? [y/n]",
                app.selected_track()
                    .map(|t| t.display_title().to_string())
                    .unwrap_or_default()
            ),
            56,
            5,
        ),
    };

    let popup_area = centered_rect_sized(width, height, list_area);
    frame.render_widget(Clear, popup_area);
    let paragraph = Paragraph::new(body)
        .block(padded_block(title))
        .wrap(Wrap { trim: false });
    let paragraph = if matches!(app.view, View::ConfirmDelete) {
        paragraph.red()
    } else {
        paragraph
    };
    frame.render_widget(paragraph, popup_area);
}
