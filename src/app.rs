use crate::config;
use crate::core::PlayerCore;
use crate::media::{MediaWidget, NullMediaWidget, RodioMediaWidget};
use crate::model::PersistedState;
use crate::store::SqliteTrackStore;
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

const VOLUME_STEP: f32 = 0.05;

pub struct AppStartupOptions {
    pub settings: PersistedState,
    pub database_path: PathBuf,
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let store = Arc::new(SqliteTrackStore::new(&options.database_path));
    info!("using track store at {}", store.path().display());
    let widget: Box<dyn MediaWidget> = match RodioMediaWidget::new() {
        Ok(widget) => Box::new(widget),
        Err(err) => {
            warn!("no audio output, using null output: {err:#}");
            Box::new(NullMediaWidget::new())
        }
    };

    let mut core = PlayerCore::new(store, widget, options.settings);
    // Failure is already on the status line; the UI starts with an empty list.
    let _ = core.initialize();

    let result = run_terminal_session(&mut core);
    finish_session(result, || config::save_state(&core.persisted_state()))
}

/// Raw mode, alternate screen and mouse capture for the lifetime of the
/// value. Dropping it restores the terminal, on error paths too.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let terminal = match Terminal::new(CrosstermBackend::new(stdout())) {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = disable_raw_mode();
                return Err(err.into());
            }
        };
        let mut session = Self { terminal };
        execute!(
            session.terminal.backend_mut(),
            EnterAlternateScreen,
            EnableMouseCapture
        )?;
        session.terminal.clear()?;
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            warn!("failed to leave raw mode: {err}");
        }
        if let Err(err) = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        ) {
            warn!("failed to leave alternate screen: {err}");
        }
        let _ = self.terminal.show_cursor();
    }
}

fn run_terminal_session<W: MediaWidget>(core: &mut PlayerCore<W>) -> Result<()> {
    let mut session = TerminalSession::enter()?;
    run_event_loop(&mut session.terminal, core)
}

/// Saves settings whatever the session outcome was. A session error wins
/// over a save error.
fn finish_session(result: Result<()>, save_settings: impl FnOnce() -> Result<()>) -> Result<()> {
    let saved = save_settings();
    if let Err(err) = &saved {
        warn!("failed to save settings: {err:#}");
    }
    result?;
    saved
}

fn run_event_loop<W: MediaWidget>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    core: &mut PlayerCore<W>,
) -> Result<()> {
    let mut command_mode = false;
    let mut command_buffer = String::new();
    let mut last_tick = Instant::now();
    let mut playlist_rect = ratatui::prelude::Rect::default();

    loop {
        core.pump_upload_events();
        core.sync_playlist();
        maybe_auto_advance_track(core);

        if core.dirty || last_tick.elapsed() > Duration::from_millis(250) {
            terminal.draw(|frame| {
                playlist_rect = crate::ui::playlist_rect(frame.area());
                crate::ui::draw(frame, core, &command_buffer, command_mode)
            })?;
            core.dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let event = event::read()?;
        if let Event::Mouse(mouse) = event {
            handle_mouse(core, mouse, playlist_rect);
            continue;
        }

        let Event::Key(key) = event else {
            continue;
        };

        if key.kind != KeyEventKind::Press {
            continue;
        }

        if command_mode {
            match key.code {
                KeyCode::Esc => {
                    command_mode = false;
                    command_buffer.clear();
                    core.dirty = true;
                }
                KeyCode::Enter => {
                    run_command(core, &command_buffer);
                    command_mode = false;
                    command_buffer.clear();
                }
                KeyCode::Backspace => {
                    command_buffer.pop();
                    core.dirty = true;
                }
                KeyCode::Char(ch) => {
                    command_buffer.push(ch);
                    core.dirty = true;
                }
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
            KeyCode::Down => core.select_next(),
            KeyCode::Up => core.select_prev(),
            KeyCode::Enter => {
                core.activate_selected();
            }
            KeyCode::Char(' ') => {
                core.toggle_play_pause();
            }
            KeyCode::Char('n') => {
                core.next();
            }
            KeyCode::Char('b') => {
                core.previous();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let next = core.volume() + VOLUME_STEP;
                core.set_volume(next);
            }
            KeyCode::Char('-') => {
                let next = (core.volume() - VOLUME_STEP).max(0.0);
                core.set_volume(next);
            }
            KeyCode::Char(':') => {
                command_mode = true;
                core.dirty = true;
            }
            _ => {}
        }
    }
}

fn maybe_auto_advance_track<W: MediaWidget>(core: &mut PlayerCore<W>) {
    if !core.is_playing() {
        return;
    }
    core.poll_ended();
}

fn handle_mouse<W: MediaWidget>(
    core: &mut PlayerCore<W>,
    mouse: MouseEvent,
    playlist_rect: ratatui::prelude::Rect,
) {
    let inside_playlist = point_in_rect(mouse.column, mouse.row, playlist_rect);
    match mouse.kind {
        MouseEventKind::ScrollDown if inside_playlist => core.select_next(),
        MouseEventKind::ScrollUp if inside_playlist => core.select_prev(),
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: ratatui::prelude::Rect) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

fn run_command<W: MediaWidget>(core: &mut PlayerCore<W>, raw: &str) {
    let input = raw.trim();
    if input.is_empty() {
        core.set_status("No command");
        return;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => {
            core.set_status("Commands: upload <path> | play <number> | reload | help");
        }
        "upload" => {
            if rest.is_empty() {
                core.set_status("Usage: upload <path>");
            } else {
                // Completion is reported through the upload event channel.
                drop(core.upload(PathBuf::from(rest)));
            }
        }
        "play" => match rest.parse::<usize>() {
            Ok(number) if number >= 1 => {
                core.select_index(number - 1);
            }
            _ => core.set_status("Usage: play <number>"),
        },
        "reload" => {
            let _ = core.reload();
        }
        _ => core.set_status("Unknown command. Use :help"),
    }
}
