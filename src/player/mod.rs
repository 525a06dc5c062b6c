//! Player — the real-time playback driver.
//!
//! Owns a `PlaybackEngine` and calls `step()` once per tick at the configured
//! rate, drawing each tick's live projectiles to the terminal. Pacing, input
//! and terminal state live here; the engine itself is unaware of wall-clock
//! time.

use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Result, bail};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{cursor, execute, queue, style, terminal};
use tracing::debug;

use crate::config::{MarkerColor, NamedColor, PlayerConfig};
use crate::engine::{PlaybackEngine, PlaybackState};
use crate::renderer::{Canvas, CellChange, Renderer};
use crate::types::Schedule;

/// Rows reserved above the canvas for the key hints.
const CANVAS_OFFSET: u16 = 1;

/// Why the player stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The engine reported natural termination.
    Finished { ticks: u64 },
    /// The user quit before the end.
    Interrupted { ticks: u64 },
}

enum KeyAction {
    Continue,
    TogglePause,
    Quit,
}

pub struct Player {
    engine: PlaybackEngine,
    config: PlayerConfig,
    canvas: Canvas,
    ticks: u64,
    live: usize,
    paused: bool,
}

impl Player {
    pub fn new(schedule: Schedule, config: PlayerConfig) -> Self {
        let engine = PlaybackEngine::with_viewport(schedule, config.viewport);
        let canvas = Canvas::blank(config.canvas.columns, config.canvas.rows);
        Self {
            engine,
            config,
            canvas,
            ticks: 0,
            live: 0,
            paused: false,
        }
    }

    /// Play the schedule in the terminal until it finishes or the user quits.
    ///
    /// Sets up the terminal, enters the tick loop, and restores the terminal
    /// on exit (even on error).
    pub fn play(&mut self) -> Result<Outcome> {
        let (term_w, term_h) = terminal::size()?;
        let need_w = self.config.canvas.columns;
        let need_h = self.config.canvas.rows;
        // +2: one row for key hints, one row for status bar
        if term_w < need_w || term_h < need_h + 2 {
            bail!(
                "Terminal too small: need {}x{}, have {}x{}",
                need_w,
                need_h + 2,
                term_w,
                term_h,
            );
        }

        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run_loop(&mut stdout);

        // Always restore terminal state.
        let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();

        result
    }

    // -----------------------------------------------------------------------
    // Tick loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<Outcome> {
        let interval = self.config.tick_interval();
        self.render_hints(stdout)?;
        self.render_full(stdout)?;
        self.render_status(stdout)?;

        loop {
            let started = Instant::now();

            if !self.paused {
                let tick = self.engine.step();
                self.ticks += 1;
                self.live = tick.entities.len();

                let next = Renderer::rasterize(
                    &tick.entities,
                    self.engine.viewport(),
                    self.config.canvas.columns,
                    self.config.canvas.rows,
                );
                let changes = Renderer::diff(&self.canvas, &next);
                self.canvas = next;
                self.render_changes(stdout, &changes)?;
                self.render_status(stdout)?;

                if tick.finished {
                    return Ok(Outcome::Finished { ticks: self.ticks });
                }
            }

            // Wait out the rest of the tick, handling input as it arrives.
            loop {
                let remaining = interval.saturating_sub(started.elapsed());
                if !event::poll(remaining)? {
                    break;
                }
                match event::read()? {
                    Event::Key(key) => match handle_key(&key) {
                        KeyAction::Quit => {
                            debug!(ticks = self.ticks, "playback interrupted");
                            return Ok(Outcome::Interrupted { ticks: self.ticks });
                        }
                        KeyAction::TogglePause => {
                            self.paused = !self.paused;
                            self.render_status(stdout)?;
                        }
                        KeyAction::Continue => {}
                    },
                    Event::Resize(_, _) => {
                        queue!(stdout, terminal::Clear(terminal::ClearType::All))?;
                        self.render_hints(stdout)?;
                        self.render_full(stdout)?;
                        self.render_status(stdout)?;
                    }
                    _ => {}
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn render_hints(&self, stdout: &mut io::Stdout) -> Result<()> {
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::Print(" "),
        )?;
        for (i, hint) in ["[Space] pause", "[q][Esc] quit"].iter().enumerate() {
            if i > 0 {
                queue!(stdout, style::Print("  "))?;
            }
            print_key_hint(stdout, hint)?;
        }
        stdout.flush()?;
        Ok(())
    }

    fn render_full(&self, stdout: &mut io::Stdout) -> Result<()> {
        for row in 0..self.canvas.rows {
            queue!(stdout, cursor::MoveTo(0, row + CANVAS_OFFSET))?;
            for column in 0..self.canvas.columns {
                self.queue_cell(stdout, self.canvas.is_marked(column, row))?;
            }
        }
        stdout.flush()?;
        Ok(())
    }

    fn render_changes(&self, stdout: &mut io::Stdout, changes: &[CellChange]) -> Result<()> {
        for change in changes {
            queue!(stdout, cursor::MoveTo(change.column, change.row + CANVAS_OFFSET))?;
            self.queue_cell(stdout, change.marked)?;
        }
        stdout.flush()?;
        Ok(())
    }

    fn queue_cell(&self, stdout: &mut io::Stdout, marked: bool) -> Result<()> {
        if marked {
            let mut cs = style::ContentStyle::default();
            cs.foreground_color = Some(to_ct_color(self.config.canvas.marker_color));
            queue!(
                stdout,
                style::PrintStyledContent(style::StyledContent::new(cs, self.config.canvas.marker))
            )?;
        } else {
            queue!(stdout, style::Print(' '))?;
        }
        Ok(())
    }

    fn render_status(&self, stdout: &mut io::Stdout) -> Result<()> {
        let status_y = self.config.canvas.rows + CANVAS_OFFSET;
        let (_, term_h) = terminal::size()?;
        if status_y >= term_h {
            return Ok(()); // No room for status bar.
        }

        let state = match self.engine.state() {
            PlaybackState::Running => "running",
            PlaybackState::Draining => "draining",
            PlaybackState::Finished => "finished",
        };
        let status = format!(
            " Tick {} | Frame {}/{} | {} live | {}{} ",
            self.ticks,
            self.engine.cursor(),
            self.engine.last_frame(),
            self.live,
            state,
            if self.paused { " [paused]" } else { "" },
        );

        let mut cs = style::ContentStyle::default();
        cs.attributes.set(style::Attribute::Dim);

        queue!(
            stdout,
            cursor::MoveTo(0, status_y),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::PrintStyledContent(style::StyledContent::new(cs, status)),
        )?;
        stdout.flush()?;
        Ok(())
    }
}

fn handle_key(key: &KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Continue;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char(' ') => KeyAction::TogglePause,
        _ => KeyAction::Continue,
    }
}

/// Print a hint like `[q][Esc] quit`: bracketed keys bold, the rest dim.
fn print_key_hint(stdout: &mut io::Stdout, hint: &str) -> Result<()> {
    let split = hint.rfind(']').map_or(0, |i| i + 1);
    let (keys, label) = hint.split_at(split);
    queue!(
        stdout,
        style::SetAttribute(style::Attribute::Bold),
        style::Print(keys),
        style::SetAttribute(style::Attribute::Reset),
        style::SetAttribute(style::Attribute::Dim),
        style::Print(label),
        style::SetAttribute(style::Attribute::Reset),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_ct_color(c: MarkerColor) -> style::Color {
    match c {
        MarkerColor::Named(n) => match n {
            NamedColor::Red => style::Color::Red,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::White => style::Color::White,
        },
        MarkerColor::Rgb { r, g, b } => style::Color::Rgb { r, g, b },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn quit_and_pause_keys() {
        let press = |code, modifiers| handle_key(&key(code, modifiers, KeyEventKind::Press));
        let none = KeyModifiers::NONE;

        assert!(matches!(press(KeyCode::Char('q'), none), KeyAction::Quit));
        assert!(matches!(press(KeyCode::Esc, none), KeyAction::Quit));
        assert!(matches!(
            press(KeyCode::Char('c'), KeyModifiers::CONTROL),
            KeyAction::Quit
        ));
        assert!(matches!(press(KeyCode::Char('c'), none), KeyAction::Continue));
        assert!(matches!(press(KeyCode::Char(' '), none), KeyAction::TogglePause));
    }

    #[test]
    fn key_releases_are_ignored() {
        let release = key(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);
        assert!(matches!(handle_key(&release), KeyAction::Continue));
    }

    #[test]
    fn named_marker_colors_map_to_terminal_colors() {
        assert_eq!(to_ct_color(MarkerColor::Named(NamedColor::Red)), style::Color::Red);
        assert_eq!(
            to_ct_color(MarkerColor::Rgb { r: 9, g: 8, b: 7 }),
            style::Color::Rgb { r: 9, g: 8, b: 7 }
        );
    }

    #[test]
    fn player_starts_with_a_blank_canvas() {
        let player = Player::new(Schedule::default(), PlayerConfig::default());
        assert_eq!(player.canvas.marked_count(), 0);
        assert_eq!(player.engine.state(), PlaybackState::Running);
    }
}
