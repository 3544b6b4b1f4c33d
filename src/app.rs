//! App: terminal init, main loop, 1 Hz clock, key and mouse handling.

use crate::Args;
use crate::audio::TerminalAudio;
use crate::input::{Action, key_to_action};
use crate::mascot::Mascot;
use crate::theme::Theme;
use crate::ui::{self, Flash};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use matchtui::{Coord, GameEvent, GameSession, SessionState, dispatch_audio};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// The session clock counts whole seconds.
const CLOCK_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Pre-game board with the title popup.
    Title,
    Playing,
    GameOver,
}

impl From<SessionState> for Screen {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Idle => Self::Title,
            SessionState::Running => Self::Playing,
            SessionState::Ended { .. } => Self::GameOver,
        }
    }
}

pub struct App {
    args: Args,
    session: GameSession,
    theme: Theme,
    cursor: Coord,
    mascot: Mascot,
    audio: TerminalAudio,
    /// Drives the mascot's choice of line.
    rng: StdRng,
    flash: Flash,
    /// Board rect from the last frame, for mouse hit-testing.
    board: Rect,
    last_tick: Instant,
}

impl App {
    pub fn new(args: Args, session: GameSession, theme: Theme) -> Self {
        let rng = args
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let audio = TerminalAudio::new(args.bell);
        Self {
            args,
            session,
            theme,
            cursor: Coord::new(0, 0),
            mascot: Mascot::default(),
            audio,
            rng,
            flash: Flash::default(),
            board: Rect::default(),
            last_tick: Instant::now(),
        }
    }

    fn screen(&self) -> Screen {
        self.session.state().into()
    }

    fn start(&mut self) {
        if let Err(e) = self.session.start() {
            error!(error = %e, "could not start session");
        }
        self.last_tick = Instant::now();
        self.flash.clear();
    }

    fn select(&mut self, at: Coord) {
        match self.session.select_tile(at) {
            Ok(outcome) => debug!(?outcome, %at, "select"),
            Err(e) if e.is_fault() => error!(error = %e, "session faulted"),
            Err(e) => debug!(error = %e, "move rejected"),
        }
    }

    fn apply_action(&mut self, action: Action) {
        let screen = self.screen();
        match (screen, action) {
            (Screen::Title, Action::Start | Action::Select) => self.start(),
            (Screen::Playing | Screen::GameOver, Action::Restart) => self.start(),
            (Screen::Playing, Action::Select) => self.select(self.cursor),
            (Screen::Playing, Action::Up | Action::Down | Action::Left | Action::Right) => {
                let grid = self.session.grid();
                self.cursor = move_cursor(self.cursor, action, grid.rows(), grid.cols());
            }
            _ => {}
        }
    }

    fn click(&mut self, column: u16, row: u16) {
        match self.screen() {
            Screen::Title => self.start(),
            Screen::Playing => {
                if let Some(at) = ui::cell_at(self.board, column, row) {
                    self.cursor = at;
                    self.select(at);
                }
            }
            Screen::GameOver => {}
        }
    }

    /// Hand pending session events to audio, the mascot and the spawn flash.
    fn pump_events(&mut self, now: Instant) {
        let events = self.session.drain_events();
        if events.is_empty() {
            return;
        }
        dispatch_audio(&events, &mut self.audio);
        let mut spawned = Vec::new();
        for event in &events {
            if let Some(phase) = event.cascade_phase() {
                debug!(?phase, "cascade step");
            }
            self.mascot.observe(event, now, &mut self.rng);
            if let GameEvent::TilesSpawned { tiles, .. } = event {
                spawned.extend(tiles.iter().map(|(at, _)| *at));
            }
        }
        if !spawned.is_empty() && !self.args.no_animation {
            self.flash.trigger(spawned);
        }
    }

    fn tick_clock(&mut self) {
        if !self.session.is_running() {
            return;
        }
        while self.last_tick.elapsed() >= CLOCK_TICK && self.session.is_running() {
            self.last_tick += CLOCK_TICK;
            self.session.tick();
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        if self.args.no_menu {
            self.start();
        }
        let result = self.run_loop(&mut terminal);

        // Restore
        if let Err(e) = execute!(std::io::stdout(), DisableMouseCapture) {
            warn!(error = %e, "could not release mouse");
        }
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.clamp(1.0, 240.0));
        loop {
            let now = Instant::now();
            let screen = self.screen();
            let speech = self.mascot.speech(now);
            let completed = terminal.draw(|f| {
                ui::draw(
                    f,
                    screen,
                    &self.session,
                    &self.theme,
                    self.cursor,
                    speech,
                    &mut self.flash,
                    now,
                );
            })?;
            let grid = self.session.grid();
            self.board = ui::board_rect(completed.area, grid.rows(), grid.cols());
            if self.flash.is_done() {
                self.flash.clear();
            }

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            let action = key_to_action(key);
                            if action == Action::Quit {
                                return Ok(());
                            }
                            self.apply_action(action);
                        }
                        Event::Mouse(MouseEvent {
                            kind: MouseEventKind::Down(MouseButton::Left),
                            column,
                            row,
                            ..
                        }) => self.click(column, row),
                        _ => {}
                    }
                }
            }

            self.tick_clock();
            self.pump_events(Instant::now());
        }
    }
}

/// Cursor after one step, clamped to the board.
fn move_cursor(at: Coord, action: Action, rows: usize, cols: usize) -> Coord {
    let Coord { row, col } = at;
    match action {
        Action::Up => Coord::new(row.saturating_sub(1), col),
        Action::Down => Coord::new((row + 1).min(rows.saturating_sub(1)), col),
        Action::Left => Coord::new(row, col.saturating_sub(1)),
        Action::Right => Coord::new(row, (col + 1).min(cols.saturating_sub(1))),
        _ => at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use matchtui::{GameConfig, TileFactory};

    fn app(extra: &[&str]) -> App {
        let args = Args::parse_from(["matchtui", "--seed", "7"].iter().chain(extra).copied());
        let config = GameConfig::default();
        let source = TileFactory::seeded(7, config.color_count, config.special_chance);
        let session = GameSession::new(config, source).unwrap();
        App::new(args, session, Theme::default())
    }

    #[test]
    fn test_cursor_stays_on_board() {
        let corner = Coord::new(0, 0);
        assert_eq!(move_cursor(corner, Action::Up, 8, 8), corner);
        assert_eq!(move_cursor(corner, Action::Left, 8, 8), corner);
        assert_eq!(move_cursor(corner, Action::Down, 8, 8), Coord::new(1, 0));
        let far = Coord::new(7, 7);
        assert_eq!(move_cursor(far, Action::Right, 8, 8), far);
        assert_eq!(move_cursor(far, Action::Down, 8, 8), far);
    }

    #[test]
    fn test_start_from_title_greets() {
        let mut app = app(&[]);
        assert_eq!(app.screen(), Screen::Title);
        app.apply_action(Action::Up);
        assert_eq!(app.cursor, Coord::new(0, 0));

        app.apply_action(Action::Start);
        assert_eq!(app.screen(), Screen::Playing);
        let now = Instant::now();
        app.pump_events(now);
        assert_eq!(app.mascot.speech(now), Some("Good luck!"));
    }

    #[test]
    fn test_restart_ignored_on_title() {
        let mut app = app(&[]);
        app.apply_action(Action::Restart);
        assert_eq!(app.screen(), Screen::Title);
        app.apply_action(Action::Select);
        app.apply_action(Action::Right);
        assert_eq!(app.cursor, Coord::new(0, 1));
        app.apply_action(Action::Restart);
        assert_eq!(app.screen(), Screen::Playing);
        assert_eq!(app.session.score(), 0);
    }
}
