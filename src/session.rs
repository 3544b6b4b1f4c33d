//! Session state machine: countdown, selection, swap validation, scoring.

use crate::cascade::{CascadeEngine, CascadeReport};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::events::GameEvent;
use crate::grid::{Coord, Grid};
use crate::tile::{TileFactory, TileSource};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Pre-game board on display; moves ignored.
    Idle,
    /// Clock running; moves accepted.
    Running,
    /// Clock ran out, or the cascade faulted.
    Ended { faulted: bool },
}

/// Whole seconds left in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    duration: u32,
    remaining: u32,
}

impl SessionClock {
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn reset(&mut self) {
        self.remaining = self.duration;
    }

    /// Count down one second. True when this tick reached zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }
}

/// What a swap attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Session not running; nothing happened.
    Ignored,
    /// Swap made no run and was undone.
    Reverted,
    /// Swap matched and the cascade settled.
    Resolved(CascadeReport),
}

/// What a tile click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Ignored,
    Selected(Coord),
    Deselected,
    Moved(MoveOutcome),
}

/// One play session. Owns the board, score, clock and pending selection.
#[derive(Debug)]
pub struct GameSession<S = TileFactory> {
    config: GameConfig,
    source: S,
    engine: CascadeEngine,
    grid: Grid,
    state: SessionState,
    selection: Option<Coord>,
    score: u32,
    clock: SessionClock,
    events: Vec<GameEvent>,
}

impl<S: TileSource> GameSession<S> {
    /// Validate `config` and build a settled pre-game board.
    pub fn new(config: GameConfig, mut source: S) -> Result<Self, GameError> {
        config.validate()?;
        let engine = CascadeEngine::new(&config);
        let grid = settled_board(&config, &engine, &mut source)?;
        let clock = SessionClock::new(config.session_duration_secs);
        Ok(Self {
            config,
            source,
            engine,
            grid,
            state: SessionState::Idle,
            selection: None,
            score: 0,
            clock,
            events: Vec::new(),
        })
    }

    /// Session over an existing board, still Idle. The board is used as given
    /// until the next [`GameSession::start`].
    pub fn with_grid(config: GameConfig, source: S, grid: Grid) -> Result<Self, GameError> {
        config.validate()?;
        if grid.rows() != config.rows || grid.cols() != config.cols {
            return Err(GameError::InvalidConfig(format!(
                "grid is {}x{} but config wants {}x{}",
                grid.rows(),
                grid.cols(),
                config.rows,
                config.cols
            )));
        }
        Ok(Self {
            engine: CascadeEngine::new(&config),
            clock: SessionClock::new(config.session_duration_secs),
            config,
            source,
            grid,
            state: SessionState::Idle,
            selection: None,
            score: 0,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn selection(&self) -> Option<Coord> {
        self.selection
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a fresh session from any state. Old undrained events are dropped.
    ///
    /// The new board is settled before play; the settle awards no score.
    pub fn start(&mut self) -> Result<(), GameError> {
        self.events.clear();
        self.selection = None;
        self.score = 0;
        self.clock.reset();
        self.grid = match settled_board(&self.config, &self.engine, &mut self.source) {
            Ok(grid) => grid,
            Err(e) => {
                self.fault();
                return Err(e);
            }
        };
        self.state = SessionState::Running;
        info!(
            rows = self.config.rows,
            cols = self.config.cols,
            duration = self.clock.duration(),
            "session started"
        );
        self.events.push(GameEvent::SessionStarted {
            duration_secs: self.clock.duration(),
        });
        Ok(())
    }

    /// Click on a tile. First click selects, clicking it again deselects,
    /// clicking another tile tries a swap and always clears the selection.
    pub fn select_tile(&mut self, at: Coord) -> Result<SelectOutcome, GameError> {
        if !self.is_running() {
            return Ok(SelectOutcome::Ignored);
        }
        if !self.grid.in_bounds(at) {
            return Err(GameError::OutOfBounds {
                at,
                rows: self.grid.rows(),
                cols: self.grid.cols(),
            });
        }
        self.events.push(GameEvent::TileSelected { at });
        match self.selection.take() {
            None => {
                self.selection = Some(at);
                Ok(SelectOutcome::Selected(at))
            }
            Some(pending) if pending == at => {
                self.events.push(GameEvent::SelectionCleared);
                Ok(SelectOutcome::Deselected)
            }
            Some(pending) => {
                self.events.push(GameEvent::SelectionCleared);
                self.attempt_swap(pending, at).map(SelectOutcome::Moved)
            }
        }
    }

    /// Swap two adjacent tiles and resolve. A swap that makes no run is undone.
    pub fn attempt_swap(&mut self, a: Coord, b: Coord) -> Result<MoveOutcome, GameError> {
        if !self.is_running() {
            return Ok(MoveOutcome::Ignored);
        }
        self.grid.swap(a, b)?;
        self.events.push(GameEvent::Swapped { a, b });

        let report = match self
            .engine
            .run_cycle(&mut self.grid, &mut self.source, &mut self.events)
        {
            Ok(report) => report,
            Err(e) => {
                self.fault();
                return Err(e);
            }
        };

        if report.steps == 0 {
            self.grid.swap(a, b)?;
            debug!(%a, %b, "swap reverted");
            self.events.push(GameEvent::SwapReverted { a, b });
            return Ok(MoveOutcome::Reverted);
        }

        self.score += report.score;
        self.events.push(GameEvent::ScoreChanged { score: self.score });
        Ok(MoveOutcome::Resolved(report))
    }

    /// One second of real time. Ends the session when the clock hits zero.
    pub fn tick(&mut self) {
        if !self.is_running() {
            return;
        }
        let expired = self.clock.tick();
        self.events.push(GameEvent::ClockTicked {
            remaining: self.clock.remaining(),
        });
        if expired {
            self.end(false);
        }
    }

    fn fault(&mut self) {
        warn!(score = self.score, "session ended by cascade fault");
        self.end(true);
    }

    fn end(&mut self, faulted: bool) {
        self.state = SessionState::Ended { faulted };
        self.selection = None;
        info!(score = self.score, faulted, "session ended");
        self.events.push(GameEvent::SessionEnded {
            final_score: self.score,
            faulted,
        });
    }
}

/// Fresh run-free board, passed once through the cascade before play. Events
/// and score from the settle are discarded.
fn settled_board(
    config: &GameConfig,
    engine: &CascadeEngine,
    source: &mut impl TileSource,
) -> Result<Grid, GameError> {
    let mut grid = Grid::fresh(config.rows, config.cols, config.color_count, source);
    let mut discarded = Vec::new();
    let report = engine.run_cycle(&mut grid, source, &mut discarded)?;
    debug!(steps = report.steps, "initial board settled");
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::find_matches;
    use crate::tile::{Tile, TileColor};
    use std::collections::VecDeque;

    const SCENARIO: &str = "
        RRBGBGYP
        BGYPORBG
        GYPORBGY
        YPORBGYP
        PORBGYPO
        ORBGYPOR
        RBGYPORB
        BGYPORBG";

    fn scripted(codes: &str) -> impl FnMut() -> Tile {
        let mut queue: VecDeque<Tile> = codes.chars().filter_map(Tile::from_code).collect();
        move || queue.pop_front().unwrap_or(Tile::new(TileColor::Orange))
    }

    /// Running session on the scenario board, refills drawn from `refill`.
    fn running(refill: &str) -> GameSession<impl FnMut() -> Tile> {
        let grid = Grid::parse(SCENARIO).unwrap();
        let mut s = GameSession::with_grid(GameConfig::default(), scripted(refill), grid).unwrap();
        s.state = SessionState::Running;
        s
    }

    #[test]
    fn test_new_board_is_settled_and_idle() {
        let s = GameSession::new(GameConfig::default(), TileFactory::seeded(9, 6, 0.05)).unwrap();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(find_matches(s.grid()).is_empty());
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn test_start_board_has_no_runs_and_awards_nothing() {
        // The pre-game board takes tiles 1..=64 and has no runs; start() then
        // draws three reds for the top-left cells and the third is recoloured.
        let mut n = 0usize;
        let source = move || {
            n += 1;
            if (65..=67).contains(&n) {
                Tile::new(TileColor::Red)
            } else {
                Tile::new(TileColor::ALL[(n * 5) % 6])
            }
        };
        let mut s = GameSession::new(GameConfig::default(), source).unwrap();
        s.start().unwrap();
        assert!(s.is_running());
        assert_eq!(s.score(), 0);
        assert!(find_matches(s.grid()).is_empty());
        assert_eq!(s.grid().to_string().lines().next().map(|l| &l[..3]), Some("RRB"));
        let events = s.drain_events();
        assert_eq!(
            events,
            vec![GameEvent::SessionStarted { duration_secs: 60 }]
        );
    }

    #[test]
    fn test_every_valid_config_builds_a_session() {
        let sizes = [(1, 1), (2, 2), (1, 8), (3, 3), (4, 7), (8, 8), (12, 12), (5, 12)];
        for (rows, cols) in sizes {
            for color_count in 1..=6 {
                for special_chance in [0.0, 0.05, 1.0] {
                    let config = GameConfig {
                        rows,
                        cols,
                        color_count,
                        special_chance,
                        ..GameConfig::default()
                    };
                    if config.validate().is_err() {
                        continue;
                    }
                    for seed in 0..20 {
                        let source = TileFactory::seeded(seed, color_count, special_chance);
                        let mut s = GameSession::new(config.clone(), source)
                            .unwrap_or_else(|e| panic!("{config:?} seed {seed}: {e}"));
                        assert!(find_matches(s.grid()).is_empty());
                        s.start()
                            .unwrap_or_else(|e| panic!("{config:?} seed {seed}: {e}"));
                        assert!(find_matches(s.grid()).is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn test_select_same_tile_twice_deselects() {
        let mut s = running("");
        let before = s.grid().clone();
        let at = Coord::new(2, 2);
        assert_eq!(s.select_tile(at), Ok(SelectOutcome::Selected(at)));
        assert_eq!(s.selection(), Some(at));
        assert_eq!(s.select_tile(at), Ok(SelectOutcome::Deselected));
        assert_eq!(s.selection(), None);
        assert_eq!(s.grid(), &before);
    }

    fn small_running(refill: &str) -> GameSession<impl FnMut() -> Tile> {
        let config = GameConfig {
            rows: 4,
            cols: 4,
            ..GameConfig::default()
        };
        let grid = Grid::parse(
            "RBRG
             BRGY
             GYBP
             YPOB",
        )
        .unwrap();
        let mut s = GameSession::with_grid(config, scripted(refill), grid).unwrap();
        s.state = SessionState::Running;
        s
    }

    #[test]
    fn test_matching_swap_scores_and_settles() {
        let mut s = small_running("OPY");
        let out = s.attempt_swap(Coord::new(0, 1), Coord::new(1, 1)).unwrap();
        let MoveOutcome::Resolved(report) = out else {
            panic!("expected a resolved move, got {out:?}");
        };
        assert_eq!(report.steps, 1);
        assert_eq!(report.score, 30);
        assert_eq!(s.score(), 30);
        assert_eq!(s.grid().to_string(), "OPYG\nBBGY\nGYBP\nYPOB\n");
        assert!(find_matches(s.grid()).is_empty());

        let events = s.drain_events();
        assert_eq!(
            events.first(),
            Some(&GameEvent::Swapped {
                a: Coord::new(0, 1),
                b: Coord::new(1, 1)
            })
        );
        assert_eq!(events.last(), Some(&GameEvent::ScoreChanged { score: 30 }));
    }

    #[test]
    fn test_two_clicks_perform_the_swap() {
        let mut s = small_running("OPY");
        assert_eq!(
            s.select_tile(Coord::new(0, 1)),
            Ok(SelectOutcome::Selected(Coord::new(0, 1)))
        );
        let out = s.select_tile(Coord::new(1, 1)).unwrap();
        assert!(matches!(out, SelectOutcome::Moved(MoveOutcome::Resolved(_))));
        assert_eq!(s.selection(), None);
        assert_eq!(s.score(), 30);
    }

    #[test]
    fn test_reverted_swap_restores_board() {
        let mut s = running("");
        let before = s.grid().clone();
        let out = s.attempt_swap(Coord::new(4, 4), Coord::new(4, 5)).unwrap();
        assert_eq!(out, MoveOutcome::Reverted);
        assert_eq!(s.grid(), &before);
        let events = s.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], GameEvent::SwapReverted { .. }));
    }

    #[test]
    fn test_non_adjacent_swap_is_invalid_and_harmless() {
        let mut s = running("");
        let before = s.grid().clone();
        let err = s
            .attempt_swap(Coord::new(0, 0), Coord::new(5, 5))
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidMove { .. }));
        assert_eq!(s.grid(), &before);
        assert!(s.is_running());
    }

    #[test]
    fn test_select_out_of_bounds() {
        let mut s = running("");
        assert!(matches!(
            s.select_tile(Coord::new(8, 0)),
            Err(GameError::OutOfBounds { .. })
        ));
        assert_eq!(s.selection(), None);
    }

    #[test]
    fn test_second_click_far_away_clears_selection() {
        let mut s = running("");
        s.select_tile(Coord::new(0, 0)).unwrap();
        assert!(s.select_tile(Coord::new(5, 5)).is_err());
        assert_eq!(s.selection(), None);
    }

    #[test]
    fn test_clicks_ignored_when_idle() {
        let grid = Grid::parse(SCENARIO).unwrap();
        let mut s = GameSession::with_grid(GameConfig::default(), scripted(""), grid).unwrap();
        assert_eq!(s.select_tile(Coord::new(0, 0)), Ok(SelectOutcome::Ignored));
        assert_eq!(s.selection(), None);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_clock_ends_session_exactly_once() {
        let mut s = running("");
        for _ in 0..59 {
            s.tick();
        }
        assert!(s.is_running());
        assert_eq!(s.clock().remaining(), 1);
        s.tick();
        assert_eq!(s.state(), SessionState::Ended { faulted: false });
        s.tick();
        s.tick();
        let ended = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::SessionEnded { .. }))
            .count();
        assert_eq!(ended, 1);
        assert_eq!(s.select_tile(Coord::new(0, 0)), Ok(SelectOutcome::Ignored));
    }

    #[test]
    fn test_tick_while_idle_is_noop() {
        let grid = Grid::parse(SCENARIO).unwrap();
        let mut s = GameSession::with_grid(GameConfig::default(), scripted(""), grid).unwrap();
        s.tick();
        assert_eq!(s.clock().remaining(), 60);
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_divergence_ends_session_with_fault() {
        let config = GameConfig {
            rows: 3,
            cols: 3,
            max_cascade_steps: 4,
            ..GameConfig::default()
        };
        let grid = Grid::parse("RGR\nGRB\nRBR").unwrap();
        let always_red = || Tile::new(TileColor::Red);
        let mut s = GameSession::with_grid(config, always_red, grid).unwrap();
        s.state = SessionState::Running;
        // Swapping (1,1) R with (1,2) B lines up reds in column 2.
        let err = s
            .attempt_swap(Coord::new(1, 1), Coord::new(1, 2))
            .unwrap_err();
        assert_eq!(err, GameError::CascadeDivergence { limit: 4 });
        assert_eq!(s.state(), SessionState::Ended { faulted: true });
        assert!(s.drain_events().contains(&GameEvent::SessionEnded {
            final_score: 0,
            faulted: true
        }));
        assert_eq!(
            s.attempt_swap(Coord::new(0, 0), Coord::new(0, 1)),
            Ok(MoveOutcome::Ignored)
        );
    }

    #[test]
    fn test_restart_resets_state() {
        let mut s = GameSession::new(GameConfig::default(), TileFactory::seeded(5, 6, 0.05)).unwrap();
        s.start().unwrap();
        s.score = 120;
        s.select_tile(Coord::new(1, 1)).unwrap();
        s.tick();
        s.start().unwrap();
        assert_eq!(s.score(), 0);
        assert_eq!(s.selection(), None);
        assert_eq!(s.clock().remaining(), 60);
        assert_eq!(
            s.drain_events(),
            vec![GameEvent::SessionStarted { duration_secs: 60 }]
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GameConfig {
            special_chance: -0.1,
            ..GameConfig::default()
        };
        assert!(GameSession::new(config, TileFactory::seeded(1, 6, 0.0)).is_err());
    }
}
