//! The clear, drop, refill loop that runs after every accepted move.

use crate::config::GameConfig;
use crate::error::GameError;
use crate::events::{ClearedTile, GameEvent};
use crate::grid::Grid;
use crate::matcher::{MatchSet, find_matches};
use crate::tile::TileSource;
use tracing::{debug, error};

/// Stage of a cascade step. Each per-step event belongs to one, see
/// [`GameEvent::cascade_phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadePhase {
    Clearing,
    Dropping,
    Refilling,
}

/// Summary of one full cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CascadeReport {
    /// Clear/drop/refill iterations. Zero means the first scan found nothing.
    pub steps: u32,
    pub score: u32,
    pub tiles_cleared: u32,
}

#[derive(Debug, Clone)]
pub struct CascadeEngine {
    match_score: u32,
    special_score: u32,
    max_steps: u32,
}

impl CascadeEngine {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            match_score: config.match_score,
            special_score: config.special_score,
            max_steps: config.max_cascade_steps,
        }
    }

    /// Points for clearing `matches` on `grid`: one award per coordinate,
    /// special rate for special tiles.
    pub fn score(&self, matches: &MatchSet, grid: &Grid) -> u32 {
        matches
            .cells
            .iter()
            .filter_map(|&at| grid.get(at))
            .map(|t| {
                if t.special {
                    self.special_score
                } else {
                    self.match_score
                }
            })
            .sum()
    }

    /// Scan and resolve until the board is settled, pushing per-step events.
    ///
    /// Refill can keep producing runs, so the loop is capped; hitting the cap is
    /// reported as [`GameError::CascadeDivergence`].
    pub fn run_cycle(
        &self,
        grid: &mut Grid,
        source: &mut impl TileSource,
        events: &mut Vec<GameEvent>,
    ) -> Result<CascadeReport, GameError> {
        let mut report = CascadeReport::default();
        loop {
            let matches = find_matches(grid);
            if matches.is_empty() {
                break;
            }
            if report.steps >= self.max_steps {
                error!(limit = self.max_steps, "cascade did not settle");
                return Err(GameError::CascadeDivergence {
                    limit: self.max_steps,
                });
            }
            report.steps += 1;
            let step = report.steps;

            let score_delta = self.score(&matches, grid);
            let mut tiles = Vec::with_capacity(matches.len());
            for &at in &matches.cells {
                if let Some(tile) = grid.get(at) {
                    tiles.push(ClearedTile { at, tile });
                    grid.set(at, None)?;
                }
            }
            report.score += score_delta;
            report.tiles_cleared += tiles.len() as u32;
            debug!(
                step,
                cleared = tiles.len(),
                score_delta,
                specials = matches.special_colors.len(),
                "cascade step"
            );
            events.push(GameEvent::TilesCleared {
                step,
                tiles,
                score_delta,
            });

            let moves = grid.compact();
            events.push(GameEvent::TilesDropped { step, moves });

            let spawned = grid.fill_empties(source);
            events.push(GameEvent::TilesSpawned {
                step,
                tiles: spawned,
            });
        }
        if report.steps > 0 {
            events.push(GameEvent::Settled {
                steps: report.steps,
            });
        }
        Ok(report)
    }
}
