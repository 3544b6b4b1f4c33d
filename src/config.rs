//! Static game configuration.

use crate::error::GameError;
use crate::matcher::MIN_RUN;
use crate::tile::TileColor;

/// Largest board side accepted.
pub const MAX_SIDE: usize = 12;
/// Boards with a side longer than this need every colour in play.
const COMPACT_SIDE: usize = 8;

/// Board and scoring parameters for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    /// Number of colours in play, taken from the front of [`TileColor::ALL`].
    pub color_count: usize,
    /// Probability in `[0, 1]` that a generated tile is special.
    pub special_chance: f64,
    /// Points per ordinary tile cleared.
    pub match_score: u32,
    /// Points per special tile cleared.
    pub special_score: u32,
    pub session_duration_secs: u32,
    /// Upper bound on clear/drop/refill iterations for one cascade.
    pub max_cascade_steps: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            color_count: TileColor::ALL.len(),
            special_chance: 0.05,
            match_score: 10,
            special_score: 50,
            session_duration_secs: 60,
            max_cascade_steps: 100,
        }
    }
}

impl GameConfig {
    /// Fewest colours that keep cascades on this board size short. With fewer,
    /// refills keep landing in new runs and cascades run into the step cap.
    pub fn min_colors(&self) -> usize {
        let side = self.rows.max(self.cols);
        if side < MIN_RUN {
            1
        } else if side <= COMPACT_SIDE {
            4
        } else {
            TileColor::ALL.len()
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        let fail = |msg: String| Err(GameError::InvalidConfig(msg));
        if self.rows == 0 || self.cols == 0 || self.rows > MAX_SIDE || self.cols > MAX_SIDE {
            return fail(format!(
                "grid sides must be in 1..={MAX_SIDE}, got {}x{}",
                self.rows, self.cols
            ));
        }
        let min_colors = self.min_colors();
        if self.color_count < min_colors || self.color_count > TileColor::ALL.len() {
            return fail(format!(
                "color_count must be in {min_colors}..={} for a {}x{} board, got {}",
                TileColor::ALL.len(),
                self.rows,
                self.cols,
                self.color_count
            ));
        }
        if !(0.0..=1.0).contains(&self.special_chance) {
            return fail(format!(
                "special_chance must be in [0, 1], got {}",
                self.special_chance
            ));
        }
        if self.session_duration_secs == 0 {
            return fail("session duration must be at least one second".to_string());
        }
        if self.max_cascade_steps == 0 {
            return fail("max_cascade_steps must be positive".to_string());
        }
        Ok(())
    }
}
