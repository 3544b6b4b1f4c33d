//! Error kinds for the match engine.

use crate::grid::Coord;
use thiserror::Error;

/// Everything that can go wrong while driving a board.
///
/// `InvalidMove` and `OutOfBounds` are ordinary rejections: the board is left
/// untouched and the caller carries on. `CascadeDivergence` is a logic fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("tiles {from} and {to} are not orthogonally adjacent")]
    InvalidMove { from: Coord, to: Coord },
    #[error("coordinate {at} is outside the {rows}x{cols} grid")]
    OutOfBounds { at: Coord, rows: usize, cols: usize },
    #[error("cascade did not settle within {limit} steps")]
    CascadeDivergence { limit: u32 },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl GameError {
    /// True for errors that end the session instead of just rejecting a move.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::CascadeDivergence { .. })
    }
}
