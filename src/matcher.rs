//! Run detection: horizontal and vertical runs of three or more tiles of one
//! base colour, plus colour-wide clears triggered by special tiles.

use crate::grid::{Coord, Grid};
use crate::tile::TileColor;
use std::collections::BTreeSet;

/// Shortest line of same-coloured tiles that clears.
pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// One maximal straight run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: Coord,
    pub len: usize,
    pub axis: Axis,
    pub color: TileColor,
}

impl Run {
    pub fn cells(&self) -> impl Iterator<Item = Coord> + use<> {
        let Run {
            start, len, axis, ..
        } = *self;
        (0..len).map(move |i| match axis {
            Axis::Horizontal => Coord::new(start.row, start.col + i),
            Axis::Vertical => Coord::new(start.row + i, start.col),
        })
    }
}

/// Result of one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    /// Every matched cell, once.
    pub cells: BTreeSet<Coord>,
    pub runs: Vec<Run>,
    /// Colours cleared board-wide because a special tile sat in a run.
    pub special_colors: BTreeSet<TileColor>,
}

impl MatchSet {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, at: Coord) -> bool {
        self.cells.contains(&at)
    }
}

/// Scan `grid` and collect every cell that clears this pass.
///
/// Colour-wide clears come only from specials sitting in runs found on this
/// board; tiles added by the clear itself are not scanned again this pass.
pub fn find_matches(grid: &Grid) -> MatchSet {
    let mut set = MatchSet::default();

    for row in 0..grid.rows() {
        scan_line(grid, Coord::new(row, 0), Axis::Horizontal, &mut set);
    }
    for col in 0..grid.cols() {
        scan_line(grid, Coord::new(0, col), Axis::Vertical, &mut set);
    }

    for run in &set.runs {
        if run.cells().any(|c| grid.get(c).is_some_and(|t| t.special)) {
            set.special_colors.insert(run.color);
        }
    }
    if !set.special_colors.is_empty() {
        for at in grid.coords() {
            if let Some(tile) = grid.get(at) {
                if set.special_colors.contains(&tile.color) {
                    set.cells.insert(at);
                }
            }
        }
    }
    set
}

/// Walk one row or column, recording each maximal run once and skipping past
/// it so interior start points never re-trigger.
fn scan_line(grid: &Grid, origin: Coord, axis: Axis, set: &mut MatchSet) {
    let len = match axis {
        Axis::Horizontal => grid.cols(),
        Axis::Vertical => grid.rows(),
    };
    let at = |i: usize| match axis {
        Axis::Horizontal => Coord::new(origin.row, i),
        Axis::Vertical => Coord::new(i, origin.col),
    };

    let mut i = 0;
    while i + MIN_RUN <= len {
        let Some(color) = grid.get(at(i)).map(|t| t.color) else {
            i += 1;
            continue;
        };
        let mut end = i + 1;
        while end < len && grid.get(at(end)).is_some_and(|t| t.color == color) {
            end += 1;
        }
        if end - i >= MIN_RUN {
            let run = Run {
                start: at(i),
                len: end - i,
                axis,
                color,
            };
            set.cells.extend(run.cells());
            set.runs.push(run);
        }
        i = end;
    }
}
