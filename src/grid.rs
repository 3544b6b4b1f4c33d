//! The tile grid: cell access, adjacency, swap, gravity and refill.

use crate::error::GameError;
use crate::matcher::MIN_RUN;
use crate::tile::{Tile, TileColor, TileSource};
use std::fmt;

/// Board coordinate. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Orthogonal neighbours only: Manhattan distance exactly 1.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A tile that gravity moved from one cell to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileMove {
    pub from: Coord,
    pub to: Coord,
}

/// Fixed-size grid of tiles. `None` is an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// Row-major: index = row * cols + col.
    cells: Vec<Option<Tile>>,
}

impl Grid {
    /// All-empty grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    /// Grid with every cell drawn from `source`, row-major.
    pub fn filled(rows: usize, cols: usize, source: &mut impl TileSource) -> Self {
        let mut grid = Self::new(rows, cols);
        grid.fill_empties(source);
        grid
    }

    /// Grid drawn from `source` row-major with no run already on it. A drawn
    /// tile that would complete a run is recoloured to the next free colour
    /// among the first `color_count`; its special flag is kept. With fewer
    /// than three colours that may be impossible, and the tile stays as drawn.
    pub fn fresh(
        rows: usize,
        cols: usize,
        color_count: usize,
        source: &mut impl TileSource,
    ) -> Self {
        let mut grid = Self::new(rows, cols);
        let palette = &TileColor::ALL[..color_count.clamp(1, TileColor::ALL.len())];
        for at in grid.coords() {
            let mut tile = source.next_tile();
            let blocked = [grid.run_color_before(at, 0, 1), grid.run_color_before(at, 1, 0)];
            if blocked.contains(&Some(tile.color)) {
                let start = palette.iter().position(|&c| c == tile.color).unwrap_or(0);
                let free = (1..=palette.len())
                    .map(|k| palette[(start + k) % palette.len()])
                    .find(|&c| !blocked.contains(&Some(c)));
                if let Some(color) = free {
                    tile.color = color;
                }
            }
            grid.cells[at.row * cols + at.col] = Some(tile);
        }
        grid
    }

    /// Colour shared by the `MIN_RUN - 1` tiles just before `at`, stepping
    /// back by (`dr`, `dc`).
    fn run_color_before(&self, at: Coord, dr: usize, dc: usize) -> Option<TileColor> {
        let back = MIN_RUN - 1;
        if at.row < back * dr || at.col < back * dc {
            return None;
        }
        let mut color = None;
        for k in 1..=back {
            let tile = self.get(Coord::new(at.row - k * dr, at.col - k * dc))?;
            match color {
                None => color = Some(tile.color),
                Some(c) if c == tile.color => {}
                Some(_) => return None,
            }
        }
        color
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn in_bounds(&self, at: Coord) -> bool {
        at.row < self.rows && at.col < self.cols
    }

    fn check(&self, at: Coord) -> Result<usize, GameError> {
        if self.in_bounds(at) {
            Ok(at.row * self.cols + at.col)
        } else {
            Err(GameError::OutOfBounds {
                at,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Tile at `at`; `None` for empty or out-of-range cells.
    #[inline]
    pub fn get(&self, at: Coord) -> Option<Tile> {
        self.check(at).ok().and_then(|i| self.cells[i])
    }

    pub fn set(&mut self, at: Coord, tile: Option<Tile>) -> Result<(), GameError> {
        let i = self.check(at)?;
        self.cells[i] = tile;
        Ok(())
    }

    /// Every coordinate, row-major.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Coord::new(row, col)))
    }

    /// Exchange two orthogonally adjacent cells. Both change or neither does.
    pub fn swap(&mut self, a: Coord, b: Coord) -> Result<(), GameError> {
        let ia = self.check(a)?;
        let ib = self.check(b)?;
        if !a.is_adjacent(b) {
            return Err(GameError::InvalidMove { from: a, to: b });
        }
        self.cells.swap(ia, ib);
        Ok(())
    }

    /// Per column, slide tiles down over empties keeping their order; empties
    /// end up at the top. Returns the tiles that moved.
    pub fn compact(&mut self) -> Vec<TileMove> {
        let mut moves = Vec::new();
        for col in 0..self.cols {
            let mut write = self.rows;
            for row in (0..self.rows).rev() {
                let from = row * self.cols + col;
                if let Some(tile) = self.cells[from] {
                    write -= 1;
                    if write != row {
                        self.cells[write * self.cols + col] = Some(tile);
                        self.cells[from] = None;
                        moves.push(TileMove {
                            from: Coord::new(row, col),
                            to: Coord::new(write, col),
                        });
                    }
                }
            }
        }
        moves
    }

    /// Put a fresh tile in every empty cell, row-major. Returns what was placed.
    pub fn fill_empties(&mut self, source: &mut impl TileSource) -> Vec<(Coord, Tile)> {
        let mut spawned = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let cell = &mut self.cells[row * self.cols + col];
                if cell.is_none() {
                    let tile = source.next_tile();
                    *cell = Some(tile);
                    spawned.push((Coord::new(row, col), tile));
                }
            }
        }
        spawned
    }

    pub fn empty_cells(&self) -> Vec<Coord> {
        self.coords().filter(|&c| self.get(c).is_none()).collect()
    }

    /// Parse a grid from one line per row of tile codes (see [`Tile::code`]),
    /// `.` for empty. Whitespace between cells is ignored.
    pub fn parse(s: &str) -> Result<Self, GameError> {
        let rows: Vec<Vec<Option<Tile>>> = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|line| {
                line.chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| match c {
                        '.' => Ok(None),
                        c => Tile::from_code(c).map(Some).ok_or_else(|| {
                            GameError::InvalidConfig(format!("unknown tile code {c:?}"))
                        }),
                    })
                    .collect()
            })
            .collect::<Result<_, _>>()?;
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(GameError::InvalidConfig("ragged grid rows".to_string()));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let c = self.get(Coord::new(row, col)).map_or('.', |t| t.code());
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::find_matches;
    use crate::tile::{TileColor, TileFactory};
    use proptest::prelude::*;

    #[test]
    fn test_adjacency_is_orthogonal() {
        let c = Coord::new(3, 3);
        assert!(c.is_adjacent(Coord::new(2, 3)));
        assert!(c.is_adjacent(Coord::new(3, 4)));
        assert!(!c.is_adjacent(Coord::new(4, 4)));
        assert!(!c.is_adjacent(c));
        assert!(!c.is_adjacent(Coord::new(3, 5)));
    }

    #[test]
    fn test_fresh_grid_recolours_would_be_runs() {
        let mut always_red = || Tile::special(TileColor::Red);
        let g = Grid::fresh(4, 5, 3, &mut always_red);
        assert!(find_matches(&g).is_empty());
        assert_eq!(g.to_string(), "rrbrr\nrrbrr\nbbrbb\nrrbrr\n");
    }

    #[test]
    fn test_fresh_grid_without_room_for_other_colours_keeps_draws() {
        let mut always_red = || Tile::new(TileColor::Red);
        let g = Grid::fresh(1, 3, 1, &mut always_red);
        assert_eq!(g.to_string(), "RRR\n");
    }

    #[test]
    fn test_get_out_of_bounds_is_none() {
        let g = Grid::parse("RB\nGY").unwrap();
        assert_eq!(g.get(Coord::new(1, 1)), Some(Tile::new(TileColor::Yellow)));
        assert_eq!(g.get(Coord::new(2, 0)), None);
        assert!(matches!(
            Grid::new(2, 2).set(Coord::new(0, 9), None),
            Err(GameError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_non_adjacent_swap_is_rejected_and_grid_unchanged() {
        let mut g = Grid::filled(8, 8, &mut TileFactory::seeded(3, 6, 0.1));
        let before = g.clone();
        let err = g.swap(Coord::new(0, 0), Coord::new(5, 5)).unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidMove {
                from: Coord::new(0, 0),
                to: Coord::new(5, 5)
            }
        );
        assert_eq!(g, before);
    }

    #[test]
    fn test_swap_out_of_bounds() {
        let mut g = Grid::parse("RB\nGY").unwrap();
        let before = g.clone();
        assert!(matches!(
            g.swap(Coord::new(1, 1), Coord::new(1, 2)),
            Err(GameError::OutOfBounds { .. })
        ));
        assert_eq!(g, before);
    }

    #[test]
    fn test_compact_keeps_order_and_lifts_empties() {
        let mut g = Grid::parse(
            "R.
             .B
             G.
             .Y",
        )
        .unwrap();
        let moves = g.compact();
        assert_eq!(g.to_string(), "..\n..\nRB\nGY\n");
        assert_eq!(moves.len(), 3);
        assert!(moves.contains(&TileMove {
            from: Coord::new(2, 0),
            to: Coord::new(3, 0)
        }));
    }

    #[test]
    fn test_compact_full_column_is_noop() {
        let mut g = Grid::parse("RB\nGY").unwrap();
        assert!(g.compact().is_empty());
        assert_eq!(g.to_string(), "RB\nGY\n");
    }

    #[test]
    fn test_fill_empties_only_touches_empty_cells() {
        let mut g = Grid::parse("R.\n.Y").unwrap();
        let mut src = || Tile::special(TileColor::Orange);
        let spawned = g.fill_empties(&mut src);
        assert_eq!(g.to_string(), "Ro\noY\n");
        assert_eq!(
            spawned.iter().map(|(c, _)| *c).collect::<Vec<_>>(),
            vec![Coord::new(0, 1), Coord::new(1, 0)]
        );
        assert!(g.empty_cells().is_empty());
    }

    #[test]
    fn test_parse_rejects_ragged() {
        assert!(Grid::parse("RB\nG").is_err());
        assert!(Grid::parse("RX").is_err());
    }

    proptest! {
        #[test]
        fn prop_swap_twice_restores_grid(
            seed in any::<u64>(),
            row in 0usize..8,
            col in 0usize..8,
            dir in 0usize..4,
        ) {
            let mut g = Grid::filled(8, 8, &mut TileFactory::seeded(seed, 6, 0.2));
            let a = Coord::new(row, col);
            let b = match dir {
                0 => Coord::new(row.wrapping_sub(1), col),
                1 => Coord::new(row + 1, col),
                2 => Coord::new(row, col.wrapping_sub(1)),
                _ => Coord::new(row, col + 1),
            };
            let before = g.clone();
            if g.swap(a, b).is_ok() {
                g.swap(a, b).unwrap();
            }
            prop_assert_eq!(g, before);
        }

        #[test]
        fn prop_compact_leaves_no_gaps(seed in any::<u64>(), holes in proptest::collection::vec((0usize..8, 0usize..8), 0..20)) {
            let mut g = Grid::filled(8, 8, &mut TileFactory::seeded(seed, 6, 0.0));
            for (r, c) in holes {
                g.set(Coord::new(r, c), None).unwrap();
            }
            let count = 64 - g.empty_cells().len();
            g.compact();
            prop_assert_eq!(64 - g.empty_cells().len(), count);
            for col in 0..8 {
                let mut seen_tile = false;
                for row in 0..8 {
                    let filled = g.get(Coord::new(row, col)).is_some();
                    prop_assert!(!(seen_tile && !filled), "gap below a tile in column {}", col);
                    seen_tile |= filled;
                }
            }
        }
    }
}
