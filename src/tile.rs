//! Tiles and tile generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Base colour of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TileColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl TileColor {
    pub const ALL: [Self; 6] = [
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Yellow,
        Self::Purple,
        Self::Orange,
    ];

    /// Index into [`TileColor::ALL`] (and into palette arrays).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// One-letter code: R B G Y P O.
    pub fn letter(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Blue => 'B',
            Self::Green => 'G',
            Self::Yellow => 'Y',
            Self::Purple => 'P',
            Self::Orange => 'O',
        }
    }

    /// Inverse of [`TileColor::letter`]; case-insensitive.
    pub fn from_letter(c: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|color| color.letter() == c.to_ascii_uppercase())
    }
}

impl fmt::Display for TileColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Orange => "orange",
        };
        f.write_str(name)
    }
}

/// A tile value. Replaced wholesale on change, never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub color: TileColor,
    /// Special tiles clear every tile of their colour when part of a run.
    pub special: bool,
}

impl Tile {
    pub const fn new(color: TileColor) -> Self {
        Self {
            color,
            special: false,
        }
    }

    pub const fn special(color: TileColor) -> Self {
        Self {
            color,
            special: true,
        }
    }

    /// Compact code: colour letter, lowercase when special.
    pub fn code(&self) -> char {
        if self.special {
            self.color.letter().to_ascii_lowercase()
        } else {
            self.color.letter()
        }
    }

    /// Inverse of [`Tile::code`].
    pub fn from_code(c: char) -> Option<Self> {
        let color = TileColor::from_letter(c)?;
        Some(Self {
            color,
            special: c.is_ascii_lowercase(),
        })
    }
}

/// Anything that can hand out fresh tiles for refills.
pub trait TileSource {
    fn next_tile(&mut self) -> Tile;
}

impl<F: FnMut() -> Tile> TileSource for F {
    fn next_tile(&mut self) -> Tile {
        self()
    }
}

/// Random tiles: uniform over the first `color_count` colours, special with
/// probability `special_chance`.
#[derive(Debug, Clone)]
pub struct TileFactory {
    rng: StdRng,
    color_count: usize,
    special_chance: f64,
}

impl TileFactory {
    pub fn new(rng: StdRng, color_count: usize, special_chance: f64) -> Self {
        Self {
            rng,
            color_count: color_count.clamp(1, TileColor::ALL.len()),
            special_chance: if special_chance.is_nan() {
                0.0
            } else {
                special_chance.clamp(0.0, 1.0)
            },
        }
    }

    pub fn seeded(seed: u64, color_count: usize, special_chance: f64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), color_count, special_chance)
    }

    pub fn from_entropy(color_count: usize, special_chance: f64) -> Self {
        Self::new(StdRng::from_entropy(), color_count, special_chance)
    }
}

impl TileSource for TileFactory {
    fn next_tile(&mut self) -> Tile {
        let color = TileColor::ALL[self.rng.gen_range(0..self.color_count)];
        let special = self.rng.gen_bool(self.special_chance);
        Tile { color, special }
    }
}
