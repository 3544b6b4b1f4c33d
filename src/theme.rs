//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use matchtui::TileColor;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark tile colours, in [`TileColor::ALL`] order.
const ONEDARK_TILES: [Color; 6] = [
    Color::Rgb(0xE0, 0x6C, 0x75), // red
    Color::Rgb(0x61, 0xAF, 0xEF), // blue
    Color::Rgb(0x98, 0xC3, 0x79), // green
    Color::Rgb(0xE5, 0xC0, 0x7B), // yellow
    Color::Rgb(0xC6, 0x78, 0xDD), // purple
    Color::Rgb(0xD1, 0x9A, 0x66), // orange
];

/// Tile and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Tile colours, indexed by [`TileColor::index`].
    pub tiles: [Color; 6],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, timer).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Dimmed board while no session is running.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    pub fn onedark_default() -> Self {
        Self {
            tiles: ONEDARK_TILES,
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override tile colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.tiles = [
                    Color::Rgb(0xFF, 0x00, 0x00),
                    Color::Rgb(0x00, 0x88, 0xFF),
                    Color::Rgb(0x00, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x00, 0xFF),
                    Color::Rgb(0xFF, 0x88, 0x00),
                ];
            }
            Palette::Colorblind => {
                // Tol "vibrant" set: no red/green pair carries meaning alone.
                self.tiles = [
                    Color::Rgb(0xCC, 0x33, 0x11),
                    Color::Rgb(0x00, 0x77, 0xBB),
                    Color::Rgb(0x00, 0x99, 0x88),
                    Color::Rgb(0xBB, 0xBB, 0x00),
                    Color::Rgb(0xEE, 0x33, 0x77),
                    Color::Rgb(0xEE, 0x77, 0x33),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str]| keys.iter().find_map(|k| map.get(*k).and_then(|v| parse_hex(v).ok()));
        let base = Self::onedark_default();
        let tile_keys: [&[&str]; 6] = [
            &["cpu_end", "temp_end"],
            &["cpu_box"],
            &["mem_box", "cpu_start"],
            &["title", "cpu_mid"],
            &["net_box"],
            &["proc_misc", "temp_mid"],
        ];
        let mut tiles = base.tiles;
        for (slot, keys) in tiles.iter_mut().zip(tile_keys) {
            if let Some(c) = get(keys) {
                *slot = c;
            }
        }
        Self {
            tiles,
            bg: get(&["meter_bg"]).unwrap_or(base.bg),
            div_line: get(&["div_line"]).unwrap_or(base.div_line),
            main_fg: get(&["main_fg"]).unwrap_or(base.main_fg),
            title: get(&["title"]).unwrap_or(base.title),
            inactive_fg: get(&["inactive_fg"]).unwrap_or(base.inactive_fg),
        }
    }

    #[inline]
    pub fn tile_color(&self, color: TileColor) -> Color {
        self.tiles[color.index()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some((key, rest)) = stripped.split_once(']') else {
            continue;
        };
        if let Some((_, value)) = rest.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.trim().to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(bad)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(bad()),
    }
}
