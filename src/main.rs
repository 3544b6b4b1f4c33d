//! Matchtui — match-three tile puzzle in the terminal.

mod app;
mod audio;
mod input;
mod mascot;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use matchtui::{GameConfig, GameSession, TileFactory};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        rows: args.rows,
        cols: args.cols,
        color_count: args.colors,
        special_chance: args.special_chance,
        session_duration_secs: args.duration,
        ..GameConfig::default()
    };
    let source = match args.seed {
        Some(seed) => TileFactory::seeded(seed, config.color_count, config.special_chance),
        None => TileFactory::from_entropy(config.color_count, config.special_chance),
    };
    let session = GameSession::new(config, source).context("invalid game settings")?;
    let mut app = App::new(args, session, theme);
    app.run()?;
    Ok(())
}

/// Logs go to a file so they never land on the alternate screen.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Match-three tile puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "matchtui",
    version,
    about = "Match-three tile puzzle in the terminal. Swap neighbours to line up three or more of a colour before the clock runs out.",
    long_about = "Matchtui is a terminal match-three game.\n\n\
        Select a tile, then an orthogonal neighbour to swap them. A swap that lines up three or \
        more tiles of one colour clears them; tiles above fall and new ones drop in. Starred \
        tiles are special: when they are part of a line, every tile of their colour clears.\n\n\
        CONTROLS:\n  Arrows/hjkl  Move cursor    Space/Enter  Select tile    Mouse  Click tile\n  \
        S/Enter      Start          R            Restart        Q / Esc  Quit"
)]
pub struct Args {
    /// Board rows (1-12).
    #[arg(long, default_value = "8", value_name = "N")]
    pub rows: usize,

    /// Board columns (1-12).
    #[arg(long, default_value = "8", value_name = "N")]
    pub cols: usize,

    /// Number of tile colours in play (4-6; a board side over 8 needs all 6).
    #[arg(long, default_value = "6", value_name = "N")]
    pub colors: usize,

    /// Chance that a new tile is special, 0.0-1.0.
    #[arg(long, default_value = "0.05", value_name = "P")]
    pub special_chance: f64,

    /// Session length in seconds.
    #[arg(short, long, default_value = "60", value_name = "SECS")]
    pub duration: u32,

    /// Seed for the tile generator (reproducible boards).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the clear flash animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Skip the title screen and start immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Ring the terminal bell on matches and when time is up.
    #[arg(long)]
    pub bell: bool,

    /// Write logs to this file (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
