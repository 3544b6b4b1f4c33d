//! Matchtui core: the match-three rules engine.
//!
//! A [`GameSession`] owns an 8x8 (configurable) [`Grid`] of coloured tiles.
//! Swapping two adjacent tiles is kept only if it lines up three or more of a
//! colour; the [`CascadeEngine`] then clears, drops and refills until the board
//! is match-free again. Special tiles in a run clear their whole colour.
//!
//! Everything here is synchronous. Presentation and audio layers read the
//! board through [`GameSession::grid`] and consume [`GameEvent`]s from
//! [`GameSession::drain_events`]; a scheduler calls [`GameSession::tick`] once
//! per second.

pub mod cascade;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod matcher;
pub mod session;
pub mod tile;

pub use cascade::{CascadeEngine, CascadePhase, CascadeReport};
pub use config::GameConfig;
pub use error::GameError;
pub use events::{AudioSink, AudioTrigger, ClearedTile, GameEvent, dispatch_audio};
pub use grid::{Coord, Grid, TileMove};
pub use matcher::{MatchSet, Run, find_matches};
pub use session::{GameSession, MoveOutcome, SelectOutcome, SessionClock, SessionState};
pub use tile::{Tile, TileColor, TileFactory, TileSource};
