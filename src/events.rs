//! Notifications for the presentation and audio collaborators.

use crate::cascade::CascadePhase;
use crate::grid::{Coord, TileMove};
use crate::tile::Tile;

/// A tile removed by a clear step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearedTile {
    pub at: Coord,
    pub tile: Tile,
}

/// State changes, in the order they happened. `step` counts cascade
/// iterations from 1 within one resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    SessionStarted {
        duration_secs: u32,
    },
    TileSelected {
        at: Coord,
    },
    SelectionCleared,
    Swapped {
        a: Coord,
        b: Coord,
    },
    /// The swap made no run and was undone.
    SwapReverted {
        a: Coord,
        b: Coord,
    },
    TilesCleared {
        step: u32,
        tiles: Vec<ClearedTile>,
        score_delta: u32,
    },
    TilesDropped {
        step: u32,
        moves: Vec<TileMove>,
    },
    TilesSpawned {
        step: u32,
        tiles: Vec<(Coord, Tile)>,
    },
    /// Board is match-free again after `steps` iterations.
    Settled {
        steps: u32,
    },
    ScoreChanged {
        score: u32,
    },
    ClockTicked {
        remaining: u32,
    },
    SessionEnded {
        final_score: u32,
        faulted: bool,
    },
}

impl GameEvent {
    /// Sound cue for this event, if any.
    pub fn audio_trigger(&self) -> Option<AudioTrigger> {
        match self {
            Self::SessionStarted { .. } => Some(AudioTrigger::SessionStart),
            Self::TileSelected { .. } => Some(AudioTrigger::Select),
            Self::TilesCleared { .. } => Some(AudioTrigger::Match),
            Self::SessionEnded { .. } => Some(AudioTrigger::SessionEnd),
            _ => None,
        }
    }

    /// Cascade stage that produced this event, for per-step events.
    pub fn cascade_phase(&self) -> Option<CascadePhase> {
        match self {
            Self::TilesCleared { .. } => Some(CascadePhase::Clearing),
            Self::TilesDropped { .. } => Some(CascadePhase::Dropping),
            Self::TilesSpawned { .. } => Some(CascadePhase::Refilling),
            _ => None,
        }
    }
}

/// The one sound vocabulary shared by every audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioTrigger {
    Select,
    Match,
    SessionStart,
    SessionEnd,
}

/// Fire-and-forget sound output.
pub trait AudioSink {
    fn play(&mut self, trigger: AudioTrigger);
}

/// Forward every audio cue in `events` to `sink`.
pub fn dispatch_audio<'a>(
    events: impl IntoIterator<Item = &'a GameEvent>,
    sink: &mut impl AudioSink,
) {
    for trigger in events.into_iter().filter_map(GameEvent::audio_trigger) {
        sink.play(trigger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<AudioTrigger>);

    impl AudioSink for Recorder {
        fn play(&mut self, trigger: AudioTrigger) {
            self.0.push(trigger);
        }
    }

    #[test]
    fn test_dispatch_maps_events_to_triggers() {
        let events = vec![
            GameEvent::SessionStarted { duration_secs: 60 },
            GameEvent::TileSelected {
                at: Coord::new(0, 0),
            },
            GameEvent::ClockTicked { remaining: 59 },
            GameEvent::TilesCleared {
                step: 1,
                tiles: vec![],
                score_delta: 30,
            },
            GameEvent::Settled { steps: 1 },
            GameEvent::SessionEnded {
                final_score: 30,
                faulted: false,
            },
        ];
        let mut sink = Recorder::default();
        dispatch_audio(&events, &mut sink);
        assert_eq!(
            sink.0,
            vec![
                AudioTrigger::SessionStart,
                AudioTrigger::Select,
                AudioTrigger::Match,
                AudioTrigger::SessionEnd,
            ]
        );
    }

    #[test]
    fn test_step_events_carry_their_phase() {
        let step_events = [
            GameEvent::TilesCleared {
                step: 1,
                tiles: vec![],
                score_delta: 0,
            },
            GameEvent::TilesDropped {
                step: 1,
                moves: vec![],
            },
            GameEvent::TilesSpawned {
                step: 1,
                tiles: vec![],
            },
        ];
        let phases: Vec<_> = step_events.iter().filter_map(GameEvent::cascade_phase).collect();
        assert_eq!(
            phases,
            [CascadePhase::Clearing, CascadePhase::Dropping, CascadePhase::Refilling]
        );
        assert_eq!(GameEvent::Settled { steps: 1 }.cascade_phase(), None);
        assert_eq!(GameEvent::SelectionCleared.cascade_phase(), None);
    }
}
