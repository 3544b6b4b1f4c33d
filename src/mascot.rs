//! The mascot's speech bubble: short throttled cheers driven by game events.

use matchtui::GameEvent;
use rand::Rng;
use rand::seq::SliceRandom;
use std::time::{Duration, Instant};

/// A new line is dropped if the previous one appeared less than this ago.
const MIN_GAP: Duration = Duration::from_secs(2);
/// How long a line stays up.
const VISIBLE_FOR: Duration = Duration::from_secs(3);

const START_LINE: &str = "Good luck!";
const END_LINE: &str = "Good work!";
const MATCH_LINES: [&str; 4] = ["Nice!", "Amazing!", "Keep it up!", "Great!"];

#[derive(Debug, Default)]
pub struct Mascot {
    line: Option<(&'static str, Instant)>,
}

impl Mascot {
    /// React to one event. Only starts, clears and ends make the mascot talk.
    pub fn observe(&mut self, event: &GameEvent, now: Instant, rng: &mut impl Rng) {
        let line = match event {
            GameEvent::SessionStarted { .. } => START_LINE,
            GameEvent::SessionEnded { .. } => END_LINE,
            GameEvent::TilesCleared { .. } => MATCH_LINES.choose(rng).copied().unwrap_or("Nice!"),
            _ => return,
        };
        self.say(line, now);
    }

    /// Show `line` unless the last line is younger than [`MIN_GAP`].
    pub fn say(&mut self, line: &'static str, now: Instant) {
        if let Some((_, at)) = self.line {
            if now.saturating_duration_since(at) < MIN_GAP {
                return;
            }
        }
        self.line = Some((line, now));
    }

    /// Current line, if still visible at `now`.
    pub fn speech(&self, now: Instant) -> Option<&'static str> {
        self.line
            .filter(|(_, at)| now.saturating_duration_since(*at) < VISIBLE_FOR)
            .map(|(line, _)| line)
    }
}
