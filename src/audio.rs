//! Terminal bell as the audio backend.

use matchtui::{AudioSink, AudioTrigger};
use std::io::{Stdout, Write};
use tracing::{debug, warn};

const BEL: &[u8] = b"\x07";

/// Rings the bell on matches and at the end of a session when enabled.
/// Every cue is logged either way.
pub struct TerminalAudio<W: Write = Stdout> {
    out: W,
    bell: bool,
}

impl TerminalAudio {
    pub fn new(bell: bool) -> Self {
        Self::with_writer(std::io::stdout(), bell)
    }
}

impl<W: Write> TerminalAudio<W> {
    pub fn with_writer(out: W, bell: bool) -> Self {
        Self { out, bell }
    }
}

impl<W: Write> AudioSink for TerminalAudio<W> {
    fn play(&mut self, trigger: AudioTrigger) {
        debug!(?trigger, "audio cue");
        if !self.bell || !matches!(trigger, AudioTrigger::Match | AudioTrigger::SessionEnd) {
            return;
        }
        if let Err(e) = self.out.write_all(BEL).and_then(|()| self.out.flush()) {
            warn!(error = %e, "bell write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bell_rings_only_on_match_and_end() {
        let mut audio = TerminalAudio::with_writer(Vec::new(), true);
        for t in [
            AudioTrigger::SessionStart,
            AudioTrigger::Select,
            AudioTrigger::Match,
            AudioTrigger::SessionEnd,
        ] {
            audio.play(t);
        }
        assert_eq!(audio.out, b"\x07\x07");
    }

    #[test]
    fn test_silent_without_flag() {
        let mut audio = TerminalAudio::with_writer(Vec::new(), false);
        audio.play(AudioTrigger::Match);
        assert!(audio.out.is_empty());
    }
}
