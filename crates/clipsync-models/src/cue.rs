//! Caption cues: one on-screen line with per-word reveal and highlight timing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Absolute time interval `[start, end)` during which a word is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HighlightWindow {
    pub start: f64,
    pub end: f64,
}

impl HighlightWindow {
    /// Create a new highlight window.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Whether `time` falls inside the window.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}

/// A word placed on a caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CueWord {
    /// Word text
    pub text: String,
    /// Spoken start time in seconds
    pub start: f64,
    /// Visible end time in seconds (at least the minimum visible duration)
    pub end: f64,
    /// Seconds after the cue start at which this word appears
    pub reveal_offset: f64,
    /// Highlight interval for keywords, `None` for ordinary words
    pub highlight: Option<HighlightWindow>,
}

impl CueWord {
    /// Whether this word carries a highlight.
    pub fn is_highlighted(&self) -> bool {
        self.highlight.is_some()
    }
}

/// One caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Cue {
    /// Position of the cue in the timeline
    pub index: usize,
    /// Start time in seconds (first word's start)
    pub start: f64,
    /// End time in seconds (last word's visible end)
    pub end: f64,
    /// Words in reading order
    pub words: Vec<CueWord>,
}

impl Cue {
    /// Line text with words joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// On-screen duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the cue is on screen at `time`.
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    /// Words already revealed at `time`.
    pub fn revealed_at(&self, time: f64) -> impl Iterator<Item = &CueWord> {
        let offset = time - self.start;
        self.words.iter().filter(move |w| w.reveal_offset <= offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start: f64, end: f64, cue_start: f64) -> CueWord {
        CueWord {
            text: text.to_string(),
            start,
            end,
            reveal_offset: start - cue_start,
            highlight: None,
        }
    }

    #[test]
    fn test_text_and_reveal() {
        let cue = Cue {
            index: 0,
            start: 1.0,
            end: 2.0,
            words: vec![word("stop", 1.0, 1.3, 1.0), word("scrolling", 1.4, 2.0, 1.0)],
        };

        assert_eq!(cue.text(), "stop scrolling");
        assert_eq!(cue.revealed_at(1.2).count(), 1);
        assert_eq!(cue.revealed_at(1.4).count(), 2);
        assert!(cue.is_active_at(1.0));
        assert!(!cue.is_active_at(2.0));
    }
}
