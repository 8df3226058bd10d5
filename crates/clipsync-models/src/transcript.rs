//! Word-level transcript as produced by the speech-to-text collaborator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single transcribed word with timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Word {
    /// Word text as transcribed
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (`end >= start` for well-formed input)
    pub end: f64,
    /// Whether the word should be highlighted as a keyword
    #[serde(default, alias = "emphasis")]
    pub is_keyword: bool,
}

impl Word {
    /// Create a plain (non-keyword) word.
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            is_keyword: false,
        }
    }

    /// Create a keyword word.
    pub fn keyword(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            is_keyword: true,
            ..Self::new(text, start, end)
        }
    }

    /// Spoken duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// An ordered word sequence for one source video or clip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Transcript {
    pub words: Vec<Word>,
}

impl Transcript {
    /// Wrap a word list.
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when there are no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Extract the words spoken inside `[start, end)` of the source video,
    /// rebased to clip-relative seconds.
    ///
    /// Words that straddle a boundary are kept and clipped to the window.
    /// Zero-length words are kept when they fall inside the window. Reversed
    /// words (`end < start`) that begin inside the window are rebased without
    /// clipping so caption building still rejects them. Text is trimmed and
    /// words left empty are dropped, as are words whose timing is not finite.
    pub fn slice(&self, start: f64, end: f64) -> Transcript {
        let duration = end - start;
        if !duration.is_finite() || duration <= 0.0 {
            return Transcript::default();
        }

        let words = self
            .words
            .iter()
            .filter(|w| w.start.is_finite() && w.end.is_finite())
            .filter(|w| {
                if w.end > w.start {
                    w.end > start && w.start < end
                } else {
                    w.start >= start && w.start < end
                }
            })
            .filter_map(|w| {
                let text = w.text.trim();
                if text.is_empty() {
                    return None;
                }
                let (rel_start, rel_end) = if w.end < w.start {
                    (w.start - start, w.end - start)
                } else {
                    ((w.start - start).max(0.0), (w.end - start).min(duration))
                };
                Some(Word {
                    text: text.to_string(),
                    start: rel_start,
                    end: rel_end,
                    is_keyword: w.is_keyword,
                })
            })
            .collect();

        Transcript { words }
    }
}

impl From<Vec<Word>> for Transcript {
    fn from(words: Vec<Word>) -> Self {
        Self::new(words)
    }
}
