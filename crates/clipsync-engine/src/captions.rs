//! Caption cue building.
//!
//! Groups transcript words into on-screen lines and assigns each word its
//! reveal offset and, for keywords, a highlight window. A line closes when
//! it is full, when the next word would make it too long, or when the
//! speaker pauses longer than the silence threshold. With a positive
//! visibility floor every cue ends strictly after it starts.

use std::collections::HashSet;

use clipsync_models::{Cue, CueWord, HighlightWindow, Transcript, Word};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Hook words that get highlighted even when the transcriber did not flag them.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "secret",
    "truth",
    "never",
    "always",
    "money",
    "million",
    "dollar",
    "free",
    "important",
    "critical",
    "key",
    "must",
    "stop",
    "wait",
    "listen",
    "warning",
    "danger",
    "amazing",
    "incredible",
    "insane",
    "crazy",
    "game-changer",
];

/// Case-insensitive set of words to emphasize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordLexicon {
    words: HashSet<String>,
}

impl KeywordLexicon {
    /// Build a lexicon from arbitrary words.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| normalize(w.as_ref()))
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Lexicon of common hook words.
    pub fn hook_words() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }

    /// Whether `text` matches an entry, ignoring case and surrounding punctuation.
    pub fn matches(&self, text: &str) -> bool {
        !self.words.is_empty() && self.words.contains(&normalize(text))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Lowercase and strip leading/trailing punctuation.
fn normalize(text: &str) -> String {
    text.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Builds the caption cue sequence for one clip.
#[derive(Debug, Clone)]
pub struct CaptionTimelineBuilder {
    max_words: usize,
    max_line_duration: f64,
    silence_break: f64,
    min_visible: f64,
    lexicon: Option<KeywordLexicon>,
}

impl CaptionTimelineBuilder {
    /// Create a builder from engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_words: config.max_words_per_line.max(1),
            max_line_duration: config.max_line_duration_seconds,
            silence_break: config.silence_break_seconds,
            min_visible: config.min_word_visible_seconds,
            lexicon: None,
        }
    }

    /// Also highlight words found in `lexicon`.
    pub fn with_lexicon(mut self, lexicon: KeywordLexicon) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    /// Build cues from a transcript.
    pub fn build_transcript(&self, transcript: &Transcript) -> EngineResult<Vec<Cue>> {
        self.build(&transcript.words)
    }

    /// Build cues from clip-relative words.
    ///
    /// Fails with [`EngineError::MalformedTranscript`] on the first word
    /// whose end precedes its start or whose times are not finite. Nothing
    /// is built in that case.
    pub fn build(&self, words: &[Word]) -> EngineResult<Vec<Cue>> {
        for (index, word) in words.iter().enumerate() {
            if !(word.start.is_finite() && word.end.is_finite()) || word.end < word.start {
                return Err(EngineError::MalformedTranscript {
                    index,
                    start: word.start,
                    end: word.end,
                });
            }
        }

        if words.is_empty() {
            return Ok(Vec::new());
        }

        let mut ordered: Vec<&Word> = words.iter().collect();
        ordered.sort_by(|a, b| a.start.total_cmp(&b.start));

        let lines = self.group_lines(&ordered);
        let mut cues = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let next_start = lines.get(index + 1).map(|next| next[0].start);
            cues.push(self.build_cue(index, line, next_start));
        }

        debug!(
            words = words.len(),
            cues = cues.len(),
            "Built caption cues"
        );

        Ok(cues)
    }

    /// Split start-ordered words into lines.
    ///
    /// Words starting at the same instant as the line's first word always
    /// join it, so every line starts strictly after the previous one.
    fn group_lines<'a>(&self, ordered: &[&'a Word]) -> Vec<Vec<&'a Word>> {
        let mut lines: Vec<Vec<&'a Word>> = Vec::new();
        let mut current: Vec<&'a Word> = Vec::new();
        let mut line_end = f64::NEG_INFINITY;

        for &word in ordered {
            if let Some(first) = current.first() {
                let full = current.len() >= self.max_words;
                let too_long = word.end - first.start > self.max_line_duration;
                let pause = word.start - line_end > self.silence_break;
                if word.start > first.start && (full || too_long || pause) {
                    lines.push(std::mem::take(&mut current));
                    line_end = f64::NEG_INFINITY;
                }
            }
            line_end = line_end.max(word.end);
            current.push(word);
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    /// Seconds a word stays visible, stretched up to the floor.
    fn display_end(&self, word: &Word) -> f64 {
        if word.end - word.start < self.min_visible {
            word.start + self.min_visible
        } else {
            word.end
        }
    }

    fn is_emphasized(&self, word: &Word) -> bool {
        word.is_keyword
            || self
                .lexicon
                .as_ref()
                .is_some_and(|lexicon| lexicon.matches(&word.text))
    }

    fn build_cue(&self, index: usize, line: &[&Word], next_start: Option<f64>) -> Cue {
        let start = line[0].start;
        let natural_end = line
            .iter()
            .map(|w| self.display_end(w))
            .fold(start, f64::max);
        let end = match next_start {
            Some(next) => natural_end.min(next).max(start),
            None => natural_end,
        };

        let words = line
            .iter()
            .map(|word| {
                let visible_end = self.display_end(word).min(end).max(word.start);
                let highlight = self
                    .is_emphasized(word)
                    .then(|| HighlightWindow::new(word.start, visible_end));
                CueWord {
                    text: word.text.clone(),
                    start: word.start,
                    end: visible_end,
                    reveal_offset: word.start - start,
                    highlight,
                }
            })
            .collect();

        Cue {
            index,
            start,
            end,
            words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> CaptionTimelineBuilder {
        CaptionTimelineBuilder::new(&EngineConfig::default())
    }

    #[test]
    fn test_empty_transcript_no_cues() {
        assert!(builder().build(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_two_words_one_cue_with_highlight() {
        let config = EngineConfig {
            max_words_per_line: 5,
            ..Default::default()
        };
        let words = vec![Word::new("hello", 0.0, 0.5), Word::keyword("world", 0.6, 1.0)];
        let cues = CaptionTimelineBuilder::new(&config).build(&words).unwrap();

        assert_eq!(cues.len(), 1);
        let cue = &cues[0];
        assert_eq!(cue.start, 0.0);
        assert_eq!(cue.end, 1.0);
        assert!(cue.words[0].highlight.is_none());
        assert_eq!(cue.words[1].highlight, Some(HighlightWindow::new(0.6, 1.0)));
        assert_eq!(cue.words[1].reveal_offset, 0.6);
    }

    #[test]
    fn test_reversed_word_rejected() {
        let words = vec![Word::new("ok", 0.0, 0.5), Word::new("bad", 2.0, 1.5)];
        let err = builder().build(&words).unwrap_err();
        assert_eq!(
            err,
            EngineError::MalformedTranscript {
                index: 1,
                start: 2.0,
                end: 1.5
            }
        );
    }

    #[test]
    fn test_max_words_breaks_line() {
        let words: Vec<Word> = (0..6)
            .map(|i| Word::new(format!("w{i}"), i as f64 * 0.25, i as f64 * 0.25 + 0.2))
            .collect();
        let cues = builder().build(&words).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].words.len(), 4);
        assert_eq!(cues[1].words.len(), 2);
        assert_eq!(cues[1].start, 1.0);
    }

    #[test]
    fn test_silence_breaks_line() {
        let words = vec![Word::new("before", 0.0, 0.5), Word::new("after", 1.5, 2.0)];
        let cues = builder().build(&words).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].end, 0.5);
        assert_eq!(cues[1].start, 1.5);
    }

    #[test]
    fn test_line_duration_breaks_line() {
        let config = EngineConfig {
            max_line_duration_seconds: 1.0,
            ..Default::default()
        };
        let words = vec![
            Word::new("a", 0.0, 0.5),
            Word::new("b", 0.5, 0.75),
            Word::new("c", 0.75, 1.25),
        ];
        let cues = CaptionTimelineBuilder::new(&config).build(&words).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1].text(), "c");
    }

    #[test]
    fn test_long_single_word_still_forms_cue() {
        let config = EngineConfig {
            max_line_duration_seconds: 1.0,
            ..Default::default()
        };
        let cues = CaptionTimelineBuilder::new(&config)
            .build(&[Word::new("looooong", 0.0, 3.0)])
            .unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].end, 3.0);
    }

    #[test]
    fn test_zero_duration_word_gets_floor() {
        let cues = builder().build(&[Word::new("uh", 1.0, 1.0)]).unwrap();
        assert_eq!(cues[0].start, 1.0);
        assert!((cues[0].end - 1.1).abs() < 1e-12);
        assert!((cues[0].words[0].end - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_floor_never_overlaps_next_cue() {
        let config = EngineConfig {
            max_words_per_line: 1,
            min_word_visible_seconds: 0.5,
            ..Default::default()
        };
        let words = vec![Word::new("a", 0.0, 0.0), Word::new("b", 0.25, 0.5)];
        let cues = CaptionTimelineBuilder::new(&config).build(&words).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].end, 0.25);
        assert!(cues[0].end <= cues[1].start);
    }

    #[test]
    fn test_unsorted_words_are_ordered() {
        let words = vec![Word::new("second", 0.5, 0.75), Word::new("first", 0.0, 0.25)];
        let cues = builder().build(&words).unwrap();
        assert_eq!(cues[0].text(), "first second");
        assert_eq!(cues[0].start, 0.0);
    }

    #[test]
    fn test_lexicon_highlights_hook_words() {
        let builder = builder().with_lexicon(KeywordLexicon::hook_words());
        let words = vec![Word::new("The", 0.0, 0.25), Word::new("SECRET,", 0.25, 0.5)];
        let cues = builder.build(&words).unwrap();

        assert!(!cues[0].words[0].is_highlighted());
        assert!(cues[0].words[1].is_highlighted());
    }

    #[test]
    fn test_same_start_words_share_a_line() {
        let config = EngineConfig {
            max_words_per_line: 1,
            ..Default::default()
        };
        let words = vec![Word::new("we", 0.5, 0.9), Word::new("both", 0.5, 0.7)];
        let cues = CaptionTimelineBuilder::new(&config).build(&words).unwrap();

        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].words.len(), 2);
        assert_eq!((cues[0].start, cues[0].end), (0.5, 0.9));
    }

    #[test]
    fn test_cues_always_have_positive_duration() {
        let config = EngineConfig {
            max_words_per_line: 1,
            min_word_visible_seconds: 0.05,
            ..Default::default()
        };
        let words = vec![
            Word::new("uh", 1.0, 1.0),
            Word::new("so", 1.0, 1.0),
            Word::new("then", 1.02, 1.02),
            Word::new("yes", 2.0, 2.5),
        ];
        let cues = CaptionTimelineBuilder::new(&config).build(&words).unwrap();

        for cue in &cues {
            assert!(cue.end > cue.start, "cue {} is empty", cue.index);
        }
        for pair in cues.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_pause_measured_from_latest_word_end() {
        // "long" is still being spoken when "short" ends, so there is no pause
        // before "next" even though it starts 0.8s after "short" ends
        let words = vec![
            Word::new("long", 0.0, 1.5),
            Word::new("short", 0.25, 0.5),
            Word::new("next", 1.3, 1.6),
        ];
        let cues = builder().build(&words).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text(), "long short next");
    }

    #[test]
    fn test_sliced_transcript_keeps_reversed_word_error() {
        let transcript = Transcript::new(vec![
            Word::new("uh", 11.0, 11.0),
            Word::new("bad", 12.0, 11.5),
        ]);
        let err = builder()
            .build_transcript(&transcript.slice(10.0, 20.0))
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedTranscript { index: 1, .. }));
    }

    #[test]
    fn test_sliced_zero_length_word_gets_floor() {
        let transcript = Transcript::new(vec![Word::new("uh", 11.0, 11.0)]);
        let cues = builder()
            .build_transcript(&transcript.slice(10.0, 20.0))
            .unwrap();
        assert_eq!(cues.len(), 1);
        assert!((cues[0].end - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_lexicon_normalizes() {
        let lexicon = KeywordLexicon::new(["Money"]);
        assert!(lexicon.matches("money!"));
        assert!(lexicon.matches("\"MONEY\""));
        assert!(!lexicon.matches("monkey"));
        assert!(KeywordLexicon::hook_words().matches("game-changer"));
    }
}
