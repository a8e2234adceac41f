//! Wake word and exit phrase matching
//!
//! Plain case-insensitive substring containment against a tiny vocabulary.
//! There is no tokenization and no fuzzy matching: "lamination" contains the
//! wake word "lami", and that is accepted.

use super::SessionState;
use crate::{Error, Result};

/// What a recognized utterance means to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utterance {
    /// Contains the agent's name
    WakeWord,
    /// Contains one of the exit phrases
    ExitPhrase,
    /// Anything else worth answering
    Question(String),
    /// Nothing usable was captured
    Unrecognized,
}

/// Matches transcripts against the wake word and exit phrases
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    wake_word: String,
    exit_phrases: Vec<String>,
}

impl PhraseMatcher {
    /// Create a matcher
    ///
    /// Both vocabularies are trimmed and lowercased; blank exit phrases are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the wake word is blank
    pub fn new(wake_word: &str, exit_phrases: Vec<String>) -> Result<Self> {
        let wake_word = wake_word.trim().to_lowercase();
        if wake_word.is_empty() {
            return Err(Error::Config("wake word must not be empty".to_string()));
        }

        let exit_phrases: Vec<String> = exit_phrases
            .into_iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        tracing::debug!(wake_word = %wake_word, exit_phrases = ?exit_phrases, "phrase matcher initialized");

        Ok(Self {
            wake_word,
            exit_phrases,
        })
    }

    /// Normalized wake word
    #[must_use]
    pub fn wake_word(&self) -> &str {
        &self.wake_word
    }

    /// Normalized exit phrases
    #[must_use]
    pub fn exit_phrases(&self) -> &[String] {
        &self.exit_phrases
    }

    /// Check if the transcript contains the wake word
    #[must_use]
    pub fn contains_wake_word(&self, transcript: &str) -> bool {
        transcript.to_lowercase().contains(&self.wake_word)
    }

    /// Return the first exit phrase contained in the transcript
    #[must_use]
    pub fn find_exit_phrase(&self, transcript: &str) -> Option<&str> {
        let normalized = transcript.to_lowercase();
        self.exit_phrases
            .iter()
            .find(|p| normalized.contains(p.as_str()))
            .map(String::as_str)
    }

    /// Classify a transcript for the given session state
    ///
    /// While dormant the wake word wins. While active exit phrases win, and
    /// an utterance that is only the wake word again maps to `WakeWord`; if
    /// more follows the wake word, that remainder becomes the question.
    #[must_use]
    pub fn classify(&self, state: SessionState, transcript: &str) -> Utterance {
        let text = transcript.trim();
        if text.is_empty() {
            return Utterance::Unrecognized;
        }

        match state {
            SessionState::Dormant => {
                if self.contains_wake_word(text) {
                    Utterance::WakeWord
                } else if self.find_exit_phrase(text).is_some() {
                    Utterance::ExitPhrase
                } else {
                    Utterance::Question(text.to_string())
                }
            }
            SessionState::Active => {
                if self.find_exit_phrase(text).is_some() {
                    Utterance::ExitPhrase
                } else if self.contains_wake_word(text) {
                    let rest = self.strip_wake_word(text);
                    if rest.is_empty() {
                        Utterance::WakeWord
                    } else {
                        Utterance::Question(rest)
                    }
                } else {
                    Utterance::Question(text.to_string())
                }
            }
        }
    }

    /// Remove the wake word and whatever leads up to it
    ///
    /// "hey lami, what's the time" becomes "what's the time". Matching is
    /// done char by char on the original text so offsets stay valid when
    /// lowercasing changes byte lengths.
    fn strip_wake_word(&self, transcript: &str) -> String {
        self.wake_word_end(transcript).map_or_else(
            || transcript.to_string(),
            |end| {
                transcript[end..]
                    .trim_start_matches(|c: char| {
                        c.is_whitespace() || c == ',' || c == '.' || c == '!' || c == '?'
                    })
                    .trim_end()
                    .to_string()
            },
        )
    }

    /// Byte offset just past the first case-insensitive wake word match
    fn wake_word_end(&self, transcript: &str) -> Option<usize> {
        for (start, _) in transcript.char_indices() {
            let mut lowered = String::new();
            for (offset, c) in transcript[start..].char_indices() {
                lowered.extend(c.to_lowercase());
                if !self.wake_word.starts_with(lowered.as_str()) {
                    break;
                }
                if lowered.len() == self.wake_word.len() {
                    return Some(start + offset + c.len_utf8());
                }
            }
        }
        None
    }
}
