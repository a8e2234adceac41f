//! Speech output adapters

use std::io::Write;

use async_trait::async_trait;

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use crate::Result;

/// Strip markdown artifacts the model likes to emit
///
/// Only `#` and `*` are removed; everything else is spoken as-is.
#[must_use]
pub fn clean_for_speech(text: &str) -> String {
    text.chars().filter(|c| *c != '#' && *c != '*').collect()
}

/// Speaks text to the user, returning when done
#[async_trait(?Send)]
pub trait SpeechOutput {
    /// Speak already-cleaned text
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&mut self, text: &str) -> Result<()>;
}

/// Cloud TTS played through the local speaker
pub struct VoiceOutput {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl VoiceOutput {
    /// Open the speaker
    ///
    /// # Errors
    ///
    /// Returns error if no output device is usable
    pub fn new(tts: TextToSpeech) -> Result<Self> {
        Ok(Self {
            tts,
            playback: AudioPlayback::new()?,
        })
    }
}

#[async_trait(?Send)]
impl SpeechOutput for VoiceOutput {
    async fn speak(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        tracing::debug!(text, "speaking");
        let audio = self.tts.synthesize(text).await?;
        self.playback.play_mp3(&audio)
    }
}

/// Prints replies to standard output
pub struct ConsoleOutput {
    label: String,
}

impl ConsoleOutput {
    /// Print each reply prefixed with `label> `
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_lowercase(),
        }
    }
}

#[async_trait(?Send)]
impl SpeechOutput for ConsoleOutput {
    async fn speak(&mut self, text: &str) -> Result<()> {
        let mut stdout = std::io::stdout();
        writeln!(stdout, "{}> {text}", self.label)?;
        stdout.flush()?;
        Ok(())
    }
}
