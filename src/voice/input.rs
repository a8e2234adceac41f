//! Speech capture adapters
//!
//! A [`SpeechInput`] produces one [`Recognition`] per call: either text or a
//! tagged reason why nothing usable was heard.

use std::io::Write;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use super::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use super::detector::SpeechDetector;
use super::stt::SpeechToText;
use crate::{Error, Result};

/// How often the microphone buffer is drained while listening
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of one capture attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    /// Speech was transcribed
    Text(String),
    /// No speech started within the listen timeout
    Timeout,
    /// Speech was captured but nothing could be transcribed
    NotUnderstood,
    /// The recognition service failed
    ServiceError(String),
}

impl Recognition {
    /// Recognized text, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Source of recognized utterances
///
/// Not `Send`: audio streams are tied to the thread that opened them.
#[async_trait(?Send)]
pub trait SpeechInput {
    /// Wait for the next utterance
    ///
    /// Capture problems are reported as [`Recognition`] variants, never as
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] once the source is exhausted, or an
    /// audio error if the device is gone
    async fn listen(&mut self) -> Result<Recognition>;
}

/// Listen until text is recognized, giving up after `max_attempts`
///
/// Returns the last failed recognition when every attempt fails.
///
/// # Errors
///
/// Propagates errors from the input source itself
pub async fn listen_with_retry(
    input: &mut dyn SpeechInput,
    max_attempts: u32,
) -> Result<Recognition> {
    let attempts = max_attempts.max(1);
    let mut last = Recognition::Timeout;

    for attempt in 1..=attempts {
        last = input.listen().await?;
        match &last {
            Recognition::Text(text) => {
                tracing::info!(attempt, heard = %text, "recognized speech");
                return Ok(last);
            }
            Recognition::Timeout => tracing::debug!(attempt, "listen timed out"),
            Recognition::NotUnderstood => tracing::info!(attempt, "didn't catch that"),
            Recognition::ServiceError(e) => {
                tracing::warn!(attempt, error = %e, "recognition service failed");
            }
        }
    }

    Ok(last)
}

/// Microphone capture + cloud transcription
pub struct MicrophoneInput {
    capture: AudioCapture,
    detector: SpeechDetector,
    stt: SpeechToText,
    timeout: Duration,
    phrase_limit: Duration,
}

impl MicrophoneInput {
    /// Open the microphone and start capturing
    ///
    /// `timeout` bounds the wait for speech to start; `phrase_limit` bounds
    /// how long one utterance may run.
    ///
    /// # Errors
    ///
    /// Returns error if the microphone cannot be opened
    pub fn new(stt: SpeechToText, timeout: Duration, phrase_limit: Duration) -> Result<Self> {
        let mut capture = AudioCapture::new()?;
        capture.start()?;

        Ok(Self {
            capture,
            detector: SpeechDetector::default(),
            stt,
            timeout,
            phrase_limit,
        })
    }

    /// Wait for one complete segment of speech
    ///
    /// Returns `None` if no speech started before the timeout.
    async fn record_segment(&mut self) -> Option<Vec<f32>> {
        self.capture.clear_buffer();
        self.detector.reset();
        let start = Instant::now();

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let samples = self.capture.take_buffer();
            if !samples.is_empty() && self.detector.process(&samples) {
                return Some(self.detector.take_segment());
            }

            if self.detector.is_speaking() {
                if self.detector.segment_secs() >= self.phrase_limit.as_secs_f32() {
                    tracing::debug!("phrase limit reached, cutting segment");
                    return Some(self.detector.take_segment());
                }
            } else if start.elapsed() >= self.timeout {
                return None;
            }
        }
    }
}

#[async_trait(?Send)]
impl SpeechInput for MicrophoneInput {
    async fn listen(&mut self) -> Result<Recognition> {
        tracing::info!("listening...");

        let Some(segment) = self.record_segment().await else {
            return Ok(Recognition::Timeout);
        };

        tracing::info!("recognizing...");
        let wav = samples_to_wav(&segment, SAMPLE_RATE)?;

        Ok(match self.stt.transcribe(&wav).await {
            Ok(text) if text.is_empty() => Recognition::NotUnderstood,
            Ok(text) => Recognition::Text(text),
            Err(e) => Recognition::ServiceError(e.to_string()),
        })
    }
}

/// Reads typed utterances line by line
pub struct ConsoleInput<R> {
    lines: Lines<R>,
    prompt: Option<String>,
}

impl ConsoleInput<BufReader<Stdin>> {
    /// Read from standard input, printing a prompt before each line
    #[must_use]
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            prompt: Some("you> ".to_string()),
        }
    }
}

impl<R: AsyncBufRead + Unpin> ConsoleInput<R> {
    /// Read from any buffered reader, without a prompt
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            prompt: None,
        }
    }
}

#[async_trait(?Send)]
impl<R: AsyncBufRead + Unpin> SpeechInput for ConsoleInput<R> {
    async fn listen(&mut self) -> Result<Recognition> {
        if let Some(prompt) = &self.prompt {
            let mut stdout = std::io::stdout();
            write!(stdout, "{prompt}")?;
            stdout.flush()?;
        }

        match self.lines.next_line().await? {
            None => Err(Error::InputClosed),
            Some(line) if line.trim().is_empty() => Ok(Recognition::NotUnderstood),
            Some(line) => Ok(Recognition::Text(line.trim().to_string())),
        }
    }
}
