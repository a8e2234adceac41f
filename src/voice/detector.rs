//! Energy-based speech segmentation
//!
//! Cuts a single utterance out of the microphone stream: speech starts when
//! the block level crosses a threshold and ends after a run of silence.

use super::capture::{SAMPLE_RATE, rms};

/// Default level above which a block counts as speech
pub const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech length for a segment (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends a segment (0.5s at 16kHz)
const SILENCE_SAMPLES: usize = 8000;

/// State of the speech detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Speech started, accumulating until silence
    Speaking,
}

/// Detects the start and end of one spoken segment
pub struct SpeechDetector {
    threshold: f32,
    state: DetectorState,
    segment: Vec<f32>,
    silence_counter: usize,
}

impl Default for SpeechDetector {
    fn default() -> Self {
        Self::new(ENERGY_THRESHOLD)
    }
}

impl SpeechDetector {
    /// Create a detector with the given RMS threshold
    #[must_use]
    pub const fn new(threshold: f32) -> Self {
        Self {
            threshold,
            state: DetectorState::Idle,
            segment: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Feed a block of samples
    ///
    /// Returns true once a segment is complete: enough speech followed by
    /// enough silence. A burst too short to count is discarded after a
    /// longer silence.
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = rms(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Speaking;
                    self.segment.clear();
                    self.segment.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
                false
            }
            DetectorState::Speaking => {
                self.segment.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.is_segment_complete() {
                    tracing::debug!(samples = self.segment.len(), "speech segment complete");
                    return true;
                }

                if self.silence_counter > SILENCE_SAMPLES * 2 {
                    tracing::trace!("speech burst too short, resetting");
                    self.reset();
                }
                false
            }
        }
    }

    /// Check if the current segment has speech followed by silence
    #[must_use]
    pub fn is_segment_complete(&self) -> bool {
        self.state == DetectorState::Speaking
            && self.silence_counter > SILENCE_SAMPLES
            && self.segment.len() > MIN_SPEECH_SAMPLES
    }

    /// Check if speech has started
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.state == DetectorState::Speaking
    }

    /// Duration of the accumulated segment
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn segment_secs(&self) -> f32 {
        self.segment.len() as f32 / SAMPLE_RATE as f32
    }

    #[must_use]
    pub fn segment(&self) -> &[f32] {
        &self.segment
    }

    /// Take the accumulated segment and return to idle
    pub fn take_segment(&mut self) -> Vec<f32> {
        let segment = std::mem::take(&mut self.segment);
        self.reset();
        segment
    }

    /// Reset detector to idle state
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.segment.clear();
        self.silence_counter = 0;
    }

    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }
}
