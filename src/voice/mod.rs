//! Voice processing module
//!
//! Microphone capture and speech segmentation, cloud STT/TTS, speaker
//! playback, and the input/output adapters the assistant loop talks to.

mod capture;
mod detector;
mod input;
mod output;
mod playback;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, rms, samples_to_wav};
pub use detector::{DetectorState, ENERGY_THRESHOLD, SpeechDetector};
pub use input::{ConsoleInput, MicrophoneInput, Recognition, SpeechInput, listen_with_retry};
pub use output::{ConsoleOutput, SpeechOutput, VoiceOutput, clean_for_speech};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE};
pub use stt::{SpeechToText, SttProvider};
pub use tts::TextToSpeech;
