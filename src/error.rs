//! Error types for Lami

use thiserror::Error;

/// Result type alias for Lami operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Lami
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Language model request failed or returned an unusable response
    #[error("generation error: {0}")]
    Generation(String),

    /// History could not be written
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The input source is exhausted (e.g. stdin reached EOF)
    #[error("input closed")]
    InputClosed,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
