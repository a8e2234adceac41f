//! TOML configuration file loading
//!
//! Supports `~/.config/lami/config.toml` (or a path given on the command
//! line). Every field is optional; the file is a partial overlay on top of
//! the built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LamiConfigFile {
    #[serde(default)]
    pub agent: AgentFileConfig,

    #[serde(default)]
    pub replies: RepliesFileConfig,

    #[serde(default)]
    pub listen: ListenFileConfig,

    #[serde(default)]
    pub voice: VoiceFileConfig,

    #[serde(default)]
    pub llm: LlmFileConfig,

    #[serde(default)]
    pub history: HistoryFileConfig,
}

/// Assistant identity
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentFileConfig {
    /// Name doubling as the wake word (e.g. "lami")
    pub name: Option<String>,

    /// Phrases that end a conversation
    pub exit_phrases: Option<Vec<String>>,

    /// Background about the user, sent as the model's system instruction
    pub memory: Option<String>,
}

/// Canned reply overrides
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepliesFileConfig {
    pub greeting: Option<String>,
    pub acknowledgement: Option<String>,
    pub farewell: Option<String>,
    pub not_understood: Option<String>,
    pub apology: Option<String>,
    pub clarify: Option<String>,
}

/// Capture bounds
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenFileConfig {
    /// Seconds to wait for speech to start
    pub timeout_secs: Option<f64>,

    /// Maximum seconds for one utterance
    pub phrase_limit_secs: Option<f64>,

    /// Capture attempts per cycle before giving up
    pub max_attempts: Option<u32>,

    /// Say "didn't catch that" when nothing was recognized mid-conversation
    pub announce_not_understood: Option<bool>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceFileConfig {
    /// Use microphone and speaker (false = text mode)
    pub enabled: Option<bool>,

    /// STT provider ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// HTTP timeout for one STT or TTS request, in seconds
    pub request_timeout_secs: Option<f64>,
}

/// Language model configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gemini-1.5-flash")
    pub model: Option<String>,

    /// HTTP timeout for one generation request
    pub request_timeout_secs: Option<f64>,
}

/// History persistence
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryFileConfig {
    /// Path of the history JSON file
    pub path: Option<PathBuf>,
}

/// Parse config file content
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse_config_file(content: &str) -> crate::Result<LamiConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load a config file, falling back to defaults
///
/// Returns `LamiConfigFile::default()` if the file doesn't exist or can't be
/// parsed.
pub fn load_config_file(path: &Path) -> LamiConfigFile {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file");
        return LamiConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                LamiConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            LamiConfigFile::default()
        }
    }
}

/// Return the default config file path: `~/.config/lami/config.toml` on Linux
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "lami", "lami")
        .map(|d| d.config_dir().join("config.toml"))
}
