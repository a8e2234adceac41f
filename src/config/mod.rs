//! Configuration management for Lami
//!
//! Layers, lowest to highest: built-in defaults, the TOML config file,
//! environment variables (a `.env` file in the working directory is loaded
//! first), then command-line flags applied by the binary.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

pub use file::{LamiConfigFile, config_file_path, load_config_file, parse_config_file};

use crate::llm::DEFAULT_GEMINI_MODEL;
use crate::session::Replies;
use crate::voice::SttProvider;
use crate::{Error, Result};

/// Default agent name, which is also the wake word
pub const DEFAULT_NAME: &str = "lami";

/// Default phrases that end a conversation
pub const DEFAULT_EXIT_PHRASES: &[&str] = &["bye", "exit", "no thanks"];

/// Lami configuration
#[derive(Debug)]
pub struct Config {
    /// Assistant identity and vocabulary
    pub agent: AgentConfig,

    /// Canned utterances
    pub replies: Replies,

    /// Capture bounds
    pub listen: ListenConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Language model configuration
    pub llm: LlmConfig,

    /// API keys (environment only)
    pub api_keys: ApiKeys,

    /// Where the conversation history is persisted
    pub history_path: PathBuf,
}

/// Assistant identity
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Display name, also used as the wake word
    pub name: String,

    /// Phrases that end a conversation
    pub exit_phrases: Vec<String>,

    /// Background about the user for the model's system instruction
    pub memory: Option<String>,
}

/// Capture bounds
#[derive(Debug, Clone)]
pub struct ListenConfig {
    /// How long to wait for speech to start
    pub timeout: Duration,

    /// Longest single utterance
    pub phrase_limit: Duration,

    /// Capture attempts per cycle before yielding "unrecognized"
    pub max_attempts: u32,

    /// Say "didn't catch that" when a conversation cycle hears nothing
    pub announce_not_understood: bool,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Use microphone and speaker; false means text mode
    pub enabled: bool,

    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// HTTP timeout for one STT or TTS request
    pub request_timeout: Duration,
}

/// Language model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Gemini model identifier
    pub model: String,

    /// HTTP timeout for one generation request
    pub request_timeout: Duration,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// Gemini API key (`API_KEY` or `GEMINI_API_KEY`)
    pub gemini: Option<SecretString>,

    /// `OpenAI` API key (Whisper STT and TTS)
    pub openai: Option<SecretString>,

    /// Deepgram API key (optional STT)
    pub deepgram: Option<SecretString>,
}

impl ApiKeys {
    /// Take the key for the configured STT provider
    pub fn take_stt(&mut self, provider: SttProvider) -> Option<SecretString> {
        match provider {
            SttProvider::Whisper => self.openai.take(),
            SttProvider::Deepgram => self.deepgram.take(),
        }
    }
}

impl Config {
    /// Load configuration from the config file and the process environment
    ///
    /// `config_path` overrides the default `~/.config/lami/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns error if a setting has an invalid value
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }

        let file = config_path
            .map(Path::to_path_buf)
            .or_else(config_file_path)
            .map(|p| load_config_file(&p))
            .unwrap_or_default();

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a setting has an invalid value
    pub fn from_sources(
        file: LamiConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let secret = |keys: &[&str]| {
            keys.iter()
                .find_map(|&k| env(k))
                .map(|v| SecretString::from(v.trim().to_string()))
        };

        let api_keys = ApiKeys {
            gemini: secret(&["API_KEY", "GEMINI_API_KEY"]),
            openai: secret(&["OPENAI_API_KEY"]),
            deepgram: secret(&["DEEPGRAM_API_KEY"]),
        };

        let agent = AgentConfig {
            name: env("LAMI_NAME")
                .or(file.agent.name)
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            exit_phrases: env("LAMI_EXIT_PHRASES")
                .map(|v| v.split(',').map(|p| p.trim().to_string()).collect())
                .or(file.agent.exit_phrases)
                .unwrap_or_else(|| DEFAULT_EXIT_PHRASES.iter().map(ToString::to_string).collect()),
            memory: env("LAMI_MEMORY").or(file.agent.memory),
        };

        if agent.name.trim().is_empty() {
            return Err(Error::Config("agent name must not be empty".to_string()));
        }

        let replies = build_replies(file.replies, &agent.name);

        let listen = ListenConfig {
            timeout: seconds(
                "listen.timeout_secs",
                parse_env(&env, "LAMI_LISTEN_TIMEOUT_SECS")?.or(file.listen.timeout_secs),
                5.0,
            )?,
            phrase_limit: seconds(
                "listen.phrase_limit_secs",
                parse_env(&env, "LAMI_PHRASE_LIMIT_SECS")?.or(file.listen.phrase_limit_secs),
                10.0,
            )?,
            max_attempts: parse_env(&env, "LAMI_MAX_ATTEMPTS")?
                .or(file.listen.max_attempts)
                .unwrap_or(3),
            announce_not_understood: parse_env(&env, "LAMI_ANNOUNCE_NOT_UNDERSTOOD")?
                .or(file.listen.announce_not_understood)
                .unwrap_or(true),
        };

        if listen.max_attempts == 0 {
            return Err(Error::Config("listen.max_attempts must be at least 1".to_string()));
        }

        let stt_provider = env("LAMI_STT_PROVIDER")
            .or(file.voice.stt_provider)
            .map(|p| p.parse::<SttProvider>())
            .transpose()?
            .unwrap_or_default();

        let voice = VoiceConfig {
            enabled: !parse_env(&env, "LAMI_TEXT_MODE")?.unwrap_or(false)
                && file.voice.enabled.unwrap_or(true),
            stt_provider,
            stt_model: env("LAMI_STT_MODEL")
                .or(file.voice.stt_model)
                .unwrap_or_else(|| stt_provider.default_model().to_string()),
            tts_model: env("LAMI_TTS_MODEL")
                .or(file.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: env("LAMI_TTS_VOICE")
                .or(file.voice.tts_voice)
                .unwrap_or_else(|| "alloy".to_string()),
            tts_speed: file.voice.tts_speed.unwrap_or(1.0),
            request_timeout: seconds(
                "voice.request_timeout_secs",
                file.voice.request_timeout_secs,
                30.0,
            )?,
        };

        let llm = LlmConfig {
            model: env("LAMI_LLM_MODEL")
                .or(file.llm.model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            request_timeout: seconds(
                "llm.request_timeout_secs",
                file.llm.request_timeout_secs,
                60.0,
            )?,
        };

        let history_path = env("LAMI_HISTORY_PATH")
            .map(PathBuf::from)
            .or(file.history.path)
            .unwrap_or_else(default_history_path);

        Ok(Self {
            agent,
            replies,
            listen,
            voice,
            llm,
            api_keys,
            history_path,
        })
    }
}

/// Default history location: `~/.local/share/lami/history.json` on Linux
#[must_use]
pub fn default_history_path() -> PathBuf {
    directories::ProjectDirs::from("dev", "lami", "lami").map_or_else(
        || PathBuf::from("lami_history.json"),
        |d| d.data_dir().join("history.json"),
    )
}

/// Merge reply overrides, naming the agent in the default greeting/farewell
fn build_replies(file: file::RepliesFileConfig, name: &str) -> Replies {
    let defaults = Replies::default();
    let display = capitalize(name.trim());

    Replies {
        greeting: file.greeting.unwrap_or_else(|| {
            format!("{display} is ready to assist. Say '{display}' to activate.")
        }),
        acknowledgement: file.acknowledgement.unwrap_or(defaults.acknowledgement),
        farewell: file
            .farewell
            .unwrap_or_else(|| format!("Goodbye! I will wait for you to call {display} again.")),
        not_understood: file.not_understood.unwrap_or(defaults.not_understood),
        apology: file.apology.unwrap_or(defaults.apology),
        clarify: file.clarify.unwrap_or(defaults.clarify),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Parse an environment variable, reporting a bad value as a config error
fn parse_env<T: std::str::FromStr>(
    env: impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    env(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| Error::Config(format!("{key} has invalid value: {v}")))
        })
        .transpose()
}

fn seconds(name: &str, value: Option<f64>, default: f64) -> Result<Duration> {
    let secs = value.unwrap_or(default);
    if secs <= 0.0 {
        return Err(Error::Config(format!("{name} must be positive, got {secs}")));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| Error::Config(format!("{name} is out of range: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(LamiConfigFile::default(), env_from(&[])).unwrap();

        assert_eq!(config.agent.name, "lami");
        assert_eq!(config.agent.exit_phrases, vec!["bye", "exit", "no thanks"]);
        assert_eq!(config.listen.timeout, Duration::from_secs(5));
        assert_eq!(config.listen.max_attempts, 3);
        assert!(config.listen.announce_not_understood);
        assert!(config.voice.enabled);
        assert_eq!(config.voice.stt_provider, SttProvider::Whisper);
        assert_eq!(config.voice.stt_model, "whisper-1");
        assert_eq!(config.llm.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.llm.request_timeout, Duration::from_secs(60));
        assert_eq!(config.voice.request_timeout, Duration::from_secs(30));
        assert!(config.api_keys.gemini.is_none());
        assert_eq!(
            config.replies.greeting,
            "Lami is ready to assist. Say 'Lami' to activate."
        );
    }

    #[test]
    fn test_api_key_from_env() {
        let config = Config::from_sources(
            LamiConfigFile::default(),
            env_from(&[("GEMINI_API_KEY", "g-key"), ("OPENAI_API_KEY", " o-key ")]),
        )
        .unwrap();

        assert_eq!(config.api_keys.gemini.unwrap().expose_secret(), "g-key");
        assert_eq!(config.api_keys.openai.unwrap().expose_secret(), "o-key");
    }

    #[test]
    fn test_api_key_prefers_plain_api_key() {
        let config = Config::from_sources(
            LamiConfigFile::default(),
            env_from(&[("API_KEY", "first"), ("GEMINI_API_KEY", "second")]),
        )
        .unwrap();

        assert_eq!(config.api_keys.gemini.unwrap().expose_secret(), "first");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = parse_config_file(
            r#"
            [agent]
            name = "nova"
            [llm]
            model = "gemini-1.5-pro"
            "#,
        )
        .unwrap();

        let config = Config::from_sources(
            file,
            env_from(&[("LAMI_NAME", "echo"), ("LAMI_EXIT_PHRASES", "stop, quit")]),
        )
        .unwrap();

        assert_eq!(config.agent.name, "echo");
        assert_eq!(config.agent.exit_phrases, vec!["stop", "quit"]);
        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert_eq!(
            config.replies.farewell,
            "Goodbye! I will wait for you to call Echo again."
        );
    }

    #[test]
    fn test_text_mode_disables_voice() {
        let config = Config::from_sources(
            LamiConfigFile::default(),
            env_from(&[("LAMI_TEXT_MODE", "true")]),
        )
        .unwrap();
        assert!(!config.voice.enabled);
    }

    #[test]
    fn test_deepgram_provider_default_model() {
        let config = Config::from_sources(
            LamiConfigFile::default(),
            env_from(&[("LAMI_STT_PROVIDER", "deepgram")]),
        )
        .unwrap();
        assert_eq!(config.voice.stt_provider, SttProvider::Deepgram);
        assert_eq!(config.voice.stt_model, "nova-2");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_attempts = Config::from_sources(
            LamiConfigFile::default(),
            env_from(&[("LAMI_MAX_ATTEMPTS", "zero")]),
        );
        assert!(bad_attempts.is_err());

        let zero_attempts = Config::from_sources(
            LamiConfigFile::default(),
            env_from(&[("LAMI_MAX_ATTEMPTS", "0")]),
        );
        assert!(zero_attempts.is_err());

        let negative_timeout = Config::from_sources(
            parse_config_file("[listen]\ntimeout_secs = -1.0\n").unwrap(),
            env_from(&[]),
        );
        assert!(negative_timeout.is_err());

        let zero_voice_timeout = Config::from_sources(
            parse_config_file("[voice]\nrequest_timeout_secs = 0.0\n").unwrap(),
            env_from(&[]),
        );
        assert!(zero_voice_timeout.is_err());

        let bad_provider = Config::from_sources(
            LamiConfigFile::default(),
            env_from(&[("LAMI_STT_PROVIDER", "carrier-pigeon")]),
        );
        assert!(bad_provider.is_err());
    }

    #[test]
    fn test_reply_overrides() {
        let file = parse_config_file("[replies]\nacknowledgement = \"Yes?\"\n").unwrap();
        let config = Config::from_sources(file, env_from(&[])).unwrap();
        assert_eq!(config.replies.acknowledgement, "Yes?");
        assert_eq!(config.replies.not_understood, Replies::default().not_understood);
    }
}
