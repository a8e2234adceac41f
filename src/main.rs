use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::EnvFilter;

use lami::llm::GeminiClient;
use lami::session::{ConversationSession, HistoryStore, PhraseMatcher};
use lami::voice::{
    AudioCapture, AudioPlayback, ConsoleInput, ConsoleOutput, MicrophoneInput,
    PLAYBACK_SAMPLE_RATE, SpeechInput, SpeechOutput, SpeechToText, SttProvider, TextToSpeech,
    VoiceOutput, rms,
};
use lami::{Assistant, Config, StopReason};

/// Lami - wake-word voice assistant with persistent conversation memory
#[derive(Parser)]
#[command(name = "lami", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: ~/.config/lami/config.toml)
    #[arg(long, env = "LAMI_CONFIG")]
    config: Option<PathBuf>,

    /// History file to load and save
    #[arg(long)]
    history: Option<PathBuf>,

    /// Type questions and read answers instead of using the microphone and speaker
    #[arg(long)]
    text: bool,

    /// Stay silent when nothing was understood
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Print the saved conversation history
    History,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,lami=info",
        1 => "info,lami=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(path) = cli.history {
        config.history_path = path;
    }
    if cli.text {
        config.voice.enabled = false;
    }
    if cli.quiet {
        config.listen.announce_not_understood = false;
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker(),
            Command::TestTts { text } => test_tts(config, &text).await,
            Command::History => show_history(&config),
        };
    }

    tracing::info!(
        name = %config.agent.name,
        voice = config.voice.enabled,
        history = %config.history_path.display(),
        "starting lami"
    );
    tracing::debug!(?config, "loaded configuration");

    let assistant = build_assistant(config)?;

    match assistant.run().await? {
        StopReason::InputClosed => tracing::info!("input closed, shutting down"),
        StopReason::Interrupted => tracing::info!("interrupted, shutting down"),
    }

    Ok(())
}

/// Wire the session to the model and to either audio or console collaborators
fn build_assistant(config: Config) -> anyhow::Result<Assistant> {
    let Config {
        agent,
        replies,
        listen,
        voice,
        llm,
        mut api_keys,
        history_path,
    } = config;

    let gemini_key = api_keys
        .gemini
        .take()
        .context("set API_KEY or GEMINI_API_KEY to a Gemini API key")?;
    let model = GeminiClient::new(gemini_key, llm.model, llm.request_timeout)?
        .with_system_instruction(agent.memory);

    let (input, output): (Box<dyn SpeechInput>, Box<dyn SpeechOutput>) = if voice.enabled {
        // Whisper and TTS share the OpenAI key
        let tts_key = match voice.stt_provider {
            SttProvider::Whisper => api_keys
                .openai
                .as_ref()
                .map(|k| SecretString::from(k.expose_secret().to_string())),
            SttProvider::Deepgram => api_keys.openai.take(),
        }
        .context("set OPENAI_API_KEY for text to speech (or run with --text)")?;
        let stt_key = api_keys.take_stt(voice.stt_provider).with_context(|| {
            format!("an API key for {} speech recognition is required", voice.stt_provider)
        })?;

        let stt = SpeechToText::new(
            voice.stt_provider,
            stt_key,
            voice.stt_model,
            voice.request_timeout,
        )?;
        let tts = TextToSpeech::new(
            tts_key,
            voice.tts_model,
            voice.tts_voice,
            voice.tts_speed,
            voice.request_timeout,
        )?;

        (
            Box::new(MicrophoneInput::new(stt, listen.timeout, listen.phrase_limit)?),
            Box::new(VoiceOutput::new(tts)?),
        )
    } else {
        (
            Box::new(ConsoleInput::stdin()),
            Box::new(ConsoleOutput::new(&agent.name)),
        )
    };

    let matcher = PhraseMatcher::new(&agent.name, agent.exit_phrases)?;
    let session = ConversationSession::new(
        matcher,
        HistoryStore::new(history_path),
        Box::new(model),
        output,
    )?
    .with_replies(replies)
    .with_announce_not_understood(listen.announce_not_understood);

    Ok(Assistant::new(session, input, listen.max_attempts))
}

/// Print the saved conversation history
fn show_history(config: &Config) -> anyhow::Result<()> {
    let history = HistoryStore::new(&config.history_path).load()?;

    if history.is_empty() {
        println!("No saved conversation at {}", config.history_path.display());
    } else {
        println!("{}", history.format());
    }

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let frequency = 440.0_f32;
    let num_samples = PLAYBACK_SAMPLE_RATE as usize * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {PLAYBACK_SAMPLE_RATE} Hz...", samples.len());
    playback.play(samples)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");

    Ok(())
}

/// Test TTS output
async fn test_tts(config: Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let api_key = config
        .api_keys
        .openai
        .context("set OPENAI_API_KEY to test text to speech")?;

    let tts = TextToSpeech::new(
        api_key,
        config.voice.tts_model,
        config.voice.tts_voice,
        config.voice.tts_speed,
        config.voice.request_timeout,
    )?;

    println!("Synthesizing speech...");
    let mp3_data = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    let playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3_data)?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
