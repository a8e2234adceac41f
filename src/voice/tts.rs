//! Text-to-speech (TTS) via the `OpenAI` speech API

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

const BASE_URL: &str = "https://api.openai.com/v1";

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    voice: String,
    speed: f32,
    model: String,
}

impl TextToSpeech {
    /// Create a new TTS instance
    ///
    /// `speed` is clamped to the range the API accepts (0.25 to 4.0).
    /// `timeout` bounds each synthesis request.
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing or the HTTP client cannot be built
    pub fn new(
        api_key: SecretString,
        model: String,
        voice: String,
        speed: f32,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            api_key,
            voice,
            speed: speed.clamp(0.25, 4.0),
            model,
        })
    }

    /// Point the client at a different API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Synthesize text to MP3 audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tts(timeout: Duration) -> TextToSpeech {
        TextToSpeech::new(
            SecretString::from("test-key".to_string()),
            "tts-1".to_string(),
            "alloy".to_string(),
            1.0,
            timeout,
        )
        .unwrap()
    }

    #[test]
    fn test_speed_clamped() {
        assert!((tts(Duration::from_secs(5)).speed - 1.0).abs() < f32::EPSILON);

        let fast = TextToSpeech::new(
            SecretString::from("test-key".to_string()),
            "tts-1".to_string(),
            "alloy".to_string(),
            9.0,
            Duration::from_secs(5),
        )
        .unwrap();
        assert!((fast.speed - 4.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_stalled_service_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let tts = tts(Duration::from_millis(200)).with_base_url(format!("http://{addr}"));

        let result = tokio::time::timeout(Duration::from_secs(5), tts.synthesize("hello"))
            .await
            .expect("request should give up on its own");
        assert!(result.is_err());
    }
}
