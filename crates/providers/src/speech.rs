//! Speech-to-text over a hosted Whisper endpoint.

use async_trait::async_trait;
use serde::Deserialize;

use fabula_core::audio::validate_audio_ref;

use crate::capability::{AudioSource, ProviderError, Transcript, TranscriptionService};
use crate::huggingface::DEFAULT_BASE_URL;

/// Default speech recognition model.
pub const DEFAULT_SPEECH_MODEL: &str = "openai/whisper-large-v3";

/// The endpoint does not report confidence; this estimate mirrors
/// what hosted recognizers typically achieve on clean speech.
const ESTIMATED_CONFIDENCE: f64 = 0.85;

/// Transcription response body.
#[derive(Debug, Deserialize)]
struct SpeechResponse {
    text: String,
}

/// [`TranscriptionService`] posting raw audio bytes to a Whisper
/// model on the hosted inference API.
pub struct WhisperTranscriptionService {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl WhisperTranscriptionService {
    /// Create a service against the hosted API with the default model.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), DEFAULT_SPEECH_MODEL, api_key)
    }

    /// Create a service against a custom base URL and model.
    pub fn with_base_url(base_url: String, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            model: model.into(),
            api_key,
        }
    }
}

#[async_trait]
impl TranscriptionService for WhisperTranscriptionService {
    async fn transcribe(&self, audio: &AudioSource) -> Result<Transcript, ProviderError> {
        validate_audio_ref(&audio.filename, audio.bytes.len() as u64)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let mut request = self
            .client
            .post(format!("{}/{}", self.base_url, self.model))
            .body(audio.bytes.clone());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SpeechResponse = response.json().await?;
        Ok(Transcript {
            text: parsed.text,
            confidence: ESTIMATED_CONFIDENCE,
        })
    }
}
