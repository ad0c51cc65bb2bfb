//! Capability interfaces consumed by the generation pipeline.
//!
//! Each trait models one external collaborator at its interface
//! boundary: speech-to-text, story text generation, image synthesis,
//! and artifact persistence. Implementations live in this crate
//! (remote backends, filesystem store) or in test code (mocks).

use async_trait::async_trait;
use image::{DynamicImage, RgbaImage};

use fabula_core::types::RunId;

/// Opaque reference to a persisted artifact (e.g. a relative path).
pub type ArtifactRef = String;

/// An audio payload handed to the transcription service.
///
/// The pipeline treats it as an opaque reference plus bytes; format
/// validation happens up front via [`fabula_core::audio`].
#[derive(Debug, Clone)]
pub struct AudioSource {
    /// Original filename, used for format detection.
    pub filename: String,
    /// Raw audio bytes.
    pub bytes: Vec<u8>,
}

/// Result of a successful transcription.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// The transcribed text.
    pub text: String,
    /// Backend-reported or estimated confidence in `0.0..=1.0`.
    pub confidence: f64,
}

/// Result of a successful story generation.
#[derive(Debug, Clone)]
pub struct GeneratedText {
    /// The story body.
    pub story: String,
    /// Visual description of the main character.
    pub character_description: String,
    /// Which model produced the completion.
    pub model: String,
}

/// Readiness of an image generation backend.
///
/// Free/shared inference backends load models on demand, so a probe
/// may find the backend mid-load rather than hard-failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    /// The backend can serve a generation request now.
    Ready,
    /// The model is still loading; try another backend.
    Loading,
    /// The probe failed with the given reason.
    Error(String),
}

/// Errors from provider implementations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote API returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A response body could not be decoded into the expected form.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Artifact persistence failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Speech-to-text collaborator.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Transcribe an audio payload to text.
    async fn transcribe(&self, audio: &AudioSource) -> Result<Transcript, ProviderError>;
}

/// Story text generation collaborator.
#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Generate a story and character description from a prompt.
    async fn generate(&self, prompt: &str) -> Result<GeneratedText, ProviderError>;
}

/// One image synthesis backend, fed to the fallback client.
#[async_trait]
pub trait ImageGenerationBackend: Send + Sync {
    /// Stable identifier for logs and result payloads (e.g. model id).
    fn name(&self) -> &str;

    /// Probe whether the backend can serve a request right now.
    async fn probe_ready(&self) -> BackendStatus;

    /// Generate one image for the prompt at the given dimensions.
    async fn generate(
        &self,
        prompt: &str,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ProviderError>;
}

/// Artifact persistence collaborator.
///
/// The orchestrator hands over each produced raster right after its
/// step completes; it never implements storage itself.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist an image for a run under a step-specific kind
    /// (`"character"`, `"background"`, `"composed"`), returning an
    /// opaque reference.
    async fn store_image(
        &self,
        run_id: RunId,
        kind: &str,
        image: &RgbaImage,
    ) -> Result<ArtifactRef, ProviderError>;
}
