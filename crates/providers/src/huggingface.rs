//! Hugging Face Inference API client (free tier).
//!
//! One [`HuggingFaceClient`] wraps the hosted inference endpoints for
//! text completion, diffusion image generation, and model readiness
//! probing. [`HuggingFaceImageBackend`] and [`HuggingFaceTextService`]
//! adapt it to the capability traits the pipeline consumes.

use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use serde::Deserialize;

use fabula_core::story::{parse_story_output, story_prompt};

use crate::capability::{
    BackendStatus, GeneratedText, ImageGenerationBackend, ProviderError, TextGenerationService,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Base URL of the hosted inference API.
pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";

/// Default text generation model.
pub const DEFAULT_TEXT_MODEL: &str = "microsoft/DialoGPT-medium";

/// Free Stable Diffusion checkpoints, in fallback priority order.
pub const FREE_IMAGE_MODELS: &[&str] = &[
    "runwayml/stable-diffusion-v1-5",
    "CompVis/stable-diffusion-v1-4",
    "stabilityai/stable-diffusion-2-1",
];

/// Maximum completion length for text generation.
const TEXT_MAX_LENGTH: u32 = 300;
/// Sampling temperature for text generation.
const TEXT_TEMPERATURE: f64 = 0.8;
/// Diffusion steps. Low keeps free-tier latency tolerable.
const IMAGE_INFERENCE_STEPS: u32 = 20;
/// Classifier-free guidance scale.
const IMAGE_GUIDANCE_SCALE: f64 = 7.5;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the Hugging Face Inference API.
///
/// Works without an API key on the free tier; a key raises rate
/// limits.
pub struct HuggingFaceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// One element of a text-completion response array.
#[derive(Debug, Deserialize)]
struct TextCompletion {
    #[serde(default)]
    generated_text: String,
}

impl HuggingFaceClient {
    /// Create a client against the hosted API.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), api_key)
    }

    /// Create a client against a custom base URL (self-hosted TGI,
    /// test servers).
    pub fn with_base_url(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Build a POST request for a model, attaching the bearer token
    /// when one is configured.
    fn post(&self, model: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.post(format!("{}/{model}", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        request
    }

    /// Generate a text completion.
    pub async fn generate_text(&self, prompt: &str, model: &str) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": {
                "max_length": TEXT_MAX_LENGTH,
                "temperature": TEXT_TEMPERATURE,
                "return_full_text": false,
                "do_sample": true,
            }
        });

        let response = self.post(model).json(&body).send().await?;
        let response = Self::ensure_success(response).await?;

        let completions: Vec<TextCompletion> = response.json().await?;
        let first = completions
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Decode("Empty completion array".to_string()))?;

        Ok(first.generated_text)
    }

    /// Generate an image with a diffusion model.
    ///
    /// The response body is raw encoded image bytes, decoded via
    /// [`image::load_from_memory`].
    pub async fn generate_image(
        &self,
        prompt: &str,
        model: &str,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ProviderError> {
        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": {
                "width": width,
                "height": height,
                "num_inference_steps": IMAGE_INFERENCE_STEPS,
                "guidance_scale": IMAGE_GUIDANCE_SCALE,
            }
        });

        let response = self.post(model).json(&body).send().await?;
        let response = Self::ensure_success(response).await?;

        let bytes = response.bytes().await?;
        image::load_from_memory(&bytes)
            .map_err(|e| ProviderError::Decode(format!("Invalid image payload: {e}")))
    }

    /// Probe whether a model is loaded and ready.
    ///
    /// The free tier answers `503` while a model is being loaded onto
    /// an inference worker, `200` once it can serve.
    pub async fn model_status(&self, model: &str) -> BackendStatus {
        let body = serde_json::json!({ "inputs": "test" });

        match self.post(model).json(&body).send().await {
            Ok(response) if response.status().as_u16() == 503 => BackendStatus::Loading,
            Ok(response) if response.status().is_success() => BackendStatus::Ready,
            Ok(response) => BackendStatus::Error(format!(
                "Probe returned status {}",
                response.status().as_u16()
            )),
            Err(e) => BackendStatus::Error(e.to_string()),
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ProviderError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
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
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Capability adapters
// ---------------------------------------------------------------------------

/// One diffusion model exposed as an [`ImageGenerationBackend`].
pub struct HuggingFaceImageBackend {
    client: Arc<HuggingFaceClient>,
    model: String,
}

impl HuggingFaceImageBackend {
    pub fn new(client: Arc<HuggingFaceClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ImageGenerationBackend for HuggingFaceImageBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn probe_ready(&self) -> BackendStatus {
        self.client.model_status(&self.model).await
    }

    async fn generate(
        &self,
        prompt: &str,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ProviderError> {
        self.client
            .generate_image(prompt, &self.model, width, height)
            .await
    }
}

/// Build one backend per entry of a model list, preserving order.
pub fn image_backends(
    client: &Arc<HuggingFaceClient>,
    models: &[impl AsRef<str>],
) -> Vec<Arc<dyn ImageGenerationBackend>> {
    models
        .iter()
        .map(|model| {
            Arc::new(HuggingFaceImageBackend::new(
                Arc::clone(client),
                model.as_ref(),
            )) as Arc<dyn ImageGenerationBackend>
        })
        .collect()
}

/// Story generation over a text-completion model.
///
/// Wraps the completion in the story template and parses the
/// `STORY:`/`CHARACTER:` sections back out.
pub struct HuggingFaceTextService {
    client: Arc<HuggingFaceClient>,
    model: String,
}

impl HuggingFaceTextService {
    pub fn new(client: Arc<HuggingFaceClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextGenerationService for HuggingFaceTextService {
    async fn generate(&self, prompt: &str) -> Result<GeneratedText, ProviderError> {
        let completion = self
            .client
            .generate_text(&story_prompt(prompt), &self.model)
            .await?;

        let parsed = parse_story_output(&completion);
        Ok(GeneratedText {
            story: parsed.story,
            character_description: parsed.character_description,
            model: self.model.clone(),
        })
    }
}
