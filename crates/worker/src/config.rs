use fabula_providers::huggingface::{DEFAULT_BASE_URL, DEFAULT_TEXT_MODEL, FREE_IMAGE_MODELS};

/// Worker configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Bearer token for the hosted inference API, when present.
    pub api_key: Option<String>,
    /// Inference API base URL (default: the hosted endpoint).
    pub base_url: String,
    /// Model used for story generation.
    pub text_model: String,
    /// Image models tried in order, parsed from comma-separated
    /// `IMAGE_MODELS` env var.
    pub image_models: Vec<String>,
    /// Directory generated artifacts are written to.
    pub output_dir: String,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var        | Default                                  |
    /// |----------------|------------------------------------------|
    /// | `HF_API_KEY`   | (none)                                   |
    /// | `HF_BASE_URL`  | `https://api-inference.huggingface.co/models` |
    /// | `TEXT_MODEL`   | `microsoft/DialoGPT-medium`              |
    /// | `IMAGE_MODELS` | the built-in free Stable Diffusion list  |
    /// | `OUTPUT_DIR`   | `artifacts`                              |
    pub fn from_env() -> Self {
        let api_key = std::env::var("HF_API_KEY").ok().filter(|k| !k.is_empty());

        let base_url = std::env::var("HF_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let text_model = std::env::var("TEXT_MODEL").unwrap_or_else(|_| DEFAULT_TEXT_MODEL.into());

        let image_models: Vec<String> = match std::env::var("IMAGE_MODELS") {
            Ok(csv) => csv
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => FREE_IMAGE_MODELS.iter().map(|m| m.to_string()).collect(),
        };

        let output_dir = std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "artifacts".into());

        Self {
            api_key,
            base_url,
            text_model,
            image_models,
            output_dir,
        }
    }
}
