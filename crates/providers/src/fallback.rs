//! Ordered fallback over image generation backends.
//!
//! Free/shared inference backends come and go: a model may be ready,
//! still loading, or erroring at any moment. [`ImageFallbackClient`]
//! walks an ordered candidate list, probing readiness before each
//! invocation, and returns the first success. Readiness changes
//! frequently, so nothing is cached between calls — every invocation
//! re-probes from the top of the list.

use std::sync::Arc;

use image::DynamicImage;

use crate::capability::{BackendStatus, ImageGenerationBackend};

/// A successfully generated image plus which backend produced it.
#[derive(Debug)]
pub struct GeneratedImage {
    /// The generated raster.
    pub image: DynamicImage,
    /// Name of the backend that produced it.
    pub backend: String,
}

/// Errors from the fallback client.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    /// Every candidate was skipped (not ready) or failed.
    #[error("All {attempted} candidate backends for '{capability}' were unavailable or failed")]
    AllProvidersExhausted {
        /// Capability label, e.g. `"character image"`.
        capability: String,
        /// Number of candidates in the list.
        attempted: usize,
    },
}

/// Wraps an ordered list of image backends for a single capability.
///
/// Iteration is linear, non-randomized, and stateless per call: no
/// backoff, no quality comparison across backends, no parallel
/// speculative requests against rate-limited shared endpoints.
pub struct ImageFallbackClient {
    capability: String,
    backends: Vec<Arc<dyn ImageGenerationBackend>>,
}

impl ImageFallbackClient {
    /// Create a client over `backends` in fixed priority order.
    pub fn new(capability: impl Into<String>, backends: Vec<Arc<dyn ImageGenerationBackend>>) -> Self {
        Self {
            capability: capability.into(),
            backends,
        }
    }

    /// Capability label this client serves.
    pub fn capability(&self) -> &str {
        &self.capability
    }

    /// Generate one image, trying candidates in priority order.
    ///
    /// For each backend: probe readiness first and skip non-ready
    /// candidates without counting them as hard failures; invoke only
    /// when ready; return immediately on the first success; log and
    /// continue on failure. Exhausting the list yields
    /// [`FallbackError::AllProvidersExhausted`].
    pub async fn generate(
        &self,
        prompt: &str,
        width: u32,
        height: u32,
    ) -> Result<GeneratedImage, FallbackError> {
        for backend in &self.backends {
            match backend.probe_ready().await {
                BackendStatus::Ready => {}
                BackendStatus::Loading => {
                    tracing::warn!(
                        capability = %self.capability,
                        backend = backend.name(),
                        "Backend still loading, trying next",
                    );
                    continue;
                }
                BackendStatus::Error(reason) => {
                    tracing::warn!(
                        capability = %self.capability,
                        backend = backend.name(),
                        reason = %reason,
                        "Backend probe failed, trying next",
                    );
                    continue;
                }
            }

            match backend.generate(prompt, width, height).await {
                Ok(image) => {
                    tracing::info!(
                        capability = %self.capability,
                        backend = backend.name(),
                        width,
                        height,
                        "Image generated",
                    );
                    return Ok(GeneratedImage {
                        image,
                        backend: backend.name().to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        capability = %self.capability,
                        backend = backend.name(),
                        error = %e,
                        "Generation failed, trying next backend",
                    );
                }
            }
        }

        Err(FallbackError::AllProvidersExhausted {
            capability: self.capability.clone(),
            attempted: self.backends.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
