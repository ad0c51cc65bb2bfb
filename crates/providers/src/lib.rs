//! Capability interfaces and remote generation backends.
//!
//! The pipeline consumes the traits in [`capability`]; this crate also
//! ships concrete implementations over the Hugging Face Inference API
//! (free tier), the ordered-fallback client that wraps image backends,
//! and a filesystem artifact store.

pub mod capability;
pub mod fallback;
pub mod huggingface;
pub mod speech;
pub mod store;

pub use capability::{
    ArtifactRef, ArtifactStore, AudioSource, BackendStatus, GeneratedText,
    ImageGenerationBackend, ProviderError, TextGenerationService, Transcript,
    TranscriptionService,
};
pub use fallback::{FallbackError, GeneratedImage, ImageFallbackClient};
