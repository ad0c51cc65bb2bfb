//! End-to-end orchestrator runs against in-process collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};

use fabula_core::steps::{StepKind, StepStatus};
use fabula_core::types::RunId;
use fabula_providers::capability::{
    ArtifactRef, ArtifactStore, AudioSource, BackendStatus, GeneratedText,
    ImageGenerationBackend, ProviderError, TextGenerationService, Transcript,
    TranscriptionService,
};
use fabula_providers::fallback::ImageFallbackClient;
use fabula_pipeline::{PipelineError, PipelineOrchestrator, RunRequest};

// ---------------------------------------------------------------------------
// Collaborator doubles
// ---------------------------------------------------------------------------

struct FixedTranscription(&'static str);

#[async_trait]
impl TranscriptionService for FixedTranscription {
    async fn transcribe(&self, _audio: &AudioSource) -> Result<Transcript, ProviderError> {
        Ok(Transcript {
            text: self.0.to_string(),
            confidence: 0.85,
        })
    }
}

struct FailingTranscription;

#[async_trait]
impl TranscriptionService for FailingTranscription {
    async fn transcribe(&self, _audio: &AudioSource) -> Result<Transcript, ProviderError> {
        Err(ProviderError::Api {
            status: 500,
            body: "speech backend down".to_string(),
        })
    }
}

/// Returns a canned story and records the prompt it was asked for.
struct RecordingText {
    seen_prompt: Mutex<Option<String>>,
}

impl RecordingText {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            seen_prompt: Mutex::new(None),
        })
    }
}

#[async_trait]
impl TextGenerationService for RecordingText {
    async fn generate(&self, prompt: &str) -> Result<GeneratedText, ProviderError> {
        *self.seen_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(GeneratedText {
            story: "Once upon a time, deep in a forest, a knight wandered.".to_string(),
            character_description: "A weathered knight in silver armor".to_string(),
            model: "test-model".to_string(),
        })
    }
}

struct FailingText;

#[async_trait]
impl TextGenerationService for FailingText {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedText, ProviderError> {
        Err(ProviderError::Api {
            status: 503,
            body: "model overloaded".to_string(),
        })
    }
}

fn test_image() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(512, 512, Rgba([10, 20, 30, 255])))
}

/// Always-ready backend that succeeds for the first `successes`
/// generations and fails afterwards.
struct FlakyBackend {
    successes: usize,
    calls: AtomicUsize,
}

impl FlakyBackend {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            successes: usize::MAX,
            calls: AtomicUsize::new(0),
        })
    }

    fn succeeding_times(successes: usize) -> Arc<Self> {
        Arc::new(Self {
            successes,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ImageGenerationBackend for FlakyBackend {
    fn name(&self) -> &str {
        "flaky/backend"
    }

    async fn probe_ready(&self) -> BackendStatus {
        BackendStatus::Ready
    }

    async fn generate(
        &self,
        _prompt: &str,
        _width: u32,
        _height: u32,
    ) -> Result<DynamicImage, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.successes {
            Ok(test_image())
        } else {
            Err(ProviderError::Api {
                status: 429,
                body: "rate limited".to_string(),
            })
        }
    }
}

/// In-memory store that remembers every kind it persisted.
struct MemoryStore {
    kinds: Mutex<Vec<String>>,
}

impl MemoryStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            kinds: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn store_image(
        &self,
        run_id: RunId,
        kind: &str,
        _image: &RgbaImage,
    ) -> Result<ArtifactRef, ProviderError> {
        self.kinds.lock().unwrap().push(kind.to_string());
        Ok(format!("{kind}_{run_id}.png"))
    }
}

struct FailingStore;

#[async_trait]
impl ArtifactStore for FailingStore {
    async fn store_image(
        &self,
        _run_id: RunId,
        _kind: &str,
        _image: &RgbaImage,
    ) -> Result<ArtifactRef, ProviderError> {
        Err(ProviderError::Storage("disk full".to_string()))
    }
}

fn orchestrator_with(
    transcription: Arc<dyn TranscriptionService>,
    text: Arc<dyn TextGenerationService>,
    backend: Arc<dyn ImageGenerationBackend>,
    store: Arc<dyn ArtifactStore>,
) -> PipelineOrchestrator {
    PipelineOrchestrator::new(
        transcription,
        text,
        ImageFallbackClient::new("scene image", vec![backend]),
        store,
    )
}

fn happy_orchestrator() -> (PipelineOrchestrator, Arc<RecordingText>) {
    let text = RecordingText::new();
    let orchestrator = orchestrator_with(
        Arc::new(FixedTranscription("a knight in a forest")),
        text.clone(),
        FlakyBackend::succeeding(),
        MemoryStore::new(),
    );
    (orchestrator, text)
}

fn prompt_request(prompt: &str) -> RunRequest {
    RunRequest {
        prompt: Some(prompt.to_string()),
        audio: None,
    }
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_request_is_rejected() {
    let (orchestrator, _) = happy_orchestrator();

    let result = orchestrator.run(RunRequest::default()).await;
    assert_matches!(result, Err(PipelineError::InvalidInput));
}

#[tokio::test]
async fn whitespace_prompt_counts_as_absent() {
    let (orchestrator, _) = happy_orchestrator();

    let result = orchestrator.run(prompt_request("   ")).await;
    assert_matches!(result, Err(PipelineError::InvalidInput));
}

// ---------------------------------------------------------------------------
// Success paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prompt_run_produces_all_artifacts() {
    let (orchestrator, text) = happy_orchestrator();

    let outcome = orchestrator
        .run(prompt_request("tell me about a dragon"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.story_text.is_some());
    assert!(outcome.character_description.is_some());
    assert!(outcome.character_image.is_some());
    assert!(outcome.background_image.is_some());
    assert!(outcome.composed_image.is_some());
    assert!(outcome.failed_stage.is_none());
    assert!(outcome.processing_time_secs.is_some());
    assert_eq!(
        text.seen_prompt.lock().unwrap().as_deref(),
        Some("tell me about a dragon"),
    );

    // No audio input, so no transcription step.
    let records = orchestrator.step_records(outcome.run_id).await;
    let steps: Vec<StepKind> = records.iter().map(|r| r.step).collect();
    assert_eq!(
        steps,
        vec![
            StepKind::StoryGeneration,
            StepKind::CharacterImage,
            StepKind::BackgroundImage,
            StepKind::Composition,
        ],
    );
    assert!(records.iter().all(|r| r.status == StepStatus::Completed));
    assert!(records.iter().all(|r| r.duration_secs.is_some()));
}

#[tokio::test]
async fn audio_run_feeds_transcript_into_story_prompt() {
    let (orchestrator, text) = happy_orchestrator();

    let outcome = orchestrator
        .run(RunRequest {
            prompt: None,
            audio: Some(AudioSource {
                filename: "tale.wav".to_string(),
                bytes: vec![0u8; 128],
            }),
        })
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(
        text.seen_prompt.lock().unwrap().as_deref(),
        Some("a knight in a forest"),
    );

    let records = orchestrator.step_records(outcome.run_id).await;
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].step, StepKind::Transcription);
    assert_eq!(records[0].status, StepStatus::Completed);
    assert_eq!(records[0].result["confidence"], 0.85);
}

// ---------------------------------------------------------------------------
// Fatal stages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transcription_failure_ends_the_run() {
    let orchestrator = orchestrator_with(
        Arc::new(FailingTranscription),
        RecordingText::new(),
        FlakyBackend::succeeding(),
        MemoryStore::new(),
    );

    let outcome = orchestrator
        .run(RunRequest {
            prompt: None,
            audio: Some(AudioSource {
                filename: "tale.wav".to_string(),
                bytes: vec![0u8; 128],
            }),
        })
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.failed_stage, Some(StepKind::Transcription));
    assert!(outcome.story_text.is_none());

    let records = orchestrator.step_records(outcome.run_id).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, StepStatus::Failed);
    assert!(records[0].error_message.is_some());
}

#[tokio::test]
async fn story_failure_skips_every_later_step() {
    let orchestrator = orchestrator_with(
        Arc::new(FixedTranscription("unused")),
        Arc::new(FailingText),
        FlakyBackend::succeeding(),
        MemoryStore::new(),
    );

    let outcome = orchestrator
        .run(prompt_request("a doomed prompt"))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.failed_stage, Some(StepKind::StoryGeneration));
    assert!(outcome.character_image.is_none());
    assert!(outcome.composed_image.is_none());
    assert!(outcome.error.as_deref().unwrap().contains("model overloaded"));

    let records = orchestrator.step_records(outcome.run_id).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].step, StepKind::StoryGeneration);
    assert_eq!(records[0].status, StepStatus::Failed);
}

// ---------------------------------------------------------------------------
// Degraded stages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn background_failure_skips_composition_but_run_succeeds() {
    // First generation (character) succeeds, second (background) fails.
    let orchestrator = orchestrator_with(
        Arc::new(FixedTranscription("unused")),
        RecordingText::new(),
        FlakyBackend::succeeding_times(1),
        MemoryStore::new(),
    );

    let outcome = orchestrator
        .run(prompt_request("a knight story"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.character_image.is_some());
    assert!(outcome.background_image.is_none());
    assert!(outcome.composed_image.is_none());

    let records = orchestrator.step_records(outcome.run_id).await;
    let steps: Vec<StepKind> = records.iter().map(|r| r.step).collect();
    assert!(!steps.contains(&StepKind::Composition));
    let background = records
        .iter()
        .find(|r| r.step == StepKind::BackgroundImage)
        .unwrap();
    assert_eq!(background.status, StepStatus::Failed);
}

#[tokio::test]
async fn image_generation_failure_degrades_but_preserves_text() {
    let orchestrator = orchestrator_with(
        Arc::new(FixedTranscription("unused")),
        RecordingText::new(),
        FlakyBackend::succeeding_times(0),
        MemoryStore::new(),
    );

    let outcome = orchestrator
        .run(prompt_request("a knight story"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.story_text.is_some());
    assert!(outcome.character_description.is_some());
    assert!(outcome.character_image.is_none());
    assert!(outcome.background_image.is_none());
    assert!(outcome.composed_image.is_none());
}

#[tokio::test]
async fn store_failure_keeps_partial_result_data() {
    let orchestrator = orchestrator_with(
        Arc::new(FixedTranscription("unused")),
        RecordingText::new(),
        FlakyBackend::succeeding(),
        Arc::new(FailingStore),
    );

    let outcome = orchestrator
        .run(prompt_request("a knight story"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.character_image.is_none());

    let records = orchestrator.step_records(outcome.run_id).await;
    let character = records
        .iter()
        .find(|r| r.step == StepKind::CharacterImage)
        .unwrap();
    assert_eq!(character.status, StepStatus::Failed);
    // The image was generated before the store failed; its size stays
    // on the record as partial result data.
    assert_eq!(character.result["image_size"][0], 512);
    assert!(character
        .error_message
        .as_deref()
        .unwrap()
        .contains("disk full"));
}

#[tokio::test]
async fn composed_artifact_is_stored_under_its_kind() {
    let store = MemoryStore::new();
    let orchestrator = orchestrator_with(
        Arc::new(FixedTranscription("unused")),
        RecordingText::new(),
        FlakyBackend::succeeding(),
        store.clone(),
    );

    let outcome = orchestrator
        .run(prompt_request("a knight story"))
        .await
        .unwrap();
    assert!(outcome.success);

    let kinds = store.kinds.lock().unwrap().clone();
    assert_eq!(kinds, vec!["character", "background", "composed"]);
    assert!(outcome
        .composed_image
        .as_deref()
        .unwrap()
        .starts_with("composed_"));
}
