//! Pipeline orchestrator: drives one generation run end to end.
//!
//! Steps run strictly in order because each feeds the next:
//! transcription -> story -> character image -> background image ->
//! composition. Transcription and story generation are fatal stages;
//! the three image stages are degraded-but-tolerated, so a run whose
//! images fail still succeeds with its text fields populated.
//!
//! The fatal-vs-degraded policy is expressed as an explicit
//! [`StepOutcome`] tag at every call site rather than catch-and-
//! continue error handling, keeping the partial-failure contract
//! visible in the signatures.

use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;

use fabula_core::compose::{compose_scene, ScenePosition};
use fabula_core::prompt::{background_image_prompt, character_image_prompt};
use fabula_core::scene_context::extract_scene;
use fabula_core::steps::{StepKind, StepRecord};
use fabula_core::types::RunId;
use fabula_providers::capability::{
    ArtifactRef, ArtifactStore, TextGenerationService, TranscriptionService,
};
use fabula_providers::fallback::ImageFallbackClient;

use crate::ledger::StepLedger;
use crate::run::{GenerationRun, RunOutcome, RunRequest};

/// Width and height requested from image backends.
pub const IMAGE_GEN_SIZE: u32 = 512;

/// Errors rejected before any step executes.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Neither a prompt nor an audio file was provided.
    #[error("Either a prompt or an audio file is required")]
    InvalidInput,
}

/// Outcome of one pipeline step, tagged with its failure policy.
enum StepOutcome<T> {
    /// The step completed and produced a value.
    Ok(T),
    /// The step failed but the run continues (image stages).
    Degraded(String),
    /// The step failed and the run terminates (text stages).
    Fatal(String),
}

/// Drives generation runs against the configured collaborators.
///
/// Runs are independent: the only shared mutable state is the step
/// ledger, which is keyed by run identity. Within a run everything is
/// sequential; callers wanting parallel runs spawn one task per run.
pub struct PipelineOrchestrator {
    transcription: Arc<dyn TranscriptionService>,
    text: Arc<dyn TextGenerationService>,
    images: ImageFallbackClient,
    store: Arc<dyn ArtifactStore>,
    ledger: Arc<StepLedger>,
}

impl PipelineOrchestrator {
    pub fn new(
        transcription: Arc<dyn TranscriptionService>,
        text: Arc<dyn TextGenerationService>,
        images: ImageFallbackClient,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            transcription,
            text,
            images,
            store,
            ledger: Arc::new(StepLedger::new()),
        }
    }

    /// Audit records for a run, ordered by start time.
    pub async fn step_records(&self, run_id: RunId) -> Vec<StepRecord> {
        self.ledger.records_for(run_id).await
    }

    /// Execute one full generation run.
    ///
    /// Returns `Err(InvalidInput)` without creating a run (and without
    /// writing any step record) when both inputs are absent. Fatal
    /// stage failures return `Ok` with `success == false` so the run
    /// identity stays available for diagnostics.
    pub async fn run(&self, request: RunRequest) -> Result<RunOutcome, PipelineError> {
        let has_prompt = request
            .prompt
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        if !has_prompt && request.audio.is_none() {
            return Err(PipelineError::InvalidInput);
        }

        let started = Instant::now();
        let mut run = GenerationRun::new(&request);
        tracing::info!(run_id = %run.id, "Starting generation run");

        // Step 1: transcription (audio path only) — fatal.
        if let Some(audio) = &request.audio {
            match self.transcription_step(run.id, audio).await {
                StepOutcome::Ok(text) => run.transcribed_text = Some(text),
                StepOutcome::Fatal(error) | StepOutcome::Degraded(error) => {
                    return Ok(self.finish_failed(run, StepKind::Transcription, error, started));
                }
            }
        }

        // Step 2: story generation — fatal.
        let effective_prompt = run
            .effective_prompt()
            .unwrap_or_default()
            .to_string();
        match self.story_step(run.id, &effective_prompt).await {
            StepOutcome::Ok(generated) => {
                run.generation_parameters = serde_json::json!({
                    "model_used": generated.model,
                    "prompt_used": effective_prompt,
                });
                run.story_text = Some(generated.story);
                run.character_description = Some(generated.character_description);
            }
            StepOutcome::Fatal(error) | StepOutcome::Degraded(error) => {
                return Ok(self.finish_failed(run, StepKind::StoryGeneration, error, started));
            }
        }

        let story = run.story_text.clone().unwrap_or_default();
        let character_description = run.character_description.clone().unwrap_or_default();

        // Step 3: character image — degraded on failure.
        let character_prompt = character_image_prompt(&character_description);
        let character_image = match self
            .image_step(run.id, StepKind::CharacterImage, "character", &character_prompt)
            .await
        {
            StepOutcome::Ok((reference, img)) => {
                run.character_image = Some(reference);
                Some(img)
            }
            StepOutcome::Degraded(error) | StepOutcome::Fatal(error) => {
                tracing::warn!(run_id = %run.id, error = %error, "Character image degraded");
                None
            }
        };

        // Step 4: background image — degraded on failure.
        let scene = extract_scene(&story);
        let background_prompt = background_image_prompt(&scene, &character_description);
        let background_image = match self
            .image_step(
                run.id,
                StepKind::BackgroundImage,
                "background",
                &background_prompt,
            )
            .await
        {
            StepOutcome::Ok((reference, img)) => {
                run.background_image = Some(reference);
                Some(img)
            }
            StepOutcome::Degraded(error) | StepOutcome::Fatal(error) => {
                tracing::warn!(run_id = %run.id, error = %error, "Background image degraded");
                None
            }
        };

        // Step 5: composition — only when both images exist; degraded.
        if let (Some(character), Some(background)) = (character_image, background_image) {
            match self.composition_step(run.id, &character, &background).await {
                StepOutcome::Ok(reference) => run.composed_image = Some(reference),
                StepOutcome::Degraded(error) | StepOutcome::Fatal(error) => {
                    tracing::warn!(run_id = %run.id, error = %error, "Composition degraded");
                }
            }
        }

        run.processing_time_secs = Some(started.elapsed().as_secs_f64());
        tracing::info!(
            run_id = %run.id,
            processing_time_secs = run.processing_time_secs,
            composed = run.composed_image.is_some(),
            "Generation run finished",
        );

        Ok(RunOutcome::success(&run))
    }

    // ---- steps ----

    /// Transcribe the audio input. Fatal on failure.
    async fn transcription_step(
        &self,
        run_id: RunId,
        audio: &fabula_providers::capability::AudioSource,
    ) -> StepOutcome<String> {
        self.ledger.begin(run_id, StepKind::Transcription).await;

        match self.transcription.transcribe(audio).await {
            Ok(transcript) => {
                self.ledger
                    .complete(
                        run_id,
                        StepKind::Transcription,
                        serde_json::json!({
                            "transcription": transcript.text,
                            "confidence": transcript.confidence,
                        }),
                    )
                    .await;
                StepOutcome::Ok(transcript.text)
            }
            Err(e) => {
                let error = e.to_string();
                self.ledger
                    .fail(run_id, StepKind::Transcription, &error)
                    .await;
                StepOutcome::Fatal(error)
            }
        }
    }

    /// Generate story text and character description. Fatal on failure.
    async fn story_step(
        &self,
        run_id: RunId,
        prompt: &str,
    ) -> StepOutcome<fabula_providers::capability::GeneratedText> {
        self.ledger.begin(run_id, StepKind::StoryGeneration).await;

        match self.text.generate(prompt).await {
            Ok(generated) => {
                self.ledger
                    .complete(
                        run_id,
                        StepKind::StoryGeneration,
                        serde_json::json!({
                            "story_length": generated.story.len(),
                            "model_used": generated.model,
                        }),
                    )
                    .await;
                StepOutcome::Ok(generated)
            }
            Err(e) => {
                let error = e.to_string();
                self.ledger
                    .fail(run_id, StepKind::StoryGeneration, &error)
                    .await;
                StepOutcome::Fatal(error)
            }
        }
    }

    /// Generate and persist one image via the fallback client.
    /// Degraded on failure (generation or persistence).
    async fn image_step(
        &self,
        run_id: RunId,
        step: StepKind,
        artifact_kind: &str,
        prompt: &str,
    ) -> StepOutcome<(ArtifactRef, DynamicImage)> {
        self.ledger.begin(run_id, step).await;

        let generated = match self
            .images
            .generate(prompt, IMAGE_GEN_SIZE, IMAGE_GEN_SIZE)
            .await
        {
            Ok(generated) => generated,
            Err(e) => {
                let error = e.to_string();
                self.ledger.fail(run_id, step, &error).await;
                return StepOutcome::Degraded(error);
            }
        };

        let (width, height) = (generated.image.width(), generated.image.height());
        let payload = serde_json::json!({
            "image_size": [width, height],
            "backend": generated.backend,
        });

        match self
            .store
            .store_image(run_id, artifact_kind, &generated.image.to_rgba8())
            .await
        {
            Ok(reference) => {
                self.ledger.complete(run_id, step, payload).await;
                StepOutcome::Ok((reference, generated.image))
            }
            Err(e) => {
                // The image was produced; keep its dimensions as
                // partial result data alongside the storage error.
                let error = e.to_string();
                self.ledger
                    .fail_with_data(run_id, step, &error, Some(payload))
                    .await;
                StepOutcome::Degraded(error)
            }
        }
    }

    /// Compose the two images and persist the result. Degraded on
    /// failure.
    async fn composition_step(
        &self,
        run_id: RunId,
        character: &DynamicImage,
        background: &DynamicImage,
    ) -> StepOutcome<ArtifactRef> {
        self.ledger.begin(run_id, StepKind::Composition).await;

        let composed = match compose_scene(character, background, ScenePosition::Center, true) {
            Ok(composed) => composed,
            Err(e) => {
                let error = e.to_string();
                self.ledger.fail(run_id, StepKind::Composition, &error).await;
                return StepOutcome::Degraded(error);
            }
        };

        let info = serde_json::to_value(&composed.info).unwrap_or_default();

        match self.store.store_image(run_id, "composed", &composed.image).await {
            Ok(reference) => {
                self.ledger
                    .complete(run_id, StepKind::Composition, info)
                    .await;
                StepOutcome::Ok(reference)
            }
            Err(e) => {
                let error = e.to_string();
                self.ledger
                    .fail_with_data(run_id, StepKind::Composition, &error, Some(info))
                    .await;
                StepOutcome::Degraded(error)
            }
        }
    }

    /// Finalize a run that died in a fatal stage.
    fn finish_failed(
        &self,
        mut run: GenerationRun,
        stage: StepKind,
        error: String,
        started: Instant,
    ) -> RunOutcome {
        run.processing_time_secs = Some(started.elapsed().as_secs_f64());
        tracing::error!(run_id = %run.id, stage = %stage, error = %error, "Generation run failed");
        RunOutcome::failed(&run, stage, error)
    }
}
