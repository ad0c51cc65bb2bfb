//! The generation-run entity and its public outcome.

use serde::Serialize;

use fabula_core::steps::StepKind;
use fabula_core::types::{RunId, Timestamp};
use fabula_providers::capability::{ArtifactRef, AudioSource};

/// Input to one pipeline invocation. At least one of the two fields
/// must be present.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Raw user prompt.
    pub prompt: Option<String>,
    /// Audio to transcribe into a prompt.
    pub audio: Option<AudioSource>,
}

/// One end-to-end generation run.
///
/// Created at invocation, populated monotonically as steps complete
/// (each output field is written at most once), and frozen when the
/// orchestrator returns.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRun {
    /// Unique identity, created at invocation.
    pub id: RunId,
    /// Raw prompt text, when provided.
    pub user_prompt: Option<String>,
    /// Filename of the audio input, when provided.
    pub audio_filename: Option<String>,
    /// Transcription output; set only when the audio path was taken.
    pub transcribed_text: Option<String>,
    /// Generated story body.
    pub story_text: Option<String>,
    /// Generated character description.
    pub character_description: Option<String>,
    /// Persisted character image reference.
    pub character_image: Option<ArtifactRef>,
    /// Persisted background image reference.
    pub background_image: Option<ArtifactRef>,
    /// Persisted composed scene reference.
    pub composed_image: Option<ArtifactRef>,
    /// Parameters used for generation (model, effective prompt).
    pub generation_parameters: serde_json::Value,
    /// Wall-clock duration of the whole run in seconds.
    pub processing_time_secs: Option<f64>,
    /// When the run was created.
    pub created_at: Timestamp,
}

impl GenerationRun {
    /// Create a fresh run from a request.
    pub fn new(request: &RunRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            user_prompt: request.prompt.clone(),
            audio_filename: request.audio.as_ref().map(|a| a.filename.clone()),
            transcribed_text: None,
            story_text: None,
            character_description: None,
            character_image: None,
            background_image: None,
            composed_image: None,
            generation_parameters: serde_json::Value::Null,
            processing_time_secs: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// The prompt the story step runs on: the transcription when the
    /// audio path was taken, the raw prompt otherwise.
    pub fn effective_prompt(&self) -> Option<&str> {
        self.transcribed_text
            .as_deref()
            .or(self.user_prompt.as_deref())
    }
}

/// The caller-facing result of a pipeline invocation.
///
/// A run with only image-step degradation is still a success: text
/// fields are populated, image references absent.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Whether all fatal stages completed.
    pub success: bool,
    /// Identity of the run, for diagnostics and record lookup.
    pub run_id: RunId,
    pub story_text: Option<String>,
    pub character_description: Option<String>,
    pub character_image: Option<ArtifactRef>,
    pub background_image: Option<ArtifactRef>,
    pub composed_image: Option<ArtifactRef>,
    /// Wall-clock duration of the run in seconds.
    pub processing_time_secs: Option<f64>,
    /// The fatal stage, when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<StepKind>,
    /// The originating error, when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    /// Successful outcome carrying whatever the run produced.
    pub fn success(run: &GenerationRun) -> Self {
        Self::build(run, true, None, None)
    }

    /// Failed outcome tagged with the fatal stage.
    pub fn failed(run: &GenerationRun, stage: StepKind, error: String) -> Self {
        Self::build(run, false, Some(stage), Some(error))
    }

    fn build(
        run: &GenerationRun,
        success: bool,
        failed_stage: Option<StepKind>,
        error: Option<String>,
    ) -> Self {
        Self {
            success,
            run_id: run.id,
            story_text: run.story_text.clone(),
            character_description: run.character_description.clone(),
            character_image: run.character_image.clone(),
            background_image: run.background_image.clone(),
            composed_image: run.composed_image.clone(),
            processing_time_secs: run.processing_time_secs,
            failed_stage,
            error,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
