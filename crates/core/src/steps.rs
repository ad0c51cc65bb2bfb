//! Step records: the per-step audit trail of a generation run.
//!
//! Each pipeline step produces one [`StepRecord`] that moves through a
//! forward-only state machine: `pending -> processing -> {completed |
//! failed}`. Records never regress; transition helpers silently
//! refuse anything else so audit writes can never corrupt a record.

use serde::Serialize;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Step kinds
// ---------------------------------------------------------------------------

/// The five pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Transcription,
    StoryGeneration,
    CharacterImage,
    BackgroundImage,
    Composition,
}

impl StepKind {
    /// The wire/key form of the step kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::StoryGeneration => "story_generation",
            Self::CharacterImage => "character_image",
            Self::BackgroundImage => "background_image",
            Self::Composition => "composition",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Step status
// ---------------------------------------------------------------------------

/// Status of a step record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl StepStatus {
    /// Whether the status is terminal (no further transitions).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Forward-only transition predicate.
    pub fn can_transition_to(self, next: StepStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

// ---------------------------------------------------------------------------
// Step record
// ---------------------------------------------------------------------------

/// One audit entry for one pipeline step of one run.
///
/// Result payload and error message are not mutually exclusive: a
/// failed step may still carry partial result data.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Which pipeline step this record belongs to.
    pub step: StepKind,
    /// Current status (forward-only).
    pub status: StepStatus,
    /// When the step body started.
    pub started_at: Timestamp,
    /// When the step reached a terminal status.
    pub completed_at: Option<Timestamp>,
    /// Derived: terminal time minus start time, in seconds.
    pub duration_secs: Option<f64>,
    /// Arbitrary structured result data (image dimensions, transcript
    /// confidence, ...).
    pub result: serde_json::Value,
    /// Human-readable error when the step failed.
    pub error_message: Option<String>,
}

impl StepRecord {
    /// Create a `processing` record starting now.
    pub fn begin(step: StepKind) -> Self {
        Self {
            step,
            status: StepStatus::Processing,
            started_at: chrono::Utc::now(),
            completed_at: None,
            duration_secs: None,
            result: serde_json::Value::Null,
            error_message: None,
        }
    }

    /// Whether the record is still open for a terminal transition.
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Transition to `completed` with a result payload.
    ///
    /// No-op when the record is already terminal.
    pub fn complete(&mut self, result: serde_json::Value) {
        if !self.status.can_transition_to(StepStatus::Completed) {
            return;
        }
        self.status = StepStatus::Completed;
        self.result = result;
        self.finish();
    }

    /// Transition to `failed` with an error message, optionally
    /// keeping partial result data.
    ///
    /// No-op when the record is already terminal.
    pub fn fail(&mut self, error: impl Into<String>, partial_result: Option<serde_json::Value>) {
        if !self.status.can_transition_to(StepStatus::Failed) {
            return;
        }
        self.status = StepStatus::Failed;
        self.error_message = Some(error.into());
        if let Some(partial) = partial_result {
            self.result = partial;
        }
        self.finish();
    }

    /// Stamp the terminal time and derive the duration.
    fn finish(&mut self) {
        let now = chrono::Utc::now();
        self.completed_at = Some(now);
        self.duration_secs = Some(
            (now - self.started_at)
                .to_std()
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Transitions --

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(StepStatus::Pending.can_transition_to(StepStatus::Processing));
        assert!(StepStatus::Processing.can_transition_to(StepStatus::Completed));
        assert!(StepStatus::Processing.can_transition_to(StepStatus::Failed));
    }

    #[test]
    fn regressions_are_rejected() {
        assert!(!StepStatus::Completed.can_transition_to(StepStatus::Processing));
        assert!(!StepStatus::Failed.can_transition_to(StepStatus::Processing));
        assert!(!StepStatus::Completed.can_transition_to(StepStatus::Failed));
        assert!(!StepStatus::Processing.can_transition_to(StepStatus::Pending));
    }

    // -- Records --

    #[test]
    fn complete_stamps_terminal_fields() {
        let mut record = StepRecord::begin(StepKind::StoryGeneration);
        assert!(record.is_open());

        record.complete(serde_json::json!({"story_length": 42}));
        assert_eq!(record.status, StepStatus::Completed);
        assert!(record.completed_at.is_some());
        assert!(record.duration_secs.unwrap() >= 0.0);
        assert_eq!(record.result["story_length"], 42);
    }

    #[test]
    fn fail_keeps_partial_result_data() {
        let mut record = StepRecord::begin(StepKind::CharacterImage);
        record.fail("backend timeout", Some(serde_json::json!({"attempted": 3})));

        assert_eq!(record.status, StepStatus::Failed);
        assert_eq!(record.error_message.as_deref(), Some("backend timeout"));
        assert_eq!(record.result["attempted"], 3);
    }

    #[test]
    fn terminal_records_do_not_regress() {
        let mut record = StepRecord::begin(StepKind::Composition);
        record.complete(serde_json::Value::Null);
        let completed_at = record.completed_at;

        record.fail("late failure", None);
        assert_eq!(record.status, StepStatus::Completed);
        assert_eq!(record.completed_at, completed_at);
        assert!(record.error_message.is_none());
    }

    #[test]
    fn step_kind_wire_form() {
        assert_eq!(StepKind::Transcription.as_str(), "transcription");
        assert_eq!(StepKind::BackgroundImage.to_string(), "background_image");
    }
}
