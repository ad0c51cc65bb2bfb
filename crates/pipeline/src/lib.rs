//! The generation pipeline: run entity, step ledger, and orchestrator.
//!
//! A run turns one prompt (text or audio) into a story, a character
//! description, and a composed scene image, sequencing five
//! independently-failing steps with per-step audit records and a
//! fatal-vs-degraded failure policy.

pub mod ledger;
pub mod orchestrator;
pub mod run;

pub use ledger::StepLedger;
pub use orchestrator::{PipelineError, PipelineOrchestrator};
pub use run::{GenerationRun, RunOutcome, RunRequest};
