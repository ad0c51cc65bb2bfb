//! Command-line worker: runs one generation end to end.
//!
//! Reads the prompt from the command line, builds the hosted-API
//! provider stack from the environment, executes a single pipeline
//! run, and prints the outcome plus the step records as JSON.

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fabula_pipeline::{PipelineOrchestrator, RunRequest};
use fabula_providers::fallback::ImageFallbackClient;
use fabula_providers::huggingface::{image_backends, HuggingFaceClient, HuggingFaceTextService};
use fabula_providers::speech::{WhisperTranscriptionService, DEFAULT_SPEECH_MODEL};
use fabula_providers::store::FsArtifactStore;

use crate::config::WorkerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fabula_worker=debug,fabula_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prompt: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if prompt.trim().is_empty() {
        eprintln!("usage: fabula-worker <prompt...>");
        return ExitCode::FAILURE;
    }

    let config = WorkerConfig::from_env();
    tracing::info!(
        base_url = %config.base_url,
        text_model = %config.text_model,
        image_models = config.image_models.len(),
        output_dir = %config.output_dir,
        "Worker starting",
    );

    let client = Arc::new(HuggingFaceClient::with_base_url(
        config.base_url.clone(),
        config.api_key.clone(),
    ));

    let orchestrator = PipelineOrchestrator::new(
        Arc::new(WhisperTranscriptionService::with_base_url(
            config.base_url.clone(),
            DEFAULT_SPEECH_MODEL,
            config.api_key.clone(),
        )),
        Arc::new(HuggingFaceTextService::new(
            Arc::clone(&client),
            config.text_model.clone(),
        )),
        ImageFallbackClient::new(
            "scene image",
            image_backends(&client, &config.image_models),
        ),
        Arc::new(FsArtifactStore::new(config.output_dir.clone())),
    );

    let outcome = match orchestrator
        .run(RunRequest {
            prompt: Some(prompt),
            audio: None,
        })
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Run rejected");
            return ExitCode::FAILURE;
        }
    };

    let records = orchestrator.step_records(outcome.run_id).await;
    let report = serde_json::json!({
        "outcome": &outcome,
        "steps": records,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize report");
            return ExitCode::FAILURE;
        }
    }

    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
