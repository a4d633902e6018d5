//! GRC Pilot AI assistant command-line host.

#![forbid(unsafe_code)]

mod cli_command;
mod cli_config;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use grcpilot_application::{
    AiAssistantService, AiAuditLogQuery, AiAuditLogRepository, AiAuditRecorder, AiFeatureOutcome,
    AuditLogBridge, EndpointHealth, PromptDispatcher,
};
use grcpilot_core::{AppError, AppResult};
use grcpilot_domain::{AiAuditLogEntry, AiFeature, ParsedResponse};
use grcpilot_infrastructure::{
    InMemoryAiAuditLogRepository, InMemorySessionContext, OllamaInferenceEndpoint,
};
use tracing::{info, warn};

use crate::cli_command::{Cli, CliCommand, prompt_context};
use crate::cli_config::{CliConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = CliConfig::load()?;

    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let endpoint = OllamaInferenceEndpoint::new(
        http_client,
        config.ollama_url.clone(),
        config.options,
    )
    .with_health_timeout(config.health_timeout);
    let dispatcher = PromptDispatcher::new(Arc::new(endpoint), config.model_id.clone());

    let audit_log = Arc::new(InMemoryAiAuditLogRepository::new());
    let session = Arc::new(match config.session_user.clone() {
        Some(user) => InMemorySessionContext::signed_in(user),
        None => {
            warn!("GRC_USER_ID is not set; AI interactions will not be audited");
            InMemorySessionContext::new()
        }
    });
    let audit_bridge = AuditLogBridge::new();
    let subscription =
        audit_bridge.subscribe(Arc::new(AiAuditRecorder::new(audit_log.clone(), session)));
    let service = AiAssistantService::new(dispatcher, audit_bridge);

    info!(
        ollama_url = %config.ollama_url,
        model_id = %config.model_id,
        "grcpilot started"
    );

    let trail_search = match cli.command {
        CliCommand::Features => {
            print_feature_catalog();
            None
        }
        CliCommand::Health => {
            print_endpoint_health(&service.check_endpoint().await);
            None
        }
        CliCommand::Run {
            feature,
            slots,
            search,
        } => {
            let outcome = service.run_feature(feature, &prompt_context(slots)).await;
            print_outcome(&outcome);
            Some(search)
        }
        CliCommand::Ingest {
            target,
            file,
            search,
        } => {
            let data = read_tabular_file(file.as_path()).await?;
            let outcome = service.ingest_tabular(target, data.as_str()).await;
            print_outcome(&outcome);
            Some(search)
        }
    };

    drop(service);
    subscription.drained().await;

    if let Some(search) = trail_search {
        let entries = audit_log
            .list_entries(AiAuditLogQuery {
                search,
                limit: None,
            })
            .await?;
        print_audit_trail(&entries);
    }

    Ok(())
}

async fn read_tabular_file(path: &Path) -> AppResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Validation(format!(
            "failed to read tabular file '{}': {error}",
            path.display()
        ))
    })
}

fn print_feature_catalog() {
    for feature in AiFeature::all() {
        let descriptor = feature.descriptor();
        println!(
            "{:<24} {:<22} {:<30} slots: {}",
            feature.as_str(),
            descriptor.module,
            descriptor.action,
            descriptor.template.slots().join(", ")
        );
    }
}

fn print_endpoint_health(health: &EndpointHealth) {
    if let Some(failure) = &health.failure {
        println!("Inference endpoint unreachable: {failure}");
        return;
    }

    println!("Inference endpoint reachable");
    if health.model_available {
        println!("Model '{}' is installed", health.model_id);
    } else {
        println!(
            "Model '{}' is not installed; run `ollama pull {}`",
            health.model_id, health.model_id
        );
    }

    if !health.available_models.is_empty() {
        println!("Installed models: {}", health.available_models.join(", "));
    }
}

fn print_outcome(outcome: &AiFeatureOutcome) {
    match outcome.structured() {
        Some(ParsedResponse::FallbackGuessed { .. }) => {
            println!("[placeholder: model output could not be parsed; values are not computed]");
        }
        Some(ParsedResponse::Unstructured(_)) => {
            println!("[model output could not be parsed]");
        }
        _ => {}
    }

    println!("{}", outcome.display_text());
}

fn print_audit_trail(entries: &[AiAuditLogEntry]) {
    println!();
    println!("AI audit trail ({} entries)", entries.len());
    for entry in entries {
        println!(
            "{}  {}  {}  {} / {}  [{}]",
            entry.id(),
            entry.display_timestamp(),
            entry.user_name(),
            entry.module(),
            entry.action(),
            entry.model_id()
        );
    }
}
