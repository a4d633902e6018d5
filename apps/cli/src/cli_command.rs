use std::path::PathBuf;

use clap::{Parser, Subcommand};
use grcpilot_domain::{AiFeature, IngestionTarget, PromptContext};

/// Runs GRC dashboard AI features against a local inference endpoint.
#[derive(Debug, Parser)]
#[command(name = "grcpilot", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the AI feature catalog
    Features,
    /// Check that the inference endpoint serves the configured model
    Health,
    /// Run one AI feature and print its result and the audit trail
    Run {
        /// Feature name, e.g. risk-insights
        feature: AiFeature,
        /// Prompt slot values as name=value
        #[arg(value_parser = parse_slot_assignment)]
        slots: Vec<SlotAssignment>,
        /// Filter the printed audit trail by user, module or action
        #[arg(long)]
        search: Option<String>,
    },
    /// Map a tabular file onto a module schema
    Ingest {
        /// Target module: risk, audit, user, asset, regulation or policy
        target: IngestionTarget,
        /// File holding the tabular content
        file: PathBuf,
        /// Filter the printed audit trail by user, module or action
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAssignment {
    pub slot: String,
    pub value: String,
}

pub fn prompt_context(slots: Vec<SlotAssignment>) -> PromptContext {
    slots
        .into_iter()
        .map(|assignment| (assignment.slot, assignment.value))
        .collect()
}

fn parse_slot_assignment(raw: &str) -> Result<SlotAssignment, String> {
    let Some((slot, value)) = raw.split_once('=') else {
        return Err(format!("expected name=value, got '{raw}'"));
    };

    let slot = slot.trim();
    if slot.is_empty() {
        return Err(format!("slot name is missing in '{raw}'"));
    }

    Ok(SlotAssignment {
        slot: slot.to_owned(),
        value: value.to_owned(),
    })
}
