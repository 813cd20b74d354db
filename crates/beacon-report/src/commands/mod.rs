// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Subcommands of the beacon-report CLI.

mod aggregate;
mod apr;
mod balances;
mod epoch;
mod missed;
mod network;
mod queues;
mod rewards;
mod score;
mod tax_export;
mod validators;

pub use aggregate::AggregateReport;
pub use apr::AprReport;
pub use balances::BalancesReport;
pub use epoch::EpochConvert;
pub use missed::MissedReport;
pub use network::NetworkReport;
pub use queues::QueuesReport;
pub use rewards::RewardsReport;
pub use score::ScoreReport;
pub use tax_export::{TaxExport, TaxRow};
pub use validators::ValidatorsReport;

use anyhow::{Context, Result};
use beacon_rewards::{DutyReward, MagnitudeThreshold, RecordFailure, RewardsEnvelope};
use clap::Subcommand;
use serde_json::Value;

use crate::{config::GlobalConfig, input::InputArgs};

/// Reports over already-fetched beacon chain data.
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Convert between epochs, slots, timestamps and dates.
    Epoch(EpochConvert),
    /// Summarize validator rewards from a rewards-list response.
    Rewards(RewardsReport),
    /// Break down missed rewards by duty with remediation advice.
    Missed(MissedReport),
    /// Compute APR and APY from a rewards-list response.
    Apr(AprReport),
    /// Estimate validator queue waits.
    Queues(QueuesReport),
    /// Summarize network health.
    Network(NetworkReport),
    /// Show validator balance history and trends.
    Balances(BalancesReport),
    /// Report validator performance scores.
    Score(ScoreReport),
    /// Compare reward totals across periods.
    Aggregate(AggregateReport),
    /// Export rewards as tax-ready rows.
    TaxExport(TaxExport),
    /// Show validator lifecycle status and balances.
    Validators(ValidatorsReport),
}

impl Command {
    /// Run the command.
    pub fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        match self {
            Self::Epoch(cmd) => cmd.run(global_config),
            Self::Rewards(cmd) => cmd.run(global_config),
            Self::Missed(cmd) => cmd.run(global_config),
            Self::Apr(cmd) => cmd.run(global_config),
            Self::Queues(cmd) => cmd.run(global_config),
            Self::Network(cmd) => cmd.run(global_config),
            Self::Balances(cmd) => cmd.run(global_config),
            Self::Score(cmd) => cmd.run(global_config),
            Self::Aggregate(cmd) => cmd.run(global_config),
            Self::TaxExport(cmd) => cmd.run(global_config),
            Self::Validators(cmd) => cmd.run(global_config),
        }
    }
}

fn parse_envelope(document: &Value) -> Result<RewardsEnvelope> {
    RewardsEnvelope::from_value(document).context("input is not a rewards-list response")
}

/// Decompose every record of the envelope, logging and skipping the malformed ones.
fn decompose_envelope(envelope: &RewardsEnvelope) -> Vec<DutyReward> {
    let outcome = envelope.decompose(&MagnitudeThreshold::default());
    log_failures(&outcome.failures);
    outcome.records
}

fn load_rewards(input: &InputArgs) -> Result<(RewardsEnvelope, Vec<DutyReward>)> {
    let envelope = parse_envelope(&input.load()?)?;
    let rewards = decompose_envelope(&envelope);
    Ok((envelope, rewards))
}

fn log_failures(failures: &[RecordFailure]) {
    for failure in failures {
        match failure.validator_index {
            Some(index) => tracing::warn!(
                "Skipping record {} (validator {index}): {}",
                failure.position,
                failure.error
            ),
            None => tracing::warn!("Skipping record {}: {}", failure.position, failure.error),
        }
    }
    if !failures.is_empty() {
        tracing::warn!("{} record(s) skipped", failures.len());
    }
}

/// Entries of a `data` list; a single object counts as one entry.
fn data_entries(document: &Value) -> Vec<Value> {
    match document.get("data").unwrap_or(document) {
        Value::Array(entries) => entries.clone(),
        Value::Object(entry) if !entry.is_empty() && document.get("data").is_some() => {
            vec![Value::Object(entry.clone())]
        }
        _ => Vec::new(),
    }
}
