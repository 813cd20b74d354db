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

use anyhow::Result;
use beacon_rewards::{FleetSummary, MagnitudeThreshold, ValidatorStatus};
use clap::Args;

use super::{data_entries, log_failures};
use crate::{
    config::GlobalConfig,
    display::{format_eth_places, severity_marker, short_key, DisplayManager},
    input::InputArgs,
};

/// Show the lifecycle status and balances of each validator.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct ValidatorsReport {
    #[clap(flatten)]
    pub input: InputArgs,
}

impl ValidatorsReport {
    /// Run the [ValidatorsReport] command.
    pub fn run(&self, _global_config: &GlobalConfig) -> Result<()> {
        let entries = data_entries(&self.input.load()?);
        let display = DisplayManager::new();
        if entries.is_empty() {
            display.note("No validator data found.");
            return Ok(());
        }

        let (statuses, failures) =
            ValidatorStatus::collect(&entries, &MagnitudeThreshold::default());
        log_failures(&failures);

        display.header("Validator Status Report");
        for status in &statuses {
            print_validator(&display, status);
        }

        let summary = FleetSummary::from_statuses(&statuses);
        display.header("Summary");
        display.item("Total validators", summary.validators);
        display.item("Total balance", format_eth_places(summary.total_balance.ether(), 4));
        display.item(
            "Total effective",
            format_eth_places(summary.total_effective_balance.ether(), 4),
        );
        display.note("Status breakdown:");
        for (status, count) in &summary.status_counts {
            display.note(format!("    {status}: {count}"));
        }
        if !summary.offline_active.is_empty() {
            let indices: Vec<_> = summary.offline_active.iter().map(u64::to_string).collect();
            display.warning(format!("Offline active validators: {}", indices.join(", ")));
            display.note("      Check node connectivity and client health immediately.");
        }
        Ok(())
    }
}

fn print_validator(display: &DisplayManager, status: &ValidatorStatus) {
    let lifecycle = status.lifecycle();
    let index = status.validator_index.map_or_else(|| "?".to_string(), |i| i.to_string());
    let key = status.public_key.as_deref().map(short_key).unwrap_or_else(|| "N/A".to_string());
    display.header(&format!(
        "{} {}  Validator {index} ({key})",
        severity_marker(lifecycle.severity()),
        lifecycle.label()
    ));
    display.item(
        "Balance",
        format!(
            "{} (effective: {})",
            format_eth_places(status.balance.ether(), 4),
            format_eth_places(status.effective_balance.ether(), 4)
        ),
    );
    display.item("Status", format!("{} | Slashed: {}", status.status, status.slashed));
    if let Some(epoch) = status.activation_epoch {
        display.item("Activated at epoch", epoch);
    }
    if let Some(epoch) = status.exit_epoch {
        display.item("Exit epoch", epoch);
    }
    if let Some(credentials) = &status.withdrawal_credentials {
        display.item(
            "Withdrawal",
            format!(
                "{} (prefix {})",
                credentials.kind.as_deref().unwrap_or("?"),
                credentials.prefix.as_deref().unwrap_or("?")
            ),
        );
    }
    for alert in status.alerts() {
        display.note(format!("    {} {}", severity_marker(alert.severity), alert.label));
    }
}
