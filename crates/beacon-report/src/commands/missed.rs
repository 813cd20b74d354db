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
use beacon_rewards::{diagnose, Diagnostic, DutyAggregate, DutyReward};
use clap::Args;

use super::load_rewards;
use crate::{
    config::GlobalConfig,
    display::{format_eth, format_metric, format_percent, severity_marker, table, DisplayManager},
    input::InputArgs,
};

/// Break missed rewards down by duty and suggest remediations.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct MissedReport {
    #[clap(flatten)]
    pub input: InputArgs,
}

fn duty_label(duty: &str) -> &'static str {
    match duty {
        "head" => "Attestation (head)",
        "source" => "Attestation (source)",
        "target" => "Attestation (target)",
        "sync" => "Sync committee",
        "proposal_cl" => "Proposals (CL)",
        "proposal_el" => "Proposals (EL/MEV)",
        _ => "Other",
    }
}

impl MissedReport {
    /// Run the [MissedReport] command.
    pub fn run(&self, _global_config: &GlobalConfig) -> Result<()> {
        let (_, rewards) = load_rewards(&self.input)?;
        let display = DisplayManager::new();
        if rewards.is_empty() {
            display.note("No reward data found.");
            return Ok(());
        }

        display.header("Missed Rewards Analysis");
        for reward in &rewards {
            print_validator(&display, reward);
        }

        if rewards.len() > 1 {
            let aggregate = DutyAggregate::from_rewards(&rewards);
            display.header("Aggregate Missed Rewards");
            display.item("Total earned", format_eth(aggregate.earned.ether()));
            display.item("Total missed", format_eth(aggregate.missed.ether()));
            display.item("Capture rate", format_percent(aggregate.capture_rate()));
            let missed: Vec<_> = aggregate
                .missed_by_duty
                .entries()
                .into_iter()
                .filter(|(_, amount)| amount.is_positive())
                .map(|(duty, amount)| [duty.to_string(), format_eth(amount.ether())])
                .collect();
            if missed.is_empty() {
                display.note("No missed duties across all validators.");
            } else {
                display.table(table(["Duty", "Missed"], missed));
            }
        }
        Ok(())
    }
}

fn print_validator(display: &DisplayManager, reward: &DutyReward) {
    display.header(&format!("Validator {}", reward.validator_index));
    display.item("Earned", format_eth(reward.total_earned.ether()));
    display.item("Missed", format_eth(reward.total_missed.ether()));
    display.item("Penalties", format_eth(reward.total_penalty.ether()));
    display.item("Capture rate", format_percent(reward.capture_rate()));

    let rows = reward
        .missed_by_duty()
        .entries()
        .map(|(duty, amount)| [duty_label(duty).to_string(), format_eth(amount.ether())]);
    display.table(table(["Missed by duty", "Amount"], rows));

    display.note("Diagnostics:");
    for diagnostic in diagnose(reward) {
        print_diagnostic(display, &diagnostic);
    }
}

fn print_diagnostic(display: &DisplayManager, diagnostic: &Diagnostic) {
    let marker = severity_marker(diagnostic.severity);
    match diagnostic.metric {
        Some(metric) => {
            display.note(format!("  {marker} {} ({})", diagnostic.label, format_metric(metric)))
        }
        None => display.note(format!("  {marker} {}", diagnostic.label)),
    }
    display.note(format!("      -> {}", diagnostic.remediation));
}
