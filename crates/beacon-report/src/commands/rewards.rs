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
use beacon_rewards::{batch::ReportRange, DutyAggregate, DutyReward, Wei};
use clap::Args;

use super::load_rewards;
use crate::{
    config::GlobalConfig,
    display::{format_eth, format_percent, short_key, DisplayManager},
    input::InputArgs,
};

/// Summarize per-validator rewards from a rewards-list response.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct RewardsReport {
    #[clap(flatten)]
    pub input: InputArgs,
    /// Only show consensus layer rewards (attestations, sync committee, proposal CL share).
    #[clap(long, conflicts_with = "el_only")]
    pub cl_only: bool,
    /// Only show execution layer rewards (proposal fees and MEV).
    #[clap(long)]
    pub el_only: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layer {
    Both,
    Consensus,
    Execution,
}

impl Layer {
    fn title(self) -> &'static str {
        match self {
            Layer::Both => "CL + EL",
            Layer::Consensus => "CL only",
            Layer::Execution => "EL only",
        }
    }

    fn reward(self, reward: &DutyReward) -> Wei {
        match self {
            Layer::Both => reward.total_earned,
            Layer::Consensus => reward.consensus_layer_reward(),
            Layer::Execution => reward.execution_layer_reward(),
        }
    }
}

impl RewardsReport {
    fn layer(&self) -> Layer {
        if self.cl_only {
            Layer::Consensus
        } else if self.el_only {
            Layer::Execution
        } else {
            Layer::Both
        }
    }

    /// Run the [RewardsReport] command.
    pub fn run(&self, _global_config: &GlobalConfig) -> Result<()> {
        let (envelope, rewards) = load_rewards(&self.input)?;
        let layer = self.layer();
        let display = DisplayManager::new();

        display.header(&format!("Validator Rewards Report ({})", layer.title()));
        if let Some(range) = envelope.range {
            print_range(&display, &range);
        }
        if rewards.is_empty() {
            display.note("No reward data found.");
            return Ok(());
        }

        for reward in &rewards {
            if !reward.reconcile().is_exact() {
                tracing::debug!(
                    "Validator {}: category sums differ from totals: {:?}",
                    reward.validator_index,
                    reward.reconcile()
                );
            }
            match layer {
                Layer::Both => print_full(&display, reward),
                Layer::Consensus => print_consensus(&display, reward),
                Layer::Execution => print_execution(&display, reward),
            }
        }

        if rewards.len() > 1 {
            let aggregate = DutyAggregate::from_rewards(&rewards);
            let total: Wei = rewards.iter().map(|r| layer.reward(r)).sum();
            display.header("Aggregate");
            display.item("Entries", rewards.len());
            display.item("Validators", aggregate.validators);
            display.item("Total rewards", format_eth(total.ether()));
            if layer == Layer::Both {
                display.item("Total penalty", format_eth(aggregate.penalty.ether()));
                display.item("Net", format_eth(aggregate.net().ether()));
            }
        }
        Ok(())
    }
}

fn print_range(display: &DisplayManager, range: &ReportRange) {
    let bound = |value: Option<u64>| value.map_or_else(|| "?".to_string(), |v| v.to_string());
    if range.epoch.start.is_some() || range.epoch.end.is_some() {
        display.item(
            "Epoch range",
            format!("{} - {}", bound(range.epoch.start), bound(range.epoch.end)),
        );
    }
    if range.slot.start.is_some() || range.slot.end.is_some() {
        display
            .item("Slot range", format!("{} - {}", bound(range.slot.start), bound(range.slot.end)));
    }
}

fn title(reward: &DutyReward, suffix: &str) -> String {
    let key = reward.public_key.as_deref().map(short_key).unwrap_or_else(|| "N/A".to_string());
    format!("Validator {} ({key}){suffix}", reward.validator_index)
}

fn print_full(display: &DisplayManager, reward: &DutyReward) {
    display.header(&title(reward, ""));
    display.item("Finality", reward.finality.as_deref().unwrap_or("unknown"));
    display.item("Total reward", format_eth(reward.total_earned.ether()));
    display.item("Total penalty", format_eth(reward.total_penalty.ether()));
    display.item("Total missed", format_eth(reward.total_missed.ether()));
    let efficiency = if reward.total_possible().is_zero() {
        "n/a".to_string()
    } else {
        format_percent(reward.capture_rate())
    };
    display.item("Efficiency", efficiency);

    display.item("Attestation", format_eth(reward.attestation_total.ether()));
    display.item("  Head", format_eth(reward.head.earned.ether()));
    display.item("  Source", format_eth(reward.source.earned.ether()));
    display.item("  Target", format_eth(reward.target.earned.ether()));
    display.item(
        "Sync committee",
        format!(
            "reward={}, penalty={}",
            format_eth(reward.sync_committee.earned.ether()),
            format_eth(reward.sync_committee.penalty.ether())
        ),
    );
    display.item("Proposals", format_eth(reward.proposal.total.ether()));
    display.item("  EL reward", format_eth(reward.proposal.execution_layer.ether()));
    display.item("  Inclusion", format_eth(reward.proposal.inclusion_bonus.ether()));
}

fn print_consensus(display: &DisplayManager, reward: &DutyReward) {
    display.header(&title(reward, " - CL only"));
    display.item("CL reward", format_eth(reward.consensus_layer_reward().ether()));
    display.item("  Attestation", format_eth(reward.attestation_total.ether()));
    display.item("  Sync", format_eth(reward.sync_committee.earned.ether()));
    display.item("  Proposal CL", format_eth(reward.proposal.consensus_layer.ether()));
}

fn print_execution(display: &DisplayManager, reward: &DutyReward) {
    display.header(&title(reward, " - EL only"));
    display.item("EL reward", format_eth(reward.execution_layer_reward().ether()));
}
