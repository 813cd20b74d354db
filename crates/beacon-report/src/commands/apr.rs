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
use beacon_rewards::{fields::as_f64, ReturnsSummary, RewardsEnvelope, DEFAULT_STAKE};
use clap::Args;
use serde_json::Value;

use super::{decompose_envelope, parse_envelope};
use crate::{
    config::GlobalConfig,
    display::{format_count, format_decimal, format_eth, format_percent, DisplayManager},
    input::InputArgs,
};

/// Annualize the rewards of a rewards-list response into APR and APY.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct AprReport {
    #[clap(flatten)]
    pub input: InputArgs,
    /// Stake assumed per validator, in ETH.
    #[clap(long, default_value_t = DEFAULT_STAKE)]
    pub stake: f64,
}

impl AprReport {
    /// Run the [AprReport] command.
    pub fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let spec = global_config.chain_spec()?;
        let document = self.input.load()?;
        let envelope = match document.get("data") {
            Some(Value::Array(_)) | None => parse_envelope(&document)?,
            Some(_) => RewardsEnvelope::default(),
        };
        let display = DisplayManager::new();
        display.header("APR / APY Calculator");

        if envelope.data.is_empty() {
            if !print_precomputed(&display, &document) {
                display.note("No reward data found.");
            }
            return Ok(());
        }
        if self.stake <= 0.0 {
            tracing::warn!("Stake of {} ETH per validator yields a zero APR", self.stake);
        }

        let rewards = decompose_envelope(&envelope);
        let summary =
            ReturnsSummary::compute(&rewards, self.stake, envelope.period_epochs(), &spec);
        print_summary(&display, &envelope, &summary);
        Ok(())
    }
}

fn print_summary(display: &DisplayManager, envelope: &RewardsEnvelope, summary: &ReturnsSummary) {
    display.item(
        "Period",
        format!(
            "{} epochs (~{:.1} days)",
            format_count(summary.period_epochs),
            summary.period_days
        ),
    );
    if envelope.range.is_none() {
        tracing::info!("No epoch range in input; assuming one epoch per entry");
    }
    display.item("Validators", summary.validators);
    display.item("Assumed stake", format!("{} ETH", format_decimal(summary.assumed_stake, 1)));

    display.header("Rewards Summary");
    display.item("Total earned", format_eth(summary.total_earned));
    display.item("Total penalty", format_eth(summary.total_penalty));
    display.item("Net reward", format_eth(summary.net_reward));
    for (label, component) in
        [("CL rewards", summary.consensus_layer), ("EL rewards", summary.execution_layer)]
    {
        match summary.share_of_net(component) {
            Some(share) => display.item(label, format!("{} ({share:.1}%)", format_eth(component))),
            None => display.item(label, format_eth(component)),
        }
    }

    display.header("Annualized Returns");
    display.item("Total APR", format_percent(summary.total_apr));
    display.item("Total APY", format_percent(summary.total_apy));
    display.item("CL APR", format_percent(summary.consensus_layer_apr));
    display.item("EL APR", format_percent(summary.execution_layer_apr));

    let plural = if summary.validators == 1 { "" } else { "s" };
    display.header(&format!("Extrapolated Earnings ({} validator{plural})", summary.validators));
    display.item("Daily", format!("~{}", format_eth(summary.daily)));
    display.item("Monthly", format!("~{}", format_eth(summary.monthly)));
    display.item("Yearly", format!("~{}", format_eth(summary.yearly)));

    if summary.low_confidence {
        tracing::warn!(
            "Sample period of {:.1} days is short for annualization",
            summary.period_days
        );
        display.warning("Short sample period: APR extrapolation may be unreliable.");
        display.note("    Proposal rewards are luck-based and can skew short-period estimates.");
    }
    if summary.execution_layer_dominant {
        display.warning("EL rewards (proposals/MEV) are a large portion of income.");
        display.note("    These are highly variable and depend on block proposal luck.");
    }
}

/// Print the rates of an already annualized response, e.g. from an APY/ROI endpoint.
///
/// Returns false when the document holds nothing that looks like one.
fn print_precomputed(display: &DisplayManager, document: &Value) -> bool {
    let data = match document.get("data") {
        Some(data) if data.is_object() => data,
        _ => document,
    };
    let Some(fields) = data.as_object().filter(|fields| {
        fields.keys().any(|key| key.contains("apr") || key.contains("apy"))
            || fields.values().any(Value::is_object)
    }) else {
        return false;
    };
    display.note("From precomputed rates:");
    for (key, value) in fields {
        if let Some(rate) = as_f64(value) {
            display.note(format!("  {key}: {rate:.4}%"));
        } else if let Some(nested) = value.as_object() {
            display.note(format!("  {key}:"));
            for (inner, rate) in nested.iter().filter_map(|(k, v)| as_f64(v).map(|r| (k, r))) {
                display.note(format!("    {inner}: {rate:.4}%"));
            }
        }
    }
    true
}
