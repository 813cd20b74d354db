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


use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use beacon_rewards::{DutyReward, EpochMapper, ValidatorIncome, Wei};
use clap::Args;
use serde::Serialize;

use super::load_rewards;
use crate::{
    config::GlobalConfig,
    display::{format_eth, format_timestamp, offset_label, parse_utc_offset, DisplayManager},
    input::InputArgs,
};

fn offset_hours(text: &str) -> Result<f64, String> {
    parse_utc_offset(text).ok_or_else(|| format!("expected UTC, UTC+H or UTC-H, got {text:?}"))
}

/// Export per-epoch rewards as tax-ready rows, optionally to CSV.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct TaxExport {
    #[clap(flatten)]
    pub input: InputArgs,
    /// Fixed offset from UTC used for the date column, e.g. UTC+1 or UTC-5.
    #[clap(long, default_value = "UTC", value_parser = offset_hours)]
    pub timezone: f64,
    /// Write the rows to this CSV file.
    #[clap(long)]
    pub csv: Option<PathBuf>,
}

/// One validator-period row of the export.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaxRow {
    pub validator_index: u64,
    pub epoch: Option<u64>,
    pub date: String,
    pub timestamp_utc: Option<i64>,
    pub total_reward_eth: f64,
    pub total_penalty_eth: f64,
    pub net_reward_eth: f64,
    pub attestation_eth: f64,
    pub sync_committee_eth: f64,
    pub proposal_cl_eth: f64,
    pub proposal_el_eth: f64,
    pub finality: String,
}

impl TaxRow {
    pub fn new(
        reward: &DutyReward,
        fallback_epoch: Option<u64>,
        mapper: &EpochMapper,
        offset_hours: f64,
    ) -> Self {
        let epoch = reward.epoch.or(fallback_epoch);
        let timestamp = epoch.map(|epoch| mapper.epoch_to_timestamp(epoch));
        let date = timestamp
            .and_then(|ts| format_timestamp(ts, offset_hours, "%Y-%m-%d %H:%M:%S"))
            .unwrap_or_else(|| "?".to_string());
        Self {
            validator_index: reward.validator_index,
            epoch,
            date,
            timestamp_utc: timestamp,
            total_reward_eth: reward.total_earned.ether(),
            total_penalty_eth: reward.total_penalty.ether(),
            net_reward_eth: reward.net_reward().ether(),
            attestation_eth: reward.attestation_total.ether(),
            sync_committee_eth: reward.sync_committee.earned.ether(),
            proposal_cl_eth: reward.proposal.consensus_layer.ether(),
            proposal_el_eth: reward.proposal.execution_layer.ether(),
            finality: reward.finality.clone().unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

impl TaxExport {
    /// Run the [TaxExport] command.
    pub fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let mapper = EpochMapper::new(global_config.chain_spec()?);
        let (envelope, rewards) = load_rewards(&self.input)?;
        let display = DisplayManager::new();
        if rewards.is_empty() {
            display.note("No reward data found.");
            return Ok(());
        }

        let rows: Vec<TaxRow> = rewards
            .iter()
            .map(|reward| TaxRow::new(reward, envelope.start_epoch(), &mapper, self.timezone))
            .collect();
        let timezone = offset_label(self.timezone);

        if let Some(path) = &self.csv {
            write_csv(path, &rows)?;
            display.note(format!("Exported {} rows to {}", rows.len(), path.display()));
            display.note(format!("Timezone: {timezone}"));
        }

        display.header("Staking Rewards - Tax Export");
        display.item("Timezone", &timezone);
        display.item("Rows", rows.len());

        let incomes = ValidatorIncome::summarize(&rewards);
        for (index, income) in &incomes {
            display.header(&format!("Validator {index} ({} epochs)", income.periods));
            display.item("Total income", eth(income.total));
            display.item("CL rewards", eth(income.consensus_layer));
            display.item("EL rewards", eth(income.execution_layer));
            display.item("Penalties", eth(income.penalty));
            display.item("Net income", eth(income.net()));
        }
        let grand_total: Wei = incomes.values().map(ValidatorIncome::net).sum();
        display.header("Total");
        display.item("Net income", eth(grand_total));

        display.warning("Fiat conversion requires an external price feed.");
        display.note(
            "    This is raw data only. Consult a tax professional for reporting requirements.",
        );
        Ok(())
    }
}

fn eth(amount: Wei) -> String {
    format_eth(amount.ether())
}

fn write_csv(path: &Path, rows: &[TaxRow]) -> Result<()> {
    tracing::info!("Writing {} rows to {}", rows.len(), path.display());
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut wtr = csv::Writer::from_writer(file);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
