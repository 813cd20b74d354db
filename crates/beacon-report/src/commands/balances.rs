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
use beacon_rewards::{BalanceHistory, BalanceTrend, Change, EpochMapper, MagnitudeThreshold};
use clap::Args;

use super::{data_entries, log_failures};
use crate::{
    config::GlobalConfig,
    display::{format_eth, format_eth_places, format_timestamp, table, DisplayManager},
    input::InputArgs,
};

/// Show per-validator balance history with a trend analysis.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct BalancesReport {
    #[clap(flatten)]
    pub input: InputArgs,
}

impl BalancesReport {
    /// Run the [BalancesReport] command.
    pub fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let mapper = EpochMapper::new(global_config.chain_spec()?);
        let entries = data_entries(&self.input.load()?);
        let display = DisplayManager::new();
        if entries.is_empty() {
            display.note("No balance data found.");
            return Ok(());
        }

        let (histories, failures) = BalanceHistory::group(&entries, &MagnitudeThreshold::default());
        log_failures(&failures);

        display.header("Validator Balance History");
        for history in &histories {
            let index = history.validator_index.map_or_else(|| "?".to_string(), |i| i.to_string());
            display.header(&format!("Validator {index}"));
            let rows = history.snapshots.iter().zip(history.changes()).map(|(snapshot, change)| {
                let time = snapshot
                    .epoch
                    .and_then(|epoch| {
                        format_timestamp(
                            mapper.epoch_to_timestamp(epoch),
                            0.0,
                            "%Y-%m-%d %H:%M UTC",
                        )
                    })
                    .unwrap_or_default();
                [
                    snapshot.epoch.map_or_else(|| "?".to_string(), |epoch| epoch.to_string()),
                    time,
                    format_eth_places(snapshot.balance, 4),
                    format_eth_places(snapshot.effective_balance, 4),
                    change.map(format_change).unwrap_or_default(),
                ]
            });
            display.table(table(["Epoch", "Time", "Balance", "Effective", "Change"], rows));
            if let Some(trend) = history.trend() {
                print_trend(&display, &trend);
            }
        }
        Ok(())
    }
}

fn format_change(change: Change) -> String {
    match change {
        Change::Up(diff) => format!("up +{}", format_eth(diff)),
        Change::Down(diff) => format!("down {}", format_eth(diff)),
        Change::Flat => String::new(),
    }
}

fn print_trend(display: &DisplayManager, trend: &BalanceTrend) {
    display.note("Trend Analysis:");
    display.item("  First balance", format_eth_places(trend.first, 4));
    display.item("  Latest balance", format_eth_places(trend.latest, 4));
    display.item("  Net change", format_eth(trend.net_change));
    display.item("  Peak", format_eth_places(trend.peak, 4));
    display.item("  Trough", format_eth_places(trend.trough, 4));
    if trend.drop_flagged {
        tracing::warn!("Balance dropped by {:.6} ETH in a single step", -trend.largest_drop);
        display.warning(format!(
            "Largest single drop: {} (check for penalties or slashing)",
            format_eth(trend.largest_drop)
        ));
    }
}
