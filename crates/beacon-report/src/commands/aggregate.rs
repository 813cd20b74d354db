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


use anyhow::{Context, Result};
use beacon_rewards::{fields::unwrap_envelope, PeriodComparison, Trend, Wei};
use clap::Args;
use serde_json::Value;

use crate::{
    config::GlobalConfig,
    display::{format_eth, table, DisplayManager},
    input::InputArgs,
};

/// Compare reward totals across the 24h, 7d, 30d and 90d windows.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct AggregateReport {
    #[clap(flatten)]
    pub input: InputArgs,
}

fn format_trend(trend: Option<Trend>) -> String {
    match trend {
        Some(Trend::Up(percent)) => format!("up +{percent:.1}% vs avg"),
        Some(Trend::Down(percent)) => format!("down {percent:.1}% vs avg"),
        Some(Trend::Steady(percent)) => format!("steady {percent:+.1}% vs avg"),
        None => String::new(),
    }
}

impl AggregateReport {
    /// Run the [AggregateReport] command.
    pub fn run(&self, _global_config: &GlobalConfig) -> Result<()> {
        let document = self.input.load()?;
        let comparison =
            PeriodComparison::from_value(&document).context("failed to read period totals")?;
        let display = DisplayManager::new();
        display.header("Rewards Aggregate Summary");

        if comparison.is_empty() {
            tracing::info!("No known period windows in input; printing the raw document");
            display.note("Raw aggregate data:");
            if let Some(fields) = unwrap_envelope(&document).as_object() {
                for (key, value) in fields {
                    print_raw(&display, key, value, 1);
                }
            }
            return Ok(());
        }

        let rows = comparison.periods.iter().map(|period| {
            [
                period.label.to_string(),
                format_eth(period.total),
                format_eth(period.daily_average),
                format_trend(period.trend),
            ]
        });
        display.table(table(["Period", "Total", "Daily Avg", "Trend"], rows));
        if let Some(baseline) = comparison.baseline {
            display.note(format!("Trends are relative to the {baseline} daily average."));
        }
        if let Some(apr) = comparison.estimated_apr() {
            display.note(format!(
                "Estimated APR (from 24h): ~{apr:.2}% (rough, based on a single 32 ETH stake)"
            ));
        }
        Ok(())
    }
}

fn print_raw(display: &DisplayManager, key: &str, value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        Value::String(text) if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => {
            let amount = Wei::parse(text).map(|wei| format_eth(wei.ether()));
            display.note(format!("{indent}{key}: {}", amount.unwrap_or_else(|_| text.clone())));
        }
        Value::Object(fields) if depth == 1 => {
            display.note(format!("{indent}{key}:"));
            for (inner, value) in fields {
                print_raw(display, inner, value, depth + 1);
            }
        }
        other => display.note(format!("{indent}{key}: {other}")),
    }
}
