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
use beacon_rewards::{
    parse_calendar_date,
    time::{DEFAULT_PAGE_SIZE, FREE_TIER_EPOCH_BUDGET},
    EpochMapper, EpochSpan,
};
use clap::Args;

use crate::{
    config::GlobalConfig,
    display::{format_count, format_utc, DisplayManager},
};

/// Convert between epochs, slots, timestamps and calendar dates.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
#[group(multiple = false)]
pub struct EpochConvert {
    /// Epoch to convert to its slots and start time.
    #[clap(long)]
    pub epoch: Option<u64>,
    /// Slot to convert to its epoch and time.
    #[clap(long)]
    pub slot: Option<u64>,
    /// Unix timestamp to convert to epoch and slot.
    #[clap(long)]
    pub timestamp: Option<i64>,
    /// UTC date (YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD HH:MM:SS) to convert.
    #[clap(long)]
    pub date: Option<String>,
    /// Date range to express in epochs, with the number of API pages it spans.
    #[clap(long, num_args = 2, value_names = ["START", "END"])]
    pub range: Option<Vec<String>>,
}

impl EpochConvert {
    /// Run the [EpochConvert] command.
    pub fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let spec = global_config.chain_spec()?;
        let mapper = EpochMapper::new(spec);
        let display = DisplayManager::new();

        if let Some(epoch) = self.epoch {
            let time = mapper.at_epoch(epoch);
            let (first, last) = mapper.epoch_to_slot_range(epoch);
            display.header(&format!("Epoch {}", format_count(epoch)));
            display.item("Slots", format!("{} - {}", format_count(first), format_count(last)));
            display
                .item("Timestamp", format!("{} ({})", time.timestamp, format_utc(time.timestamp)));
            let seconds = spec.seconds_per_epoch();
            display.item("Duration", format!("{seconds}s ({:.1} minutes)", seconds as f64 / 60.0));
        } else if let Some(slot) = self.slot {
            let time = mapper.at_slot(slot);
            display.header(&format!("Slot {}", format_count(slot)));
            display.item(
                "Epoch",
                format!(
                    "{} (slot {} of {})",
                    format_count(time.epoch),
                    mapper.slot_in_epoch(slot),
                    spec.slots_per_epoch
                ),
            );
            display
                .item("Timestamp", format!("{} ({})", time.timestamp, format_utc(time.timestamp)));
        } else if let Some(timestamp) = self.timestamp {
            let time = mapper.at_timestamp(timestamp);
            display.header(&format!("Timestamp {timestamp} ({})", format_utc(timestamp)));
            display.item("Epoch", format_count(time.epoch));
            display.item("Slot", format_count(time.slot));
        } else if let Some(date) = &self.date {
            let timestamp = parse_calendar_date(date).context("invalid --date")?;
            let time = mapper.at_timestamp(timestamp);
            display.header(&format!("{date} ({})", format_utc(timestamp)));
            display.item("Unix timestamp", timestamp);
            display.item("Epoch", format_count(time.epoch));
            display.item("Slot", format_count(time.slot));
        } else if let Some([start, end]) = self.range.as_deref() {
            let start = parse_calendar_date(start).context("invalid range start")?;
            let end = parse_calendar_date(end).context("invalid range end")?;
            if end < start {
                tracing::warn!("Range end is before its start; the span is empty");
            }
            let span = EpochSpan::between(&mapper, start, end);
            display.header("Date Range");
            display.item(
                "Date range",
                format!(
                    "{} -> {}",
                    format_utc(span.start.timestamp),
                    format_utc(span.end.timestamp)
                ),
            );
            display.item(
                "Epoch range",
                format!("{} -> {}", format_count(span.start.epoch), format_count(span.end.epoch)),
            );
            display.item("Total epochs", format_count(span.total_epochs));
            display.item("Total slots", format_count(span.total_slots));
            display.item("Duration", format!("{:.1} days", span.elapsed_days));
            display.item(
                &format!("API pages ({DEFAULT_PAGE_SIZE}/page)"),
                format!("~{}", span.pages(DEFAULT_PAGE_SIZE)),
            );
            let feasibility = if span.exceeds_budget(FREE_TIER_EPOCH_BUDGET) {
                "exceeds the free tier request budget"
            } else {
                "feasible on the free tier"
            };
            display.item("Feasibility", feasibility);
        } else {
            display.header("Chain Constants");
            display.item(
                "Genesis timestamp",
                format!("{} ({})", spec.genesis_timestamp, format_utc(spec.genesis_timestamp)),
            );
            display.item("Seconds per slot", spec.seconds_per_slot);
            display.item("Slots per epoch", spec.slots_per_epoch);
            display.item("Seconds per epoch", spec.seconds_per_epoch());
            display.item("Epochs per day", format!("~{}", spec.epochs_per_day));
            display.item("Epochs per year", format!("~{}", format_count(spec.epochs_per_year)));
        }
        Ok(())
    }
}
