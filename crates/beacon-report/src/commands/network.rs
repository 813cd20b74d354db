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
use beacon_rewards::{
    diagnostics::PARTICIPATION_BANDS, finality_risk, ChainSpec, NetworkSnapshot, QueueState,
};
use clap::Args;

use crate::{
    config::GlobalConfig,
    display::{format_count, format_metric, format_wait, severity_marker, DisplayManager},
    input::InputArgs,
};

/// Summarize network health from a network overview or latest-epoch document.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct NetworkReport {
    #[clap(flatten)]
    pub input: InputArgs,
}

impl NetworkReport {
    /// Run the [NetworkReport] command.
    pub fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let spec = global_config.chain_spec()?;
        let snapshot = NetworkSnapshot::from_value(&self.input.load()?);
        let display = DisplayManager::new();

        display.header("Ethereum Network Health Report");
        display.header("Validators");
        display.item("Active", format_count(snapshot.active_validators));
        if snapshot.has_queues() {
            display.item("Entering queue", format_count(snapshot.entering));
            display.item("Exiting queue", format_count(snapshot.exiting));
        }

        let band = PARTICIPATION_BANDS.classify(snapshot.participation);
        display.header("Network Health");
        display.item(
            "Participation",
            format!(
                "{:.2}% {} {}",
                snapshot.participation,
                severity_marker(band.severity),
                band.label
            ),
        );
        display.item(
            "Finalized epoch",
            snapshot.finalized_epoch.map_or_else(|| "?".to_string(), |epoch| epoch.to_string()),
        );
        if snapshot.average_balance != 0.0 {
            display.item("Avg balance", format!("{:.4} ETH", snapshot.average_balance));
        }

        if snapshot.active_validators > 0 && snapshot.has_queues() {
            let entry = snapshot.entry_queue();
            display.header(&format!(
                "Queue Estimates (churn limit: {}/epoch)",
                entry.churn_limit(&spec)
            ));
            let queues = [("Activation wait", entry), ("Exit wait", snapshot.exit_queue())];
            for (label, queue) in queues.into_iter().filter(|(_, q)| q.queue_length > 0) {
                display.item(label, pending(queue, &spec));
            }
        }

        if let Some(risk) = finality_risk(snapshot.participation) {
            tracing::warn!("{} at {:.2}% participation", risk.label, snapshot.participation);
            let metric = risk.metric.map(format_metric).unwrap_or_default();
            display.warning(format!(
                "{} {} ({metric})",
                severity_marker(risk.severity),
                risk.label
            ));
            display.note(format!("    {}", risk.remediation));
        }
        Ok(())
    }
}

fn pending(queue: QueueState, spec: &ChainSpec) -> String {
    format!("{} ({} pending)", format_wait(&queue.wait(spec)), format_count(queue.queue_length))
}
