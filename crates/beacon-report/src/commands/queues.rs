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
    diagnostics::QUEUE_LENGTH_BANDS, queue::QueueKind, ChainSpec, QueueSnapshot, QueueState,
};
use clap::Args;

use crate::{
    config::GlobalConfig,
    display::{format_count, format_wait, severity_marker, DisplayManager},
    input::InputArgs,
};

/// Exit queues longer than this are called out as long in the planning advice.
const LONG_EXIT_QUEUE: u64 = 1000;

/// Estimate activation, exit and withdrawal queue waits.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct QueuesReport {
    #[clap(flatten)]
    pub input: InputArgs,
}

fn describe(kind: QueueKind) -> (&'static str, &'static str) {
    match kind {
        QueueKind::Activation => ("Activation", "Validators waiting to enter the active set"),
        QueueKind::Exit => ("Exit", "Validators waiting to leave the active set"),
        QueueKind::Withdrawal => ("Withdrawal", "Validators waiting for the balance sweep"),
    }
}

impl QueuesReport {
    /// Run the [QueuesReport] command.
    pub fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let spec = global_config.chain_spec()?;
        let snapshot = QueueSnapshot::from_value(&self.input.load()?);
        let display = DisplayManager::new();

        display.header("Validator Queue Status");
        if snapshot.active_estimated {
            tracing::info!("Active validator count missing from input; using an estimate");
            display.note(format!(
                "Using estimated active validator count: {}",
                format_count(snapshot.active_validators)
            ));
        }

        let network = snapshot.state(QueueKind::Activation);
        display.header("Network Info");
        display.item("Active validators", format_count(snapshot.active_validators));
        display.item(
            "Churn limit",
            format!(
                "{} per epoch ({} per day)",
                network.churn_limit(&spec),
                format_count(network.activations_per_day(&spec))
            ),
        );

        for (kind, state) in snapshot.queues() {
            let (name, description) = describe(kind);
            let band = QUEUE_LENGTH_BANDS.classify(state.queue_length as f64);
            display.header(&format!("{name} Queue"));
            display.item("Status", format!("{} {}", severity_marker(band.severity), band.label));
            display.item("Pending", format_count(state.queue_length));
            if state.queue_length > 0 {
                display.item("Wait", format_wait(&state.wait(&spec)));
            }
            display.item("Info", description);
        }

        display.header("Planning Advice");
        display.item("Staking", staking_advice(snapshot.state(QueueKind::Activation), &spec));
        display.item("Exiting", exit_advice(snapshot.state(QueueKind::Exit), &spec));
        Ok(())
    }
}

fn staking_advice(activation: QueueState, spec: &ChainSpec) -> String {
    if activation.queue_length == 0 {
        return "No activation queue; new validators activate within minutes.".to_string();
    }
    format!(
        "If you deposit now, expect {} before earning rewards.",
        format_wait(&activation.wait(spec))
    )
}

fn exit_advice(exit: QueueState, spec: &ChainSpec) -> String {
    let wait = format_wait(&exit.wait(spec));
    match exit.queue_length {
        0 => "No exit queue; exits process immediately.".to_string(),
        n if n > LONG_EXIT_QUEUE => {
            format!("Queue is long. Plan for {wait} before the exit completes.")
        }
        _ => format!("Queue is short. The exit should complete in {wait}."),
    }
}
