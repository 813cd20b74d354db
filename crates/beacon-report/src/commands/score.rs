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
    diagnostics::SCORE_BANDS, performance::TARGET_SCORE, PerformanceScore, ScoreSummary,
};
use clap::Args;

use super::data_entries;
use crate::{
    config::GlobalConfig,
    display::{format_percent, severity_marker, table, DisplayManager},
    input::InputArgs,
};

/// Report validator performance scores.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct ScoreReport {
    #[clap(flatten)]
    pub input: InputArgs,
}

fn status(score: f64) -> String {
    let band = SCORE_BANDS.classify(score);
    format!("{} {}", severity_marker(band.severity), band.label)
}

impl ScoreReport {
    /// Run the [ScoreReport] command.
    pub fn run(&self, _global_config: &GlobalConfig) -> Result<()> {
        let document = self.input.load()?;
        let display = DisplayManager::new();
        let scores: Vec<_> =
            data_entries(&document).iter().map(PerformanceScore::from_value).collect();
        if scores.is_empty() {
            display.note("No performance score data found.");
            return Ok(());
        }

        display.header("Validator Performance Report");
        display.note("Component weights: Attestation 84.4% | Proposals 12.5% | Sync 3.1%");
        display.note(format!("Target: >= {TARGET_SCORE:.1}% good, >= 99.5% exceptional"));
        let rows = scores.iter().map(|score| {
            [
                score.validator_index.map_or_else(|| "?".to_string(), |index| index.to_string()),
                format_percent(score.overall),
                format_percent(score.attester),
                format_percent(score.proposer),
                format_percent(score.sync),
                status(score.overall),
            ]
        });
        display.table(table(
            ["Validator", "Overall", "Attestation", "Proposals", "Sync committee", "Status"],
            rows,
        ));

        if let Some(summary) = ScoreSummary::from_scores(&scores).filter(|s| s.validators > 1) {
            display.header("Summary");
            display.item("Validators", summary.validators);
            display.item(
                "Average score",
                format!("{} {}", format_percent(summary.average), status(summary.average)),
            );
            display.item("Highest", format_percent(summary.highest));
            display.item("Lowest", format_percent(summary.lowest));
            if summary.below_target > 0 {
                display.warning(format!(
                    "{} validator(s) below the {TARGET_SCORE:.0}% target",
                    summary.below_target
                ));
            }
        }
        Ok(())
    }
}
