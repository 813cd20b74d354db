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

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::{as_u64, FieldChain};

/// Score below which a validator counts as under target.
pub const TARGET_SCORE: f64 = 99.0;

const OVERALL: FieldChain = FieldChain::first_present("beacon_score", &["beacon_score", "score"]);
const ATTESTER: FieldChain =
    FieldChain::first_present("attester_efficiency", &["attester_efficiency", "attestation"]);
const PROPOSER: FieldChain =
    FieldChain::first_present("proposer_efficiency", &["proposer_efficiency", "proposal"]);
const SYNC: FieldChain =
    FieldChain::first_present("sync_efficiency", &["sync_efficiency", "sync_committee"]);

/// Performance score of one validator, every component in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceScore {
    pub validator_index: Option<u64>,
    pub overall: f64,
    pub attester: f64,
    pub proposer: f64,
    pub sync: f64,
}

impl PerformanceScore {
    pub fn from_value(entry: &Value) -> Self {
        let mut score = Self {
            validator_index: entry.pointer("/validator/index").and_then(as_u64),
            overall: OVERALL.resolve_f64(entry),
            attester: ATTESTER.resolve_f64(entry),
            proposer: PROPOSER.resolve_f64(entry),
            sync: SYNC.resolve_f64(entry),
        };
        // The overall score decides the scale of every component.
        if score.overall > 0.0 && score.overall <= 1.0 {
            score.overall *= 100.0;
            score.attester *= 100.0;
            score.proposer *= 100.0;
            score.sync *= 100.0;
        }
        score
    }

    pub fn is_below_target(&self) -> bool {
        self.overall < TARGET_SCORE
    }
}

/// Summary over the overall scores of several validators.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub validators: usize,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub below_target: usize,
}

impl ScoreSummary {
    /// `None` for an empty slice.
    pub fn from_scores(scores: &[PerformanceScore]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let overall = scores.iter().map(|s| s.overall);
        Some(Self {
            validators: scores.len(),
            average: overall.clone().sum::<f64>() / scores.len() as f64,
            highest: overall.clone().fold(f64::NEG_INFINITY, f64::max),
            lowest: overall.fold(f64::INFINITY, f64::min),
            below_target: scores.iter().filter(|s| s.is_below_target()).count(),
        })
    }
}
