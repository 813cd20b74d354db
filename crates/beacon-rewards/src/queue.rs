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

//! Churn limit and queue wait estimates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    fields::{unwrap_envelope, FieldChain},
    ChainSpec,
};

/// Active validator count assumed when a queue document does not carry one.
pub const ESTIMATED_ACTIVE_VALIDATORS: u64 = 970_000;

/// Number of validators that may enter or exit the active set per epoch.
pub fn churn_limit(active_validators: u64, spec: &ChainSpec) -> u64 {
    let scaled = active_validators.checked_div(spec.churn_limit_quotient).unwrap_or_default();
    scaled.max(spec.min_per_epoch_churn_limit)
}

/// Expected time until an item entering at the tail of a queue is processed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum WaitEstimate {
    Bounded { epochs: f64, hours: f64 },
    /// The queue never drains because nothing churns per epoch.
    Unbounded,
}

impl WaitEstimate {
    pub const IMMEDIATE: WaitEstimate = WaitEstimate::Bounded { epochs: 0.0, hours: 0.0 };

    pub fn hours(&self) -> Option<f64> {
        match self {
            WaitEstimate::Bounded { hours, .. } => Some(*hours),
            WaitEstimate::Unbounded => None,
        }
    }
}

/// Wait for a queue of `queue_length` given the active set size.
pub fn wait(queue_length: u64, active_validators: u64, spec: &ChainSpec) -> WaitEstimate {
    if queue_length == 0 {
        return WaitEstimate::IMMEDIATE;
    }
    let churn = churn_limit(active_validators, spec);
    if churn == 0 {
        return WaitEstimate::Unbounded;
    }
    let epochs = queue_length as f64 / churn as f64;
    WaitEstimate::Bounded { epochs, hours: epochs * spec.seconds_per_epoch() as f64 / 3600.0 }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    pub queue_length: u64,
    pub active_validators: u64,
}

impl QueueState {
    pub fn churn_limit(&self, spec: &ChainSpec) -> u64 {
        churn_limit(self.active_validators, spec)
    }

    pub fn wait(&self, spec: &ChainSpec) -> WaitEstimate {
        wait(self.queue_length, self.active_validators, spec)
    }

    /// Validators processed per day at the current churn limit.
    pub fn activations_per_day(&self, spec: &ChainSpec) -> u64 {
        self.churn_limit(spec).saturating_mul(spec.epochs_per_day)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueKind {
    Activation,
    Exit,
    Withdrawal,
}

const ACTIVATION: FieldChain = FieldChain::first_non_zero(
    "activation",
    &["beaconchain_entering", "activation_queue", "entering", "entry_queue"],
);
const EXIT: FieldChain =
    FieldChain::first_non_zero("exit", &["beaconchain_exiting", "exit_queue", "exiting"]);
const WITHDRAWAL: FieldChain =
    FieldChain::first_non_zero("withdrawal", &["withdrawal_queue", "withdrawals"]);
const ACTIVE: FieldChain =
    FieldChain::first_non_zero("active", &["active_validators", "validatorscount", "active"]);

/// Queue lengths read from either the V1 or the V2 queue document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub activation: u64,
    pub exit: u64,
    pub withdrawal: u64,
    pub active_validators: u64,
    /// Set when the document had no active count and [ESTIMATED_ACTIVE_VALIDATORS] was used.
    pub active_estimated: bool,
}

impl QueueSnapshot {
    pub fn from_value(document: &Value) -> Self {
        let data = unwrap_envelope(document);
        let active = ACTIVE.resolve_u64(&data);
        Self {
            activation: ACTIVATION.resolve_u64(&data),
            exit: EXIT.resolve_u64(&data),
            withdrawal: WITHDRAWAL.resolve_u64(&data),
            active_validators: if active == 0 { ESTIMATED_ACTIVE_VALIDATORS } else { active },
            active_estimated: active == 0,
        }
    }

    pub fn state(&self, kind: QueueKind) -> QueueState {
        let queue_length = match kind {
            QueueKind::Activation => self.activation,
            QueueKind::Exit => self.exit,
            QueueKind::Withdrawal => self.withdrawal,
        };
        QueueState { queue_length, active_validators: self.active_validators }
    }

    pub fn queues(&self) -> [(QueueKind, QueueState); 3] {
        [QueueKind::Activation, QueueKind::Exit, QueueKind::Withdrawal]
            .map(|kind| (kind, self.state(kind)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::MAINNET;

    #[test]
    fn scenario_d() {
        assert_eq!(churn_limit(970_000, &MAINNET), 14);
        let estimate = wait(1400, 970_000, &MAINNET);
        assert_eq!(estimate, WaitEstimate::Bounded { epochs: 100.0, hours: 100.0 * 384.0 / 3600.0 });
        assert!((estimate.hours().unwrap() - 10.67).abs() < 0.01);
    }

    #[test]
    fn churn_has_a_floor() {
        for active in [0, 1, 65_535, 65_536 * 4, 65_536 * 5 - 1] {
            assert_eq!(churn_limit(active, &MAINNET), 4);
        }
        assert_eq!(churn_limit(65_536 * 5, &MAINNET), 5);
        assert_eq!(churn_limit(u64::MAX, &MAINNET), u64::MAX / 65_536);
    }

    #[test]
    fn empty_queue_is_immediate() {
        assert_eq!(wait(0, 970_000, &MAINNET), WaitEstimate::IMMEDIATE);
        assert_eq!(wait(0, 970_000, &MAINNET).hours(), Some(0.0));
    }

    #[test]
    fn zero_churn_is_unbounded() {
        let spec = ChainSpec::builder().min_per_epoch_churn_limit(0).build().unwrap();
        assert_eq!(wait(10, 1_000, &spec), WaitEstimate::Unbounded);
        assert_eq!(wait(10, 1_000, &spec).hours(), None);
        let spec = ChainSpec::builder()
            .min_per_epoch_churn_limit(0)
            .churn_limit_quotient(0)
            .build()
            .unwrap();
        assert_eq!(churn_limit(1_000_000, &spec), 0);
    }

    #[test]
    fn activations_per_day() {
        let state = QueueState { queue_length: 5, active_validators: 970_000 };
        assert_eq!(state.activations_per_day(&MAINNET), 14 * 225);
    }

    #[test]
    fn snapshot_from_v2_document() {
        let doc = json!({
            "data": {
                "beaconchain_entering": 0,
                "activation_queue": 1400,
                "exit_queue": 20,
                "withdrawals": 7,
                "active_validators": 970000
            }
        });
        let snapshot = QueueSnapshot::from_value(&doc);
        assert_eq!(snapshot.activation, 1400);
        assert_eq!(snapshot.exit, 20);
        assert_eq!(snapshot.withdrawal, 7);
        assert!(!snapshot.active_estimated);
        assert_eq!(snapshot.state(QueueKind::Activation).churn_limit(&MAINNET), 14);
    }

    #[test]
    fn snapshot_without_active_count() {
        let snapshot = QueueSnapshot::from_value(&json!({ "entering": 3 }));
        assert_eq!(snapshot.active_validators, ESTIMATED_ACTIVE_VALIDATORS);
        assert!(snapshot.active_estimated);
        let [activation, exit, withdrawal] = snapshot.queues();
        assert_eq!(activation.1.queue_length, 3);
        assert_eq!(exit.1.wait(&MAINNET), WaitEstimate::IMMEDIATE);
        assert_eq!(withdrawal.0, QueueKind::Withdrawal);
    }
}
