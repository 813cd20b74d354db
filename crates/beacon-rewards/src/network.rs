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

use crate::{
    fields::{as_u64, unwrap_envelope, FieldChain},
    queue::QueueState,
    units::scale_balance,
};

const ACTIVE: FieldChain =
    FieldChain::first_present("active_validators", &["active_validators", "validatorscount"]);
const PARTICIPATION: FieldChain = FieldChain::first_present(
    "participation_rate",
    &["participation_rate", "globalparticipationrate"],
);
const FINALIZED_EPOCH: FieldChain =
    FieldChain::first_present("finalized_epoch", &["finalized_epoch", "finalizedepoch"]);
const AVERAGE_BALANCE: FieldChain =
    FieldChain::first_present("average_balance", &["average_balance", "averagevalidatorbalance"]);
const ENTERING: FieldChain =
    FieldChain::first_present("entering", &["entering_validators", "beaconchain_entering"]);
const EXITING: FieldChain =
    FieldChain::first_present("exiting", &["exiting_validators", "beaconchain_exiting"]);

/// Network-wide state from the V2 network overview or the V1 latest-epoch document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub active_validators: u64,
    /// Attestation participation, in percent.
    pub participation: f64,
    pub finalized_epoch: Option<u64>,
    /// Average validator balance in ether; 0 when unknown.
    pub average_balance: f64,
    pub entering: u64,
    pub exiting: u64,
}

impl NetworkSnapshot {
    pub fn from_value(document: &Value) -> Self {
        let data = unwrap_envelope(document);

        // Fractional rates are reported on a 0-1 scale by some endpoints.
        let mut participation = PARTICIPATION.resolve_f64(&data);
        let fractional = PARTICIPATION.resolve(&data).is_some_and(Value::is_f64);
        if fractional && participation <= 1.0 {
            participation *= 100.0;
        }

        Self {
            active_validators: ACTIVE.resolve_u64(&data),
            participation,
            finalized_epoch: FINALIZED_EPOCH.resolve(&data).and_then(as_u64),
            average_balance: scale_balance(AVERAGE_BALANCE.resolve_f64(&data)),
            entering: ENTERING.resolve_u64(&data),
            exiting: EXITING.resolve_u64(&data),
        }
    }

    pub fn has_queues(&self) -> bool {
        self.entering > 0 || self.exiting > 0
    }

    pub fn entry_queue(&self) -> QueueState {
        QueueState { queue_length: self.entering, active_validators: self.active_validators }
    }

    pub fn exit_queue(&self) -> QueueState {
        QueueState { queue_length: self.exiting, active_validators: self.active_validators }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn v2_document() {
        let doc = json!({
            "data": {
                "active_validators": 970000,
                "participation_rate": 0.9912,
                "finalized_epoch": 347566,
                "average_balance": 32.05,
                "entering_validators": 1400,
                "exiting_validators": 0
            }
        });
        let snapshot = NetworkSnapshot::from_value(&doc);
        assert_eq!(snapshot.active_validators, 970000);
        assert!((snapshot.participation - 99.12).abs() < 1e-9);
        assert_eq!(snapshot.finalized_epoch, Some(347566));
        assert_eq!(snapshot.average_balance, 32.05);
        assert!(snapshot.has_queues());
        assert_eq!(snapshot.entry_queue().queue_length, 1400);
    }

    #[test]
    fn v1_document() {
        let doc = json!({
            "data": [{
                "validatorscount": 900000,
                "globalparticipationrate": 98.5,
                "finalizedepoch": 100,
                "averagevalidatorbalance": 32050000000u64
            }]
        });
        let snapshot = NetworkSnapshot::from_value(&doc);
        assert_eq!(snapshot.active_validators, 900000);
        assert_eq!(snapshot.participation, 98.5);
        assert_eq!(snapshot.finalized_epoch, Some(100));
        assert!((snapshot.average_balance - 32.05).abs() < 1e-9);
        assert!(!snapshot.has_queues());
    }

    #[test]
    fn integer_participation_is_already_percent() {
        let snapshot = NetworkSnapshot::from_value(&json!({ "participation_rate": 1 }));
        assert_eq!(snapshot.participation, 1.0);
        assert_eq!(snapshot.finalized_epoch, None);
    }
}
