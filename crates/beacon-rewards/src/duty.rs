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

//! Decomposition of a per-validator rewards record into duty categories.

use std::ops::Add;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{
    units::{RawAmount, ScaleStrategy, Wei},
    AnalyticsError,
};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Validator identity as it appears in a rewards record.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawValidator {
    pub index: Option<u64>,
    pub public_key: Option<String>,
}

/// Earned, missed and penalized amounts of a single duty, as received.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawCategory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub reward: RawAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missed_reward: RawAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub penalty: RawAmount,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawAttestation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: RawAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub head: RawCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: RawCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target: RawCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inactivity_leak_penalty: RawAmount,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawProposal {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: RawAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub execution_layer_reward: RawAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attestation_inclusion_reward: RawAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missed_cl_reward: RawAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missed_el_reward: RawAmount,
}

/// One entry of a rewards-list response, before any unit resolution.
///
/// Every amount other than `total_reward` is optional and defaults to zero.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawDutyRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub validator: RawValidator,
    pub epoch: Option<u64>,
    pub total_reward: Option<RawAmount>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_missed: RawAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_penalty: RawAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attestation: RawAttestation,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sync_committee: RawCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub proposal: RawProposal,
    pub finality: Option<String>,
}

/// Resolved amounts of one duty category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryAmounts {
    pub earned: Wei,
    pub missed: Wei,
    pub penalty: Wei,
}

impl CategoryAmounts {
    fn resolve<S: ScaleStrategy + ?Sized>(
        raw: &RawCategory,
        strategy: &S,
    ) -> Result<Self, AnalyticsError> {
        Ok(Self {
            earned: strategy.resolve(&raw.reward)?,
            missed: strategy.resolve(&raw.missed_reward)?,
            penalty: strategy.resolve(&raw.penalty)?,
        })
    }
}

/// Resolved block proposal amounts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProposalAmounts {
    pub total: Wei,
    /// Always `total - execution_layer`; upstream records never carry it directly.
    pub consensus_layer: Wei,
    pub execution_layer: Wei,
    pub inclusion_bonus: Wei,
    pub missed_consensus_layer: Wei,
    pub missed_execution_layer: Wei,
}

impl ProposalAmounts {
    pub fn missed(&self) -> Wei {
        self.missed_consensus_layer + self.missed_execution_layer
    }
}

/// Missed amounts broken down by duty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MissedByDuty {
    pub head: Wei,
    pub source: Wei,
    pub target: Wei,
    pub sync: Wei,
    pub proposal_cl: Wei,
    pub proposal_el: Wei,
}

impl MissedByDuty {
    /// Duty names paired with their amounts, in report order.
    pub fn entries(&self) -> [(&'static str, Wei); 6] {
        [
            ("head", self.head),
            ("source", self.source),
            ("target", self.target),
            ("sync", self.sync),
            ("proposal_cl", self.proposal_cl),
            ("proposal_el", self.proposal_el),
        ]
    }

    pub fn proposal(&self) -> Wei {
        self.proposal_cl + self.proposal_el
    }
}

impl Add for MissedByDuty {
    type Output = MissedByDuty;

    fn add(self, rhs: MissedByDuty) -> MissedByDuty {
        MissedByDuty {
            head: self.head + rhs.head,
            source: self.source + rhs.source,
            target: self.target + rhs.target,
            sync: self.sync + rhs.sync,
            proposal_cl: self.proposal_cl + rhs.proposal_cl,
            proposal_el: self.proposal_el + rhs.proposal_el,
        }
    }
}

/// A validator's rewards for one period, split into duty categories.
///
/// All amounts are exact base units; use [Wei::ether] for display values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DutyReward {
    pub validator_index: u64,
    pub public_key: Option<String>,
    pub epoch: Option<u64>,
    pub total_earned: Wei,
    pub total_missed: Wei,
    pub total_penalty: Wei,
    pub attestation_total: Wei,
    pub head: CategoryAmounts,
    pub source: CategoryAmounts,
    pub target: CategoryAmounts,
    pub sync_committee: CategoryAmounts,
    pub proposal: ProposalAmounts,
    pub inactivity_leak_penalty: Wei,
    pub finality: Option<String>,
}

impl DutyReward {
    pub fn total_possible(&self) -> Wei {
        self.total_earned + self.total_missed + self.total_penalty
    }

    /// Percentage of the possible reward that was earned; 0 when nothing was possible.
    pub fn capture_rate(&self) -> f64 {
        capture_rate(self.total_earned, self.total_possible())
    }

    /// Attestation, sync committee and the consensus-layer share of proposals.
    pub fn consensus_layer_reward(&self) -> Wei {
        self.attestation_total + self.sync_committee.earned + self.proposal.consensus_layer
    }

    pub fn execution_layer_reward(&self) -> Wei {
        self.proposal.execution_layer
    }

    pub fn net_reward(&self) -> Wei {
        self.total_earned - self.total_penalty
    }

    pub fn missed_by_duty(&self) -> MissedByDuty {
        MissedByDuty {
            head: self.head.missed,
            source: self.source.missed,
            target: self.target.missed,
            sync: self.sync_committee.missed,
            proposal_cl: self.proposal.missed_consensus_layer,
            proposal_el: self.proposal.missed_execution_layer,
        }
    }

    /// Compare the category sums against the top-level totals.
    pub fn reconcile(&self) -> Reconciliation {
        let earned = self.attestation_total + self.sync_committee.earned + self.proposal.total;
        let missed = self.head.missed
            + self.source.missed
            + self.target.missed
            + self.sync_committee.missed
            + self.proposal.missed();
        let penalty = self.head.penalty
            + self.source.penalty
            + self.target.penalty
            + self.sync_committee.penalty
            + self.inactivity_leak_penalty;
        Reconciliation {
            earned: self.total_earned - earned,
            missed: self.total_missed - missed,
            penalty: self.total_penalty - penalty,
        }
    }
}

/// `part / possible * 100`, or 0 when `possible` is zero.
pub fn capture_rate(part: Wei, possible: Wei) -> f64 {
    part.percent_of(possible).unwrap_or_default()
}

/// Top-level total minus the sum of its categories, per amount kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub earned: Wei,
    pub missed: Wei,
    pub penalty: Wei,
}

impl Reconciliation {
    pub fn is_within(&self, tolerance: Wei) -> bool {
        [self.earned, self.missed, self.penalty]
            .into_iter()
            .all(|delta| delta.abs_diff(Wei::ZERO) <= tolerance)
    }

    pub fn is_exact(&self) -> bool {
        self.is_within(Wei::ZERO)
    }
}

/// Resolve every amount of a raw record into base units.
pub fn decompose<S: ScaleStrategy + ?Sized>(
    record: &RawDutyRecord,
    strategy: &S,
) -> Result<DutyReward, AnalyticsError> {
    let validator_index =
        record.validator.index.ok_or(AnalyticsError::MissingRequiredField("validator.index"))?;
    let total_reward =
        record.total_reward.as_ref().ok_or(AnalyticsError::MissingRequiredField("total_reward"))?;

    let proposal = &record.proposal;
    let proposal_total = strategy.resolve(&proposal.total)?;
    let execution_layer = strategy.resolve(&proposal.execution_layer_reward)?;

    Ok(DutyReward {
        validator_index,
        public_key: record.validator.public_key.clone(),
        epoch: record.epoch,
        total_earned: strategy.resolve(total_reward)?,
        total_missed: strategy.resolve(&record.total_missed)?,
        total_penalty: strategy.resolve(&record.total_penalty)?,
        attestation_total: strategy.resolve(&record.attestation.total)?,
        head: CategoryAmounts::resolve(&record.attestation.head, strategy)?,
        source: CategoryAmounts::resolve(&record.attestation.source, strategy)?,
        target: CategoryAmounts::resolve(&record.attestation.target, strategy)?,
        sync_committee: CategoryAmounts::resolve(&record.sync_committee, strategy)?,
        proposal: ProposalAmounts {
            total: proposal_total,
            consensus_layer: proposal_total - execution_layer,
            execution_layer,
            inclusion_bonus: strategy.resolve(&proposal.attestation_inclusion_reward)?,
            missed_consensus_layer: strategy.resolve(&proposal.missed_cl_reward)?,
            missed_execution_layer: strategy.resolve(&proposal.missed_el_reward)?,
        },
        inactivity_leak_penalty: strategy.resolve(&record.attestation.inactivity_leak_penalty)?,
        finality: record.finality.clone(),
    })
}

/// Deserialize a JSON record and decompose it.
pub fn decompose_value<S: ScaleStrategy + ?Sized>(
    value: &Value,
    strategy: &S,
) -> Result<DutyReward, AnalyticsError> {
    let record = RawDutyRecord::deserialize(value)?;
    decompose(&record, strategy)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::units::MagnitudeThreshold;

    fn full_record() -> Value {
        json!({
            "validator": { "index": 42, "public_key": "0xabc" },
            "epoch": 347566,
            "total_reward": "30000",
            "total_missed": "700",
            "total_penalty": "50",
            "attestation": {
                "total": "20000",
                "head": { "reward": "5000", "missed_reward": "100", "penalty": "0" },
                "source": { "reward": "5000", "missed_reward": "0", "penalty": "10" },
                "target": { "reward": "10000", "missed_reward": "300", "penalty": "20" },
                "inactivity_leak_penalty": "5"
            },
            "sync_committee": { "reward": "4000", "missed_reward": "100", "penalty": "15" },
            "proposal": {
                "total": "6000",
                "execution_layer_reward": "2500",
                "attestation_inclusion_reward": "400",
                "missed_cl_reward": "150",
                "missed_el_reward": "50"
            },
            "finality": "finalized"
        })
    }

    #[test]
    fn decomposes_every_category() {
        let reward = decompose_value(&full_record(), &MagnitudeThreshold::default()).unwrap();
        assert_eq!(reward.validator_index, 42);
        assert_eq!(reward.epoch, Some(347566));
        assert_eq!(reward.proposal.consensus_layer, Wei::from(3500u64));
        assert_eq!(reward.execution_layer_reward(), Wei::from(2500u64));
        assert_eq!(reward.consensus_layer_reward(), Wei::from(20000u64 + 4000 + 3500));
        assert_eq!(reward.net_reward(), Wei::from(29950u64));
        assert_eq!(reward.total_possible(), Wei::from(30750u64));
        assert_eq!(reward.missed_by_duty().proposal(), Wei::from(200u64));
        assert_eq!(reward.finality.as_deref(), Some("finalized"));
        assert!(reward.reconcile().is_exact());
    }

    #[test]
    fn capture_rate_divides_exact_amounts() {
        let record = json!({
            "validator": { "index": 7 },
            "total_reward": "20790000000000000",
            "total_missed": "210000000000000",
            "total_penalty": "0"
        });
        let reward = decompose_value(&record, &MagnitudeThreshold::default()).unwrap();
        assert_eq!(reward.capture_rate(), 99.0);
        assert_eq!(capture_rate(Wei::from(199u64), Wei::from(200u64)), 99.5);
    }

    #[test]
    fn scenario_b_full_capture() {
        let record = json!({
            "validator": { "index": 1 },
            "total_reward": "32000000000000000",
            "total_missed": "0",
            "total_penalty": "0"
        });
        let reward = decompose_value(&record, &MagnitudeThreshold::default()).unwrap();
        assert_eq!(reward.total_earned.ether(), 0.032);
        assert_eq!(reward.capture_rate(), 100.0);
    }

    #[test]
    fn absent_and_null_fields_default_to_zero() {
        let record = json!({
            "validator": { "index": 7 },
            "total_reward": "0",
            "total_missed": null,
            "attestation": { "head": null },
            "proposal": {}
        });
        let reward = decompose_value(&record, &MagnitudeThreshold::default()).unwrap();
        assert_eq!(reward.total_possible(), Wei::ZERO);
        assert_eq!(reward.capture_rate(), 0.0);
        assert_eq!(reward.head, CategoryAmounts::default());
        assert_eq!(reward.epoch, None);
    }

    #[test]
    fn missing_required_fields() {
        let strategy = MagnitudeThreshold::default();
        assert_eq!(
            decompose_value(&json!({ "total_reward": "1" }), &strategy),
            Err(AnalyticsError::MissingRequiredField("validator.index"))
        );
        assert_eq!(
            decompose_value(&json!({ "validator": { "index": 1 } }), &strategy),
            Err(AnalyticsError::MissingRequiredField("total_reward"))
        );
    }

    #[test]
    fn malformed_amounts_are_surfaced() {
        let mut record = full_record();
        record["sync_committee"]["reward"] = json!("12.5");
        assert_eq!(
            decompose_value(&record, &MagnitudeThreshold::default()),
            Err(AnalyticsError::MalformedNumericInput("12.5".to_string()))
        );

        let wrong_shape = json!({ "validator": "not-an-object", "total_reward": "1" });
        assert!(matches!(
            decompose_value(&wrong_shape, &MagnitudeThreshold::default()),
            Err(AnalyticsError::MalformedRecord(_))
        ));
    }

    #[test]
    fn native_numbers_follow_the_strategy() {
        let record = json!({
            "validator": { "index": 3 },
            "total_reward": 0.5,
            "total_missed": 5e17,
        });
        let reward = decompose_value(&record, &MagnitudeThreshold::default()).unwrap();
        assert_eq!(reward.total_earned.ether(), 0.5);
        assert_eq!(reward.total_missed.ether(), 0.5);
        assert_eq!(reward.capture_rate(), 50.0);
    }

    #[test]
    fn reconciliation_reports_deltas() {
        let mut record = full_record();
        record["total_reward"] = json!("30001");
        let reward = decompose_value(&record, &MagnitudeThreshold::default()).unwrap();
        let delta = reward.reconcile();
        assert_eq!(delta.earned, Wei::from(1u64));
        assert!(!delta.is_exact());
        assert!(delta.is_within(Wei::from(1u64)));
    }
}
