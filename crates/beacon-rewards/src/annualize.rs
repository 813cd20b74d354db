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

//! Annualized rates from rewards observed over a finite period.

use serde::{Deserialize, Serialize};

use crate::{aggregate::DutyAggregate, duty::DutyReward, ChainSpec};

/// Stake assumed per validator when none is given, in ether.
pub const DEFAULT_STAKE: f64 = 32.0;

/// Observation windows shorter than this many days give unreliable rates.
pub const LOW_CONFIDENCE_DAYS: f64 = 7.0;

/// Linear annualization of a period return, in percent.
///
/// Returns 0 for a zero stake or a zero-length period. A short period is scaled up
/// proportionally; see [is_low_confidence].
pub fn apr(net_reward: f64, baseline_stake: f64, period_epochs: u64, spec: &ChainSpec) -> f64 {
    if baseline_stake == 0.0 || period_epochs == 0 {
        return 0.0;
    }
    (net_reward / baseline_stake) * (spec.epochs_per_year as f64 / period_epochs as f64) * 100.0
}

/// Compounded yield for an APR, in percent.
///
/// Uses continuous compounding, `e^(apr/100) - 1`, which approximates but does not equal
/// compounding at the protocol's real reward frequency.
pub fn apy(apr_percent: f64) -> f64 {
    ((apr_percent / 100.0).exp() - 1.0) * 100.0
}

/// Wall-clock length of a period of epochs, in days.
pub fn period_days(period_epochs: u64, spec: &ChainSpec) -> f64 {
    period_epochs.saturating_mul(spec.seconds_per_epoch()) as f64 / spec.seconds_per_day() as f64
}

/// Whether a period is too short for its annualized rate to be trusted.
pub fn is_low_confidence(period_epochs: u64, spec: &ChainSpec) -> bool {
    period_days(period_epochs, spec) < LOW_CONFIDENCE_DAYS
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnualizationInput {
    /// Net reward over the period, in ether.
    pub net_reward: f64,
    /// Stake that earned the reward, in ether.
    pub baseline_stake: f64,
    pub period_epochs: u64,
}

impl AnnualizationInput {
    pub fn apr(&self, spec: &ChainSpec) -> f64 {
        apr(self.net_reward, self.baseline_stake, self.period_epochs, spec)
    }

    pub fn apy(&self, spec: &ChainSpec) -> f64 {
        apy(self.apr(spec))
    }
}

/// Returns of a set of validators over one period, with extrapolated earnings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReturnsSummary {
    pub period_epochs: u64,
    pub period_days: f64,
    pub validators: usize,
    pub assumed_stake: f64,
    pub total_earned: f64,
    pub total_penalty: f64,
    pub net_reward: f64,
    pub consensus_layer: f64,
    pub execution_layer: f64,
    pub total_apr: f64,
    pub total_apy: f64,
    pub consensus_layer_apr: f64,
    pub execution_layer_apr: f64,
    pub daily: f64,
    /// 30 days at the daily rate.
    pub monthly: f64,
    /// 365.25 days at the daily rate.
    pub yearly: f64,
    pub low_confidence: bool,
    /// Execution-layer income exceeds half of the consensus-layer income.
    pub execution_layer_dominant: bool,
}

impl ReturnsSummary {
    pub fn compute(
        rewards: &[DutyReward],
        stake_per_validator: f64,
        period_epochs: u64,
        spec: &ChainSpec,
    ) -> Self {
        let aggregate = DutyAggregate::from_rewards(rewards);
        let assumed_stake = aggregate.validators as f64 * stake_per_validator;
        let net_reward = aggregate.net().ether();
        let consensus_layer = aggregate.consensus_layer.ether();
        let execution_layer = aggregate.execution_layer.ether();

        let total_apr = apr(net_reward, assumed_stake, period_epochs, spec);
        let days = period_days(period_epochs, spec);
        let daily = if days > 0.0 { net_reward / days } else { 0.0 };

        Self {
            period_epochs,
            period_days: days,
            validators: aggregate.validators,
            assumed_stake,
            total_earned: aggregate.earned.ether(),
            total_penalty: aggregate.penalty.ether(),
            net_reward,
            consensus_layer,
            execution_layer,
            total_apr,
            total_apy: apy(total_apr),
            consensus_layer_apr: apr(consensus_layer, assumed_stake, period_epochs, spec),
            execution_layer_apr: apr(execution_layer, assumed_stake, period_epochs, spec),
            daily,
            monthly: daily * 30.0,
            yearly: daily * 365.25,
            low_confidence: days < LOW_CONFIDENCE_DAYS,
            execution_layer_dominant: execution_layer > consensus_layer * 0.5,
        }
    }

    /// Share of the net reward contributed by a component, in percent.
    pub fn share_of_net(&self, component: f64) -> Option<f64> {
        (self.net_reward != 0.0).then(|| component / self.net_reward * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{duty::decompose_value, units::MagnitudeThreshold, MAINNET};

    #[test]
    fn scenario_c_one_day() {
        let rate = apr(0.001, 32.0, 225, &MAINNET);
        assert!((rate - 1.140625).abs() < 1e-9);
        assert!(is_low_confidence(225, &MAINNET));
        assert!(!is_low_confidence(225 * 7, &MAINNET));
    }

    #[test]
    fn zero_guards() {
        for reward in [0.0, 1.0, -3.0] {
            assert_eq!(apr(reward, 0.0, 225, &MAINNET), 0.0);
            assert_eq!(apr(reward, 32.0, 0, &MAINNET), 0.0);
        }
    }

    #[test]
    fn apy_is_continuous_compounding() {
        assert_eq!(apy(0.0), 0.0);
        assert!((apy(100.0) - (std::f64::consts::E - 1.0) * 100.0).abs() < 1e-9);
        let mut previous = apy(0.0);
        for step in 1..200 {
            let next = apy(f64::from(step) * 0.5);
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn input_value() {
        let input = AnnualizationInput { net_reward: 0.001, baseline_stake: 32.0, period_epochs: 225 };
        assert_eq!(input.apr(&MAINNET), apr(0.001, 32.0, 225, &MAINNET));
        assert_eq!(input.apy(&MAINNET), apy(input.apr(&MAINNET)));
    }

    #[test]
    fn returns_summary() {
        let strategy = MagnitudeThreshold::default();
        let rewards: Vec<_> = [
            json!({
                "validator": { "index": 1 },
                "total_reward": "2000000000000000",
                "total_penalty": "1000000000000000",
                "attestation": { "total": "1000000000000000" },
                "proposal": { "total": "1000000000000000", "execution_layer_reward": "800000000000000" }
            }),
            json!({
                "validator": { "index": 2 },
                "total_reward": "1000000000000000",
                "attestation": { "total": "1000000000000000" }
            }),
        ]
        .iter()
        .map(|value| decompose_value(value, &strategy).unwrap())
        .collect();

        let summary = ReturnsSummary::compute(&rewards, DEFAULT_STAKE, 225, &MAINNET);
        assert_eq!(summary.validators, 2);
        assert_eq!(summary.assumed_stake, 64.0);
        assert_eq!(summary.net_reward, 0.002);
        assert_eq!(summary.execution_layer, 0.0008);
        assert_eq!(summary.consensus_layer, 0.0022);
        assert_eq!(summary.period_days, 1.0);
        assert!((summary.daily - 0.002).abs() < 1e-12);
        assert!((summary.monthly - 0.06).abs() < 1e-12);
        assert!((summary.total_apr - apr(0.002, 64.0, 225, &MAINNET)).abs() < 1e-12);
        assert!(summary.low_confidence);
        assert!(!summary.execution_layer_dominant);
        assert_eq!(summary.share_of_net(summary.execution_layer).map(f64::round), Some(40.0));
    }

    #[test]
    fn empty_period_summary() {
        let summary = ReturnsSummary::compute(&[], DEFAULT_STAKE, 0, &MAINNET);
        assert_eq!(summary.total_apr, 0.0);
        assert_eq!(summary.daily, 0.0);
        assert_eq!(summary.share_of_net(1.0), None);
    }
}
