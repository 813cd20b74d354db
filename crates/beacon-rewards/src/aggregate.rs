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

//! Sums across decomposed records and multi-period reward comparisons.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    annualize::DEFAULT_STAKE,
    duty::{capture_rate, DutyReward, MissedByDuty},
    fields::{unwrap_envelope, FieldChain},
    units::{MagnitudeThreshold, RawAmount, ScaleStrategy, Wei},
    AnalyticsError,
};

/// Totals over a set of decomposed records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DutyAggregate {
    pub records: usize,
    pub validators: usize,
    pub earned: Wei,
    pub missed: Wei,
    pub penalty: Wei,
    pub consensus_layer: Wei,
    pub execution_layer: Wei,
    pub inactivity_leak_penalty: Wei,
    pub missed_by_duty: MissedByDuty,
}

impl DutyAggregate {
    pub fn from_rewards(rewards: &[DutyReward]) -> Self {
        let validators: BTreeSet<u64> = rewards.iter().map(|r| r.validator_index).collect();
        rewards.iter().fold(
            Self { records: rewards.len(), validators: validators.len(), ..Default::default() },
            |mut acc, reward| {
                acc.earned += reward.total_earned;
                acc.missed += reward.total_missed;
                acc.penalty += reward.total_penalty;
                acc.consensus_layer += reward.consensus_layer_reward();
                acc.execution_layer += reward.execution_layer_reward();
                acc.inactivity_leak_penalty += reward.inactivity_leak_penalty;
                acc.missed_by_duty = acc.missed_by_duty + reward.missed_by_duty();
                acc
            },
        )
    }

    pub fn net(&self) -> Wei {
        self.earned - self.penalty
    }

    /// Earned over earned plus missed; penalties are not part of the denominator here.
    pub fn capture_rate(&self) -> f64 {
        capture_rate(self.earned, self.earned + self.missed)
    }
}

/// Income of one validator over all of its records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidatorIncome {
    /// Number of records (periods) summed.
    pub periods: usize,
    pub total: Wei,
    pub consensus_layer: Wei,
    pub execution_layer: Wei,
    pub penalty: Wei,
}

impl ValidatorIncome {
    /// Group records by validator index, ordered by index.
    pub fn summarize(rewards: &[DutyReward]) -> BTreeMap<u64, ValidatorIncome> {
        let mut by_validator: BTreeMap<u64, ValidatorIncome> = BTreeMap::new();
        for reward in rewards {
            let income = by_validator.entry(reward.validator_index).or_default();
            income.periods += 1;
            income.total += reward.total_earned;
            income.consensus_layer += reward.consensus_layer_reward();
            income.execution_layer += reward.execution_layer_reward();
            income.penalty += reward.total_penalty;
        }
        by_validator
    }

    pub fn net(&self) -> Wei {
        self.total - self.penalty
    }
}

/// Direction of a period's daily average relative to the long-run baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Trend {
    Up(f64),
    Down(f64),
    Steady(f64),
}

/// Relative difference, in percent, above which a trend counts as up or down.
pub const TREND_BAND_PERCENT: f64 = 5.0;

impl Trend {
    /// Compare a daily average against a baseline; `None` without a positive baseline.
    pub fn compare(daily_average: f64, baseline: f64) -> Option<Trend> {
        if baseline <= 0.0 {
            return None;
        }
        let percent = (daily_average - baseline) / baseline * 100.0;
        Some(if percent > TREND_BAND_PERCENT {
            Trend::Up(percent)
        } else if percent < -TREND_BAND_PERCENT {
            Trend::Down(percent)
        } else {
            Trend::Steady(percent)
        })
    }

    pub fn percent(&self) -> f64 {
        match self {
            Trend::Up(p) | Trend::Down(p) | Trend::Steady(p) => *p,
        }
    }
}

/// A reporting window of the rewards-aggregate endpoint.
#[derive(Clone, Copy, Debug)]
pub struct PeriodWindow {
    pub label: &'static str,
    pub days: u32,
    pub field: FieldChain,
}

pub const PERIOD_WINDOWS: [PeriodWindow; 4] = [
    PeriodWindow {
        label: "24h",
        days: 1,
        field: FieldChain::first_present(
            "24h",
            &["1d", "24h", "rewards_1d", "total_1d", "period_1d", "1"],
        ),
    },
    PeriodWindow {
        label: "7d",
        days: 7,
        field: FieldChain::first_present(
            "7d",
            &["7d", "rewards_7d", "total_7d", "period_7d", "7"],
        ),
    },
    PeriodWindow {
        label: "30d",
        days: 30,
        field: FieldChain::first_present(
            "30d",
            &["30d", "rewards_30d", "total_30d", "period_30d", "30"],
        ),
    },
    PeriodWindow {
        label: "90d",
        days: 90,
        field: FieldChain::first_present(
            "90d",
            &["90d", "rewards_90d", "total_90d", "period_90d", "90"],
        ),
    },
];

const PERIOD_TOTAL: FieldChain = FieldChain::first_present("total", &["total_reward", "total"]);
const PERIOD_CL: FieldChain =
    FieldChain::first_present("consensus_layer", &["cl_reward", "attestation"]);
const PERIOD_EL: FieldChain =
    FieldChain::first_present("execution_layer", &["el_reward", "execution_layer_reward"]);

/// Rewards of a single window, in display units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodTotals {
    pub label: &'static str,
    pub days: u32,
    pub total: f64,
    pub consensus_layer: f64,
    pub execution_layer: f64,
    pub daily_average: f64,
    /// Absent for the 90d window and when there is no baseline. A 30d baseline is compared
    /// with itself and reads as steady.
    pub trend: Option<Trend>,
}

/// Side by side comparison of the available reward windows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeriodComparison {
    pub periods: Vec<PeriodTotals>,
    /// Label of the window the trends are measured against (90d, else 30d).
    pub baseline: Option<&'static str>,
}

impl PeriodComparison {
    pub fn from_value(document: &Value) -> Result<Self, AnalyticsError> {
        let data = unwrap_envelope(document);
        let strategy = MagnitudeThreshold::default();

        let mut periods = Vec::new();
        for window in &PERIOD_WINDOWS {
            let Some(value) = window.field.resolve(&data) else {
                continue;
            };
            let (total, consensus_layer, execution_layer) = if value.is_object() {
                (
                    display_amount(PERIOD_TOTAL.resolve(value), &strategy)?,
                    display_amount(PERIOD_CL.resolve(value), &strategy)?,
                    display_amount(PERIOD_EL.resolve(value), &strategy)?,
                )
            } else {
                (display_amount(Some(value), &strategy)?, 0.0, 0.0)
            };
            periods.push(PeriodTotals {
                label: window.label,
                days: window.days,
                total,
                consensus_layer,
                execution_layer,
                daily_average: total / f64::from(window.days),
                trend: None,
            });
        }

        let baseline = ["90d", "30d"]
            .into_iter()
            .find_map(|label| periods.iter().find(|p| p.label == label))
            .map(|p| (p.label, p.daily_average));
        if let Some((_, daily)) = baseline {
            for period in periods.iter_mut().filter(|p| p.label != "90d") {
                period.trend = Trend::compare(period.daily_average, daily);
            }
        }

        Ok(Self { periods, baseline: baseline.map(|(label, _)| label) })
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&PeriodTotals> {
        self.periods.iter().find(|p| p.label == label)
    }

    /// Rough APR from the 24h window against a single default stake.
    ///
    /// Only reported when both the 24h and the 30d windows are present.
    pub fn estimated_apr(&self) -> Option<f64> {
        self.get("30d")?;
        let day = self.get("24h")?;
        Some(day.total * 365.25 / DEFAULT_STAKE * 100.0)
    }
}

fn display_amount(
    value: Option<&Value>,
    strategy: &MagnitudeThreshold,
) -> Result<f64, AnalyticsError> {
    let Some(value) = value else {
        return Ok(0.0);
    };
    let amount = RawAmount::deserialize(value)?;
    Ok(strategy.resolve(&amount)?.ether())
}
