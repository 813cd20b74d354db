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

//! Threshold rules mapping metrics to severities and remediation advice.
//!
//! Rules are plain data: a table of predicate and outcome pairs evaluated in order. With
//! [classify] every rule whose predicate holds contributes a [Diagnostic], so one input may
//! produce several; [first_match] stops at the first one instead.

use serde::Serialize;

use crate::{
    aggregate::DutyAggregate,
    duty::{DutyReward, MissedByDuty},
    units::Wei,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Healthy,
    Notice,
    Warning,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub label: &'static str,
    pub remediation: &'static str,
    /// The value that triggered the rule, when one is meaningful.
    pub metric: Option<Metric>,
}

/// A diagnostic's triggering value together with its unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Metric {
    Ether(f64),
    Percent(f64),
}

/// A single entry of a rule table.
pub struct Rule<T, O = Diagnostic> {
    pub name: &'static str,
    pub applies: fn(&T) -> bool,
    pub outcome: fn(&T) -> O,
}

/// Evaluate every rule in table order and collect the outcomes of the ones that apply.
pub fn classify<T, O>(rules: &[Rule<T, O>], input: &T) -> Vec<O> {
    rules.iter().filter(|rule| (rule.applies)(input)).map(|rule| (rule.outcome)(input)).collect()
}

/// Outcome of the first rule in table order that applies.
pub fn first_match<T, O>(rules: &[Rule<T, O>], input: &T) -> Option<O> {
    rules.iter().find(|rule| (rule.applies)(input)).map(|rule| (rule.outcome)(input))
}

/// The metrics the duty rules look at, for one record or for an aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DutyMetrics {
    pub missed: MissedByDuty,
    pub inactivity_leak_penalty: Wei,
    pub capture_rate: f64,
}

impl From<&DutyReward> for DutyMetrics {
    fn from(reward: &DutyReward) -> Self {
        Self {
            missed: reward.missed_by_duty(),
            inactivity_leak_penalty: reward.inactivity_leak_penalty,
            capture_rate: reward.capture_rate(),
        }
    }
}

impl From<&DutyAggregate> for DutyMetrics {
    fn from(aggregate: &DutyAggregate) -> Self {
        Self {
            missed: aggregate.missed_by_duty,
            inactivity_leak_penalty: aggregate.inactivity_leak_penalty,
            capture_rate: aggregate.capture_rate(),
        }
    }
}

fn fixed(severity: Severity, label: &'static str, remediation: &'static str) -> Diagnostic {
    Diagnostic { severity, label, remediation, metric: None }
}

fn missed_proposal(m: &DutyMetrics) -> Diagnostic {
    Diagnostic {
        severity: Severity::Critical,
        label: "Missed block proposal",
        remediation: "Validator was offline or slow when assigned to propose. Check the node was \
                      running and the MEV relay is configured.",
        metric: Some(Metric::Ether(m.missed.proposal().ether())),
    }
}

fn capture_band(m: &DutyMetrics) -> Diagnostic {
    let band = CaptureBand::from_rate(m.capture_rate);
    Diagnostic {
        severity: band.severity(),
        label: band.label(),
        remediation: band.remediation(),
        metric: Some(Metric::Percent(m.capture_rate)),
    }
}

/// Duty rules in evaluation order: specific misses and penalties first, banding last.
pub static DUTY_RULES: [Rule<DutyMetrics>; 7] = [
    Rule {
        name: "missed_head",
        applies: |m| m.missed.head.is_positive(),
        outcome: |_| {
            fixed(
                Severity::Warning,
                "Missed head votes",
                "Check network latency and peer count. Ensure the beacon node has good \
                 connectivity.",
            )
        },
    },
    Rule {
        name: "missed_source",
        applies: |m| m.missed.source.is_positive(),
        outcome: |_| {
            fixed(
                Severity::Warning,
                "Missed source votes",
                "Verify the beacon node is synced and not falling behind.",
            )
        },
    },
    Rule {
        name: "missed_target",
        applies: |m| m.missed.target.is_positive(),
        outcome: |_| {
            fixed(
                Severity::Critical,
                "Missed target votes",
                "Most costly miss. Check node sync status and attestation timing. May indicate \
                 extended downtime.",
            )
        },
    },
    Rule {
        name: "missed_sync",
        applies: |m| m.missed.sync.is_positive(),
        outcome: |_| {
            fixed(
                Severity::Warning,
                "Missed sync committee duties",
                "Validator was selected for the sync committee but missed participation. Check \
                 uptime during the sync period.",
            )
        },
    },
    Rule {
        name: "missed_proposal",
        applies: |m| m.missed.proposal_cl.is_positive() || m.missed.proposal_el.is_positive(),
        outcome: missed_proposal,
    },
    Rule {
        name: "inactivity_leak",
        applies: |m| m.inactivity_leak_penalty.is_positive(),
        outcome: |_| {
            fixed(
                Severity::Critical,
                "Inactivity leak penalty",
                "The network is failing to finalize and this validator was offline. This is a \
                 severe penalty; restore uptime immediately.",
            )
        },
    },
    Rule { name: "capture_rate", applies: |_| true, outcome: capture_band },
];

/// Classify a decomposed record against [DUTY_RULES].
pub fn diagnose(reward: &DutyReward) -> Vec<Diagnostic> {
    classify(&DUTY_RULES, &DutyMetrics::from(reward))
}

/// Partition of capture rates; each band includes its lower edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CaptureBand {
    /// `[0, 95)`
    Poor,
    /// `[95, 99)`
    BelowTarget,
    /// `[99, 99.5)`
    Good,
    /// `[99.5, 100]`
    Exceptional,
}

impl CaptureBand {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 99.5 {
            CaptureBand::Exceptional
        } else if rate >= 99.0 {
            CaptureBand::Good
        } else if rate >= 95.0 {
            CaptureBand::BelowTarget
        } else {
            CaptureBand::Poor
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            CaptureBand::Exceptional | CaptureBand::Good => Severity::Healthy,
            CaptureBand::BelowTarget => Severity::Warning,
            CaptureBand::Poor => Severity::Critical,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CaptureBand::Exceptional => "Exceptional performance",
            CaptureBand::Good => "Good performance",
            CaptureBand::BelowTarget => "Below target",
            CaptureBand::Poor => "Poor performance",
        }
    }

    pub fn remediation(self) -> &'static str {
        match self {
            CaptureBand::Exceptional => "No action needed.",
            CaptureBand::Good => "Minor optimizations possible.",
            CaptureBand::BelowTarget => "Investigate the missed duties above.",
            CaptureBand::Poor => "Immediate attention required.",
        }
    }
}

/// One band of a [BandTable].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Band {
    /// Inclusive lower edge.
    pub floor: f64,
    pub severity: Severity,
    pub label: &'static str,
}

/// Bands ordered from the highest floor down, with a fallback below the lowest one.
#[derive(Clone, Copy, Debug)]
pub struct BandTable {
    pub bands: &'static [Band],
    pub fallback: Band,
}

impl BandTable {
    pub fn classify(&self, value: f64) -> &Band {
        self.bands.iter().find(|band| value >= band.floor).unwrap_or(&self.fallback)
    }
}

const fn band(floor: f64, severity: Severity, label: &'static str) -> Band {
    Band { floor, severity, label }
}

/// Network attestation participation, in percent.
pub static PARTICIPATION_BANDS: BandTable = BandTable {
    bands: &[
        band(99.0, Severity::Healthy, "Healthy"),
        band(97.0, Severity::Notice, "Acceptable"),
        band(95.0, Severity::Warning, "Degraded"),
    ],
    fallback: band(0.0, Severity::Critical, "Critical"),
};

/// Validator performance scores, in percent.
pub static SCORE_BANDS: BandTable = BandTable {
    bands: &[
        band(99.5, Severity::Healthy, "Exceptional"),
        band(99.0, Severity::Healthy, "Good"),
        band(97.0, Severity::Notice, "Below target"),
        band(95.0, Severity::Warning, "Needs attention"),
    ],
    fallback: band(0.0, Severity::Critical, "Poor"),
};

/// Number of validators waiting in a queue.
pub static QUEUE_LENGTH_BANDS: BandTable = BandTable {
    bands: &[
        band(10_000.0, Severity::Critical, "Very long"),
        band(1_000.0, Severity::Warning, "Long"),
        band(100.0, Severity::Notice, "Moderate"),
        band(1.0, Severity::Healthy, "Short"),
    ],
    fallback: band(0.0, Severity::Healthy, "Empty"),
};

/// Participation below which the chain cannot finalize.
pub const FINALITY_THRESHOLD: f64 = 67.0;

/// Participation below which finality is at risk if it keeps dropping.
pub const LOW_PARTICIPATION_THRESHOLD: f64 = 80.0;

/// Finality risk for a participation rate in percent; `None` when participation is sufficient.
pub fn finality_risk(participation: f64) -> Option<Diagnostic> {
    if participation < FINALITY_THRESHOLD {
        Some(Diagnostic {
            severity: Severity::Critical,
            label: "Finality at risk",
            remediation: "Participation is below the two-thirds threshold, so the chain cannot \
                          finalize. Inactive validators will face inactivity leak penalties.",
            metric: Some(Metric::Percent(participation)),
        })
    } else if participation < LOW_PARTICIPATION_THRESHOLD {
        Some(Diagnostic {
            severity: Severity::Warning,
            label: "Low participation",
            remediation: "Finality may be delayed if participation continues to drop.",
            metric: Some(Metric::Percent(participation)),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(capture_rate: f64) -> DutyMetrics {
        DutyMetrics { capture_rate, ..Default::default() }
    }

    fn labels(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
        diagnostics.iter().map(|d| d.label).collect()
    }

    #[test]
    fn capture_band_edges_are_inclusive() {
        assert_eq!(CaptureBand::from_rate(99.0), CaptureBand::Good);
        assert_eq!(CaptureBand::from_rate(98.999), CaptureBand::BelowTarget);
        assert_eq!(CaptureBand::from_rate(99.5), CaptureBand::Exceptional);
        assert_eq!(CaptureBand::from_rate(95.0), CaptureBand::BelowTarget);
        assert_eq!(CaptureBand::from_rate(94.99), CaptureBand::Poor);
        assert_eq!(CaptureBand::from_rate(0.0), CaptureBand::Poor);
        assert_eq!(CaptureBand::from_rate(100.0), CaptureBand::Exceptional);
    }

    #[test]
    fn clean_record_only_gets_a_band() {
        let out = classify(&DUTY_RULES, &metrics(99.0));
        assert_eq!(labels(&out), vec!["Good performance"]);
        assert_eq!(out[0].severity, Severity::Healthy);
        assert_eq!(out[0].metric, Some(Metric::Percent(99.0)));
    }

    #[test]
    fn multiple_rules_fire_in_table_order() {
        let input = DutyMetrics {
            missed: MissedByDuty {
                head: Wei::from(1u64),
                target: Wei::from(1u64),
                proposal_el: Wei::from(2_000_000_000_000_000u64),
                ..Default::default()
            },
            inactivity_leak_penalty: Wei::from(1u64),
            capture_rate: 90.0,
        };
        let out = classify(&DUTY_RULES, &input);
        assert_eq!(
            labels(&out),
            vec![
                "Missed head votes",
                "Missed target votes",
                "Missed block proposal",
                "Inactivity leak penalty",
                "Poor performance",
            ]
        );
        assert_eq!(out[2].metric, Some(Metric::Ether(0.002)));
        assert_eq!(out.iter().map(|d| d.severity).max(), Some(Severity::Critical));
    }

    #[test]
    fn rules_can_be_tested_in_isolation() {
        let sync = DUTY_RULES.iter().find(|rule| rule.name == "missed_sync").unwrap();
        let mut input = metrics(100.0);
        assert!(!(sync.applies)(&input));
        input.missed.sync = Wei::from(5u64);
        assert!((sync.applies)(&input));
        assert_eq!((sync.outcome)(&input).severity, Severity::Warning);
    }

    #[test]
    fn first_match_stops_at_the_first_rule() {
        let mut input = metrics(90.0);
        assert_eq!(first_match(&DUTY_RULES, &input).map(|d| d.label), Some("Poor performance"));
        input.missed.target = Wei::from(1u64);
        input.missed.sync = Wei::from(1u64);
        assert_eq!(first_match(&DUTY_RULES, &input).map(|d| d.label), Some("Missed target votes"));
        assert!(first_match::<DutyMetrics, Diagnostic>(&[], &input).is_none());
    }

    #[test]
    fn band_tables() {
        assert_eq!(PARTICIPATION_BANDS.classify(99.0).label, "Healthy");
        assert_eq!(PARTICIPATION_BANDS.classify(96.0).label, "Degraded");
        assert_eq!(PARTICIPATION_BANDS.classify(50.0).severity, Severity::Critical);
        assert_eq!(SCORE_BANDS.classify(99.2).label, "Good");
        assert_eq!(SCORE_BANDS.classify(97.0).label, "Below target");
        assert_eq!(QUEUE_LENGTH_BANDS.classify(0.0).label, "Empty");
        assert_eq!(QUEUE_LENGTH_BANDS.classify(99.0).label, "Short");
        assert_eq!(QUEUE_LENGTH_BANDS.classify(100.0).label, "Moderate");
        assert_eq!(QUEUE_LENGTH_BANDS.classify(10_000.0).label, "Very long");
    }

    #[test]
    fn finality() {
        assert_eq!(finality_risk(66.9).map(|d| d.severity), Some(Severity::Critical));
        assert_eq!(finality_risk(67.0).map(|d| d.severity), Some(Severity::Warning));
        assert_eq!(finality_risk(80.0), None);
    }
}
