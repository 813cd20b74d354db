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

//! Lifecycle status of validators from an overview response, and a summary over all of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    batch::RecordFailure,
    diagnostics::{classify, first_match, Diagnostic, Rule, Severity},
    fields::as_u64,
    units::{RawAmount, ScaleStrategy, Wei},
    AnalyticsError,
};

/// Exit epochs at or beyond this value mean the validator has no exit scheduled.
pub const NO_EXIT_SCHEDULED: u64 = 1 << 63;

/// Where a validator stands in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    Slashed,
    Exited,
    Exiting,
    Pending,
    Online,
    Offline,
}

impl Lifecycle {
    pub fn label(self) -> &'static str {
        match self {
            Lifecycle::Slashed => "SLASHED",
            Lifecycle::Exited => "EXITED",
            Lifecycle::Exiting => "EXITING",
            Lifecycle::Pending => "PENDING",
            Lifecycle::Online => "ONLINE",
            Lifecycle::Offline => "OFFLINE",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Lifecycle::Online => Severity::Healthy,
            Lifecycle::Exited | Lifecycle::Pending => Severity::Notice,
            Lifecycle::Exiting => Severity::Warning,
            Lifecycle::Slashed | Lifecycle::Offline => Severity::Critical,
        }
    }
}

/// Lifecycle rules in precedence order; the first that applies decides, the last always does.
pub static LIFECYCLE_RULES: [Rule<ValidatorStatus, Lifecycle>; 6] = [
    Rule {
        name: "slashing",
        applies: |v| v.status.contains("slashing"),
        outcome: |_| Lifecycle::Slashed,
    },
    Rule {
        name: "exited",
        applies: |v| v.status.contains("exited") || v.status == "withdrawal",
        outcome: |_| Lifecycle::Exited,
    },
    Rule {
        name: "exiting",
        applies: |v| v.status.contains("exiting"),
        outcome: |_| Lifecycle::Exiting,
    },
    Rule {
        name: "pending",
        applies: |v| v.status.contains("pending"),
        outcome: |_| Lifecycle::Pending,
    },
    Rule { name: "online", applies: |v| v.online, outcome: |_| Lifecycle::Online },
    Rule { name: "offline", applies: |_| true, outcome: |_| Lifecycle::Offline },
];

/// Alerts raised for a single validator, in evaluation order.
pub static STATUS_RULES: [Rule<ValidatorStatus>; 2] = [
    Rule {
        name: "slashed",
        applies: |v| v.slashed,
        outcome: |_| Diagnostic {
            severity: Severity::Critical,
            label: "Validator slashed",
            remediation: "The validator is being forcibly exited. Stop every instance running \
                          this key before investigating the cause.",
            metric: None,
        },
    },
    Rule {
        name: "offline_active",
        applies: ValidatorStatus::is_offline_while_active,
        outcome: |_| Diagnostic {
            severity: Severity::Critical,
            label: "Active validator offline",
            remediation: "Check node connectivity and client health immediately.",
            metric: None,
        },
    },
];

/// Withdrawal credentials as reported upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalCredentials {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub prefix: Option<String>,
}

/// One entry of a validator overview response.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatorStatus {
    pub validator_index: Option<u64>,
    pub public_key: Option<String>,
    /// Upstream status string such as `active_online` or `exited`.
    pub status: String,
    pub online: bool,
    pub slashed: bool,
    pub balance: Wei,
    pub effective_balance: Wei,
    pub activation_epoch: Option<u64>,
    /// Scheduled exit epoch; absent when no exit is scheduled.
    pub exit_epoch: Option<u64>,
    pub withdrawal_credentials: Option<WithdrawalCredentials>,
}

impl ValidatorStatus {
    pub fn from_value<S: ScaleStrategy + ?Sized>(
        entry: &Value,
        strategy: &S,
    ) -> Result<Self, AnalyticsError> {
        let flag = |key: &str| entry.get(key).and_then(Value::as_bool).unwrap_or_default();
        let withdrawal_credentials = match entry.get("withdrawal_credentials") {
            Some(value) if value.as_object().is_some_and(|fields| !fields.is_empty()) => {
                Some(WithdrawalCredentials::deserialize(value)?)
            }
            _ => None,
        };
        Ok(Self {
            validator_index: entry.pointer("/validator/index").and_then(as_u64),
            public_key: entry
                .pointer("/validator/public_key")
                .and_then(Value::as_str)
                .map(str::to_string),
            status: entry.get("status").and_then(Value::as_str).unwrap_or("unknown").to_string(),
            online: flag("online"),
            slashed: flag("slashed"),
            balance: amount_at(entry, "/balances/current", strategy)?,
            effective_balance: amount_at(entry, "/balances/effective", strategy)?,
            activation_epoch: entry
                .pointer("/life_cycle_epochs/activation")
                .and_then(as_u64)
                .filter(|epoch| *epoch > 0),
            exit_epoch: entry
                .pointer("/life_cycle_epochs/exit")
                .and_then(as_u64)
                .filter(|epoch| *epoch > 0 && *epoch < NO_EXIT_SCHEDULED),
            withdrawal_credentials,
        })
    }

    pub fn lifecycle(&self) -> Lifecycle {
        first_match(&LIFECYCLE_RULES, self).unwrap_or(Lifecycle::Offline)
    }

    /// Active per its status string but not seen online.
    pub fn is_offline_while_active(&self) -> bool {
        !self.online && self.status.contains("active")
    }

    pub fn alerts(&self) -> Vec<Diagnostic> {
        classify(&STATUS_RULES, self)
    }

    /// Parse every overview entry; entries with malformed balances are returned as failures.
    pub fn collect<S: ScaleStrategy + ?Sized>(
        entries: &[Value],
        strategy: &S,
    ) -> (Vec<ValidatorStatus>, Vec<RecordFailure>) {
        let mut statuses = Vec::with_capacity(entries.len());
        let mut failures = Vec::new();
        for (position, entry) in entries.iter().enumerate() {
            match ValidatorStatus::from_value(entry, strategy) {
                Ok(status) => statuses.push(status),
                Err(error) => failures.push(RecordFailure {
                    position,
                    validator_index: entry.pointer("/validator/index").and_then(as_u64),
                    error,
                }),
            }
        }
        (statuses, failures)
    }
}

fn amount_at<S: ScaleStrategy + ?Sized>(
    entry: &Value,
    pointer: &str,
    strategy: &S,
) -> Result<Wei, AnalyticsError> {
    let amount = match entry.pointer(pointer).filter(|value| !value.is_null()) {
        Some(value) => RawAmount::deserialize(value)?,
        None => RawAmount::default(),
    };
    strategy.resolve(&amount)
}

/// Totals and status breakdown over a set of validators.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FleetSummary {
    pub validators: usize,
    pub total_balance: Wei,
    pub total_effective_balance: Wei,
    /// Count per upstream status string, ordered by status.
    pub status_counts: BTreeMap<String, usize>,
    /// Indices of validators that are active but offline, in input order.
    pub offline_active: Vec<u64>,
}

impl FleetSummary {
    pub fn from_statuses(statuses: &[ValidatorStatus]) -> Self {
        let mut summary = Self { validators: statuses.len(), ..Default::default() };
        for status in statuses {
            summary.total_balance += status.balance;
            summary.total_effective_balance += status.effective_balance;
            *summary.status_counts.entry(status.status.clone()).or_default() += 1;
            if status.is_offline_while_active() {
                summary.offline_active.extend(status.validator_index);
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::units::MagnitudeThreshold;

    fn entry(index: u64, status: &str, online: bool) -> Value {
        json!({
            "validator": { "index": index, "public_key": "0x93247f2209abcacf57b75a51dafae777f9dd" },
            "status": status,
            "online": online,
            "slashed": false,
            "balances": { "current": "32001000000000000000", "effective": "32000000000000000000" },
            "life_cycle_epochs": { "activation": 1000, "exit": 18446744073709551615u64 },
            "withdrawal_credentials": { "type": "execution", "prefix": "0x01" }
        })
    }

    fn status(index: u64, status: &str, online: bool) -> ValidatorStatus {
        ValidatorStatus::from_value(&entry(index, status, online), &MagnitudeThreshold::default())
            .unwrap()
    }

    #[test]
    fn parses_an_overview_entry() {
        let v = status(5, "active_online", true);
        assert_eq!(v.validator_index, Some(5));
        assert_eq!(v.balance.ether(), 32.001);
        assert_eq!(v.effective_balance.ether(), 32.0);
        assert_eq!(v.activation_epoch, Some(1000));
        assert_eq!(v.exit_epoch, None);
        assert_eq!(
            v.withdrawal_credentials,
            Some(WithdrawalCredentials {
                kind: Some("execution".to_string()),
                prefix: Some("0x01".to_string())
            })
        );
    }

    #[test]
    fn lifecycle_precedence() {
        let cases = [
            ("slashing_online", true, Lifecycle::Slashed),
            ("exited", false, Lifecycle::Exited),
            ("withdrawal", false, Lifecycle::Exited),
            ("exiting_online", true, Lifecycle::Exiting),
            ("pending", false, Lifecycle::Pending),
            ("active_online", true, Lifecycle::Online),
            ("active_offline", false, Lifecycle::Offline),
            ("deposited", false, Lifecycle::Offline),
        ];
        for (upstream, online, expected) in cases {
            assert_eq!(status(1, upstream, online).lifecycle(), expected, "{upstream}");
        }
    }

    #[test]
    fn alerts() {
        assert!(status(1, "active_online", true).alerts().is_empty());

        let offline = status(2, "active_offline", false);
        let labels: Vec<_> = offline.alerts().iter().map(|d| d.label).collect();
        assert_eq!(labels, vec!["Active validator offline"]);

        let mut slashed = status(3, "slashing_offline", false);
        slashed.slashed = true;
        let labels: Vec<_> = slashed.alerts().iter().map(|d| d.label).collect();
        assert_eq!(labels, vec!["Validator slashed"]);
    }

    #[test]
    fn scheduled_exit_is_kept() {
        let mut value = entry(9, "exiting_online", true);
        value["life_cycle_epochs"]["exit"] = json!(400000);
        let v = ValidatorStatus::from_value(&value, &MagnitudeThreshold::default()).unwrap();
        assert_eq!(v.exit_epoch, Some(400000));
    }

    #[test]
    fn summary_over_a_fleet() {
        let entries = vec![
            entry(1, "active_online", true),
            entry(2, "active_offline", false),
            entry(3, "active_online", true),
            json!({ "validator": { "index": 4 }, "balances": { "current": "bad" } }),
        ];
        let (statuses, failures) =
            ValidatorStatus::collect(&entries, &MagnitudeThreshold::default());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].validator_index, Some(4));

        let summary = FleetSummary::from_statuses(&statuses);
        assert_eq!(summary.validators, 3);
        assert_eq!(summary.total_balance, Wei::parse("96003000000000000000").unwrap());
        assert_eq!(summary.total_effective_balance.ether(), 96.0);
        assert_eq!(
            summary.status_counts.into_iter().collect::<Vec<_>>(),
            vec![("active_offline".to_string(), 1), ("active_online".to_string(), 2)]
        );
        assert_eq!(summary.offline_active, vec![2]);
    }
}
