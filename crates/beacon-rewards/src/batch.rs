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

//! Record-scoped processing of a whole rewards document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    duty::{decompose_value, DutyReward},
    fields::as_u64,
    units::ScaleStrategy,
    AnalyticsError,
};

/// Result of decomposing a single record.
pub type RecordOutcome = Result<DutyReward, AnalyticsError>;

/// A record that could not be decomposed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordFailure {
    /// Zero-based position of the record in the input list.
    pub position: usize,
    /// Validator index, when the record carried one.
    pub validator_index: Option<u64>,
    pub error: AnalyticsError,
}

/// Successfully decomposed records together with the ones that were skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub records: Vec<DutyReward>,
    pub failures: Vec<RecordFailure>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Decompose every record; a failing record is reported and does not stop the others.
pub fn decompose_batch<S: ScaleStrategy + ?Sized>(values: &[Value], strategy: &S) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for (position, value) in values.iter().enumerate() {
        match decompose_value(value, strategy) {
            Ok(record) => outcome.records.push(record),
            Err(error) => outcome.failures.push(RecordFailure {
                position,
                validator_index: value.pointer("/validator/index").and_then(as_u64),
                error,
            }),
        }
    }
    outcome
}

/// Inclusive start and end of a range, either of which may be absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// Epoch and slot range a rewards document covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRange {
    #[serde(default)]
    pub epoch: Bounds,
    #[serde(default)]
    pub slot: Bounds,
}

/// Top level of a rewards-list response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RewardsEnvelope {
    #[serde(default)]
    pub data: Vec<Value>,
    pub range: Option<ReportRange>,
}

impl RewardsEnvelope {
    pub fn from_value(document: &Value) -> Result<Self, AnalyticsError> {
        Ok(Self::deserialize(document)?)
    }

    pub fn decompose<S: ScaleStrategy + ?Sized>(&self, strategy: &S) -> BatchOutcome {
        decompose_batch(&self.data, strategy)
    }

    /// First epoch of the covered range, if known.
    pub fn start_epoch(&self) -> Option<u64> {
        self.range.and_then(|range| range.epoch.start)
    }

    /// Number of epochs the document covers.
    ///
    /// With both range bounds set (and non-zero) this is the inclusive length of the range,
    /// at least 1. Otherwise each entry is taken to cover one epoch.
    pub fn period_epochs(&self) -> u64 {
        match self.range.map(|range| range.epoch) {
            Some(Bounds { start: Some(start), end: Some(end) }) if start != 0 && end != 0 => {
                end.saturating_sub(start).saturating_add(1).max(1)
            }
            _ => self.data.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::units::MagnitudeThreshold;

    #[test]
    fn one_bad_record_does_not_abort_the_batch() {
        let records = vec![
            json!({ "validator": { "index": 1 }, "total_reward": "100" }),
            json!({ "validator": { "index": 2 }, "total_reward": "1.5" }),
            json!({ "total_reward": "100" }),
            json!({ "validator": { "index": 4 }, "total_reward": "300" }),
        ];
        let outcome = decompose_batch(&records, &MagnitudeThreshold::default());
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].validator_index, 4);
        assert!(!outcome.is_clean());
        assert_eq!(
            outcome.failures,
            vec![
                RecordFailure {
                    position: 1,
                    validator_index: Some(2),
                    error: AnalyticsError::MalformedNumericInput("1.5".to_string()),
                },
                RecordFailure {
                    position: 2,
                    validator_index: None,
                    error: AnalyticsError::MissingRequiredField("validator.index"),
                },
            ]
        );
    }

    #[test]
    fn period_from_range() {
        let doc = json!({
            "data": [{}, {}],
            "range": { "epoch": { "start": 347000, "end": 347224 } }
        });
        let envelope = RewardsEnvelope::from_value(&doc).unwrap();
        assert_eq!(envelope.period_epochs(), 225);
        assert_eq!(envelope.start_epoch(), Some(347000));
    }

    #[test]
    fn period_falls_back_to_entry_count() {
        let doc = json!({ "data": [{}, {}, {}], "range": { "epoch": { "start": 0, "end": 10 } } });
        assert_eq!(RewardsEnvelope::from_value(&doc).unwrap().period_epochs(), 3);

        let doc = json!({ "data": [{}] });
        assert_eq!(RewardsEnvelope::from_value(&doc).unwrap().period_epochs(), 1);

        let reversed = json!({ "data": [], "range": { "epoch": { "start": 20, "end": 10 } } });
        assert_eq!(RewardsEnvelope::from_value(&reversed).unwrap().period_epochs(), 1);
    }

    #[test]
    fn empty_document() {
        let envelope = RewardsEnvelope::from_value(&json!({})).unwrap();
        assert!(envelope.data.is_empty());
        assert_eq!(envelope.period_epochs(), 0);
        assert!(envelope.decompose(&MagnitudeThreshold::default()).is_clean());
    }
}
