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

//! Balance history per validator and its trend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    batch::RecordFailure,
    fields::{as_u64, FieldChain},
    units::{RawAmount, ScaleStrategy},
    AnalyticsError,
};

/// Step size, in ether, below which consecutive balances count as unchanged.
pub const CHANGE_THRESHOLD: f64 = 0.001;

/// A single drop larger than this, in ether, is flagged for review.
pub const DROP_ALERT_THRESHOLD: f64 = -0.01;

const BALANCE: FieldChain = FieldChain::first_present("balance", &["balance", "current"]);
const EFFECTIVE: FieldChain =
    FieldChain::first_present("effective_balance", &["effective_balance", "effective"]);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub epoch: Option<u64>,
    /// Balance in ether.
    pub balance: f64,
    /// Effective balance in ether.
    pub effective_balance: f64,
}

impl BalanceSnapshot {
    pub fn from_value<S: ScaleStrategy + ?Sized>(
        entry: &Value,
        strategy: &S,
    ) -> Result<Self, AnalyticsError> {
        Ok(Self {
            epoch: entry.get("epoch").and_then(as_u64),
            balance: resolve_amount(&BALANCE, entry, strategy)?,
            effective_balance: resolve_amount(&EFFECTIVE, entry, strategy)?,
        })
    }
}

fn resolve_amount<S: ScaleStrategy + ?Sized>(
    field: &FieldChain,
    entry: &Value,
    strategy: &S,
) -> Result<f64, AnalyticsError> {
    let amount = match field.resolve(entry) {
        Some(value) => RawAmount::deserialize(value)?,
        None => RawAmount::default(),
    };
    Ok(strategy.resolve(&amount)?.ether())
}

/// Movement between two consecutive snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Change {
    Up(f64),
    Down(f64),
    Flat,
}

impl Change {
    pub fn between(previous: f64, current: f64) -> Self {
        let diff = current - previous;
        if diff > CHANGE_THRESHOLD {
            Change::Up(diff)
        } else if diff < -CHANGE_THRESHOLD {
            Change::Down(diff)
        } else {
            Change::Flat
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceTrend {
    pub first: f64,
    pub latest: f64,
    pub net_change: f64,
    pub peak: f64,
    pub trough: f64,
    /// Most negative step between consecutive snapshots, or 0 when none decreased.
    pub largest_drop: f64,
    pub drop_flagged: bool,
}

impl BalanceTrend {
    /// Trend over epoch-ordered snapshots; needs at least two of them.
    pub fn from_snapshots(snapshots: &[BalanceSnapshot]) -> Option<Self> {
        let (first, rest) = snapshots.split_first()?;
        let latest = rest.last()?;
        let balances = snapshots.iter().map(|s| s.balance);
        let largest_drop = snapshots
            .windows(2)
            .map(|pair| pair[1].balance - pair[0].balance)
            .fold(0.0, f64::min);
        Some(Self {
            first: first.balance,
            latest: latest.balance,
            net_change: latest.balance - first.balance,
            peak: balances.clone().fold(f64::NEG_INFINITY, f64::max),
            trough: balances.fold(f64::INFINITY, f64::min),
            largest_drop,
            drop_flagged: largest_drop < DROP_ALERT_THRESHOLD,
        })
    }
}

/// Balance snapshots of one validator, ordered by epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct BalanceHistory {
    pub validator_index: Option<u64>,
    pub snapshots: Vec<BalanceSnapshot>,
}

impl BalanceHistory {
    /// Group balance-list entries by validator in order of first appearance.
    ///
    /// Entries whose amounts cannot be resolved are returned as failures.
    pub fn group<S: ScaleStrategy + ?Sized>(
        entries: &[Value],
        strategy: &S,
    ) -> (Vec<BalanceHistory>, Vec<RecordFailure>) {
        let mut histories: Vec<BalanceHistory> = Vec::new();
        let mut failures = Vec::new();
        for (position, entry) in entries.iter().enumerate() {
            let validator_index = entry
                .pointer("/validator/index")
                .or_else(|| entry.get("validator_index"))
                .and_then(as_u64);
            let snapshot = match BalanceSnapshot::from_value(entry, strategy) {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    failures.push(RecordFailure { position, validator_index, error });
                    continue;
                }
            };
            match histories.iter_mut().find(|h| h.validator_index == validator_index) {
                Some(history) => history.snapshots.push(snapshot),
                None => {
                    histories.push(BalanceHistory { validator_index, snapshots: vec![snapshot] })
                }
            }
        }
        for history in &mut histories {
            history.snapshots.sort_by_key(|s| s.epoch.unwrap_or_default());
        }
        (histories, failures)
    }

    /// Change of each snapshot relative to the previous one; the first has none.
    pub fn changes(&self) -> Vec<Option<Change>> {
        std::iter::once(None)
            .chain(
                self.snapshots
                    .windows(2)
                    .map(|pair| Some(Change::between(pair[0].balance, pair[1].balance))),
            )
            .take(self.snapshots.len())
            .collect()
    }

    pub fn trend(&self) -> Option<BalanceTrend> {
        BalanceTrend::from_snapshots(&self.snapshots)
    }
}
