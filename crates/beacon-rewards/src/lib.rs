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

//! Numeric analytics for beacon chain validator data: unit conversion, epoch and slot time,
//! reward decomposition, annualized returns, queue wait estimates and diagnostics.
//!
//! Everything here is a pure function over already-decoded JSON values. Nothing performs I/O or
//! logs; errors are scoped to the record that caused them.

// Declare modules
pub mod aggregate;
pub mod annualize;
pub mod balances;
pub mod batch;
pub mod chain_spec;
pub mod diagnostics;
pub mod duty;
mod error;
pub mod fields;
pub mod network;
pub mod performance;
pub mod queue;
pub mod time;
pub mod units;
pub mod validators;

// Re-export commonly used types
pub use aggregate::{DutyAggregate, PeriodComparison, Trend, ValidatorIncome};
pub use annualize::{apr, apy, AnnualizationInput, ReturnsSummary, DEFAULT_STAKE};
pub use balances::{BalanceHistory, BalanceSnapshot, BalanceTrend, Change};
pub use batch::{decompose_batch, BatchOutcome, RecordFailure, RewardsEnvelope};
pub use chain_spec::{ChainSpec, ChainSpecBuilder, NamedChain, HOLESKY, MAINNET, SEPOLIA};
pub use diagnostics::{
    classify, diagnose, finality_risk, first_match, CaptureBand, Diagnostic, Metric, Rule, Severity,
    DUTY_RULES,
};
pub use duty::{decompose, decompose_value, DutyReward, RawDutyRecord};
pub use error::AnalyticsError;
pub use network::NetworkSnapshot;
pub use performance::{PerformanceScore, ScoreSummary};
pub use queue::{churn_limit, wait, QueueSnapshot, QueueState, WaitEstimate};
pub use time::{parse_calendar_date, ChainTime, EpochMapper, EpochSpan};
pub use units::{to_display_unit, MagnitudeThreshold, RawAmount, ScaleStrategy, Wei};
pub use validators::{FleetSummary, Lifecycle, ValidatorStatus};
