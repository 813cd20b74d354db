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

//! Conversion between epochs, slots and Unix timestamps.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{AnalyticsError, ChainSpec};

/// Page size assumed when estimating how many paged requests cover an epoch range.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Epoch count above which a range no longer fits a free-tier monthly request budget.
pub const FREE_TIER_EPOCH_BUDGET: u64 = 100_000;

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maps between the three time coordinates of a beacon chain.
///
/// Epoch to timestamp is a strictly increasing affine function. The inverse floors, and
/// timestamps before genesis saturate to epoch (or slot) 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EpochMapper {
    spec: ChainSpec,
}

impl EpochMapper {
    pub const fn new(spec: ChainSpec) -> Self {
        Self { spec }
    }

    pub const fn spec(&self) -> &ChainSpec {
        &self.spec
    }

    /// Start of `epoch` in Unix seconds.
    ///
    /// Clamps to `i64::MAX` once the result no longer fits; the round trip through
    /// [EpochMapper::timestamp_to_epoch] holds for every epoch below that point.
    pub fn epoch_to_timestamp(&self, epoch: u64) -> i64 {
        self.offset_timestamp(epoch, self.spec.seconds_per_epoch())
    }

    pub fn timestamp_to_epoch(&self, timestamp: i64) -> u64 {
        self.units_since_genesis(timestamp, self.spec.seconds_per_epoch())
    }

    pub fn slot_to_epoch(&self, slot: u64) -> u64 {
        slot / self.spec.slots_per_epoch
    }

    /// Index of the slot within its epoch.
    pub fn slot_in_epoch(&self, slot: u64) -> u64 {
        slot % self.spec.slots_per_epoch
    }

    /// First and last slot (inclusive) of an epoch.
    pub fn epoch_to_slot_range(&self, epoch: u64) -> (u64, u64) {
        let first = epoch.saturating_mul(self.spec.slots_per_epoch);
        (first, first.saturating_add(self.spec.slots_per_epoch - 1))
    }

    /// Start of `slot` in Unix seconds, clamped like [EpochMapper::epoch_to_timestamp].
    pub fn slot_to_timestamp(&self, slot: u64) -> i64 {
        self.offset_timestamp(slot, self.spec.seconds_per_slot)
    }

    pub fn timestamp_to_slot(&self, timestamp: i64) -> u64 {
        self.units_since_genesis(timestamp, self.spec.seconds_per_slot)
    }

    pub fn at_epoch(&self, epoch: u64) -> ChainTime {
        ChainTime {
            epoch,
            slot: self.epoch_to_slot_range(epoch).0,
            timestamp: self.epoch_to_timestamp(epoch),
        }
    }

    pub fn at_slot(&self, slot: u64) -> ChainTime {
        ChainTime { epoch: self.slot_to_epoch(slot), slot, timestamp: self.slot_to_timestamp(slot) }
    }

    /// The epoch and slot containing `timestamp`; the timestamp is kept as given.
    pub fn at_timestamp(&self, timestamp: i64) -> ChainTime {
        ChainTime {
            epoch: self.timestamp_to_epoch(timestamp),
            slot: self.timestamp_to_slot(timestamp),
            timestamp,
        }
    }

    fn offset_timestamp(&self, units: u64, seconds_per_unit: u64) -> i64 {
        let units = i64::try_from(units).unwrap_or(i64::MAX);
        let seconds_per_unit = i64::try_from(seconds_per_unit).unwrap_or(i64::MAX);
        self.spec.genesis_timestamp.saturating_add(units.saturating_mul(seconds_per_unit))
    }

    fn units_since_genesis(&self, timestamp: i64, seconds_per_unit: u64) -> u64 {
        let elapsed = i128::from(timestamp) - i128::from(self.spec.genesis_timestamp);
        if elapsed <= 0 {
            return 0;
        }
        // Positive elapsed time, so truncating division is floor division.
        (elapsed / i128::from(seconds_per_unit)) as u64
    }
}

/// A point on the chain expressed in all three coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTime {
    pub epoch: u64,
    pub slot: u64,
    /// Unix seconds.
    pub timestamp: i64,
}

/// Parse a calendar date or date-time as UTC and return its Unix timestamp.
///
/// Accepted forms: `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`.
pub fn parse_calendar_date(text: &str) -> Result<i64, AnalyticsError> {
    let trimmed = text.trim();
    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp())
        .ok_or_else(|| AnalyticsError::UnparseableDate(text.to_string()))
}

/// Extent of a time range in chain coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochSpan {
    pub start: ChainTime,
    pub end: ChainTime,
    /// Epochs between the start and end epoch; 0 when the range is reversed.
    pub total_epochs: u64,
    pub total_slots: u64,
    /// Wall-clock length in days, negative when the range is reversed.
    pub elapsed_days: f64,
}

impl EpochSpan {
    pub fn between(mapper: &EpochMapper, start_timestamp: i64, end_timestamp: i64) -> Self {
        let start = mapper.at_timestamp(start_timestamp);
        let end = mapper.at_timestamp(end_timestamp);
        let total_epochs = end.epoch.saturating_sub(start.epoch);
        Self {
            start,
            end,
            total_epochs,
            total_slots: total_epochs.saturating_mul(mapper.spec().slots_per_epoch),
            elapsed_days: (end_timestamp - start_timestamp) as f64 / 86400.0,
        }
    }

    /// Number of pages of `page_size` epochs needed to cover the span.
    pub fn pages(&self, page_size: u64) -> u64 {
        self.total_epochs.div_ceil(page_size.max(1))
    }

    pub fn exceeds_budget(&self, epoch_budget: u64) -> bool {
        self.total_epochs > epoch_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAINNET;

    fn mapper() -> EpochMapper {
        EpochMapper::new(MAINNET)
    }

    #[test]
    fn epoch_to_timestamp_and_slots() {
        let mapper = mapper();
        assert_eq!(mapper.epoch_to_timestamp(0), 1606824023);
        assert_eq!(mapper.epoch_to_timestamp(347566), 1740289367);
        assert_eq!(mapper.epoch_to_slot_range(347566), (11122112, 11122143));
    }

    #[test]
    fn round_trips() {
        let mapper = mapper();
        for epoch in [0, 1, 31, 32, 225, 82125, 347566, 10_000_000] {
            assert_eq!(mapper.timestamp_to_epoch(mapper.epoch_to_timestamp(epoch)), epoch);
            let (first, last) = mapper.epoch_to_slot_range(epoch);
            assert_eq!(mapper.slot_to_epoch(first), epoch);
            assert_eq!(mapper.slot_to_epoch(last), epoch);
        }
        for slot in [0, 1, 31, 32, 11122143] {
            assert_eq!(mapper.timestamp_to_slot(mapper.slot_to_timestamp(slot)), slot);
        }
    }

    #[test]
    fn far_future_timestamps_clamp() {
        let mapper = mapper();
        let last_representable = (i64::MAX - MAINNET.genesis_timestamp) as u64 / 384;
        let timestamp = mapper.epoch_to_timestamp(last_representable);
        assert!(timestamp < i64::MAX);
        assert_eq!(mapper.timestamp_to_epoch(timestamp), last_representable);

        assert_eq!(mapper.epoch_to_timestamp(last_representable + 1), i64::MAX);
        assert_eq!(mapper.epoch_to_timestamp(u64::MAX), i64::MAX);
        assert_eq!(mapper.slot_to_timestamp(u64::MAX), i64::MAX);
    }

    #[test]
    fn floors_within_an_epoch() {
        let mapper = mapper();
        let start = mapper.epoch_to_timestamp(100);
        assert_eq!(mapper.timestamp_to_epoch(start + 383), 100);
        assert_eq!(mapper.timestamp_to_epoch(start + 384), 101);
        assert_eq!(mapper.timestamp_to_slot(start + 11), 3200);
        assert_eq!(mapper.timestamp_to_slot(start + 12), 3201);
    }

    #[test]
    fn pre_genesis_saturates() {
        let mapper = mapper();
        for ts in [0, 1606824022, -5, i64::MIN] {
            assert_eq!(mapper.timestamp_to_epoch(ts), 0);
            assert_eq!(mapper.timestamp_to_slot(ts), 0);
        }
    }

    #[test]
    fn chain_time_coordinates_agree() {
        let mapper = mapper();
        let from_epoch = mapper.at_epoch(347566);
        assert_eq!(from_epoch.slot, 11122112);
        assert_eq!(from_epoch.timestamp, 1740289367);
        assert_eq!(mapper.at_slot(11122112), from_epoch);
        assert_eq!(mapper.at_timestamp(1740289367), from_epoch);

        let mid_epoch = mapper.at_slot(11122120);
        assert_eq!(mid_epoch.epoch, 347566);
        assert_eq!(mapper.slot_in_epoch(11122120), 8);
    }

    #[test]
    fn calendar_dates() {
        assert_eq!(parse_calendar_date("2020-12-01T12:00:23").unwrap(), 1606824023);
        assert_eq!(parse_calendar_date("2020-12-01 12:00:23").unwrap(), 1606824023);
        assert_eq!(parse_calendar_date("2025-01-01").unwrap(), 1735689600);
        assert_eq!(
            parse_calendar_date("01/01/2025"),
            Err(AnalyticsError::UnparseableDate("01/01/2025".to_string()))
        );
        assert!(parse_calendar_date("2025-02-30").is_err());
    }

    #[test]
    fn span_over_a_year() {
        let mapper = mapper();
        let start = parse_calendar_date("2025-01-01").unwrap();
        let end = parse_calendar_date("2025-12-31").unwrap();
        let span = EpochSpan::between(&mapper, start, end);
        assert_eq!(span.total_epochs, span.end.epoch - span.start.epoch);
        assert_eq!(span.total_slots, span.total_epochs * 32);
        assert_eq!(span.elapsed_days, 364.0);
        assert_eq!(span.pages(DEFAULT_PAGE_SIZE), span.total_epochs.div_ceil(100));
        assert!(!span.exceeds_budget(FREE_TIER_EPOCH_BUDGET));
    }

    #[test]
    fn reversed_span_is_empty() {
        let mapper = mapper();
        let span = EpochSpan::between(&mapper, 1740289367, 1606824023);
        assert_eq!(span.total_epochs, 0);
        assert_eq!(span.pages(0), 0);
        assert!(span.elapsed_days < 0.0);
    }
}
