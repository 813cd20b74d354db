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


//! Display utilities for consistent report output formatting

use std::fmt::Display;

use beacon_rewards::{Metric, Severity, WaitEstimate};
use chrono::{DateTime, FixedOffset};
use tabled::{builder::Builder, settings::Style};

/// Standard display formatter for report output
#[derive(Debug, Default)]
pub struct DisplayManager;

impl DisplayManager {
    pub fn new() -> Self {
        Self
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        println!("\n{title}");
        println!("{}", "─".repeat(title.chars().count()));
    }

    /// Print a labeled value with standard indentation
    pub fn item(&self, label: &str, value: impl Display) {
        println!("  {:<20} {}", format!("{label}:"), value);
    }

    /// Print an indented line of free text
    pub fn note(&self, message: impl Display) {
        println!("  {message}");
    }

    /// Print a warning message
    pub fn warning(&self, message: impl Display) {
        println!("\n  [!] {message}");
    }

    /// Print a rendered table
    pub fn table(&self, table: String) {
        println!("{table}");
    }
}

/// Render a table with a header row in the modern style.
pub fn table<H, R, C>(header: H, rows: impl IntoIterator<Item = R>) -> String
where
    H: IntoIterator,
    H::Item: Into<String>,
    R: IntoIterator<Item = C>,
    C: Into<String>,
{
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }
    builder.build().with(Style::modern()).to_string()
}

/// Format a decimal with thousands separators.
pub fn format_decimal(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text.as_str(), None),
    };
    let mut grouped = String::with_capacity(text.len() + integer.len() / 3 + 1);
    // Zero after rounding prints without a sign.
    if value < 0.0 && text.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        grouped.push('-');
    }
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

/// Format an ether amount, e.g. `1,234.500000 ETH`.
pub fn format_eth(ether: f64) -> String {
    format_eth_places(ether, 6)
}

pub fn format_eth_places(ether: f64, decimals: usize) -> String {
    format!("{} ETH", format_decimal(ether, decimals))
}

/// Format an integer count with thousands separators.
pub fn format_count(count: u64) -> String {
    format_decimal(count as f64, 0)
}

pub fn format_percent(percent: f64) -> String {
    format!("{percent:.2}%")
}

/// Human readable wait time: minutes below an hour, hours below a day, days beyond.
pub fn format_wait(wait: &WaitEstimate) -> String {
    let Some(hours) = wait.hours() else {
        return "indefinite (no churn capacity)".to_string();
    };
    if hours < 1.0 {
        format!("~{:.0} minutes", hours * 60.0)
    } else if hours < 24.0 {
        format!("~{hours:.1} hours")
    } else if hours < 48.0 {
        format!("~{:.0} hours ({:.1} days)", hours, hours / 24.0)
    } else {
        format!("~{:.1} days", hours / 24.0)
    }
}

/// Abbreviate long public keys as `0x12345678...abcdef`.
pub fn short_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 20 {
        return key.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{head}...{tail}")
}

/// Label a validator by its index, or by the short form of its key when the index is unknown.
pub fn validator_label(index: Option<u64>, public_key: Option<&str>) -> String {
    match (index, public_key) {
        (Some(index), _) => format!("Validator {index}"),
        (None, Some(key)) => format!("Validator {}", short_key(key)),
        (None, None) => "Validator ?".to_string(),
    }
}

/// Parse an offset such as `UTC`, `UTC+2`, `UTC-5.5` or `+1` into hours.
pub fn parse_utc_offset(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("utc") {
        return Some(0.0);
    }
    let offset: String =
        trimmed.trim_start_matches("UTC").chars().filter(|c| !c.is_whitespace()).collect();
    offset.parse::<f64>().ok().filter(|hours| hours.is_finite() && hours.abs() < 24.0)
}

/// Label of an offset in hours, `UTC` for zero.
pub fn offset_label(hours: f64) -> String {
    if hours == 0.0 {
        "UTC".to_string()
    } else {
        format!("UTC{hours:+}")
    }
}

/// Format Unix seconds in a fixed offset from UTC.
pub fn format_timestamp(timestamp: i64, offset_hours: f64, format: &str) -> Option<String> {
    let offset = FixedOffset::east_opt((offset_hours * 3600.0).round() as i32)?;
    let datetime = DateTime::from_timestamp(timestamp, 0)?.with_timezone(&offset);
    Some(datetime.format(format).to_string())
}

/// Format Unix seconds as `YYYY-MM-DD HH:MM:SS UTC`, falling back to the raw number.
pub fn format_utc(timestamp: i64) -> String {
    format_timestamp(timestamp, 0.0, "%Y-%m-%d %H:%M:%S UTC")
        .unwrap_or_else(|| timestamp.to_string())
}

pub fn format_metric(metric: Metric) -> String {
    match metric {
        Metric::Ether(ether) => format_eth(ether),
        Metric::Percent(percent) => format_percent(percent),
    }
}

/// Short textual marker for a [Severity].
pub fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Healthy => "[ok]",
        Severity::Notice => "[note]",
        Severity::Warning => "[warn]",
        Severity::Critical => "[crit]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_are_grouped() {
        assert_eq!(format_decimal(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_decimal(-1234.5, 1), "-1,234.5");
        assert_eq!(format_decimal(999.0, 0), "999");
        assert_eq!(format_decimal(-0.0000001, 6), "0.000000");
        assert_eq!(format_eth(0.032), "0.032000 ETH");
        assert_eq!(format_count(970_000), "970,000");
    }

    #[test]
    fn wait_thresholds() {
        let wait = |hours| WaitEstimate::Bounded { epochs: 0.0, hours };
        assert_eq!(format_wait(&wait(0.5)), "~30 minutes");
        assert_eq!(format_wait(&wait(5.0)), "~5.0 hours");
        assert_eq!(format_wait(&wait(36.0)), "~36 hours (1.5 days)");
        assert_eq!(format_wait(&wait(72.0)), "~3.0 days");
        assert!(format_wait(&WaitEstimate::Unbounded).starts_with("indefinite"));
    }

    #[test]
    fn keys_are_shortened() {
        let key = "0x93247f2209abcacf57b75a51dafae777f9dd38bc7053d1af526f220a7489a6d3a2753e5f3e8b1cfe39b56f43611df74a";
        assert_eq!(short_key(key), "0x93247f22...1df74a");
        assert_eq!(short_key("0xabc"), "0xabc");
        assert_eq!(validator_label(None, Some(key)), "Validator 0x93247f22...1df74a");
        assert_eq!(validator_label(Some(7), Some(key)), "Validator 7");
    }

    #[test]
    fn offsets() {
        assert_eq!(parse_utc_offset("UTC"), Some(0.0));
        assert_eq!(parse_utc_offset("UTC+2"), Some(2.0));
        assert_eq!(parse_utc_offset("UTC -5.5"), Some(-5.5));
        assert_eq!(parse_utc_offset("Europe/Berlin"), None);
        assert_eq!(offset_label(2.0), "UTC+2");
        assert_eq!(offset_label(-5.5), "UTC-5.5");
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_utc(1740289367), "2025-02-23 05:42:47 UTC");
        assert_eq!(
            format_timestamp(1740289367, 2.0, "%Y-%m-%d %H:%M:%S").as_deref(),
            Some("2025-02-23 07:42:47")
        );
    }

    #[test]
    fn tables_render_every_cell() {
        let rendered = table(["Period", "Total"], [vec!["24h".to_string(), "1.0".to_string()]]);
        assert!(rendered.contains("Period"));
        assert!(rendered.contains("24h"));
    }
}
