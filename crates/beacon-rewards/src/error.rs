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

use thiserror::Error;

/// Errors raised by the analytics core.
///
/// All of them are scoped to a single input record. Zero stake, zero-length periods and a zero
/// churn limit are not errors; they resolve to defined zero or sentinel values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Malformed numeric input {0:?}: expected a base-10 integer")]
    MalformedNumericInput(String),

    #[error("Cannot parse date {0:?}; use YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")]
    UnparseableDate(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedRecord(err.to_string())
    }
}
