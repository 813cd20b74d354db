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

//! Ordered field-name fallbacks for documents whose schema differs between API versions.

use serde_json::{Map, Value};

/// How a [FieldChain] picks among its candidate keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The first key that is present and not null.
    FirstPresent,
    /// The first key whose value is truthy: not null, not zero, not an empty string.
    FirstNonZero,
}

/// A semantic field together with the keys that may carry it, in precedence order.
#[derive(Clone, Copy, Debug)]
pub struct FieldChain {
    pub name: &'static str,
    pub candidates: &'static [&'static str],
    pub resolution: Resolution,
}

impl FieldChain {
    pub const fn first_present(name: &'static str, candidates: &'static [&'static str]) -> Self {
        Self { name, candidates, resolution: Resolution::FirstPresent }
    }

    pub const fn first_non_zero(name: &'static str, candidates: &'static [&'static str]) -> Self {
        Self { name, candidates, resolution: Resolution::FirstNonZero }
    }

    /// Return the value of the first matching candidate key.
    pub fn resolve<'a>(&self, object: &'a Value) -> Option<&'a Value> {
        self.candidates.iter().filter_map(|key| object.get(*key)).find(|value| match self.resolution
        {
            Resolution::FirstPresent => !value.is_null(),
            Resolution::FirstNonZero => is_truthy(value),
        })
    }

    /// Resolve the field as an unsigned integer, or 0 when no candidate matches.
    pub fn resolve_u64(&self, object: &Value) -> u64 {
        self.resolve(object).and_then(as_u64).unwrap_or_default()
    }

    /// Resolve the field as a float, or 0.0 when no candidate matches.
    pub fn resolve_f64(&self, object: &Value) -> f64 {
        self.resolve(object).and_then(as_f64).unwrap_or_default()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Read a JSON number or a decimal string as an unsigned integer.
pub fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => {
            number.as_u64().or_else(|| number.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
        }
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Read a JSON number or a numeric string as a float.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Strip the response envelope of a single-object endpoint.
///
/// V2 responses nest the payload under `data`, V1 responses are flat, and some endpoints wrap the
/// object in a list; an empty list yields an empty object.
pub fn unwrap_envelope(document: &Value) -> Value {
    let data = document.get("data").unwrap_or(document);
    match data {
        Value::Array(items) => items.first().cloned().unwrap_or_else(|| Value::Object(Map::new())),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const ACTIVE: FieldChain =
        FieldChain::first_present("active", &["active_validators", "validatorscount"]);
    const ENTERING: FieldChain =
        FieldChain::first_non_zero("entering", &["beaconchain_entering", "entering"]);

    #[test]
    fn first_present_respects_precedence() {
        let doc = json!({ "validatorscount": 5, "active_validators": 7 });
        assert_eq!(ACTIVE.resolve_u64(&doc), 7);

        let doc = json!({ "active_validators": 0, "validatorscount": 5 });
        assert_eq!(ACTIVE.resolve_u64(&doc), 0);

        let doc = json!({ "active_validators": null, "validatorscount": 5 });
        assert_eq!(ACTIVE.resolve_u64(&doc), 5);
    }

    #[test]
    fn first_non_zero_skips_zeroes() {
        let doc = json!({ "beaconchain_entering": 0, "entering": 12 });
        assert_eq!(ENTERING.resolve_u64(&doc), 12);
        assert_eq!(ENTERING.resolve_u64(&json!({})), 0);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let doc = json!({ "active_validators": "970000" });
        assert_eq!(ACTIVE.resolve_u64(&doc), 970000);
        assert_eq!(ACTIVE.resolve_f64(&doc), 970000.0);
    }

    #[test]
    fn envelopes() {
        assert_eq!(unwrap_envelope(&json!({ "data": { "a": 1 } })), json!({ "a": 1 }));
        assert_eq!(unwrap_envelope(&json!({ "data": [{ "a": 1 }, { "a": 2 }] })), json!({ "a": 1 }));
        assert_eq!(unwrap_envelope(&json!({ "data": [] })), json!({}));
        assert_eq!(unwrap_envelope(&json!({ "a": 1 })), json!({ "a": 1 }));
    }
}
