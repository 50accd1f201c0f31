// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::temporal::Temporal;
use chrono::TimeDelta;
use serde_json::{Number, Value};
use std::borrow::Cow;

pub const DEFAULT_NUMERIC_EPSILON: f64 = 1e-9;

/// Tolerances applied when two leaves are compared.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EpsilonPolicy {
    /// Largest absolute difference under which two floating numbers are equal.
    pub numeric: f64,
    /// Largest distance under which two dates, date-times or durations are equal.
    pub duration: TimeDelta,
}

impl Default for EpsilonPolicy {
    fn default() -> Self {
        Self {
            numeric: DEFAULT_NUMERIC_EPSILON,
            duration: TimeDelta::zero(),
        }
    }
}

impl EpsilonPolicy {
    pub fn new(numeric: f64) -> Self {
        Self {
            numeric,
            ..Self::default()
        }
    }

    pub fn duration(mut self, duration: TimeDelta) -> Self {
        self.duration = duration;
        self
    }

    /// Compares two leaves, describing the mismatch when they differ.
    pub(crate) fn compare(
        &self,
        expected: &Value,
        actual: &Value,
        strings: StringMode,
    ) -> Result<(), String> {
        let equal = match (expected, actual) {
            (Value::Number(e), Value::Number(a)) => numbers_equal(e, a, self.numeric),
            (Value::String(e), Value::String(a)) => {
                strings.equal(e, a) || self.temporal_equal(e, a)
            }
            (Value::Null, Value::Null) | (Value::Bool(_), Value::Bool(_)) => expected == actual,
            (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
                expected == actual
            }
            _ => {
                return Err(format!(
                    "type mismatch: expected {} but was {}",
                    kind(expected),
                    kind(actual)
                ))
            }
        };

        if equal {
            Ok(())
        } else {
            Err(format!("expected {} but was {}", expected, actual))
        }
    }

    fn temporal_equal(&self, expected: &str, actual: &str) -> bool {
        let (Some(expected), Some(actual)) = (Temporal::parse(expected), Temporal::parse(actual))
        else {
            return false;
        };

        expected
            .distance(&actual)
            .is_some_and(|distance| distance <= self.duration)
    }
}

/// Integral numbers match exactly; as soon as one side is floating, they
/// match within `epsilon`.
pub(crate) fn numbers_equal(expected: &Number, actual: &Number, epsilon: f64) -> bool {
    if !expected.is_f64() && !actual.is_f64() {
        return expected == actual;
    }

    match (expected.as_f64(), actual.as_f64()) {
        (Some(e), Some(a)) => (e - a).abs() <= epsilon,
        _ => false,
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// How strings are normalized before comparison.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct StringMode {
    pub trim: bool,
    pub ignore_case: bool,
}

impl StringMode {
    /// Byte-for-byte comparison.
    pub fn exact() -> Self {
        Self::default()
    }

    /// Surrounding whitespace and letter case are not significant.
    pub fn lenient() -> Self {
        Self {
            trim: true,
            ignore_case: true,
        }
    }

    pub fn normalize<'s>(&self, s: &'s str) -> Cow<'s, str> {
        let s = if self.trim { s.trim() } else { s };
        if self.ignore_case {
            Cow::Owned(s.to_lowercase())
        } else {
            Cow::Borrowed(s)
        }
    }

    pub fn equal(&self, expected: &str, actual: &str) -> bool {
        self.normalize(expected) == self.normalize(actual)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers() {
        let policy = EpsilonPolicy::new(0.5);
        let exact = StringMode::exact();

        assert!(policy.compare(&json!(1), &json!(1), exact).is_ok());
        assert!(policy.compare(&json!(1), &json!(2), exact).is_err());
        assert!(policy.compare(&json!(1.0), &json!(1.5), exact).is_ok());
        assert!(policy.compare(&json!(1.0), &json!(1.75), exact).is_err());
        assert!(policy.compare(&json!(1), &json!(1.25), exact).is_ok());
    }

    #[test]
    fn test_integers_ignore_epsilon() {
        let policy = EpsilonPolicy::new(10.0);
        assert!(policy
            .compare(&json!(1), &json!(2), StringMode::exact())
            .is_err());
    }

    #[test]
    fn test_strings() {
        let policy = EpsilonPolicy::default();

        assert!(policy
            .compare(&json!(" TEXT "), &json!("text"), StringMode::lenient())
            .is_ok());
        assert!(policy
            .compare(&json!(" TEXT "), &json!("text"), StringMode::exact())
            .is_err());
        assert!(policy
            .compare(
                &json!("Text"),
                &json!("text"),
                StringMode {
                    trim: false,
                    ignore_case: true
                }
            )
            .is_ok());
    }

    #[test]
    fn test_temporal_strings() {
        let exact = StringMode::exact();
        let policy = EpsilonPolicy::default();

        assert!(policy
            .compare(
                &json!("2024-01-01T00:00:00Z"),
                &json!("2024-01-01T01:00:00+01:00"),
                exact
            )
            .is_ok());
        assert!(policy
            .compare(
                &json!("2024-01-01T00:00:00Z"),
                &json!("2024-01-01T00:00:03Z"),
                exact
            )
            .is_err());

        let tolerant = policy.duration(TimeDelta::try_seconds(5).unwrap());
        assert!(tolerant
            .compare(
                &json!("2024-01-01T00:00:00Z"),
                &json!("2024-01-01T00:00:03Z"),
                exact
            )
            .is_ok());
        assert!(tolerant
            .compare(&json!("PT1M"), &json!("PT63S"), exact)
            .is_ok());
        assert!(tolerant
            .compare(&json!("2024-01-01"), &json!("PT1S"), exact)
            .is_err());
    }

    #[test]
    fn test_type_mismatch() {
        let policy = EpsilonPolicy::default();
        let err = policy
            .compare(&json!("1"), &json!(1), StringMode::exact())
            .unwrap_err();
        assert_eq!(err, "type mismatch: expected string but was number");
        assert!(policy
            .compare(&json!(null), &json!(false), StringMode::exact())
            .is_err());
        assert!(policy
            .compare(&json!({}), &json!([]), StringMode::exact())
            .is_err());
    }
}
