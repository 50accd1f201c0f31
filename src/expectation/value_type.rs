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

use crate::error::DefinitionError;
use crate::json_diff::{EpsilonPolicy, StringMode};
use crate::temporal::{self, Temporal};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

/// Declared type of an expected value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    #[default]
    String,
    Int,
    Long,
    Double,
    Boolean,
    Date,
    DateTime,
    Duration,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::String => "STRING",
            ValueType::Int => "INT",
            ValueType::Long => "LONG",
            ValueType::Double => "DOUBLE",
            ValueType::Boolean => "BOOLEAN",
            ValueType::Date => "DATE",
            ValueType::DateTime => "DATETIME",
            ValueType::Duration => "DURATION",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ValueType {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STRING" => Ok(ValueType::String),
            "INT" | "INTEGER" => Ok(ValueType::Int),
            "LONG" => Ok(ValueType::Long),
            "DOUBLE" => Ok(ValueType::Double),
            "BOOLEAN" => Ok(ValueType::Boolean),
            "DATE" => Ok(ValueType::Date),
            "DATETIME" => Ok(ValueType::DateTime),
            "DURATION" => Ok(ValueType::Duration),
            _ => Err(DefinitionError::UnknownType(s.to_string())),
        }
    }
}

/// A value decoded according to its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Typed {
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Duration(TimeDelta),
}

impl ValueType {
    /// Types whose values can be bounded by a range.
    pub fn is_ordered(&self) -> bool {
        !matches!(self, ValueType::String | ValueType::Boolean)
    }

    /// Parses an expected literal from a test definition.
    pub fn parse_literal(&self, raw: &str) -> Result<Typed, DefinitionError> {
        let trimmed = raw.trim();
        let parsed = match self {
            ValueType::String => Some(Typed::String(raw.to_string())),
            ValueType::Int => trimmed.parse().ok().map(Typed::Int),
            ValueType::Long => trimmed.parse().ok().map(Typed::Long),
            ValueType::Double => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Typed::Double),
            ValueType::Boolean => parse_bool(trimmed).map(Typed::Boolean),
            ValueType::Date => temporal::parse_date(trimmed).map(Typed::Date),
            ValueType::DateTime => temporal::parse_datetime(trimmed).map(Typed::DateTime),
            ValueType::Duration => temporal::parse_duration(trimmed).map(Typed::Duration),
        };

        parsed.ok_or_else(|| DefinitionError::IllegalValue {
            value: raw.to_string(),
            value_type: self.to_string(),
        })
    }

    /// Reads a value found in a document, or `None` when it cannot be read as this type.
    pub fn coerce(&self, actual: &Value) -> Option<Typed> {
        match (self, actual) {
            (ValueType::String, Value::String(s)) => Some(Typed::String(s.clone())),
            (ValueType::String, Value::Number(_) | Value::Bool(_)) => {
                Some(Typed::String(actual.to_string()))
            }
            (ValueType::Int, Value::Number(n)) => integral(n.as_i64(), n.as_f64())
                .and_then(|v| i32::try_from(v).ok())
                .map(Typed::Int),
            (ValueType::Long, Value::Number(n)) => {
                integral(n.as_i64(), n.as_f64()).map(Typed::Long)
            }
            (ValueType::Double, Value::Number(n)) => n.as_f64().map(Typed::Double),
            (ValueType::Boolean, Value::Bool(b)) => Some(Typed::Boolean(*b)),
            (
                ValueType::Int
                | ValueType::Long
                | ValueType::Double
                | ValueType::Boolean
                | ValueType::Date
                | ValueType::DateTime
                | ValueType::Duration,
                Value::String(s),
            ) => self.parse_literal(s).ok(),
            _ => None,
        }
    }

    /// Tolerance used when the expectation declares none.
    pub fn default_epsilon(&self, policy: EpsilonPolicy) -> EpsilonPolicy {
        match self {
            ValueType::Int | ValueType::Long => EpsilonPolicy { numeric: 0.0, ..policy },
            _ => policy,
        }
    }

    /// Reads a declared epsilon: a number for numeric types, an ISO-8601
    /// duration for temporal ones.
    pub fn parse_epsilon(
        &self,
        raw: &str,
        policy: EpsilonPolicy,
    ) -> Result<EpsilonPolicy, DefinitionError> {
        let illegal = || DefinitionError::IllegalEpsilon {
            value: raw.to_string(),
            value_type: self.to_string(),
        };
        let raw = raw.trim();

        match self {
            ValueType::Int | ValueType::Long | ValueType::Double => {
                let numeric: f64 = raw.parse().map_err(|_| illegal())?;
                if !numeric.is_finite() || numeric < 0.0 {
                    return Err(illegal());
                }
                Ok(EpsilonPolicy { numeric, ..policy })
            }
            ValueType::Date | ValueType::DateTime | ValueType::Duration => {
                let duration = temporal::parse_duration(raw).ok_or_else(illegal)?;
                if duration < TimeDelta::zero() {
                    return Err(illegal());
                }
                Ok(policy.duration(duration))
            }
            ValueType::String | ValueType::Boolean => Err(illegal()),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Whole numbers, accepting floating values without a fractional part.
fn integral(as_i64: Option<i64>, as_f64: Option<f64>) -> Option<i64> {
    if as_i64.is_some() {
        return as_i64;
    }

    let value = as_f64?;
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

impl Typed {
    /// Equality within the tolerance of the value's type.
    pub fn matches(&self, actual: &Typed, epsilon: EpsilonPolicy, strings: StringMode) -> bool {
        match (self, actual) {
            (Typed::String(e), Typed::String(a)) => strings.equal(e, a),
            (Typed::Boolean(e), Typed::Boolean(a)) => e == a,
            (Typed::Int(e), Typed::Int(a)) => within(i128::from(*e), i128::from(*a), epsilon),
            (Typed::Long(e), Typed::Long(a)) => within(i128::from(*e), i128::from(*a), epsilon),
            (Typed::Double(e), Typed::Double(a)) => (e - a).abs() <= epsilon.numeric,
            (e, a) => match (e.temporal(), a.temporal()) {
                (Some(e), Some(a)) => e
                    .distance(&a)
                    .is_some_and(|distance| distance <= epsilon.duration),
                _ => false,
            },
        }
    }

    /// Ordering used by range checks; `None` for unordered or mismatched values.
    pub fn order(&self, other: &Typed) -> Option<Ordering> {
        match (self, other) {
            (Typed::Int(a), Typed::Int(b)) => Some(a.cmp(b)),
            (Typed::Long(a), Typed::Long(b)) => Some(a.cmp(b)),
            (Typed::Double(a), Typed::Double(b)) => a.partial_cmp(b),
            (Typed::Date(a), Typed::Date(b)) => Some(a.cmp(b)),
            (Typed::DateTime(a), Typed::DateTime(b)) => Some(a.cmp(b)),
            (Typed::Duration(a), Typed::Duration(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn temporal(&self) -> Option<Temporal> {
        match self {
            Typed::Date(d) => Some(Temporal::Date(*d)),
            Typed::DateTime(d) => Some(Temporal::DateTime(*d)),
            Typed::Duration(d) => Some(Temporal::Duration(*d)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Typed::String(s) => Value::String(s.clone()),
            Typed::Int(i) => Value::from(*i),
            Typed::Long(l) => Value::from(*l),
            Typed::Double(d) => Value::from(*d),
            Typed::Boolean(b) => Value::Bool(*b),
            Typed::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Typed::DateTime(d) => Value::String(d.to_rfc3339()),
            Typed::Duration(d) => Value::String(d.to_string()),
        }
    }
}

fn within(expected: i128, actual: i128, epsilon: EpsilonPolicy) -> bool {
    (expected - actual).abs() as f64 <= epsilon.numeric
}
