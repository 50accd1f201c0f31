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

use super::value_type::{Typed, ValueType};
use crate::error::DefinitionError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt::Display;
use std::ops::Bound;

static RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\[\]])\s*([^,]*?)\s*,\s*([^,]*?)\s*([\[\]])$")
        .expect("range pattern is valid")
});

/// What an expectation compares the document value against.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedValue {
    Exact(Typed),
    Range(Range),
}

impl ExpectedValue {
    /// Reads `raw` as a range when the type is ordered and it is bracketed,
    /// otherwise as a single literal.
    pub fn parse(raw: &str, value_type: ValueType) -> Result<Self, DefinitionError> {
        let trimmed = raw.trim();
        if value_type.is_ordered() && (trimmed.starts_with('[') || trimmed.starts_with(']')) {
            return Range::parse(trimmed, value_type).map(ExpectedValue::Range);
        }

        value_type.parse_literal(raw).map(ExpectedValue::Exact)
    }

    pub fn to_json(&self) -> Value {
        match self {
            ExpectedValue::Exact(typed) => typed.to_json(),
            ExpectedValue::Range(range) => Value::String(range.to_string()),
        }
    }
}

/// Interval bounded on each side by an inclusive, exclusive or missing bound.
///
/// `[` opens an inclusive lower bound and `]` an exclusive one; `]` closes an
/// inclusive upper bound and `[` an exclusive one.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    lower: Bound<Typed>,
    upper: Bound<Typed>,
    raw: String,
}

impl Range {
    pub fn parse(raw: &str, value_type: ValueType) -> Result<Self, DefinitionError> {
        let illegal = || DefinitionError::IllegalRange(raw.to_string());
        let captures = RANGE.captures(raw.trim()).ok_or_else(illegal)?;

        let bound = |group: usize, inclusive: &str| -> Result<Bound<Typed>, DefinitionError> {
            let text = captures.get(group).map_or("", |m| m.as_str());
            if text.is_empty() {
                return Ok(Bound::Unbounded);
            }
            let value = value_type.parse_literal(text)?;
            let bracket = captures.get(if group == 2 { 1 } else { 4 }).map_or("", |m| m.as_str());
            Ok(if bracket == inclusive {
                Bound::Included(value)
            } else {
                Bound::Excluded(value)
            })
        };

        let lower = bound(2, "[")?;
        let upper = bound(3, "]")?;

        match (&lower, &upper) {
            (Bound::Unbounded, Bound::Unbounded) => return Err(illegal()),
            (
                Bound::Included(lo) | Bound::Excluded(lo),
                Bound::Included(hi) | Bound::Excluded(hi),
            ) => {
                if !matches!(lo.order(hi), Some(Ordering::Less | Ordering::Equal)) {
                    return Err(illegal());
                }
            }
            _ => {}
        }

        Ok(Range {
            lower,
            upper,
            raw: raw.trim().to_string(),
        })
    }

    pub fn contains(&self, value: &Typed) -> bool {
        let above = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(lo) => matches!(
                value.order(lo),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Bound::Excluded(lo) => value.order(lo) == Some(Ordering::Greater),
        };
        let below = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(hi) => {
                matches!(value.order(hi), Some(Ordering::Less | Ordering::Equal))
            }
            Bound::Excluded(hi) => value.order(hi) == Some(Ordering::Less),
        };

        above && below
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn range(raw: &str, value_type: ValueType) -> Range {
        Range::parse(raw, value_type).unwrap()
    }

    #[test]
    fn test_inclusive_bounds() {
        let r = range("[1,3]", ValueType::Int);
        assert!(r.contains(&Typed::Int(1)));
        assert!(r.contains(&Typed::Int(3)));
        assert!(!r.contains(&Typed::Int(0)));
        assert!(!r.contains(&Typed::Int(4)));
    }

    #[test]
    fn test_exclusive_bounds() {
        let r = range("]1, 3[", ValueType::Int);
        assert!(!r.contains(&Typed::Int(1)));
        assert!(r.contains(&Typed::Int(2)));
        assert!(!r.contains(&Typed::Int(3)));

        let r = range("[1.5,2.5[", ValueType::Double);
        assert!(r.contains(&Typed::Double(1.5)));
        assert!(!r.contains(&Typed::Double(2.5)));
    }

    #[test]
    fn test_open_ended() {
        let r = range("[10,]", ValueType::Long);
        assert!(r.contains(&Typed::Long(i64::MAX)));
        assert!(!r.contains(&Typed::Long(9)));

        let r = range("[,2024-06-30]", ValueType::Date);
        let early = ValueType::Date.parse_literal("2024-01-01").unwrap();
        let late = ValueType::Date.parse_literal("2024-07-01").unwrap();
        assert!(r.contains(&early));
        assert!(!r.contains(&late));
    }

    #[test]
    fn test_duration_range() {
        let r = range("[PT1M,PT1H]", ValueType::Duration);
        assert!(r.contains(&ValueType::Duration.parse_literal("PT30M").unwrap()));
        assert!(!r.contains(&ValueType::Duration.parse_literal("PT2H").unwrap()));
    }

    #[test]
    fn test_malformed_ranges() {
        assert!(matches!(
            Range::parse("[1;3]", ValueType::Int),
            Err(DefinitionError::IllegalRange(_))
        ));
        assert!(matches!(
            Range::parse("[,]", ValueType::Int),
            Err(DefinitionError::IllegalRange(_))
        ));
        assert!(matches!(
            Range::parse("[5,1]", ValueType::Int),
            Err(DefinitionError::IllegalRange(_))
        ));
        assert!(matches!(
            Range::parse("[a,b]", ValueType::Int),
            Err(DefinitionError::IllegalValue { .. })
        ));
    }

    #[test]
    fn test_expected_value_kinds() {
        assert!(matches!(
            ExpectedValue::parse("[1,2]", ValueType::Int),
            Ok(ExpectedValue::Range(_))
        ));
        assert!(matches!(
            ExpectedValue::parse("[1,2]", ValueType::String),
            Ok(ExpectedValue::Exact(Typed::String(_)))
        ));
        assert_eq!(
            ExpectedValue::parse("]0,1]", ValueType::Double).unwrap().to_json(),
            Value::String("]0,1]".into())
        );
    }
}
