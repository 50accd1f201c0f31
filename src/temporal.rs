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

//! ISO-8601 dates, date-times and durations.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};
use once_cell::sync::Lazy;
use regex::Regex;

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([-+]?)P(?:([-+]?\d+)D)?(?:T(?:([-+]?\d+)H)?(?:([-+]?\d+)M)?(?:([-+]?)(\d+)(?:[.,](\d{1,9}))?S)?)?$",
    )
    .expect("duration pattern is valid")
});

/// A decoded temporal value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Temporal {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Duration(TimeDelta),
}

impl Temporal {
    pub fn parse(s: &str) -> Option<Temporal> {
        parse_date(s)
            .map(Temporal::Date)
            .or_else(|| parse_datetime(s).map(Temporal::DateTime))
            .or_else(|| parse_duration(s).map(Temporal::Duration))
    }

    /// Absolute distance between two values of the same kind.
    pub fn distance(&self, other: &Temporal) -> Option<TimeDelta> {
        let delta = match (self, other) {
            (Temporal::Date(a), Temporal::Date(b)) => a.signed_duration_since(*b),
            (Temporal::DateTime(a), Temporal::DateTime(b)) => a.signed_duration_since(*b),
            (Temporal::Duration(a), Temporal::Duration(b)) => a.checked_sub(b)?,
            _ => return None,
        };
        Some(delta.abs())
    }
}

/// `YYYY-MM-DD`
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// RFC 3339 date-time; a value without offset is read as UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed);
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Day-time duration such as `PT1H30M`, `P2DT3.5S` or `-PT10S`.
///
/// Year and month designators are rejected because their length is not fixed.
pub fn parse_duration(s: &str) -> Option<TimeDelta> {
    let captures = DURATION.captures(s)?;

    let has_part = (2..=6).any(|i| captures.get(i).is_some());
    if !has_part || s.ends_with('T') {
        return None;
    }

    let int = |i: usize| -> Option<i64> {
        captures
            .get(i)
            .map_or(Some(0), |m| m.as_str().parse::<i64>().ok())
    };

    let mut total = TimeDelta::try_days(int(2)?)?
        .checked_add(&TimeDelta::try_hours(int(3)?)?)?
        .checked_add(&TimeDelta::try_minutes(int(4)?)?)?;

    let second_sign = if captures.get(5).is_some_and(|m| m.as_str() == "-") {
        -1
    } else {
        1
    };
    let seconds = second_sign * int(6)?;
    let nanos = captures.get(7).map_or(Some(0), |m| {
        format!("{:0<9}", m.as_str()).parse::<i64>().ok()
    })?;
    total = total
        .checked_add(&TimeDelta::try_seconds(seconds)?)?
        .checked_add(&TimeDelta::nanoseconds(second_sign * nanos))?;

    if captures.get(1).is_some_and(|m| m.as_str() == "-") {
        total = -total;
    }
    Some(total)
}
