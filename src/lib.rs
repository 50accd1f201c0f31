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

#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

use std::fmt::Display;

pub mod error;
pub mod expectation;
pub mod json_diff;
pub mod path;
pub mod temporal;
pub mod traverse;

pub use error::{DefinitionError, PathError};
pub use expectation::{check_expected, CheckOutcome, Expectation, Validator, ValueType};
pub use json_diff::{
    diff, diff_bodies, diff_headers, diff_with_control, header_list, Category, Config, DiffEntry,
    DiffResult, EpsilonPolicy, IgnoreSet, StringMode,
};
pub use path::{JSONPath, Path};
pub use traverse::{normalize, NormalizeOptions};

/// Report of one comparison step.
///
/// The report holds the differences found between two documents, the
/// failed expectations, and the expectations that were confirmed.
///
/// # Examples
///
/// ```
/// use contract_diff::{diff, Config, Report};
/// use serde_json::json;
///
/// let result = diff(&json!({ "a": 1 }), &json!({ "a": 1 }), &Config::new());
/// let report = Report::new(result, vec![]);
/// assert!(report.passed());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    result: DiffResult,
    confirmations: Vec<DiffEntry>,
}

impl Report {
    pub fn new(result: DiffResult, confirmations: Vec<DiffEntry>) -> Self {
        Self {
            result,
            confirmations,
        }
    }

    pub fn result(&self) -> &DiffResult {
        &self.result
    }

    pub fn confirmations(&self) -> &[DiffEntry] {
        &self.confirmations
    }

    /// Whether nothing but white noise was found.
    pub fn passed(&self) -> bool {
        !self.result.has_difference()
    }

    fn failed_count(&self) -> usize {
        self.result
            .entries()
            .filter(|e| !e.is_white_noise() && !e.is_confirmation())
            .count()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let failed = self.failed_count();
        let passed = self.confirmations.len();

        writeln!(f, "{}", self.result)?;
        for confirmation in &self.confirmations {
            writeln!(f, "  {}", confirmation)?;
        }

        if failed > 0 {
            write!(f, "result: FAILED. {} confirmed; {} failed", passed, failed)
        } else {
            write!(f, "result: PASSED. {} confirmed; 0 failed", passed)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_summary() {
        let doc = json!({ "a": 1, "b": "x" });
        let mut result = diff(&json!({ "a": 2, "b": "x" }), &doc, &Config::new());
        let confirmations = check_expected(
            &doc,
            &Expectation::new("$.b", ValueType::String).with_value("x"),
            &IgnoreSet::new(),
            &mut result,
            EpsilonPolicy::default(),
        );

        let report = Report::new(result, confirmations);
        assert!(!report.passed());
        let rendered = report.to_string();
        assert!(rendered.starts_with("1 change(s), 0 addition(s), 0 deletion(s)"));
        assert!(rendered.ends_with("result: FAILED. 1 confirmed; 1 failed"));
    }

    #[test]
    fn test_white_noise_passes() {
        let config = Config::new()
            .ignore_path("$.id".jsonpath().unwrap())
            .report_white_noise(true);
        let report = Report::new(diff(&json!({ "id": 1 }), &json!({ "id": 2 }), &config), vec![]);
        assert!(report.passed());
        assert!(report.to_string().ends_with("result: PASSED. 0 confirmed; 0 failed"));
    }
}
