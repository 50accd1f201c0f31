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

//! Typed expectations checked against a single document.

mod range;
mod value_type;

pub use range::{ExpectedValue, Range};
pub use value_type::{Typed, ValueType};

use crate::error::{DefinitionError, PathError};
use crate::json_diff::{
    kind, Config, DiffEntry, DiffResult, EpsilonPolicy, IgnoreSet, Ignored, StringMode,
};
use crate::path::{Evaluation, JSONPath, Node, Path};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Actual value reported when the document value cannot be read as the declared type.
pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH_IN_TEST_DEFINITION";

/// A check on the value(s) found at a path.
///
/// # Examples
///
/// ```
/// use contract_diff::expectation::{Expectation, ValueType};
///
/// let expectation = Expectation::new("$.items.length()", ValueType::Int).with_value("[1,10]");
/// assert_eq!(expectation.value.as_deref(), Some("[1,10]"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    pub path: String,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub epsilon: Option<String>,
    #[serde(default)]
    pub check_inverse: bool,
    #[serde(default)]
    pub check_is_null: bool,
    #[serde(default)]
    pub check_path_exists: bool,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub trim: bool,
}

impl Expectation {
    pub fn new(path: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            path: path.into(),
            value_type,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_epsilon(mut self, epsilon: impl Into<String>) -> Self {
        self.epsilon = Some(epsilon.into());
        self
    }

    pub fn inverted(mut self) -> Self {
        self.check_inverse = true;
        self
    }

    pub fn expect_null(mut self) -> Self {
        self.check_is_null = true;
        self
    }

    pub fn expect_exists(mut self) -> Self {
        self.check_path_exists = true;
        self
    }

    pub fn with_ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn with_trim(mut self) -> Self {
        self.trim = true;
        self
    }

    fn string_mode(&self) -> StringMode {
        StringMode {
            trim: self.trim,
            ignore_case: self.ignore_case,
        }
    }

    fn expected_json(&self) -> Value {
        self.value.clone().map_or(Value::Null, Value::String)
    }
}

/// Result of checking one expectation.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The expectation was evaluated; each entry is a confirmation or a failure.
    Checked(Vec<DiffEntry>),
    /// The expectation itself is malformed.
    Invalid {
        path: String,
        expected: Value,
        error: DefinitionError,
    },
    /// The path could not be parsed or evaluated.
    Unevaluable {
        path: String,
        expected: Value,
        error: PathError,
    },
}

impl CheckOutcome {
    /// Flattens the outcome into entries. Definition and evaluation errors
    /// become a single change carrying the error message.
    pub fn into_entries(self) -> Vec<DiffEntry> {
        match self {
            CheckOutcome::Checked(entries) => entries,
            CheckOutcome::Invalid {
                path,
                expected,
                error,
            } => vec![DiffEntry::change(path, expected, Value::Null, error.to_string())],
            CheckOutcome::Unevaluable {
                path,
                expected,
                error,
            } => {
                let actual = if error.is_type_mismatch() {
                    Value::String(TYPE_MISMATCH.to_string())
                } else {
                    Value::Null
                };
                vec![DiffEntry::change(path, expected, actual, error.to_string())]
            }
        }
    }
}

/// Checks expectations against one document.
#[derive(Debug)]
pub struct Validator<'d> {
    doc: &'d Value,
    ignored: Ignored,
    epsilon: EpsilonPolicy,
    report_white_noise: bool,
}

impl<'d> Validator<'d> {
    /// Resolves the ignore patterns of `config` against `doc` once for every check.
    pub fn new(doc: &'d Value, config: &Config) -> Self {
        Self {
            doc,
            ignored: config.ignores().resolve(&[doc]),
            epsilon: config.epsilon_policy(),
            report_white_noise: config.reports_white_noise(),
        }
    }

    pub fn check(&self, expectation: &Expectation) -> CheckOutcome {
        let invalid = |error| CheckOutcome::Invalid {
            path: expectation.path.clone(),
            expected: expectation.expected_json(),
            error,
        };
        let unevaluable = |error| CheckOutcome::Unevaluable {
            path: expectation.path.clone(),
            expected: expectation.expected_json(),
            error,
        };

        let structural = expectation.check_is_null || expectation.check_path_exists;
        if structural && expectation.value.is_some() {
            return invalid(DefinitionError::ExclusiveChecks);
        }

        let path = match expectation.path.jsonpath() {
            Ok(path) => path,
            Err(err) => return unevaluable(err),
        };

        let entries = if structural {
            self.check_structure(expectation, &path)
        } else {
            self.check_value(expectation, &path)
        };

        match entries {
            Ok(entries) => CheckOutcome::Checked(entries),
            Err(Failure::Definition(err)) => invalid(err),
            Err(Failure::Path(err)) => unevaluable(err),
        }
    }

    /// Checks `expectation`, recording failures into `failures` and
    /// returning the confirmations.
    pub fn check_expected(
        &self,
        expectation: &Expectation,
        failures: &mut DiffResult,
    ) -> Vec<DiffEntry> {
        let mut confirmations = vec![];

        for entry in self.check(expectation).into_entries() {
            if entry.is_confirmation() {
                confirmations.push(entry);
            } else {
                tracing::debug!(path = %entry.json_path(), "expectation failed");
                failures.push(entry);
            }
        }

        confirmations
    }

    pub fn check_all(&self, expectations: &[Expectation], failures: &mut DiffResult) -> Vec<DiffEntry> {
        let confirmations = expectations
            .iter()
            .flat_map(|expectation| self.check_expected(expectation, failures))
            .collect();
        failures.sort();
        confirmations
    }

    fn check_structure(&self, expectation: &Expectation, path: &Path) -> Result<Vec<DiffEntry>, Failure> {
        let mut entries = vec![];
        let inverse = expectation.check_inverse;

        if expectation.check_path_exists {
            let exists = path.exists(self.doc)?;
            let entry = if exists != inverse {
                DiffEntry::confirmation(&expectation.path, Value::Bool(!inverse), Value::Bool(exists))
            } else {
                let message = if exists {
                    "path exists but should not"
                } else {
                    "path does not exist"
                };
                DiffEntry::change(&expectation.path, Value::Bool(!inverse), Value::Bool(exists), message)
            };
            entries.extend(self.filter_ignored(&expectation.path, entry));
        }

        if expectation.check_is_null {
            let is_null = path.is_null(self.doc)?;
            let entry = if is_null != inverse {
                DiffEntry::confirmation(&expectation.path, Value::Bool(!inverse), Value::Bool(is_null))
            } else {
                let message = if is_null {
                    "value is null but should not be"
                } else {
                    "value is not null"
                };
                DiffEntry::change(&expectation.path, Value::Bool(!inverse), Value::Bool(is_null), message)
            };
            entries.extend(self.filter_ignored(&expectation.path, entry));
        }

        Ok(entries)
    }

    fn check_value(&self, expectation: &Expectation, path: &Path) -> Result<Vec<DiffEntry>, Failure> {
        let value_type = expectation.value_type;
        let raw = expectation.value.as_deref().ok_or(DefinitionError::MissingValue)?;
        let expected = ExpectedValue::parse(raw, value_type)?;
        let epsilon = match expectation.epsilon.as_deref() {
            Some(raw) => value_type.parse_epsilon(raw, self.epsilon)?,
            None => value_type.default_epsilon(self.epsilon),
        };
        let strings = expectation.string_mode();
        let expected_json = expected.to_json();

        let nodes = match path.evaluate(self.doc)? {
            Evaluation::Single(node) => vec![node],
            Evaluation::Many(nodes) if !nodes.is_empty() => nodes,
            Evaluation::Missing | Evaluation::Many(_) => {
                let entry = DiffEntry::deletion(&expectation.path, expected_json);
                return Ok(self.filter_ignored(&expectation.path, entry).into_iter().collect());
            }
        };

        let mut entries = vec![];
        for Node { path, value } in nodes {
            let entry = match value_type.coerce(&value) {
                None => DiffEntry::change(
                    &path,
                    expected_json.clone(),
                    Value::String(TYPE_MISMATCH.to_string()),
                    format!("cannot read {} {} as {}", kind(&value), value, value_type),
                ),
                Some(actual) => {
                    let found = value.clone().into_owned();
                    match judge(&expected, &actual, expectation.check_inverse, epsilon, strings) {
                        Ok(()) => DiffEntry::confirmation(&path, expected_json.clone(), found),
                        Err(message) => {
                            DiffEntry::change(&path, expected_json.clone(), found, message)
                        }
                    }
                }
            };
            entries.extend(self.filter_ignored(&path, entry));
        }

        Ok(entries)
    }

    /// Drops entries on ignored paths, or flags them as white noise.
    fn filter_ignored(&self, path: &str, entry: DiffEntry) -> Option<DiffEntry> {
        if !self.ignored.covers(path) {
            Some(entry)
        } else if self.report_white_noise && !entry.is_confirmation() {
            Some(entry.into_white_noise())
        } else {
            None
        }
    }
}

/// Checks `expectation` against `doc`, appending failures to `failures` and
/// returning the confirmations.
pub fn check_expected(
    doc: &Value,
    expectation: &Expectation,
    ignore: &IgnoreSet,
    failures: &mut DiffResult,
    epsilon: EpsilonPolicy,
) -> Vec<DiffEntry> {
    let config = Config::new().ignore_set(ignore.clone()).epsilon(epsilon);
    Validator::new(doc, &config).check_expected(expectation, failures)
}

/// Compares an expected value against one actual value. Inversion applies
/// to exact values only.
fn judge(
    expected: &ExpectedValue,
    actual: &Typed,
    inverse: bool,
    epsilon: EpsilonPolicy,
    strings: StringMode,
) -> Result<(), String> {
    match expected {
        ExpectedValue::Exact(expected) => {
            let matched = expected.matches(actual, epsilon, strings);
            if matched != inverse {
                Ok(())
            } else if inverse {
                Err(format!("expected a value other than {}", expected.to_json()))
            } else {
                Err(format!(
                    "expected {} but was {}",
                    expected.to_json(),
                    actual.to_json()
                ))
            }
        }
        ExpectedValue::Range(range) => {
            if range.contains(actual) {
                Ok(())
            } else {
                Err(format!("{} is outside {}", actual.to_json(), range))
            }
        }
    }
}

enum Failure {
    Definition(DefinitionError),
    Path(PathError),
}

impl From<DefinitionError> for Failure {
    fn from(err: DefinitionError) -> Self {
        Failure::Definition(err)
    }
}

impl From<PathError> for Failure {
    fn from(err: PathError) -> Self {
        Failure::Path(err)
    }
}
