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

mod equality;
mod ignore;
mod misc;

pub use equality::{EpsilonPolicy, StringMode, DEFAULT_NUMERIC_EPSILON};
pub use ignore::{IgnoreSet, Ignored};

pub(crate) use equality::kind;

use crate::path::{compare_paths, Path, ROOT};
use crate::traverse::{self, Visit};
use chrono::TimeDelta;
use misc::Indent;
use serde::Serialize;
use serde_json::Value;
use std::{collections::HashMap, fmt};

/// Message carried by every successful check.
pub const CONFIRMATION: &str = "<confirmed>";

/// Message of the root entry reported when a body is empty or not JSON.
pub const NOT_VALID_JSON: &str = "RESPONSE_BODY_NOT_VALID_JSON: body is empty or not valid JSON";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Present on both sides with different values.
    Change,
    /// Present only in the candidate.
    Addition,
    /// Present only in the reference.
    Deletion,
}

/// One finding of a comparison or of an expectation check.
///
/// Changes always carry both sides. Additions and deletions carry only the
/// side they were found on and no message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    json_path: String,
    expected: Option<Value>,
    actual: Option<Value>,
    message: Option<String>,
    category: Category,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    white_noise: bool,
}

impl DiffEntry {
    pub fn change(
        json_path: impl Into<String>,
        expected: Value,
        actual: Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            json_path: json_path.into(),
            expected: Some(expected),
            actual: Some(actual),
            message: Some(message.into()),
            category: Category::Change,
            white_noise: false,
        }
    }

    pub fn addition(json_path: impl Into<String>, actual: Value) -> Self {
        Self {
            json_path: json_path.into(),
            expected: None,
            actual: Some(actual),
            message: None,
            category: Category::Addition,
            white_noise: false,
        }
    }

    pub fn deletion(json_path: impl Into<String>, expected: Value) -> Self {
        Self {
            json_path: json_path.into(),
            expected: Some(expected),
            actual: None,
            message: None,
            category: Category::Deletion,
            white_noise: false,
        }
    }

    /// A passed check, shaped like a change so both kinds can share one list.
    pub fn confirmation(json_path: impl Into<String>, expected: Value, actual: Value) -> Self {
        Self::change(json_path, expected, actual, CONFIRMATION)
    }

    pub fn json_path(&self) -> &str {
        &self.json_path
    }

    pub fn expected(&self) -> Option<&Value> {
        self.expected.as_ref()
    }

    pub fn actual(&self) -> Option<&Value> {
        self.actual.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_confirmation(&self) -> bool {
        self.message.as_deref() == Some(CONFIRMATION)
    }

    /// Whether the entry sits on an ignored path and is reported for diagnostics only.
    pub fn is_white_noise(&self) -> bool {
        self.white_noise
    }

    pub(crate) fn into_white_noise(self) -> Self {
        Self {
            white_noise: true,
            ..self
        }
    }

    fn counts(&self) -> bool {
        !self.white_noise && !self.is_confirmation()
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json_to_string =
            |json: &Value| serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string());

        match (self.category, &self.expected, &self.actual) {
            (_, Some(expected), Some(actual)) if self.is_confirmation() => {
                write!(
                    f,
                    "json atom at path \"{}\" matches {}",
                    self.json_path,
                    json_to_string(expected)
                )?;
                if expected != actual {
                    write!(f, " (actual {})", json_to_string(actual))?;
                }
            }
            (Category::Change, Some(expected), Some(actual)) => {
                writeln!(
                    f,
                    "json atoms at path \"{}\" are not equal: {}",
                    self.json_path,
                    self.message.as_deref().unwrap_or_default()
                )?;
                writeln!(f, "    expected:")?;
                writeln!(f, "{}", json_to_string(expected).indent(8))?;
                writeln!(f, "    actual:")?;
                write!(f, "{}", json_to_string(actual).indent(8))?;
            }
            (Category::Addition, _, _) => {
                write!(
                    f,
                    "json atom at path \"{}\" is missing from reference",
                    self.json_path
                )?;
            }
            (Category::Deletion, _, _) => {
                write!(
                    f,
                    "json atom at path \"{}\" is missing from candidate",
                    self.json_path
                )?;
            }
            (Category::Change, _, _) => unreachable!("changes carry both sides"),
        }

        if self.white_noise {
            write!(f, " (white noise)")?;
        }

        Ok(())
    }
}

/// Findings of one comparison, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffResult {
    changes: Vec<DiffEntry>,
    additions: Vec<DiffEntry>,
    deletions: Vec<DiffEntry>,
}

impl DiffResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: DiffEntry) {
        match entry.category {
            Category::Change => self.changes.push(entry),
            Category::Addition => self.additions.push(entry),
            Category::Deletion => self.deletions.push(entry),
        }
    }

    pub fn changes(&self) -> &[DiffEntry] {
        &self.changes
    }

    pub fn additions(&self) -> &[DiffEntry] {
        &self.additions
    }

    pub fn deletions(&self) -> &[DiffEntry] {
        &self.deletions
    }

    pub fn entries(&self) -> impl Iterator<Item = &DiffEntry> {
        self.changes
            .iter()
            .chain(self.additions.iter())
            .chain(self.deletions.iter())
    }

    /// Whether any entry other than white noise or a confirmation was recorded.
    pub fn has_difference(&self) -> bool {
        self.entries().any(DiffEntry::counts)
    }

    pub fn len(&self) -> usize {
        self.changes.len() + self.additions.len() + self.deletions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends the entries of another result for the same step.
    pub fn merge(&mut self, other: DiffResult) {
        self.changes.extend(other.changes);
        self.additions.extend(other.additions);
        self.deletions.extend(other.deletions);
        self.sort();
    }

    /// Orders every category by path; entries on the same path keep their discovery order.
    pub fn sort(&mut self) {
        for list in [&mut self.changes, &mut self.additions, &mut self.deletions] {
            list.sort_by(|a, b| compare_paths(&a.json_path, &b.json_path));
        }
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} change(s), {} addition(s), {} deletion(s)",
            self.changes.len(),
            self.additions.len(),
            self.deletions.len()
        )?;
        for entry in self.entries() {
            write!(f, "\n{}", entry.to_string().indent(2))?;
        }
        Ok(())
    }
}

/// Configuration for how JSON values should be compared.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub(crate) ignore: IgnoreSet,
    pub(crate) epsilon: EpsilonPolicy,
    pub(crate) report_white_noise: bool,
    pub(crate) strings: StringMode,
    pub(crate) header_strings: StringMode,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create a new [`Config`] with nothing ignored and default tolerances.
    ///
    /// Body strings compare byte-for-byte, header values ignore surrounding
    /// whitespace and case.
    pub fn new() -> Self {
        Self {
            ignore: IgnoreSet::new(),
            epsilon: EpsilonPolicy::default(),
            report_white_noise: false,
            strings: StringMode::exact(),
            header_strings: StringMode::lenient(),
        }
    }

    /// Add a path to the list of paths to ignore.
    pub fn ignore_path(mut self, path: Path) -> Self {
        self.ignore = self.ignore.path(path);
        self
    }

    pub fn ignore_header(mut self, name: impl Into<String>) -> Self {
        self.ignore = self.ignore.header(name);
        self
    }

    /// Replace the whole ignore set.
    pub fn ignore_set(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn epsilon(mut self, epsilon: EpsilonPolicy) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn numeric_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon.numeric = epsilon;
        self
    }

    pub fn duration_epsilon(mut self, epsilon: TimeDelta) -> Self {
        self.epsilon.duration = epsilon;
        self
    }

    /// Keep entries on ignored paths, flagged as white noise.
    pub fn report_white_noise(mut self, report: bool) -> Self {
        self.report_white_noise = report;
        self
    }

    pub fn string_mode(mut self, mode: StringMode) -> Self {
        self.strings = mode;
        self
    }

    pub fn header_string_mode(mut self, mode: StringMode) -> Self {
        self.header_strings = mode;
        self
    }

    pub fn ignores(&self) -> &IgnoreSet {
        &self.ignore
    }

    pub fn epsilon_policy(&self) -> EpsilonPolicy {
        self.epsilon
    }

    pub fn reports_white_noise(&self) -> bool {
        self.report_white_noise
    }
}

/// Compares `candidate` against `reference`, leaf by leaf.
///
/// Values of the reference missing from the candidate are deletions,
/// values only in the candidate are additions, and values on both sides
/// that differ under the configured tolerances are changes.
pub fn diff(candidate: &Value, reference: &Value, config: &Config) -> DiffResult {
    let ignored = config.ignore.resolve(&[candidate, reference]);
    diff_with(candidate, reference, config, &ignored)
}

/// Compares raw bodies. A body that is empty or not JSON while the other
/// side differs yields one change at the root instead of per-leaf entries.
pub fn diff_bodies(candidate: &str, reference: &str, config: &Config) -> DiffResult {
    let parse = |body: &str| -> Option<Value> {
        let body = body.trim();
        if body.is_empty() {
            None
        } else {
            serde_json::from_str(body).ok()
        }
    };

    match (parse(candidate), parse(reference)) {
        (Some(candidate), Some(reference)) => diff(&candidate, &reference, config),
        (parsed_candidate, parsed_reference) => {
            let ignored = {
                let docs: Vec<&Value> = parsed_candidate
                    .iter()
                    .chain(parsed_reference.iter())
                    .collect();
                config.ignore.resolve(&docs)
            };
            let mut folder = DiffFolder::new(config, ignored);

            if candidate.trim() != reference.trim() {
                folder.record(DiffEntry::change(
                    ROOT,
                    parsed_reference.unwrap_or_else(|| Value::String(reference.to_string())),
                    parsed_candidate.unwrap_or_else(|| Value::String(candidate.to_string())),
                    NOT_VALID_JSON,
                ));
            }

            folder.finish()
        }
    }
}

/// Compares `candidate` against `reference` after discarding every path on
/// which `reference` and `control` already disagree.
///
/// Two runs of the same service that differ on a path (timestamps,
/// generated ids) make that path white noise.
pub fn diff_with_control(
    candidate: &Value,
    reference: &Value,
    control: &Value,
    config: &Config,
) -> DiffResult {
    let noise = diff(reference, control, &config.clone().report_white_noise(false));
    tracing::debug!(paths = noise.len(), "white noise found between reference and control");

    let mut ignored = config.ignore.resolve(&[candidate, reference]);
    ignored.extend(noise.entries().map(|e| e.json_path.clone()));

    diff_with(candidate, reference, config, &ignored)
}

/// Reads a header list from a JSON object of names to values.
///
/// String values are taken as they are; numbers and booleans by their JSON
/// text. Returns `None` when `doc` is not an object or holds any other value.
pub fn header_list(doc: &Value) -> Option<Vec<(String, String)>> {
    doc.as_object()?
        .iter()
        .map(|(name, value)| match value {
            Value::String(text) => Some((name.clone(), text.clone())),
            Value::Number(_) | Value::Bool(_) => Some((name.clone(), value.to_string())),
            _ => None,
        })
        .collect()
}

/// Compares header lists. Names match case-insensitively; values compare
/// with the configured header string mode.
pub fn diff_headers(
    candidate: &[(String, String)],
    reference: &[(String, String)],
    config: &Config,
) -> DiffResult {
    let mut result = DiffResult::new();
    let find = |headers: &[(String, String)], name: &str| {
        headers
            .iter()
            .find(|(other, _)| other.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    };

    let mut record = |entry: DiffEntry, name: &str| {
        if !config.ignore.ignores_header(name) {
            result.push(entry);
        } else if config.report_white_noise {
            result.push(entry.into_white_noise());
        }
    };

    for (name, expected) in reference {
        match find(candidate, name) {
            None => record(DiffEntry::deletion(name, Value::String(expected.clone())), name),
            Some(actual) if !config.header_strings.equal(expected, &actual) => record(
                DiffEntry::change(
                    name,
                    Value::String(expected.clone()),
                    Value::String(actual.clone()),
                    format!("expected header {} to be {}, got {}", name, expected, actual),
                ),
                name,
            ),
            Some(_) => {}
        }
    }

    for (name, actual) in candidate {
        if find(reference, name).is_none() {
            record(DiffEntry::addition(name, Value::String(actual.clone())), name);
        }
    }

    result.sort();
    result
}

fn diff_with(candidate: &Value, reference: &Value, config: &Config, ignored: &Ignored) -> DiffResult {
    let candidate_leaves: Vec<Visit> = traverse::leaves(candidate).collect();
    let reference_leaves: Vec<Visit> = traverse::leaves(reference).collect();

    let candidate_lookup: HashMap<&str, &Value> = candidate_leaves
        .iter()
        .map(|leaf| (leaf.path.as_str(), leaf.value))
        .collect();
    let reference_lookup: HashMap<&str, &Value> = reference_leaves
        .iter()
        .map(|leaf| (leaf.path.as_str(), leaf.value))
        .collect();

    let mut folder = DiffFolder::new(config, ignored.clone());

    for leaf in &reference_leaves {
        folder.on_reference_leaf(leaf, candidate_lookup.get(leaf.path.as_str()).copied());
    }

    for leaf in &candidate_leaves {
        if !reference_lookup.contains_key(leaf.path.as_str()) {
            folder.record(DiffEntry::addition(leaf.path.as_str(), leaf.value.clone()));
        }
    }

    let result = folder.finish();
    tracing::debug!(
        changes = result.changes.len(),
        additions = result.additions.len(),
        deletions = result.deletions.len(),
        "json comparison finished"
    );
    result
}

#[derive(Debug)]
struct DiffFolder<'c> {
    config: &'c Config,
    ignored: Ignored,
    acc: DiffResult,
}

impl<'c> DiffFolder<'c> {
    fn new(config: &'c Config, ignored: Ignored) -> Self {
        Self {
            config,
            ignored,
            acc: DiffResult::new(),
        }
    }

    fn on_reference_leaf(&mut self, leaf: &Visit, actual: Option<&Value>) {
        let Some(actual) = actual else {
            self.record(DiffEntry::deletion(leaf.path.as_str(), leaf.value.clone()));
            return;
        };

        if let Err(message) = self
            .config
            .epsilon
            .compare(leaf.value, actual, self.config.strings)
        {
            self.record(DiffEntry::change(
                leaf.path.as_str(),
                leaf.value.clone(),
                actual.clone(),
                message,
            ));
        }
    }

    fn record(&mut self, entry: DiffEntry) {
        if !self.ignored.covers(&entry.json_path) {
            tracing::trace!(path = %entry.json_path, category = ?entry.category, "difference");
            self.acc.push(entry);
        } else if self.config.report_white_noise {
            self.acc.push(entry.into_white_noise());
        }
    }

    fn finish(mut self) -> DiffResult {
        self.acc.sort();
        self.acc
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::JSONPath;
    use serde_json::json;

    fn paths(entries: &[DiffEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.json_path()).collect()
    }

    #[test]
    fn test_diffing_leaf_json() {
        for (candidate, reference) in [
            (json!(null), json!(null)),
            (json!(true), json!(true)),
            (json!(1), json!(1)),
            (json!(1.0), json!(1.0)),
            (json!("a"), json!("a")),
        ] {
            assert!(!diff(&candidate, &reference, &Config::new()).has_difference());
        }

        let diffs = diff(&json!(false), &json!(true), &Config::new());
        assert_eq!(diffs.changes().len(), 1);
        assert_eq!(diffs.changes()[0].json_path(), "$");

        let diffs = diff(&json!(2), &json!(1), &Config::new());
        assert_eq!(diffs.changes().len(), 1);
    }

    #[test]
    fn test_boolean_change_and_ignore() {
        let candidate = json!({ "a": false });
        let reference = json!({ "a": true });

        let diffs = diff(&candidate, &reference, &Config::new());
        assert_eq!(paths(diffs.changes()), vec!["$.a"]);
        assert_eq!(diffs.changes()[0].expected(), Some(&json!(true)));
        assert_eq!(diffs.changes()[0].actual(), Some(&json!(false)));

        let config = Config::new().ignore_path("$.a".jsonpath().unwrap());
        let diffs = diff(&candidate, &reference, &config);
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_deletions_only() {
        let candidate = json!({ "a": [1] });
        let reference = json!({ "a": [1, 2], "b": 3 });

        let diffs = diff(&candidate, &reference, &Config::new());
        assert!(diffs.changes().is_empty());
        assert!(diffs.additions().is_empty());
        assert_eq!(paths(diffs.deletions()), vec!["$.a[1]", "$.b"]);
        assert_eq!(diffs.deletions()[0].message(), None);
        assert_eq!(diffs.deletions()[0].expected(), Some(&json!(2)));
    }

    #[test]
    fn test_additions() {
        let diffs = diff(&json!({ "a": 1, "n": null }), &json!({ "a": 1 }), &Config::new());
        assert_eq!(paths(diffs.additions()), vec!["$.n"]);
        assert_eq!(diffs.additions()[0].actual(), Some(&json!(null)));
        assert!(diffs.changes().is_empty());
    }

    #[test]
    fn test_null_versus_absent_is_not_a_change() {
        let diffs = diff(&json!({}), &json!({ "a": null }), &Config::new());
        assert!(diffs.changes().is_empty());
        assert_eq!(paths(diffs.deletions()), vec!["$.a"]);
    }

    #[test]
    fn test_object_deep_path() {
        let candidate = json!({ "a": { "b": [{"c": 0}, { "c": 1 }] } });
        let reference = json!({ "a": { "b": [{"c": 0}, { "c": 2 }] } });
        let config = Config::new().ignore_path("$.a.b[*].c".jsonpath().unwrap());
        assert!(!diff(&candidate, &reference, &config).has_difference());

        let candidate = json!({ "a": { "b": [{ "d": [1, 2, 3] }] } });
        let reference = json!({ "a": { "b": [{ "d": [1, 2, 4, 5] }] } });
        let config = Config::new().ignore_path("$.a.b[*].d".jsonpath().unwrap());
        assert!(!diff(&candidate, &reference, &config).has_difference());

        let candidate = json!({ "a": { "x": 1, "y": 2, "z": 3 } });
        let reference = json!({ "a": { "x": 2, "y": 3, "z": 3 } });
        let config = Config::new()
            .ignore_path("$.a.x".jsonpath().unwrap())
            .ignore_path("$.a.y".jsonpath().unwrap());
        assert!(!diff(&candidate, &reference, &config).has_difference());

        let candidate = json!({ "a": { "b": 1, "c": 2 } });
        let reference = json!({ "a": { "b": 1, "c": 3 } });
        let config = Config::new().ignore_path("$.a.d".jsonpath().unwrap());
        assert!(diff(&candidate, &reference, &config).has_difference());
    }

    #[test]
    fn test_ignore_removal_restores_entries() {
        let candidate = json!({ "meta": { "id": 1, "at": "x" }, "v": 1 });
        let reference = json!({ "meta": { "id": 2 }, "v": 2, "w": 0 });

        let full = diff(&candidate, &reference, &Config::new());
        let ignored = diff(
            &candidate,
            &reference,
            &Config::new().ignore_path("$.meta".jsonpath().unwrap()),
        );

        assert!(ignored.entries().all(|e| !e.json_path().starts_with("$.meta")));
        assert_eq!(paths(ignored.changes()), vec!["$.v"]);
        assert_eq!(paths(ignored.deletions()), vec!["$.w"]);
        assert_eq!(full, diff(&candidate, &reference, &Config::new()));
        assert_eq!(paths(full.changes()), vec!["$.meta.id", "$.v"]);
        assert_eq!(paths(full.additions()), vec!["$.meta.at"]);
    }

    #[test]
    fn test_white_noise_is_annotated() {
        let candidate = json!({ "id": 1, "v": 1 });
        let reference = json!({ "id": 2, "v": 1 });
        let config = Config::new()
            .ignore_path("$.id".jsonpath().unwrap())
            .report_white_noise(true);

        let diffs = diff(&candidate, &reference, &config);
        assert_eq!(diffs.changes().len(), 1);
        assert!(diffs.changes()[0].is_white_noise());
        assert!(!diffs.has_difference());
    }

    #[test]
    fn test_numeric_epsilon() {
        let config = Config::new().numeric_epsilon(0.5);
        assert!(!diff(&json!({ "n": 1.0 }), &json!({ "n": 1.5 }), &config).has_difference());
        assert!(diff(&json!({ "n": 1.0 }), &json!({ "n": 1.625 }), &config).has_difference());
    }

    #[test]
    fn test_body_not_json() {
        let result = diff_bodies("", r#"{"a": 1, "b": [1, 2]}"#, &Config::new());
        assert_eq!(result.len(), 1);
        assert_eq!(result.changes()[0].json_path(), "$");
        assert_eq!(result.changes()[0].message(), Some(NOT_VALID_JSON));

        let result = diff_bodies("<html>", r#"{"a": 1}"#, &Config::new());
        assert_eq!(result.changes().len(), 1);
        assert_eq!(result.changes()[0].actual(), Some(&json!("<html>")));

        assert!(diff_bodies("", "  ", &Config::new()).is_empty());

        let result = diff_bodies(r#"{"a": 2}"#, r#"{"a": 1}"#, &Config::new());
        assert_eq!(paths(result.changes()), vec!["$.a"]);
    }

    #[test]
    fn test_control_noise() {
        let reference = json!({ "id": "r-1", "at": "2024-01-01T00:00:00Z", "v": 1 });
        let control = json!({ "id": "r-2", "at": "2024-01-01T00:00:05Z", "v": 1 });
        let candidate = json!({ "id": "c-9", "at": "2024-01-02T00:00:00Z", "v": 2 });

        let result = diff_with_control(&candidate, &reference, &control, &Config::new());
        assert_eq!(paths(result.changes()), vec!["$.v"]);

        let result = diff_with_control(
            &candidate,
            &reference,
            &control,
            &Config::new().report_white_noise(true),
        );
        assert_eq!(result.changes().len(), 3);
        assert_eq!(result.entries().filter(|e| e.is_white_noise()).count(), 2);
    }

    #[test]
    fn test_headers() {
        let reference = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("X-Version".to_string(), "2".to_string()),
            ("Date".to_string(), "Mon".to_string()),
        ];
        let candidate = vec![
            ("content-type".to_string(), " Application/JSON ".to_string()),
            ("date".to_string(), "Tue".to_string()),
            ("Server".to_string(), "x".to_string()),
        ];

        let result = diff_headers(&candidate, &reference, &Config::new().ignore_header("date"));
        assert!(result.changes().is_empty());
        assert_eq!(paths(result.deletions()), vec!["X-Version"]);
        assert_eq!(paths(result.additions()), vec!["Server"]);

        let strict = Config::new().header_string_mode(StringMode::exact());
        let result = diff_headers(&candidate, &reference, &strict);
        assert_eq!(paths(result.changes()), vec!["Content-Type", "Date"]);
    }

    #[test]
    fn test_header_list_from_json() {
        let reference = header_list(&json!({ "Content-Length": 12, "ETag": "a1" })).unwrap();
        let candidate = header_list(&json!({ "content-length": "12", "etag": "b2" })).unwrap();
        assert_eq!(reference[0], ("Content-Length".to_string(), "12".to_string()));

        let result = diff_headers(&candidate, &reference, &Config::new());
        assert_eq!(paths(result.changes()), vec!["ETag"]);
        let result = diff_headers(&candidate, &reference, &Config::new().ignore_header("etag"));
        assert!(!result.has_difference());

        assert_eq!(header_list(&json!(["ETag"])), None);
        assert_eq!(header_list(&json!({ "ETag": null })), None);
    }

    #[test]
    fn test_merge_sorts_by_path() {
        let mut first = diff(&json!({ "b": 1 }), &json!({ "b": 2 }), &Config::new());
        let second = diff(&json!({ "a": 1 }), &json!({ "a": 2 }), &Config::new());
        first.merge(second);
        assert_eq!(paths(first.changes()), vec!["$.a", "$.b"]);
    }

    #[test]
    fn test_sort_compares_indexes_as_numbers() {
        let numbers: Vec<i32> = (0..12).collect();
        let shifted: Vec<i32> = numbers.iter().map(|n| n + 1).collect();
        let reference = json!({ "a": numbers });
        let candidate = json!({ "a": shifted });
        let result = diff(&candidate, &reference, &Config::new());
        let expected: Vec<String> = (0..12).map(|n| format!("$.a[{}]", n)).collect();
        assert_eq!(paths(result.changes()), expected);

        let mut merged = DiffResult::new();
        merged.push(DiffEntry::deletion("$.a[10]", json!(1)));
        merged.push(DiffEntry::deletion("$.a[2]", json!(1)));
        merged.push(DiffEntry::deletion("$.a[0]", json!(1)));
        merged.sort();
        assert_eq!(paths(merged.deletions()), vec!["$.a[0]", "$.a[2]", "$.a[10]"]);
    }

    #[test]
    fn test_display() {
        let result = diff(&json!({ "a": 1 }), &json!({ "a": 2, "b": 3 }), &Config::new());
        let rendered = result.to_string();
        assert!(rendered.starts_with("1 change(s), 0 addition(s), 1 deletion(s)"));
        assert!(rendered.contains("json atoms at path \"$.a\" are not equal"));
        assert!(rendered.contains("json atom at path \"$.b\" is missing from candidate"));
    }

    #[test]
    fn test_serialized_shape() {
        let entry = DiffEntry::deletion("$.b", json!(3));
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "jsonPath": "$.b",
                "expected": 3,
                "actual": null,
                "message": null,
                "category": "DELETION",
            })
        );
    }
}
