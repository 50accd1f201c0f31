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

use contract_diff::expectation::TYPE_MISMATCH;
use contract_diff::{
    Config, DiffResult, Expectation, IgnoreSet, Report, Validator, ValueType,
};
use serde_json::{json, Value};

fn fixture(name: &str) -> Value {
    let path = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name);
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn expectations() -> Vec<Expectation> {
    serde_json::from_value(fixture("expectations.json")).unwrap()
}

#[test]
fn checks_loaded_expectations() {
    let candidate = fixture("candidate.json");
    let mut failures = DiffResult::new();

    let confirmations =
        Validator::new(&candidate, &Config::new()).check_all(&expectations(), &mut failures);

    assert_eq!(confirmations.len(), 10);
    assert!(confirmations.iter().all(|c| c.is_confirmation()));

    let failed: Vec<&str> = failures.changes().iter().map(|e| e.json_path()).collect();
    assert_eq!(failed, vec!["$.order.currency", "$.order.items[1].quantity"]);
    assert!(failures.additions().is_empty());
    assert!(failures.deletions().is_empty());
}

#[test]
fn ignored_paths_skip_expectations() {
    let candidate = fixture("candidate.json");
    let config = Config::new().ignore_set(
        IgnoreSet::new()
            .pattern("$.order.currency")
            .unwrap()
            .pattern("$.order.items[1]")
            .unwrap(),
    );
    let mut failures = DiffResult::new();

    Validator::new(&candidate, &config).check_all(&expectations(), &mut failures);

    assert!(failures.is_empty());
}

#[test]
fn reference_document_passes_with_one_exception() {
    let reference = fixture("reference.json");
    let mut failures = DiffResult::new();

    let confirmations =
        Validator::new(&reference, &Config::new()).check_all(&expectations(), &mut failures);

    let report = Report::new(failures, confirmations);
    assert!(!report.passed());
    let failed: Vec<&str> = report
        .result()
        .changes()
        .iter()
        .map(|e| e.json_path())
        .collect();
    assert_eq!(failed, vec!["$.order.status"]);
}

#[test]
fn malformed_definitions_are_reported() {
    let doc = json!({ "count": "many" });
    let validator = Validator::new(&doc, &Config::new());
    let mut failures = DiffResult::new();

    validator.check_expected(
        &Expectation::new("$.count", ValueType::Int).with_value("]1,2"),
        &mut failures,
    );
    validator.check_expected(
        &Expectation::new("$.count", ValueType::Int).with_value("3"),
        &mut failures,
    );

    assert_eq!(failures.changes().len(), 2);
    let messages: Vec<&str> = failures
        .changes()
        .iter()
        .filter_map(|e| e.message())
        .collect();
    assert!(messages[0].starts_with("INVALID_TEST_DEFINITION:"));
    assert_eq!(failures.changes()[1].actual(), Some(&json!(TYPE_MISMATCH)));
}
