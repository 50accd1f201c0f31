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

use crate::error::PathError;
use crate::path::{is_within, JSONPath, Path};
use serde_json::Value;

/// Path patterns and header names excluded from reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IgnoreSet {
    paths: Vec<Path>,
    headers: Vec<String>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path to the list of paths to ignore.
    pub fn path(mut self, path: Path) -> Self {
        self.paths.push(path);
        self
    }

    /// Parses and adds a path pattern.
    pub fn pattern(self, pattern: &str) -> Result<Self, PathError> {
        Ok(self.path(pattern.jsonpath()?))
    }

    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.headers.push(name.into());
        self
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn ignores_header(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h.eq_ignore_ascii_case(name))
    }

    /// Expands every pattern to the concrete locations it selects in `docs`.
    /// Member and index paths also stand for themselves when absent.
    ///
    /// Patterns that cannot be located in a document (aggregates, `#n` past
    /// the end of the results) ignore nothing there.
    pub fn resolve(&self, docs: &[&Value]) -> Ignored {
        let mut locations = vec![];

        for path in &self.paths {
            locations.extend(path.canonical());
            for doc in docs {
                match path.locate(doc) {
                    Ok(found) => locations.extend(found),
                    Err(err) => tracing::debug!(pattern = %path, error = %err, "ignore pattern skipped"),
                }
            }
        }

        locations.sort();
        locations.dedup();
        Ignored { locations }
    }
}

/// Concrete locations excluded from a comparison.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ignored {
    locations: Vec<String>,
}

impl Ignored {
    /// Whether `path` is one of the locations or lies below one.
    pub fn covers(&self, path: &str) -> bool {
        self.locations.iter().any(|location| is_within(path, location))
    }

    pub(crate) fn extend(&mut self, locations: impl IntoIterator<Item = String>) {
        self.locations.extend(locations);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_patterns() {
        let doc = json!({ "a": { "b": [{ "c": 0, "d": 1 }, { "c": 1, "d": 2 }] }, "id": 7 });
        let ignored = IgnoreSet::new()
            .pattern("$.a.b[*].c")
            .unwrap()
            .pattern("$.id")
            .unwrap()
            .resolve(&[&doc]);

        assert!(ignored.covers("$.a.b[0].c"));
        assert!(ignored.covers("$.a.b[1].c"));
        assert!(ignored.covers("$.id"));
        assert!(!ignored.covers("$.a.b[0].d"));
        assert!(!ignored.covers("$.idx"));
    }

    #[test]
    fn test_subtree_and_filter_patterns() {
        let doc = json!({ "items": [{ "kind": "tmp", "v": 1 }, { "kind": "keep", "v": 2 }] });
        let ignored = IgnoreSet::new()
            .pattern("$.items[?(@.kind=='tmp')]")
            .unwrap()
            .resolve(&[&doc]);

        assert!(ignored.covers("$.items[0].v"));
        assert!(ignored.covers("$.items[0].kind"));
        assert!(!ignored.covers("$.items[1].v"));
    }

    #[test]
    fn test_unlocatable_patterns_ignore_nothing() {
        let doc = json!({ "n": [1, 2] });
        let ignored = IgnoreSet::new()
            .pattern("$.n.max()")
            .unwrap()
            .pattern("$.n[*]#5")
            .unwrap()
            .resolve(&[&doc]);

        assert!(!ignored.covers("$.n[0]"));
    }

    #[test]
    fn test_absent_definite_pattern() {
        let ignored = IgnoreSet::new()
            .pattern("$.gone['x.y']")
            .unwrap()
            .resolve(&[&json!({})]);
        assert!(ignored.covers("$.gone['x.y']"));
        assert!(ignored.covers("$.gone['x.y'][0]"));
    }

    #[test]
    fn test_headers() {
        let ignore = IgnoreSet::new().header("Date");
        assert!(ignore.ignores_header("date"));
        assert!(!ignore.ignores_header("Server"));
    }
}
