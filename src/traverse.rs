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

//! Depth-first traversal of JSON documents.
//!
//! Object members are visited in declaration order and array elements by
//! index, so two traversals of equal documents produce the same sequence of
//! canonical paths.

use crate::path::{append_field, append_index, ROOT};
use serde_json::{Map, Value};

/// Kind of container holding a visited node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Parent {
    Root,
    Object,
    Array,
}

/// One visited node.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit<'a> {
    pub path: String,
    pub value: &'a Value,
    pub parent: Parent,
}

impl<'a> Visit<'a> {
    /// Scalars and empty containers are leaves.
    pub fn is_leaf(&self) -> bool {
        match self.value {
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => true,
        }
    }
}

/// Lazy pre-order iterator over every node of a document.
#[derive(Debug)]
pub struct Nodes<'a> {
    stack: Vec<Visit<'a>>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.stack.pop()?;

        // children are pushed in reverse so they pop in document order
        match visit.value {
            Value::Object(map) => {
                for (name, child) in map.iter().rev() {
                    self.stack.push(Visit {
                        path: append_field(&visit.path, name),
                        value: child,
                        parent: Parent::Object,
                    });
                }
            }
            Value::Array(items) => {
                for (idx, child) in items.iter().enumerate().rev() {
                    self.stack.push(Visit {
                        path: append_index(&visit.path, idx),
                        value: child,
                        parent: Parent::Array,
                    });
                }
            }
            _ => {}
        }

        Some(visit)
    }
}

pub fn nodes(doc: &Value) -> Nodes<'_> {
    Nodes {
        stack: vec![Visit {
            path: ROOT.to_string(),
            value: doc,
            parent: Parent::Root,
        }],
    }
}

pub fn leaves(doc: &Value) -> impl Iterator<Item = Visit<'_>> {
    nodes(doc).filter(Visit::is_leaf)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct NormalizeOptions {
    /// Rewrite objects nested inside arrays too; otherwise arrays are copied as they are.
    pub normalize_arrays: bool,
}

/// Returns a copy of `doc` where dotted member names become nested objects.
///
/// `{"project.id": 1}` becomes `{"project": {"id": 1}}`. A dotted member is
/// left as it is when its prefix already names a non-object value.
pub fn normalize(doc: &Value, options: NormalizeOptions) -> Value {
    match doc {
        Value::Object(map) => Value::Object(normalize_object(map, options)),
        Value::Array(items) if options.normalize_arrays => Value::Array(
            items
                .iter()
                .map(|item| normalize(item, options))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn normalize_object(map: &Map<String, Value>, options: NormalizeOptions) -> Map<String, Value> {
    let members: Vec<(&String, Value)> = map
        .iter()
        .map(|(name, value)| (name, normalize(value, options)))
        .collect();
    let explicit: Map<String, Value> = members
        .iter()
        .filter(|(name, _)| !name.contains('.'))
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();

    let mut out = Map::new();

    for (name, value) in members {
        let Some((prefix, rest)) = name.split_once('.') else {
            merge_explicit(&mut out, name, value);
            continue;
        };
        if prefix.is_empty() || rest.is_empty() {
            out.insert(name.clone(), value);
            continue;
        }

        let mut nested = Map::new();
        nested.insert(rest.to_string(), value.clone());
        let nested = normalize_object(&nested, options);

        // collisions with explicit members are checked against the whole input
        let blocked = collides(explicit.get(prefix), &Value::Object(nested.clone()))
            || out.get(prefix).is_some_and(|v| !v.is_object());

        let merged = !blocked
            && match out
                .entry(prefix.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                Value::Object(target) => merge_dotted(target, nested),
                _ => false,
            };
        if !merged {
            // a member at or below the prefix already holds a value
            out.insert(name.clone(), value);
        }
    }

    out
}

/// Folds members produced from a dotted name into `target`. Nothing is
/// written when any of them collides with a leaf.
fn merge_dotted(target: &mut Map<String, Value>, nested: Map<String, Value>) -> bool {
    let colliding = nested
        .iter()
        .any(|(name, value)| collides(target.get(name), value));
    if colliding {
        return false;
    }

    for (name, value) in nested {
        match (target.get_mut(&name), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_dotted(existing, incoming);
            }
            (_, value) => {
                target.insert(name, value);
            }
        }
    }
    true
}

fn collides(existing: Option<&Value>, incoming: &Value) -> bool {
    match (existing, incoming) {
        (None, _) => false,
        (Some(Value::Object(existing)), Value::Object(incoming)) => incoming
            .iter()
            .any(|(name, value)| collides(existing.get(name), value)),
        (Some(_), _) => true,
    }
}

/// Explicit members fill in objects previously created from dotted names.
fn merge_explicit(target: &mut Map<String, Value>, name: &str, value: Value) {
    match (target.get_mut(name), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (child, child_value) in incoming {
                merge_explicit(existing, &child, child_value);
            }
        }
        (_, value) => {
            target.insert(name.to_string(), value);
        }
    }
}
