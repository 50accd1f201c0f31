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

use super::{append_field, append_index, Aggregate, Filter, JSONPath, Key, Path, ROOT};
use crate::error::PathError;
use serde_json::Value;
use std::borrow::Cow;

/// A value selected by a path, together with its canonical location.
///
/// Aggregates produce values that do not exist in the document; their
/// `path` is the expression that computed them.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<'a> {
    pub path: String,
    pub value: Cow<'a, Value>,
}

/// Outcome of evaluating a path against a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation<'a> {
    /// A definite path that addresses nothing.
    Missing,
    Single(Node<'a>),
    /// Results of an indefinite path, in document order. May be empty.
    Many(Vec<Node<'a>>),
}

impl<'a> Evaluation<'a> {
    pub fn nodes(&self) -> &[Node<'a>] {
        match self {
            Evaluation::Missing => &[],
            Evaluation::Single(node) => std::slice::from_ref(node),
            Evaluation::Many(nodes) => nodes,
        }
    }

    /// Collapses the evaluation into a plain JSON value; indefinite results become an array.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Evaluation::Missing => None,
            Evaluation::Single(node) => Some(node.value.into_owned()),
            Evaluation::Many(nodes) => Some(Value::Array(
                nodes.into_iter().map(|n| n.value.into_owned()).collect(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
struct Located<'a> {
    path: String,
    value: &'a Value,
}

impl Path {
    /// Evaluates the path, returning a single value for definite paths and a
    /// list for indefinite ones.
    pub fn evaluate<'a>(&self, doc: &'a Value) -> Result<Evaluation<'a>, PathError> {
        let keys = self.keys();
        let (steps, function) = match keys.split_last() {
            Some((Key::Aggregate(function), steps)) => (steps, Some(*function)),
            _ => (keys, None),
        };

        let nodes = walk(steps, doc)?;

        if let Some(function) = function {
            if nodes.is_empty() {
                return Ok(Evaluation::Missing);
            }
            let value = aggregate(function, &nodes)?;
            return Ok(Evaluation::Single(Node {
                path: self.to_string(),
                value: Cow::Owned(value),
            }));
        }

        let mut nodes = nodes.into_iter().map(|l| Node {
            path: l.path,
            value: Cow::Borrowed(l.value),
        });

        if self.is_definite() {
            Ok(nodes.next().map_or(Evaluation::Missing, Evaluation::Single))
        } else {
            Ok(Evaluation::Many(nodes.collect()))
        }
    }

    /// Canonical locations of every value the path selects.
    pub fn locate(&self, doc: &Value) -> Result<Vec<String>, PathError> {
        if self.aggregate().is_some() {
            return Err(PathError::NotLocatable(self.to_string()));
        }

        Ok(walk(self.keys(), doc)?.into_iter().map(|l| l.path).collect())
    }

    /// Whether the path selects anything. A present `null` counts as existing.
    pub fn exists(&self, doc: &Value) -> Result<bool, PathError> {
        Ok(match self.evaluate(doc)? {
            Evaluation::Missing => false,
            Evaluation::Single(_) => true,
            Evaluation::Many(nodes) => !nodes.is_empty(),
        })
    }

    /// Whether the path is absent or selects only `null`s.
    pub fn is_null(&self, doc: &Value) -> Result<bool, PathError> {
        Ok(match self.evaluate(doc)? {
            Evaluation::Missing => true,
            Evaluation::Single(node) => node.value.is_null(),
            Evaluation::Many(nodes) => nodes.iter().all(|n| n.value.is_null()),
        })
    }
}

pub fn evaluate<'a>(doc: &'a Value, path: &str) -> Result<Evaluation<'a>, PathError> {
    path.jsonpath()?.evaluate(doc)
}

pub fn exists(doc: &Value, path: &str) -> Result<bool, PathError> {
    path.jsonpath()?.exists(doc)
}

pub fn is_null(doc: &Value, path: &str) -> Result<bool, PathError> {
    path.jsonpath()?.is_null(doc)
}

fn walk<'a>(keys: &[Key], doc: &'a Value) -> Result<Vec<Located<'a>>, PathError> {
    let mut current = vec![Located {
        path: ROOT.to_string(),
        value: doc,
    }];

    let mut spread = false;
    for key in keys {
        // `[n]` right after a filter, slice or descent selects nothing; `#n` reaches those results.
        current = match key {
            Key::Idx(_) if spread => vec![],
            _ => step(key, current)?,
        };
        spread = matches!(
            key,
            Key::Filter(_)
                | Key::IdxRange(..)
                | Key::IdxRangeStart(_)
                | Key::IdxRangeEnd(_)
                | Key::Descendant(_)
        );
    }

    Ok(current)
}

fn step<'a>(key: &Key, current: Vec<Located<'a>>) -> Result<Vec<Located<'a>>, PathError> {
    if let Key::Position(index) = key {
        let len = current.len();
        return current
            .into_iter()
            .nth(*index)
            .map(|node| vec![node])
            .ok_or(PathError::PositionOutOfRange { index: *index, len });
    }

    let mut next = vec![];

    for node in current {
        match key {
            Key::Field(name) => {
                if let Some(child) = node.value.as_object().and_then(|o| o.get(name)) {
                    next.push(Located {
                        path: append_field(&node.path, name),
                        value: child,
                    });
                }
            }
            Key::Idx(idx) => {
                if let Some(child) = node.value.as_array().and_then(|a| a.get(*idx)) {
                    next.push(Located {
                        path: append_index(&node.path, *idx),
                        value: child,
                    });
                }
            }
            Key::IdxRange(..) | Key::IdxRangeStart(_) | Key::IdxRangeEnd(_) => {
                if let Some(array) = node.value.as_array() {
                    let (start, end) = slice_bounds(key, array.len());
                    for idx in start..end {
                        next.push(Located {
                            path: append_index(&node.path, idx),
                            value: &array[idx],
                        });
                    }
                }
            }
            Key::Wildcard | Key::WildcardArray => children(&node, &mut next),
            Key::Descendant(name) => descend(&node, name.as_deref(), &mut next),
            Key::Filter(filter) => match node.value {
                Value::Array(items) => {
                    for (idx, item) in items.iter().enumerate() {
                        if filter.accepts(item) {
                            next.push(Located {
                                path: append_index(&node.path, idx),
                                value: item,
                            });
                        }
                    }
                }
                Value::Object(_) if filter.accepts(node.value) => next.push(node),
                _ => {}
            },
            Key::Aggregate(function) => {
                return Err(PathError::MisplacedAggregate(function.name().to_string()));
            }
            Key::Position(_) => {}
        }
    }

    Ok(next)
}

fn slice_bounds(key: &Key, len: usize) -> (usize, usize) {
    let (start, end) = match key {
        Key::IdxRange(start, end) => (*start, *end),
        Key::IdxRangeStart(start) => (*start, len),
        Key::IdxRangeEnd(end) => (0, *end),
        _ => (0, len),
    };
    let end = end.min(len);
    (start.min(end), end)
}

fn children<'a>(node: &Located<'a>, out: &mut Vec<Located<'a>>) {
    match node.value {
        Value::Object(map) => {
            for (name, child) in map {
                out.push(Located {
                    path: append_field(&node.path, name),
                    value: child,
                });
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                out.push(Located {
                    path: append_index(&node.path, idx),
                    value: child,
                });
            }
        }
        _ => {}
    }
}

/// Collects matching descendants in document order.
fn descend<'a>(node: &Located<'a>, name: Option<&str>, out: &mut Vec<Located<'a>>) {
    let mut direct = vec![];
    children(node, &mut direct);

    for child in direct {
        let is_member = matches!(node.value, Value::Object(_));
        let matches = match name {
            None => true,
            Some(name) => is_member && child.path == append_field(&node.path, name),
        };

        if matches {
            out.push(child.clone());
        }
        descend(&child, name, out);
    }
}

impl Filter {
    fn accepts(&self, item: &Value) -> bool {
        let mut current = item;
        for segment in &self.sub_path {
            match current.as_object().and_then(|o| o.get(segment)) {
                Some(next) => current = next,
                None => return false,
            }
        }

        match (current, &self.literal) {
            (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
            (a, b) => a == b,
        }
    }
}

fn aggregate(function: Aggregate, nodes: &[Located]) -> Result<Value, PathError> {
    let items: Vec<&Value> = nodes
        .iter()
        .flat_map(|node| match node.value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect();

    if function == Aggregate::Length {
        return Ok(Value::from(items.len()));
    }

    if items.is_empty() {
        return Err(PathError::EmptyAggregate {
            function: function.name().to_string(),
        });
    }

    let numbers = items
        .iter()
        .map(|item| {
            item.as_f64().ok_or_else(|| PathError::NonNumericAggregate {
                function: function.name().to_string(),
                value: item.to_string(),
            })
        })
        .collect::<Result<Vec<f64>, PathError>>()?;

    let count = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / count;

    Ok(match function {
        Aggregate::Min => extreme(&items, &numbers, |candidate, best| candidate < best),
        Aggregate::Max => extreme(&items, &numbers, |candidate, best| candidate > best),
        Aggregate::Avg => Value::from(mean),
        Aggregate::StdDev => {
            let variance = numbers.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / count;
            Value::from(variance.sqrt())
        }
        Aggregate::Length => unreachable!("returned early"),
    })
}

/// The original element holding the smallest or largest number, so integers stay integers.
fn extreme(items: &[&Value], numbers: &[f64], better: impl Fn(f64, f64) -> bool) -> Value {
    let mut best = 0;
    for (idx, number) in numbers.iter().enumerate().skip(1) {
        if better(*number, numbers[best]) {
            best = idx;
        }
    }
    items[best].clone()
}
