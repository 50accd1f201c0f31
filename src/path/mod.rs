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

//! Extended JSONPath expressions.
//!
//! Besides members, indexes, wildcards, slices and recursive descent, the
//! grammar understands equality filters (`[?(@.type=='x')]`), a positional
//! step `#n` picking the n-th result of the step before it, and terminal
//! aggregates (`.min()`, `.max()`, `.avg()`, `.stddev()`, `.length()`).

mod eval;
mod parser;

pub use eval::{evaluate, exists, is_null, Evaluation, Node};

use crate::error::PathError;
use serde_json::Value;
use std::fmt;

/// Root of every canonical path.
pub const ROOT: &str = "$";

#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    Root,
    Keys(Vec<Key>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Idx(usize),
    IdxRange(usize, usize),
    IdxRangeStart(usize),
    IdxRangeEnd(usize),
    Wildcard,
    WildcardArray,
    Field(String),
    /// `..name`, or `..*` when no name is given.
    Descendant(Option<String>),
    Filter(Filter),
    /// `#n`
    Position(usize),
    Aggregate(Aggregate),
}

/// `[?(@.sub.path==literal)]`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub(crate) sub_path: Vec<String>,
    pub(crate) literal: Value,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
    Avg,
    StdDev,
    Length,
}

impl Aggregate {
    pub(crate) fn from_name(name: &str) -> Option<Aggregate> {
        match name {
            "min" => Some(Aggregate::Min),
            "max" => Some(Aggregate::Max),
            "avg" => Some(Aggregate::Avg),
            "stddev" => Some(Aggregate::StdDev),
            "length" => Some(Aggregate::Length),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Avg => "avg",
            Aggregate::StdDev => "stddev",
            Aggregate::Length => "length",
        }
    }
}

// We cannot implement FromStr for Path without giving up the blanket
// `str` helper, so parsing goes through this trait instead.
pub trait JSONPath {
    fn jsonpath(&self) -> Result<Path, PathError>;
}

impl JSONPath for str {
    fn jsonpath(&self) -> Result<Path, PathError> {
        Path::from_jsonpath(self)
    }
}

impl Key {
    /// Whether this step can produce more than one result from a single input node.
    fn is_multi(&self) -> bool {
        matches!(
            self,
            Key::IdxRange(..)
                | Key::IdxRangeStart(_)
                | Key::IdxRangeEnd(_)
                | Key::Wildcard
                | Key::WildcardArray
                | Key::Descendant(_)
                | Key::Filter(_)
        )
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Key::Idx(idx) => write!(f, "[{}]", idx),
            Key::Field(key) => write!(f, "{}", &append_field("", key)),
            Key::IdxRange(start, end) => write!(f, "[{}:{}]", start, end),
            Key::IdxRangeStart(start) => write!(f, "[{}:]", start),
            Key::IdxRangeEnd(end) => write!(f, "[:{}]", end),
            Key::Wildcard => write!(f, ".*"),
            Key::WildcardArray => write!(f, "[*]"),
            Key::Descendant(None) => write!(f, "..*"),
            Key::Descendant(Some(name)) if is_plain_name(name) => write!(f, "..{}", name),
            Key::Descendant(Some(name)) => write!(f, "..['{}']", name.replace('\'', "\\'")),
            Key::Filter(filter) => write!(f, "{}", filter),
            Key::Position(n) => write!(f, "#{}", n),
            Key::Aggregate(function) => write!(f, ".{}()", function.name()),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[?(@")?;
        for segment in &self.sub_path {
            write!(f, ".{}", segment)?;
        }
        match &self.literal {
            Value::String(s) => write!(f, "=='{}')]", s.replace('\'', "\\'")),
            other => write!(f, "=={})]", other),
        }
    }
}

impl Path {
    pub fn from_jsonpath(jsonpath: &str) -> Result<Self, PathError> {
        parser::parse(jsonpath)
    }

    pub fn keys(&self) -> &[Key] {
        match self {
            Path::Root => &[],
            Path::Keys(keys) => keys,
        }
    }

    /// A definite path addresses at most one value.
    ///
    /// Wildcards, slices, filters and recursive descent make a path
    /// indefinite, unless a later `#n` step narrows the results back to one.
    pub fn is_definite(&self) -> bool {
        let mut definite = true;
        for key in self.keys() {
            match key {
                Key::Position(_) | Key::Aggregate(_) => definite = true,
                key if key.is_multi() => definite = false,
                _ => {}
            }
        }
        definite
    }

    /// The canonical location addressed by a path made only of members and
    /// indexes, whether or not a document holds it.
    pub fn canonical(&self) -> Option<String> {
        self.keys()
            .iter()
            .all(|key| matches!(key, Key::Field(_) | Key::Idx(_)))
            .then(|| self.to_string())
    }

    pub fn aggregate(&self) -> Option<Aggregate> {
        match self.keys().last() {
            Some(Key::Aggregate(function)) => Some(*function),
            _ => None,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", ROOT)?;
        for key in self.keys() {
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '$' | '@'))
}

/// Canonical path of the member `name` below `base`.
pub(crate) fn append_field(base: &str, name: &str) -> String {
    if is_plain_name(name) {
        format!("{}.{}", base, name)
    } else {
        format!("{}['{}']", base, name.replace('\'', "\\'"))
    }
}

/// Canonical path of the element `idx` below `base`.
pub(crate) fn append_index(base: &str, idx: usize) -> String {
    format!("{}[{}]", base, idx)
}

/// Whether the canonical `path` equals `location` or lies below it.
pub(crate) fn is_within(path: &str, location: &str) -> bool {
    if location == ROOT {
        return true;
    }

    match path.strip_prefix(location) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Segment<'a> {
    Index(usize),
    Text(&'a str),
}

/// Orders canonical paths with array indexes compared as numbers, so `$.a[2]` precedes `$.a[10]`.
pub(crate) fn compare_paths(lhs: &str, rhs: &str) -> std::cmp::Ordering {
    segments(lhs).cmp(&segments(rhs))
}

fn segments(path: &str) -> Vec<Segment<'_>> {
    let bytes = path.as_bytes();
    let mut out = vec![];
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'[' {
            let digits = bytes[i + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
            let close = i + 1 + digits;
            if digits > 0 && bytes.get(close) == Some(&b']') {
                if let Ok(index) = path[i + 1..close].parse() {
                    if text_start < i {
                        out.push(Segment::Text(&path[text_start..i]));
                    }
                    out.push(Segment::Index(index));
                    i = close + 1;
                    text_start = i;
                    continue;
                }
            }
        }
        i += 1;
    }

    if text_start < path.len() {
        out.push(Segment::Text(&path[text_start..]));
    }
    out
}
