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

use super::{Aggregate, Filter, Key, Path};
use crate::error::PathError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FILTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*@((?:\.[^.\s=!<>()\[\]]+)*)\s*==\s*(.+?)\s*$")
        .expect("filter pattern is valid")
});

pub(super) fn parse(jsonpath: &str) -> Result<Path, PathError> {
    Parser::new(jsonpath).parse()
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> PathError {
        PathError::syntax(self.input, self.pos, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), PathError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", c)))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> Result<Path, PathError> {
        if !self.eat('$') {
            return Err(self.error("path must start with `$`"));
        }

        let mut keys = vec![];

        while let Some(c) = self.peek() {
            if let Some(Key::Aggregate(_)) = keys.last() {
                return Err(self.error("an aggregate function must be the last step"));
            }

            let key = match c {
                '.' => {
                    self.pos += 1;
                    if self.eat('.') {
                        self.descendant()?
                    } else if self.eat('[') {
                        // `$.a.[0]` is accepted as a synonym of `$.a[0]`
                        self.bracket()?
                    } else if self.eat('*') {
                        Key::Wildcard
                    } else {
                        self.member()?
                    }
                }
                '[' => {
                    self.pos += 1;
                    self.bracket()?
                }
                '#' => {
                    self.pos += 1;
                    Key::Position(self.number()?)
                }
                _ => return Err(self.error(format!("unexpected character `{}`", c))),
            };

            keys.push(key);
        }

        if keys.is_empty() {
            Ok(Path::Root)
        } else {
            Ok(Path::Keys(keys))
        }
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '.' | '[' | '#' | '(' | ']' | ')') || c.is_whitespace() {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn member(&mut self) -> Result<Key, PathError> {
        let name = self.name();
        if name.is_empty() {
            return Err(self.error("expected a member name"));
        }

        if self.peek() != Some('(') {
            return Ok(Key::Field(name));
        }

        let function = Aggregate::from_name(&name)
            .ok_or_else(|| self.error(format!("unknown function `{}`", name)))?;
        self.pos += 1;
        self.expect(')')?;
        Ok(Key::Aggregate(function))
    }

    fn descendant(&mut self) -> Result<Key, PathError> {
        if self.eat('*') {
            return Ok(Key::Descendant(None));
        }

        if self.eat('[') {
            return match self.bracket()? {
                Key::Field(name) => Ok(Key::Descendant(Some(name))),
                Key::WildcardArray => Ok(Key::Descendant(None)),
                _ => Err(self.error("only member names may follow `..`")),
            };
        }

        let name = self.name();
        if name.is_empty() {
            return Err(self.error("expected a member name after `..`"));
        }
        if self.peek() == Some('(') {
            return Err(self.error("functions cannot follow `..`"));
        }

        Ok(Key::Descendant(Some(name)))
    }

    /// Parses the inside of `[...]`; the opening bracket is already consumed.
    fn bracket(&mut self) -> Result<Key, PathError> {
        self.skip_whitespace();

        let key = match self.peek() {
            Some('*') => {
                self.pos += 1;
                Key::WildcardArray
            }
            Some(quote @ ('\'' | '"')) => {
                self.pos += 1;
                Key::Field(self.quoted(quote)?)
            }
            Some('?') => {
                self.pos += 1;
                self.expect('(')?;
                Key::Filter(self.filter()?)
            }
            Some(c) if c.is_ascii_digit() || c == ':' => self.index()?,
            Some(c) => return Err(self.error(format!("unexpected character `{}` in brackets", c))),
            None => return Err(self.error("unterminated `[`")),
        };

        self.skip_whitespace();
        self.expect(']')?;
        Ok(key)
    }

    fn quoted(&mut self, quote: char) -> Result<String, PathError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated quoted name")),
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c) => out.push(c),
                        None => return Err(self.error("dangling escape")),
                    }
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(c) => out.push(c),
            }
            self.pos += 1;
        }
    }

    fn number(&mut self) -> Result<usize, PathError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a non-negative integer"));
        }

        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse()
            .map_err(|_| PathError::syntax(self.input, start, "index is too large"))
    }

    fn index(&mut self) -> Result<Key, PathError> {
        let start = if self.peek() == Some(':') {
            None
        } else {
            Some(self.number()?)
        };

        if !self.eat(':') {
            return match start {
                Some(idx) => Ok(Key::Idx(idx)),
                None => Err(self.error("expected an index")),
            };
        }

        let end = if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            Some(self.number()?)
        } else {
            None
        };

        Ok(match (start, end) {
            (Some(start), Some(end)) => Key::IdxRange(start, end),
            (Some(start), None) => Key::IdxRangeStart(start),
            (None, Some(end)) => Key::IdxRangeEnd(end),
            (None, None) => Key::WildcardArray,
        })
    }

    /// Parses a filter body up to and including its closing `)`.
    fn filter(&mut self) -> Result<Filter, PathError> {
        let start = self.pos;
        let mut quote = None;
        let mut depth = 0usize;

        loop {
            let Some(c) = self.peek() else {
                return Err(PathError::syntax(self.input, start, "unterminated filter"));
            };
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), '\\') => self.pos += 1,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, '(') => depth += 1,
                (None, ')') if depth == 0 => break,
                (None, ')') => depth -= 1,
                (None, _) => {}
            }
            self.pos += 1;
        }

        let body: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;

        let captures = FILTER.captures(&body).ok_or_else(|| {
            let reason = if body.contains('=') && !body.contains("==") {
                "filters compare with `==`, not `=`".to_string()
            } else {
                format!("unsupported filter `{}`, only `@.member==literal` is allowed", body)
            };
            PathError::syntax(self.input, start, reason)
        })?;

        let sub_path = captures[1]
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        let literal = literal(&captures[2])
            .ok_or_else(|| PathError::syntax(self.input, start, format!("invalid literal `{}`", &captures[2])))?;

        Ok(Filter { sub_path, literal })
    }
}

fn literal(raw: &str) -> Option<Value> {
    if let Some(inner) = raw.strip_prefix('\'') {
        let inner = inner.strip_suffix('\'')?;
        return Some(Value::String(inner.replace("\\'", "'")));
    }

    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Array(_) | Value::Object(_) => None,
        scalar => Some(scalar),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literals() {
        assert_eq!(literal("'B'"), Some(json!("B")));
        assert_eq!(literal("'it\\'s'"), Some(json!("it's")));
        assert_eq!(literal("\"B\""), Some(json!("B")));
        assert_eq!(literal("12"), Some(json!(12)));
        assert_eq!(literal("1.5"), Some(json!(1.5)));
        assert_eq!(literal("true"), Some(json!(true)));
        assert_eq!(literal("null"), Some(json!(null)));
        assert_eq!(literal("'open"), None);
        assert_eq!(literal("[1]"), None);
        assert_eq!(literal("B"), None);
    }

    #[test]
    fn test_filter_forms() {
        let path = parse("$.items[?(@.meta.kind == \"x\")]").unwrap();
        assert_eq!(
            path.keys()[1],
            Key::Filter(Filter {
                sub_path: vec!["meta".into(), "kind".into()],
                literal: json!("x"),
            })
        );

        let path = parse("$.tags[?(@=='a')]").unwrap();
        assert_eq!(
            path.keys()[1],
            Key::Filter(Filter {
                sub_path: vec![],
                literal: json!("a"),
            })
        );

        let path = parse("$.a[?(@.b=='x)]')]").unwrap();
        assert_eq!(
            path.keys()[1],
            Key::Filter(Filter {
                sub_path: vec!["b".into()],
                literal: json!("x)]"),
            })
        );
    }

    #[test]
    fn test_error_offsets() {
        match parse("$.a[?(@.b='B')]") {
            Err(PathError::Syntax { reason, .. }) => assert!(reason.contains("==")),
            other => panic!("unexpected {:?}", other),
        }

        match parse("$.a.b c") {
            Err(PathError::Syntax { offset, .. }) => assert_eq!(offset, 5),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_descendants() {
        assert_eq!(
            parse("$..['a b']").unwrap().keys(),
            &[Key::Descendant(Some("a b".into()))]
        );
        assert_eq!(parse("$..*").unwrap().keys(), &[Key::Descendant(None)]);
        assert!(parse("$..").is_err());
        assert!(parse("$..[0]").is_err());
    }
}
