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

use thiserror::Error;

/// Prefix carried by every message describing a broken expectation definition.
pub const DEFINITION_ERROR_PREFIX: &str = "INVALID_TEST_DEFINITION:";

/// Errors raised while parsing or evaluating a path expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    /// The expression does not follow the path grammar.
    #[error("invalid path `{path}` at offset {offset}: {reason}")]
    Syntax {
        path: String,
        offset: usize,
        reason: String,
    },
    /// A `#n` step pointed past the end of the preceding result list.
    #[error("positional index #{index} is out of range for {len} result(s)")]
    PositionOutOfRange { index: usize, len: usize },
    #[error("cannot compute {function}() over non-numeric value {value}")]
    NonNumericAggregate { function: String, value: String },
    #[error("cannot compute {function}() over an empty array")]
    EmptyAggregate { function: String },
    /// The expression ends in an aggregate, so its result has no location in the document.
    #[error("path `{0}` computes a value and does not address a location")]
    NotLocatable(String),
    /// An aggregate step that is not the last step of the expression.
    #[error("{0}() is only allowed as the last step of a path")]
    MisplacedAggregate(String),
}

impl PathError {
    pub(crate) fn syntax(path: &str, offset: usize, reason: impl Into<String>) -> Self {
        PathError::Syntax {
            path: path.to_string(),
            offset,
            reason: reason.into(),
        }
    }

    /// Whether the failure comes from the data rather than from the expression itself.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, PathError::NonNumericAggregate { .. })
    }
}

/// An expectation that cannot be evaluated as written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    #[error("INVALID_TEST_DEFINITION: checkIsNull/checkPathExists cannot be combined with an expected value")]
    ExclusiveChecks,
    #[error("INVALID_TEST_DEFINITION: illegal range `{0}`")]
    IllegalRange(String),
    #[error("INVALID_TEST_DEFINITION: `{value}` is not a valid {value_type} value")]
    IllegalValue { value: String, value_type: String },
    #[error("INVALID_TEST_DEFINITION: `{value}` is not a valid epsilon for {value_type}")]
    IllegalEpsilon { value: String, value_type: String },
    #[error("INVALID_TEST_DEFINITION: no expected value given")]
    MissingValue,
    #[error("INVALID_TEST_DEFINITION: unknown value type `{0}`")]
    UnknownType(String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_definition_messages_share_prefix() {
        let errors = [
            DefinitionError::ExclusiveChecks,
            DefinitionError::IllegalRange("[1,".to_string()),
            DefinitionError::MissingValue,
            DefinitionError::UnknownType("FLOAT".to_string()),
        ];

        for err in errors {
            assert!(err.to_string().starts_with(DEFINITION_ERROR_PREFIX));
        }
    }

    #[test]
    fn test_type_mismatch_classification() {
        let err = PathError::NonNumericAggregate {
            function: "avg".to_string(),
            value: "\"x\"".to_string(),
        };
        assert!(err.is_type_mismatch());
        assert!(!PathError::PositionOutOfRange { index: 2, len: 1 }.is_type_mismatch());
    }
}
