//! Error types for filterspec operations

use crate::{FilterType, Timestamp};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Render a violation path for humans; the empty path is the payload root.
fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

/// Constraint that a single violation broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required property is absent or null
    Required,
    /// A string property is empty or whitespace-only
    Blank,
    /// A field name contains characters outside `[A-Za-z0-9_.]`
    Pattern,
    /// A list that must hold at least one element is empty
    Empty,
    /// An instant operand is not an ISO-8601 timestamp with a zone offset
    InvalidTimestamp,
    /// Between filter with start after end
    InvalidRange,
    /// A field appears in both sort directions
    NotDisjoint,
    /// A numeric property is outside its allowed bounds
    OutOfBounds,
    /// A collection exceeds a configured cap
    TooMany,
}

/// One constraint violation, located by its path in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Violation {
    /// Location such as `filters[2].value`; empty for the payload root
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", display_path(&self.path), self.message)
    }
}

/// Every violation found by one validation pass, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Find the first violation recorded at `path`.
    pub fn at(&self, path: &str) -> Option<&Violation> {
        self.violations.iter().find(|v| v.path == path)
    }

    /// Check whether any violation of `kind` was recorded.
    pub fn contains_kind(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} constraint violation(s)", self.violations.len())?;
        for (i, violation) in self.violations.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, violation)?;
        }
        Ok(())
    }
}

/// Error when parsing an operator token outside a filter's vocabulary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown {filter_type} operator: {token}")]
pub struct OperatorParseError {
    pub filter_type: FilterType,
    pub token: String,
}

/// Error when parsing an unrecognized filter type discriminator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown filter type: {0}")]
pub struct FilterTypeParseError(pub String);

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for decoding, constructing and validating criteria.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Missing filter type discriminator at {}", display_path(.path))]
    MissingDiscriminator { path: String },

    #[error("Unknown filter type at {}: {found}", display_path(.path))]
    UnknownFilterType { path: String, found: String },

    #[error("Unknown {filter_type} operator at {}: {token}", display_path(.path))]
    UnknownOperator {
        path: String,
        filter_type: FilterType,
        token: String,
    },

    #[error(
        "Invalid range at {}: start {start} is after end {end}",
        display_path(.path)
    )]
    InvalidRange {
        path: String,
        start: Timestamp,
        end: Timestamp,
    },

    #[error("Validation failed with {0}")]
    Validation(ValidationErrors),

    #[error("Malformed payload: {reason}")]
    Malformed { reason: String },
}

impl QueryError {
    /// Violations carried by a `Validation` error, if any.
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            QueryError::Validation(errors) => Some(errors.violations()),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for QueryError {
    fn from(errors: ValidationErrors) -> Self {
        QueryError::Validation(errors)
    }
}

impl From<OperatorParseError> for QueryError {
    fn from(err: OperatorParseError) -> Self {
        QueryError::UnknownOperator {
            path: String::new(),
            filter_type: err.filter_type,
            token: err.token,
        }
    }
}

impl From<FilterTypeParseError> for QueryError {
    fn from(err: FilterTypeParseError) -> Self {
        QueryError::UnknownFilterType {
            path: String::new(),
            found: err.0,
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Malformed {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for filterspec operations.
pub type QueryResult<T> = Result<T, QueryError>;

// =============================================================================
// TESTS
// =============================================================================
