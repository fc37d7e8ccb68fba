//! Validation rule set
//!
//! Rules write into a [`Violations`] accumulator instead of returning early,
//! so one pass over a payload reports every problem with its path.

use crate::error::{QueryResult, ValidationErrors, Violation, ViolationKind};
use crate::instant;
use crate::Timestamp;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Display;

/// Allowed characters of a field name, dotted paths included.
pub const FIELD_NAME_PATTERN: &str = "[A-Za-z0-9_.]+";

static FIELD_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{}$", FIELD_NAME_PATTERN)).expect("Invalid field name regex")
});

/// Check a field name against [`FIELD_NAME_PATTERN`].
pub fn is_valid_field_name(name: &str) -> bool {
    FIELD_NAME.is_match(name)
}

/// Path of a named property under `parent`.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Path of the `index`-th element of the list at `parent`.
pub fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Accumulator for one validation call.
#[derive(Debug, Default)]
pub struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        path: impl Into<String>,
        kind: ViolationKind,
        message: impl Into<String>,
    ) {
        self.items.push(Violation::new(path, kind, message));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Violation] {
        &self.items
    }

    pub fn into_errors(self) -> ValidationErrors {
        ValidationErrors::new(self.items)
    }

    /// `Ok(())` when nothing was recorded, otherwise one aggregated error.
    pub fn into_result(self) -> QueryResult<()> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(self.into_errors().into())
        }
    }

    /// Record a `required` violation when `value` is absent.
    pub fn require_present<T>(&mut self, path: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(path, ViolationKind::Required, "must not be null");
        }
        value
    }

    pub fn require_non_blank(&mut self, path: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.push(path, ViolationKind::Blank, "must not be blank");
            return false;
        }
        true
    }

    /// Non-blank and matching the field name pattern.
    pub fn require_field_name(&mut self, path: &str, value: &str) -> bool {
        if !self.require_non_blank(path, value) {
            return false;
        }
        if !is_valid_field_name(value) {
            self.push(
                path,
                ViolationKind::Pattern,
                "must be alphanumeric with dots/underscores",
            );
            return false;
        }
        true
    }

    /// Instant must have a four-digit-year wire form.
    pub fn require_wire_instant(&mut self, path: &str, ts: &Timestamp) -> bool {
        if !instant::has_wire_form(ts) {
            self.push(
                path,
                ViolationKind::InvalidTimestamp,
                "year must be between 0000 and 9999",
            );
            return false;
        }
        true
    }

    pub fn require_non_empty<T>(&mut self, path: &str, items: &[T]) -> bool {
        if items.is_empty() {
            self.push(path, ViolationKind::Empty, "must not be empty");
            return false;
        }
        true
    }

    /// Inclusive bounds check.
    pub fn require_within<T>(&mut self, path: &str, value: T, min: T, max: T) -> bool
    where
        T: PartialOrd + Display,
    {
        if value < min || value > max {
            self.push(
                path,
                ViolationKind::OutOfBounds,
                format!("must be between {} and {}", min, max),
            );
            return false;
        }
        true
    }

    /// Cap a collection size when a limit is configured.
    pub fn require_at_most(&mut self, path: &str, count: usize, max: Option<usize>) -> bool {
        match max {
            Some(max) if count > max => {
                self.push(
                    path,
                    ViolationKind::TooMany,
                    format!("must contain at most {} entries, found {}", max, count),
                );
                false
            }
            _ => true,
        }
    }
}

/// Structural validation of a schema value located at `path`.
pub trait Validate {
    /// Record every violation of `self` into `violations`.
    fn validate_into(&self, path: &str, violations: &mut Violations);

    /// Validate `self` as a payload root.
    fn validate(&self) -> QueryResult<()> {
        let mut violations = Violations::new();
        self.validate_into("", &mut violations);
        violations.into_result()
    }
}

impl<T: Validate> Validate for [T] {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        for (i, item) in self.iter().enumerate() {
            item.validate_into(&index_path(path, i), violations);
        }
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        if let Some(inner) = self {
            inner.validate_into(path, violations);
        }
    }
}
