//! Polymorphic filter model
//!
//! [`Filter`] is the closed union of the four filter variants. On the wire the
//! variant is selected by the `type` property:
//!
//! ```text
//! {"type":"basic","field":"age","operator":"greater_than","value":"30"}
//! {"type":"between","field":"created_at","operator":"between",
//!  "start_date_time":"2025-01-01T00:00:00.000Z","end_date_time":"2025-01-31T23:59:59.999Z"}
//! {"type":"contains","field":"status","operator":"in","values":["OPEN","PENDING"]}
//! {"type":"datetime","field":"updated_at","operator":"after","value":"2025-08-01T00:00:00.000Z"}
//! ```
//!
//! Constructors validate; a value of any of these types is always valid.

use crate::error::{QueryError, QueryResult, ViolationKind};
use crate::instant;
use crate::operator::{
    BasicOperator, BetweenOperator, ContainsOperator, DateTimeOperator, FilterType,
};
use crate::validation::{child_path, Validate, Violations};
use crate::Timestamp;
use serde::Serialize;

// ============================================================================
// VARIANTS
// ============================================================================

/// Simple comparison of a field against a single string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BasicFilter {
    field: String,
    operator: BasicOperator,
    /// Right-hand value; conversion to the column type happens downstream
    value: String,
}

impl BasicFilter {
    pub fn new(
        field: impl Into<String>,
        operator: BasicOperator,
        value: impl Into<String>,
    ) -> QueryResult<Self> {
        let filter = Self::from_parts(field.into(), operator, value.into());
        filter.validate()?;
        Ok(filter)
    }

    pub(crate) fn from_parts(field: String, operator: BasicOperator, value: String) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> BasicOperator {
        self.operator
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Validate for BasicFilter {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        violations.require_field_name(&child_path(path, "field"), &self.field);
        violations.require_non_blank(&child_path(path, "value"), &self.value);
    }
}

/// Inclusive range of instants on a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BetweenFilter {
    field: String,
    operator: BetweenOperator,
    #[serde(serialize_with = "instant::serialize")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = DateTime))]
    start_date_time: Timestamp,
    #[serde(serialize_with = "instant::serialize")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = DateTime))]
    end_date_time: Timestamp,
}

impl BetweenFilter {
    /// Fails with [`QueryError::InvalidRange`] when `start > end` and the
    /// field itself is valid.
    pub fn new(field: impl Into<String>, start: Timestamp, end: Timestamp) -> QueryResult<Self> {
        let filter = Self::from_parts(field.into(), start, end);
        filter.validate()?;
        Ok(filter)
    }

    pub(crate) fn from_parts(field: String, start: Timestamp, end: Timestamp) -> Self {
        Self {
            field,
            operator: BetweenOperator::Between,
            start_date_time: instant::to_millis(start),
            end_date_time: instant::to_millis(end),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> BetweenOperator {
        self.operator
    }

    pub fn start(&self) -> Timestamp {
        self.start_date_time
    }

    pub fn end(&self) -> Timestamp {
        self.end_date_time
    }

    pub fn is_valid_range(&self) -> bool {
        self.start_date_time <= self.end_date_time
    }

    /// Report a lone range violation as `InvalidRange`, anything else as an
    /// aggregated validation error.
    pub(crate) fn settle(&self, path: &str, violations: Violations) -> QueryResult<()> {
        match violations.as_slice() {
            [only] if only.kind == ViolationKind::InvalidRange => Err(QueryError::InvalidRange {
                path: path.to_string(),
                start: self.start_date_time,
                end: self.end_date_time,
            }),
            _ => violations.into_result(),
        }
    }
}

impl Validate for BetweenFilter {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        violations.require_field_name(&child_path(path, "field"), &self.field);
        for (name, ts) in [
            ("start_date_time", &self.start_date_time),
            ("end_date_time", &self.end_date_time),
        ] {
            violations.require_wire_instant(&child_path(path, name), ts);
        }
        if !self.is_valid_range() {
            violations.push(
                path,
                ViolationKind::InvalidRange,
                "start_date_time must be before or equal to end_date_time",
            );
        }
    }

    fn validate(&self) -> QueryResult<()> {
        let mut violations = Violations::new();
        self.validate_into("", &mut violations);
        self.settle("", violations)
    }
}

/// Membership of a field's value in a non-empty list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContainsFilter {
    field: String,
    operator: ContainsOperator,
    values: Vec<String>,
}

impl ContainsFilter {
    pub fn new<I, S>(field: impl Into<String>, values: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filter = Self::from_parts(field.into(), values.into_iter().map(Into::into).collect());
        filter.validate()?;
        Ok(filter)
    }

    pub(crate) fn from_parts(field: String, values: Vec<String>) -> Self {
        Self {
            field,
            operator: ContainsOperator::In,
            values,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> ContainsOperator {
        self.operator
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Validate for ContainsFilter {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        violations.require_field_name(&child_path(path, "field"), &self.field);
        violations.require_non_empty(&child_path(path, "values"), &self.values);
    }
}

/// Temporal comparison of a field against one instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DateTimeFilter {
    field: String,
    operator: DateTimeOperator,
    #[serde(serialize_with = "instant::serialize")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = DateTime))]
    value: Timestamp,
}

impl DateTimeFilter {
    pub fn new(
        field: impl Into<String>,
        operator: DateTimeOperator,
        value: Timestamp,
    ) -> QueryResult<Self> {
        let filter = Self::from_parts(field.into(), operator, value);
        filter.validate()?;
        Ok(filter)
    }

    pub(crate) fn from_parts(field: String, operator: DateTimeOperator, value: Timestamp) -> Self {
        Self {
            field,
            operator,
            value: instant::to_millis(value),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> DateTimeOperator {
        self.operator
    }

    pub fn value(&self) -> Timestamp {
        self.value
    }
}

impl Validate for DateTimeFilter {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        violations.require_field_name(&child_path(path, "field"), &self.field);
        violations.require_wire_instant(&child_path(path, "value"), &self.value);
    }
}

// ============================================================================
// UNION
// ============================================================================

/// One filter condition, discriminated by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "type")]
pub enum Filter {
    #[serde(rename = "basic")]
    Basic(BasicFilter),
    #[serde(rename = "between")]
    Between(BetweenFilter),
    #[serde(rename = "contains")]
    Contains(ContainsFilter),
    #[serde(rename = "datetime")]
    DateTime(DateTimeFilter),
}

impl Filter {
    /// Create a basic comparison filter.
    pub fn basic(
        field: impl Into<String>,
        operator: BasicOperator,
        value: impl Into<String>,
    ) -> QueryResult<Self> {
        BasicFilter::new(field, operator, value).map(Filter::Basic)
    }

    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> QueryResult<Self> {
        Self::basic(field, BasicOperator::Equal, value)
    }

    /// Create an inclusive instant range filter.
    pub fn between(
        field: impl Into<String>,
        start: Timestamp,
        end: Timestamp,
    ) -> QueryResult<Self> {
        BetweenFilter::new(field, start, end).map(Filter::Between)
    }

    /// Create a membership filter.
    pub fn contains<I, S>(field: impl Into<String>, values: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContainsFilter::new(field, values).map(Filter::Contains)
    }

    /// Create a date-time comparison filter.
    pub fn date_time(
        field: impl Into<String>,
        operator: DateTimeOperator,
        value: Timestamp,
    ) -> QueryResult<Self> {
        DateTimeFilter::new(field, operator, value).map(Filter::DateTime)
    }

    pub fn filter_type(&self) -> FilterType {
        match self {
            Filter::Basic(_) => FilterType::Basic,
            Filter::Between(_) => FilterType::Between,
            Filter::Contains(_) => FilterType::Contains,
            Filter::DateTime(_) => FilterType::DateTime,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Basic(f) => f.field(),
            Filter::Between(f) => f.field(),
            Filter::Contains(f) => f.field(),
            Filter::DateTime(f) => f.field(),
        }
    }

    /// Canonical token of this filter's operator.
    pub fn operator_token(&self) -> &'static str {
        match self {
            Filter::Basic(f) => f.operator().as_str(),
            Filter::Between(f) => f.operator().as_str(),
            Filter::Contains(f) => f.operator().as_str(),
            Filter::DateTime(f) => f.operator().as_str(),
        }
    }

    /// Validate as a standalone payload whose violations were collected at `path`.
    pub(crate) fn settle(&self, path: &str, violations: Violations) -> QueryResult<()> {
        match self {
            Filter::Between(f) => f.settle(path, violations),
            _ => violations.into_result(),
        }
    }
}

impl Validate for Filter {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        match self {
            Filter::Basic(f) => f.validate_into(path, violations),
            Filter::Between(f) => f.validate_into(path, violations),
            Filter::Contains(f) => f.validate_into(path, violations),
            Filter::DateTime(f) => f.validate_into(path, violations),
        }
    }

    fn validate(&self) -> QueryResult<()> {
        let mut violations = Violations::new();
        self.validate_into("", &mut violations);
        self.settle("", violations)
    }
}

impl From<BasicFilter> for Filter {
    fn from(filter: BasicFilter) -> Self {
        Filter::Basic(filter)
    }
}

impl From<BetweenFilter> for Filter {
    fn from(filter: BetweenFilter) -> Self {
        Filter::Between(filter)
    }
}

impl From<ContainsFilter> for Filter {
    fn from(filter: ContainsFilter) -> Self {
        Filter::Contains(filter)
    }
}

impl From<DateTimeFilter> for Filter {
    fn from(filter: DateTimeFilter) -> Self {
        Filter::DateTime(filter)
    }
}
