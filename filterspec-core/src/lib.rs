//! FILTERSPEC Core - Query Criteria Schema
//!
//! Typed model of the criteria a client sends to ask for a filtered, sorted,
//! paginated result set: a closed union of filter variants, joins, sort and
//! paging, plus the JSON wire format those values travel in.
//!
//! Every value that exists has passed validation. Constructors validate, and
//! [`WireFormat`] decoding validates before returning. Execution against a
//! store belongs to the consumer.

use chrono::{DateTime, Utc};

pub mod config;
pub mod criteria;
pub mod error;
pub mod filter;
pub mod instant;
pub mod operator;
pub mod validation;
pub mod wire;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

pub use config::DecodeConfig;
pub use criteria::{Criteria, CriteriaBuilder, JoinSpec, PageableCriteria, SortSpec, MAX_PAGE_SIZE};
pub use error::{
    ConfigError, FilterTypeParseError, OperatorParseError, QueryError, QueryResult,
    ValidationErrors, Violation, ViolationKind,
};
pub use filter::{BasicFilter, BetweenFilter, ContainsFilter, DateTimeFilter, Filter};
pub use instant::{format_instant, parse_instant};
pub use operator::{BasicOperator, BetweenOperator, ContainsOperator, DateTimeOperator, FilterType};
pub use validation::{is_valid_field_name, Validate, Violations, FIELD_NAME_PATTERN};
pub use wire::WireFormat;
