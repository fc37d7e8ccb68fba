//! FILTERSPEC Test Utilities
//!
//! Shared test infrastructure for the filterspec workspace:
//! - Proptest generators for valid filters, criteria and paging
//! - Fixtures for common query shapes and their wire payloads
//! - Custom assertions for decode and validation outcomes

pub use filterspec_core::{
    BasicFilter, BasicOperator, BetweenFilter, ContainsFilter, Criteria, DateTimeFilter,
    DateTimeOperator, DecodeConfig, Filter, FilterType, JoinSpec, PageableCriteria, QueryError,
    QueryResult, SortSpec, Timestamp, ViolationKind, WireFormat,
};

use chrono::{TimeZone, Utc};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies that only produce values accepted by the
    //! validating constructors.

    use super::*;
    use proptest::prelude::*;

    /// Generate a field name, optionally dotted.
    pub fn arb_field_name() -> impl Strategy<Value = String> {
        "[A-Za-z_][A-Za-z0-9_]{0,11}(\\.[A-Za-z_][A-Za-z0-9_]{0,11}){0,2}"
    }

    /// Generate a non-blank operand string.
    pub fn arb_value() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 _:-]{0,15}[A-Za-z0-9]"
    }

    /// Generate a millisecond-precision Timestamp between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1_577_836_800_000i64..1_893_456_000_000i64).prop_map(|ms| {
            chrono::DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
        })
    }

    pub fn arb_basic_operator() -> impl Strategy<Value = BasicOperator> {
        proptest::sample::select(BasicOperator::ALL.to_vec())
    }

    pub fn arb_date_time_operator() -> impl Strategy<Value = DateTimeOperator> {
        proptest::sample::select(DateTimeOperator::ALL.to_vec())
    }

    pub fn arb_basic_filter() -> impl Strategy<Value = Filter> {
        (arb_field_name(), arb_basic_operator(), arb_value())
            .prop_filter_map("valid basic filter", |(field, op, value)| {
                Filter::basic(field, op, value).ok()
            })
    }

    /// Generate a between filter with `start <= end`.
    pub fn arb_between_filter() -> impl Strategy<Value = Filter> {
        (arb_field_name(), arb_timestamp(), arb_timestamp()).prop_filter_map(
            "valid between filter",
            |(field, a, b)| {
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                Filter::between(field, start, end).ok()
            },
        )
    }

    pub fn arb_contains_filter() -> impl Strategy<Value = Filter> {
        (arb_field_name(), prop::collection::vec(arb_value(), 1..5))
            .prop_filter_map("valid contains filter", |(field, values)| {
                Filter::contains(field, values).ok()
            })
    }

    pub fn arb_date_time_filter() -> impl Strategy<Value = Filter> {
        (arb_field_name(), arb_date_time_operator(), arb_timestamp())
            .prop_filter_map("valid datetime filter", |(field, op, value)| {
                Filter::date_time(field, op, value).ok()
            })
    }

    /// Generate any filter variant.
    pub fn arb_filter() -> impl Strategy<Value = Filter> {
        prop_oneof![
            arb_basic_filter(),
            arb_between_filter(),
            arb_contains_filter(),
            arb_date_time_filter(),
        ]
    }

    pub fn arb_join() -> impl Strategy<Value = JoinSpec> {
        (arb_field_name(), proptest::option::of(arb_filter()))
            .prop_filter_map("valid join", |(join, filter)| JoinSpec::new(join, filter).ok())
    }

    /// Generate a sort whose directions never share a field.
    pub fn arb_sort() -> impl Strategy<Value = SortSpec> {
        prop::collection::btree_set(arb_field_name(), 0..6)
            .prop_flat_map(|set| {
                let fields: Vec<String> = set.into_iter().collect();
                let n = fields.len();
                (Just(fields), 0..=n)
            })
            .prop_filter_map("disjoint sort", |(fields, split)| {
                let (ascending, descending) = fields.split_at(split);
                SortSpec::new(ascending.to_vec(), descending.to_vec()).ok()
            })
    }

    pub fn arb_criteria() -> impl Strategy<Value = Criteria> {
        (
            prop::collection::vec(arb_join(), 0..3),
            prop::collection::vec(arb_filter(), 0..4),
            proptest::option::of(arb_sort()),
        )
            .prop_filter_map("valid criteria", |(joins, filters, sort)| {
                Criteria::new(joins, filters, sort).ok()
            })
    }

    pub fn arb_pageable() -> impl Strategy<Value = PageableCriteria> {
        (arb_criteria(), 0u32..10_000, 1u32..=500)
            .prop_filter_map("valid pageable criteria", |(criteria, page, size)| {
                PageableCriteria::new(criteria, page, size).ok()
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common query shapes.

    use super::*;

    /// Midnight UTC on the given day.
    pub fn utc_date(year: i32, month: u32, day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn active_status_filter() -> Filter {
        Filter::eq("status", "ACTIVE").expect("fixture filter is valid")
    }

    pub fn created_in_january() -> Filter {
        let end = Utc
            .with_ymd_and_hms(2025, 1, 31, 23, 59, 59)
            .single()
            .unwrap_or_else(Utc::now);
        Filter::between("created_at", utc_date(2025, 1, 1), end).expect("fixture filter is valid")
    }

    pub fn open_or_pending() -> Filter {
        Filter::contains("status", ["OPEN", "PENDING"]).expect("fixture filter is valid")
    }

    pub fn updated_after_august() -> Filter {
        Filter::date_time("updated_at", DateTimeOperator::After, utc_date(2025, 8, 1))
            .expect("fixture filter is valid")
    }

    /// Criteria joining orders, filtering by status and sorting newest first.
    pub fn sample_criteria() -> Criteria {
        Criteria::builder()
            .join(JoinSpec::new("orders", Some(open_or_pending())).expect("fixture join is valid"))
            .filter(active_status_filter())
            .filter(created_in_january())
            .sort(SortSpec::new(["name"], ["created_at"]).expect("fixture sort is valid"))
            .build()
    }

    pub fn sample_pageable() -> PageableCriteria {
        PageableCriteria::new(sample_criteria(), 0, 20).expect("fixture paging is valid")
    }

    /// Wire form of a typical pageable request.
    pub const SAMPLE_PAGEABLE_JSON: &str = r#"{
        "filters": [
            {"type": "basic", "field": "age", "operator": "greater_than", "value": "30"},
            {"type": "contains", "field": "status", "operator": "in", "values": ["OPEN", "PENDING"]}
        ],
        "sort": {"ascending": ["name"]},
        "page": 0,
        "size": 20
    }"#;

    /// Decode payload shapes for every filter variant.
    pub fn sample_filter_payloads() -> Vec<serde_json::Value> {
        vec![
            serde_json::json!({"type": "basic", "field": "age", "operator": "greater_than", "value": "30"}),
            serde_json::json!({
                "type": "between",
                "field": "created_at",
                "operator": "between",
                "start_date_time": "2025-01-01T00:00:00.000Z",
                "end_date_time": "2025-01-31T23:59:59.999Z"
            }),
            serde_json::json!({"type": "contains", "field": "status", "operator": "in", "values": ["OPEN", "PENDING"]}),
            serde_json::json!({"type": "datetime", "field": "updated_at", "operator": "after", "value": "2025-08-01T00:00:00.000Z"}),
        ]
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over decode and validation outcomes.

    use super::*;

    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &QueryResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &QueryResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    /// Assert that a result is a Validation error with a `kind` violation at `path`.
    #[track_caller]
    pub fn assert_violation_at<T: std::fmt::Debug>(
        result: &QueryResult<T>,
        path: &str,
        kind: ViolationKind,
    ) {
        match result {
            Err(QueryError::Validation(errors)) => {
                assert!(
                    errors.violations().iter().any(|v| v.path == path && v.kind == kind),
                    "Expected {:?} violation at '{}', got: {}",
                    kind,
                    path,
                    errors
                );
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_invalid_range<T: std::fmt::Debug>(result: &QueryResult<T>) {
        match result {
            Err(QueryError::InvalidRange { start, end, .. }) => {
                assert!(start > end, "InvalidRange with ordered bounds {} .. {}", start, end);
            }
            other => panic!("Expected InvalidRange error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_missing_discriminator<T: std::fmt::Debug>(result: &QueryResult<T>, path: &str) {
        match result {
            Err(QueryError::MissingDiscriminator { path: p }) => {
                assert_eq!(p, path, "Wrong path in MissingDiscriminator error");
            }
            other => panic!("Expected MissingDiscriminator error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_unknown_operator<T: std::fmt::Debug>(
        result: &QueryResult<T>,
        path: &str,
        token: &str,
    ) {
        match result {
            Err(QueryError::UnknownOperator { path: p, token: t, .. }) => {
                assert_eq!(p, path, "Wrong path in UnknownOperator error");
                assert_eq!(t, token, "Wrong token in UnknownOperator error");
            }
            other => panic!("Expected UnknownOperator error for '{}', got: {:?}", token, other),
        }
    }

    #[track_caller]
    pub fn assert_malformed<T: std::fmt::Debug>(result: &QueryResult<T>) {
        match result {
            Err(QueryError::Malformed { .. }) => {}
            other => panic!("Expected Malformed error, got: {:?}", other),
        }
    }

    /// Assert that encoding then decoding `value` yields an equal value.
    #[track_caller]
    pub fn assert_wire_round_trip<T>(value: &T)
    where
        T: WireFormat + PartialEq + std::fmt::Debug,
    {
        let encoded = value.encode_string();
        match T::decode_str(&encoded) {
            Ok(decoded) => assert_eq!(&decoded, value, "Round trip changed value via {}", encoded),
            Err(e) => panic!("Encoded value failed to decode: {} ({})", e, encoded),
        }
    }
}
