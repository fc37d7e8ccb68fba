//! Decode scenarios for payloads a request layer typically receives.

use chrono::{TimeZone, Utc};
use filterspec_core::{
    BasicOperator, Criteria, DateTimeOperator, DecodeConfig, Filter, PageableCriteria,
    QueryError, SortSpec, Validate, ViolationKind, WireFormat, MAX_PAGE_SIZE,
};
use filterspec_test_utils::{assertions, fixtures};
use serde_json::json;

#[test]
fn test_missing_type_fails_with_missing_discriminator() {
    let result = Filter::decode_str(r#"{"field":"x","operator":"equal","value":"1"}"#);
    assertions::assert_missing_discriminator(&result, "");

    let payload = json!({"joins": [{"join": "orders", "filter": {"field": "x"}}]});
    let result = Criteria::decode_value(payload);
    assertions::assert_missing_discriminator(&result, "joins[0].filter");
}

#[test]
fn test_unknown_operator_is_rejected() {
    let result =
        Filter::decode_str(r#"{"type":"basic","field":"x","operator":"like","value":"1"}"#);
    assertions::assert_unknown_operator(&result, "operator", "like");

    let result = Filter::decode_value(json!({
        "type": "datetime",
        "field": "x",
        "operator": "greater_than",
        "value": "2025-01-01T00:00:00Z"
    }));
    assertions::assert_unknown_operator(&result, "operator", "greater_than");
}

#[test]
fn test_operator_case_and_whitespace() {
    let parsed: BasicOperator = " Equal ".parse().unwrap();
    assert_eq!(parsed, BasicOperator::Equal);
    assert_eq!("equal".parse::<BasicOperator>().unwrap(), parsed);
}

#[test]
fn test_field_pattern() {
    assertions::assert_ok(&Filter::eq("customer.address_1", "x"));
    let result = Filter::eq("customer address", "x");
    assertions::assert_violation_at(&result, "field", ViolationKind::Pattern);
}

#[test]
fn test_between_range() {
    let inverted = json!({
        "type": "between",
        "field": "created_at",
        "start_date_time": "2025-01-31T00:00:00.000Z",
        "end_date_time": "2025-01-01T00:00:00.000Z"
    });
    assertions::assert_invalid_range(&Filter::decode_value(inverted));

    let ordered = json!({
        "type": "between",
        "field": "created_at",
        "start_date_time": "2025-01-01T00:00:00.000Z",
        "end_date_time": "2025-01-31T00:00:00.000Z"
    });
    assertions::assert_ok(&Filter::decode_value(ordered));
}

#[test]
fn test_sort_disjointness() {
    let result = SortSpec::new(["a", "b"], ["b"]);
    assertions::assert_violation_at(&result, "", ViolationKind::NotDisjoint);
    assertions::assert_ok(&SortSpec::new(["a"], ["b"]));
}

#[test]
fn test_contains_values() {
    let empty = json!({"type": "contains", "field": "status", "operator": "in", "values": []});
    assertions::assert_violation_at(&Filter::decode_value(empty), "values", ViolationKind::Empty);

    let one = json!({"type": "contains", "field": "status", "operator": "in", "values": ["OPEN"]});
    assertions::assert_ok(&Filter::decode_value(one));
}

#[test]
fn test_paging_bounds() {
    let decode =
        |page: i64, size: i64| PageableCriteria::decode_value(json!({"page": page, "size": size}));

    assertions::assert_violation_at(&decode(-1, 10), "page", ViolationKind::OutOfBounds);
    assertions::assert_violation_at(&decode(0, 0), "size", ViolationKind::OutOfBounds);
    assertions::assert_violation_at(&decode(0, 501), "size", ViolationKind::OutOfBounds);
    assertions::assert_ok(&decode(0, 500));
    assertions::assert_ok(&decode(0, 1));
}

#[test]
fn test_sparse_criteria_encoding() {
    let criteria = Criteria::builder()
        .filter(fixtures::active_status_filter())
        .build();
    let encoded = criteria.encode_string();
    assert!(!encoded.contains("joins"));
    assert!(!encoded.contains("sort"));
    assert!(!encoded.contains("null"));
}

#[test]
fn test_sample_request_decodes() {
    let pageable = PageableCriteria::decode_str(fixtures::SAMPLE_PAGEABLE_JSON).unwrap();
    assert_eq!(pageable.page(), 0);
    assert_eq!(pageable.size(), 20);
    assert_eq!(pageable.filters()[0].operator_token(), "greater_than");
    assert_eq!(pageable.sort().map(SortSpec::ascending), Some(&["name".to_string()][..]));
}

#[test]
fn test_violations_aggregate_across_payload() {
    let payload = json!({
        "joins": [{"join": " "}],
        "filters": [
            {"type": "basic", "field": "age", "operator": "equal", "value": ""},
            {"type": "contains", "field": "tags", "values": []}
        ],
        "sort": {"ascending": ["name"], "descending": ["name"]},
        "page": -3,
        "size": 10
    });
    let err = PageableCriteria::decode_value(payload).unwrap_err();
    let paths: Vec<_> = err.violations().unwrap().iter().map(|v| v.path.clone()).collect();
    assert_eq!(
        paths,
        vec!["joins[0].join", "filters[0].value", "filters[1].values", "sort", "page"]
    );
    assert!(err.to_string().contains("5 constraint violation(s)"));
}

#[test]
fn test_tightened_page_size() {
    let config = DecodeConfig::default().with_max_page_size(50);
    let result = PageableCriteria::decode_with(br#"{"page":0,"size":100}"#, &config);
    assertions::assert_violation_at(&result, "size", ViolationKind::OutOfBounds);
    assertions::assert_ok(&PageableCriteria::decode(br#"{"page":0,"size":100}"#));
}

#[test]
fn test_non_object_payload_is_malformed() {
    assertions::assert_malformed(&Criteria::decode_str("\"filters\""));
    assertions::assert_malformed(&PageableCriteria::decode_str(r#"{"page":"zero","size":1}"#));
    assert!(matches!(Filter::decode_str("42"), Err(QueryError::Malformed { .. })));
}

#[test]
fn test_configured_page_size_never_exceeds_schema_bound() {
    for max_page_size in [MAX_PAGE_SIZE + 1, 1000, u32::MAX] {
        let config = DecodeConfig::default().with_max_page_size(max_page_size);
        assert!(config.validate().is_err());
        assert_eq!(config.page_size_limit(), MAX_PAGE_SIZE);

        let result = PageableCriteria::decode_with(br#"{"page":0,"size":800}"#, &config);
        assertions::assert_violation_at(&result, "size", ViolationKind::OutOfBounds);

        let accepted = PageableCriteria::decode_with(br#"{"page":1,"size":500}"#, &config).unwrap();
        assert!(accepted.validate().is_ok());
        assertions::assert_wire_round_trip(&accepted);
    }
}

#[test]
fn test_instants_without_four_digit_year_never_encode() {
    let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
    let result = Filter::date_time("at", DateTimeOperator::Equal, far);
    assertions::assert_violation_at(&result, "value", ViolationKind::InvalidTimestamp);

    let early = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let result = Filter::between("created_at", early, far);
    assertions::assert_violation_at(&result, "end_date_time", ViolationKind::InvalidTimestamp);

    let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
    let filter = Filter::date_time("at", DateTimeOperator::Before, last).unwrap();
    assertions::assert_wire_round_trip(&filter);
}

#[test]
fn test_non_string_type_is_unknown_filter_type() {
    let result = Filter::decode_value(json!({"type": 5, "field": "x"}));
    assert!(matches!(result, Err(QueryError::UnknownFilterType { ref found, .. }) if found == "5"));
}

#[test]
fn test_empty_sort_is_not_encoded() {
    let criteria = Criteria::builder()
        .filter(fixtures::active_status_filter())
        .sort(SortSpec::default())
        .build();
    assert!(!criteria.encode_string().contains("sort"));
    assertions::assert_wire_round_trip(&criteria);
}
