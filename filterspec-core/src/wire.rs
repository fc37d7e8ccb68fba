//! JSON wire codec
//!
//! Decoding runs in two steps. Serde reads the payload into loosely typed
//! documents (every property optional, operators still raw tokens), then a
//! `Decoder` lowers the documents into schema values while recording
//! constraint violations with their paths.
//!
//! Structural problems stop decoding immediately: malformed JSON, a filter
//! without `type`, an unknown `type`, or an operator token outside the
//! variant's vocabulary. Everything else is accumulated and reported as one
//! [`QueryError::Validation`].
//!
//! Encoding is plain serde serialization of the schema types.

use crate::config::DecodeConfig;
use crate::criteria::{check_paging, Criteria, JoinSpec, PageableCriteria, SortSpec};
use crate::error::{OperatorParseError, QueryError, QueryResult, ViolationKind};
use crate::filter::{BasicFilter, BetweenFilter, ContainsFilter, DateTimeFilter, Filter};
use crate::instant;
use crate::operator::{
    BasicOperator, BetweenOperator, ContainsOperator, DateTimeOperator, FilterType,
};
use crate::validation::{child_path, index_path, Validate, Violations};
use crate::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

// ============================================================================
// WIRE DOCUMENTS
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilterDoc {
    #[serde(rename = "type")]
    kind: Option<Value>,
    field: Option<String>,
    operator: Option<String>,
    value: Option<Value>,
    values: Option<Vec<String>>,
    start_date_time: Option<Value>,
    end_date_time: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JoinDoc {
    join: Option<String>,
    filter: Option<FilterDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SortDoc {
    ascending: Option<Vec<String>>,
    descending: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CriteriaDoc {
    joins: Option<Vec<JoinDoc>>,
    filters: Option<Vec<FilterDoc>>,
    sort: Option<SortDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageableDoc {
    #[serde(flatten)]
    criteria: CriteriaDoc,
    page: Option<i64>,
    size: Option<i64>,
}

// ============================================================================
// LOWERING
// ============================================================================

/// Lowers wire documents into schema values for one decode call.
struct Decoder<'a> {
    config: &'a DecodeConfig,
    violations: Violations,
}

impl<'a> Decoder<'a> {
    fn new(config: &'a DecodeConfig) -> Self {
        Self {
            config,
            violations: Violations::new(),
        }
    }

    /// Parse an operator that must be present.
    fn operator<T>(&mut self, path: &str, token: Option<String>) -> QueryResult<Option<T>>
    where
        T: FromStr<Err = OperatorParseError>,
    {
        match self.violations.require_present(path, token) {
            Some(token) => parse_operator(path, &token).map(Some),
            None => Ok(None),
        }
    }

    /// Operators of single-operator variants may be omitted but must parse when present.
    fn fixed_operator<T>(&mut self, path: &str, token: Option<String>) -> QueryResult<()>
    where
        T: FromStr<Err = OperatorParseError>,
    {
        if let Some(token) = token {
            parse_operator::<T>(path, &token)?;
        }
        Ok(())
    }

    /// String operand; JSON numbers and booleans keep their textual form.
    fn scalar(&mut self, path: &str, value: Option<Value>) -> QueryResult<Option<String>> {
        match self.violations.require_present(path, value) {
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(QueryError::Malformed {
                reason: format!("{} must be a string", path),
            }),
            None => Ok(None),
        }
    }

    fn instant(&mut self, path: &str, value: Option<Value>) -> Option<Timestamp> {
        let value = self.violations.require_present(path, value)?;
        let parsed = value.as_str().and_then(instant::parse_instant);
        if parsed.is_none() {
            self.violations.push(
                path,
                ViolationKind::InvalidTimestamp,
                "must be an ISO-8601 timestamp with zone offset",
            );
        }
        parsed
    }

    fn filter(&mut self, doc: FilterDoc, path: &str) -> QueryResult<Option<Filter>> {
        let kind = doc.kind.ok_or_else(|| QueryError::MissingDiscriminator {
            path: path.to_string(),
        })?;
        let filter_type = kind
            .as_str()
            .and_then(|token| token.parse::<FilterType>().ok())
            .ok_or_else(|| QueryError::UnknownFilterType {
                path: path.to_string(),
                found: match &kind {
                    Value::String(token) => token.clone(),
                    other => other.to_string(),
                },
            })?;

        let field_path = child_path(path, "field");
        let operator_path = child_path(path, "operator");
        let field = self.violations.require_present(&field_path, doc.field);

        let filter: Option<Filter> = match filter_type {
            FilterType::Basic => {
                let operator = self.operator::<BasicOperator>(&operator_path, doc.operator)?;
                let value_path = child_path(path, "value");
                let value = self.scalar(&value_path, doc.value)?;
                match (field, operator, value) {
                    (Some(field), Some(operator), Some(value)) => {
                        Some(BasicFilter::from_parts(field, operator, value).into())
                    }
                    (field, _, value) => {
                        self.check_field(&field_path, field.as_deref());
                        if let Some(value) = value {
                            self.violations.require_non_blank(&value_path, &value);
                        }
                        None
                    }
                }
            }
            FilterType::Between => {
                self.fixed_operator::<BetweenOperator>(&operator_path, doc.operator)?;
                let start = self.instant(&child_path(path, "start_date_time"), doc.start_date_time);
                let end = self.instant(&child_path(path, "end_date_time"), doc.end_date_time);
                match (field, start, end) {
                    (Some(field), Some(start), Some(end)) => {
                        Some(BetweenFilter::from_parts(field, start, end).into())
                    }
                    (field, _, _) => {
                        self.check_field(&field_path, field.as_deref());
                        None
                    }
                }
            }
            FilterType::Contains => {
                self.fixed_operator::<ContainsOperator>(&operator_path, doc.operator)?;
                let values_path = child_path(path, "values");
                let values = self.violations.require_present(&values_path, doc.values);
                if let Some(values) = &values {
                    self.violations.require_at_most(
                        &values_path,
                        values.len(),
                        self.config.max_contains_values,
                    );
                }
                match (field, values) {
                    (Some(field), Some(values)) => {
                        Some(ContainsFilter::from_parts(field, values).into())
                    }
                    (field, values) => {
                        self.check_field(&field_path, field.as_deref());
                        if let Some(values) = values {
                            self.violations.require_non_empty(&values_path, &values);
                        }
                        None
                    }
                }
            }
            FilterType::DateTime => {
                let operator = self.operator::<DateTimeOperator>(&operator_path, doc.operator)?;
                let value = self.instant(&child_path(path, "value"), doc.value);
                match (field, operator, value) {
                    (Some(field), Some(operator), Some(value)) => {
                        Some(DateTimeFilter::from_parts(field, operator, value).into())
                    }
                    (field, _, _) => {
                        self.check_field(&field_path, field.as_deref());
                        None
                    }
                }
            }
        };

        if let Some(filter) = &filter {
            filter.validate_into(path, &mut self.violations);
        }
        Ok(filter)
    }

    /// Field checks for a filter that could not be assembled.
    fn check_field(&mut self, path: &str, field: Option<&str>) {
        if let Some(field) = field {
            self.violations.require_field_name(path, field);
        }
    }

    fn join(&mut self, doc: JoinDoc, path: &str) -> QueryResult<Option<JoinSpec>> {
        let join_path = child_path(path, "join");
        let join = self.violations.require_present(&join_path, doc.join);
        if let Some(join) = &join {
            self.violations.require_non_blank(&join_path, join);
        }
        let filter = match doc.filter {
            Some(filter) => self.filter(filter, &child_path(path, "filter"))?,
            None => None,
        };
        Ok(join.map(|join| JoinSpec::from_parts(join, filter)))
    }

    fn sort(&mut self, doc: SortDoc, path: &str) -> SortSpec {
        let sort = SortSpec::from_parts(
            doc.ascending.unwrap_or_default(),
            doc.descending.unwrap_or_default(),
        );
        let max = self.config.max_sort_fields;
        self.violations
            .require_at_most(&child_path(path, "ascending"), sort.ascending().len(), max);
        self.violations
            .require_at_most(&child_path(path, "descending"), sort.descending().len(), max);
        sort.validate_into(path, &mut self.violations);
        sort
    }

    fn criteria(&mut self, doc: CriteriaDoc, path: &str) -> QueryResult<Criteria> {
        let joins_path = child_path(path, "joins");
        let join_docs = doc.joins.unwrap_or_default();
        self.violations
            .require_at_most(&joins_path, join_docs.len(), self.config.max_joins);
        let mut joins = Vec::with_capacity(join_docs.len());
        for (i, join) in join_docs.into_iter().enumerate() {
            if let Some(join) = self.join(join, &index_path(&joins_path, i))? {
                joins.push(join);
            }
        }

        let filters_path = child_path(path, "filters");
        let filter_docs = doc.filters.unwrap_or_default();
        self.violations
            .require_at_most(&filters_path, filter_docs.len(), self.config.max_filters);
        let mut filters = Vec::with_capacity(filter_docs.len());
        for (i, filter) in filter_docs.into_iter().enumerate() {
            if let Some(filter) = self.filter(filter, &index_path(&filters_path, i))? {
                filters.push(filter);
            }
        }

        let sort = doc.sort.map(|sort| self.sort(sort, &child_path(path, "sort")));
        Ok(Criteria::from_parts(joins, filters, sort))
    }

    fn pageable(&mut self, doc: PageableDoc) -> QueryResult<PageableCriteria> {
        let criteria = self.criteria(doc.criteria, "")?;
        check_paging(
            "",
            doc.page,
            doc.size,
            self.config.page_size_limit(),
            &mut self.violations,
        );
        let page = doc.page.and_then(|p| u32::try_from(p).ok()).unwrap_or_default();
        let size = doc.size.and_then(|s| u32::try_from(s).ok()).unwrap_or_default();
        Ok(PageableCriteria::from_parts(criteria, page, size))
    }

    fn finish<T>(self, value: T) -> QueryResult<T> {
        self.violations.into_result().map(|()| value)
    }
}

fn parse_operator<T>(path: &str, token: &str) -> QueryResult<T>
where
    T: FromStr<Err = OperatorParseError>,
{
    token.parse::<T>().map_err(|err| QueryError::UnknownOperator {
        path: path.to_string(),
        filter_type: err.filter_type,
        token: err.token,
    })
}

fn read_doc<D: DeserializeOwned>(bytes: &[u8]) -> QueryResult<D> {
    Ok(serde_json::from_slice(bytes)?)
}

fn read_doc_value<D: DeserializeOwned>(value: Value) -> QueryResult<D> {
    Ok(serde_json::from_value(value)?)
}

fn logged<T>(payload: &'static str, result: QueryResult<T>) -> QueryResult<T> {
    match &result {
        Ok(_) => tracing::trace!(payload, "decoded payload"),
        Err(QueryError::Validation(errors)) => tracing::debug!(
            payload,
            violations = errors.len(),
            "rejected payload: {}",
            errors
        ),
        Err(err) => tracing::debug!(payload, error = %err, "rejected payload"),
    }
    result
}

fn lower_filter(doc: FilterDoc, config: &DecodeConfig) -> QueryResult<Filter> {
    let mut decoder = Decoder::new(config);
    let filter = decoder.filter(doc, "")?;
    match filter {
        Some(filter) => filter.settle("", decoder.violations).map(|()| filter),
        None => Err(QueryError::Validation(decoder.violations.into_errors())),
    }
}

fn lower_criteria(doc: CriteriaDoc, config: &DecodeConfig) -> QueryResult<Criteria> {
    let mut decoder = Decoder::new(config);
    let criteria = decoder.criteria(doc, "")?;
    decoder.finish(criteria)
}

fn lower_pageable(doc: PageableDoc, config: &DecodeConfig) -> QueryResult<PageableCriteria> {
    let mut decoder = Decoder::new(config);
    let pageable = decoder.pageable(doc)?;
    decoder.finish(pageable)
}

// ============================================================================
// PUBLIC CODEC
// ============================================================================

/// JSON encode/decode for the top-level schema values.
///
/// Decoding yields a fully validated value or the first structural error /
/// the aggregated violations. Encoding never fails.
pub trait WireFormat: Serialize + Sized {
    fn decode_with(bytes: &[u8], config: &DecodeConfig) -> QueryResult<Self>;

    fn decode_value_with(value: Value, config: &DecodeConfig) -> QueryResult<Self>;

    fn decode(bytes: &[u8]) -> QueryResult<Self> {
        Self::decode_with(bytes, &DecodeConfig::default())
    }

    fn decode_str(s: &str) -> QueryResult<Self> {
        Self::decode(s.as_bytes())
    }

    fn decode_value(value: Value) -> QueryResult<Self> {
        Self::decode_value_with(value, &DecodeConfig::default())
    }

    fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("schema values always serialize")
    }

    fn encode_string(&self) -> String {
        serde_json::to_string(self).expect("schema values always serialize")
    }

    fn encode_value(&self) -> Value {
        serde_json::to_value(self).expect("schema values always serialize")
    }
}

impl WireFormat for Filter {
    fn decode_with(bytes: &[u8], config: &DecodeConfig) -> QueryResult<Self> {
        logged("filter", read_doc(bytes).and_then(|doc| lower_filter(doc, config)))
    }

    fn decode_value_with(value: Value, config: &DecodeConfig) -> QueryResult<Self> {
        logged("filter", read_doc_value(value).and_then(|doc| lower_filter(doc, config)))
    }
}

impl WireFormat for Criteria {
    fn decode_with(bytes: &[u8], config: &DecodeConfig) -> QueryResult<Self> {
        logged("criteria", read_doc(bytes).and_then(|doc| lower_criteria(doc, config)))
    }

    fn decode_value_with(value: Value, config: &DecodeConfig) -> QueryResult<Self> {
        logged("criteria", read_doc_value(value).and_then(|doc| lower_criteria(doc, config)))
    }
}

impl WireFormat for PageableCriteria {
    fn decode_with(bytes: &[u8], config: &DecodeConfig) -> QueryResult<Self> {
        logged("pageable_criteria", read_doc(bytes).and_then(|doc| lower_pageable(doc, config)))
    }

    fn decode_value_with(value: Value, config: &DecodeConfig) -> QueryResult<Self> {
        logged(
            "pageable_criteria",
            read_doc_value(value).and_then(|doc| lower_pageable(doc, config)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_discriminator() {
        let err =
            Filter::decode_str(r#"{"field":"x","operator":"equal","value":"1"}"#).unwrap_err();
        assert_eq!(
            err,
            QueryError::MissingDiscriminator {
                path: String::new()
            }
        );
    }

    #[test]
    fn test_unknown_filter_type() {
        let err = Filter::decode_str(r#"{"type":"regex","field":"x"}"#).unwrap_err();
        assert!(matches!(err, QueryError::UnknownFilterType { ref found, .. } if found == "regex"));
    }

    #[test]
    fn test_non_string_discriminator_is_unknown_type() {
        let err = Filter::decode_str(r#"{"type":5,"field":"x"}"#).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownFilterType {
                path: String::new(),
                found: "5".to_string(),
            }
        );

        let err = Criteria::decode_value(json!({"filters": [{"type": ["basic"]}]})).unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnknownFilterType { ref path, .. } if path == "filters[0]"
        ));

        let err = Filter::decode_str(r#"{"type":null,"field":"x"}"#).unwrap_err();
        assert!(matches!(err, QueryError::MissingDiscriminator { .. }));
    }

    #[test]
    fn test_raised_page_size_cap_is_clamped() {
        let config = DecodeConfig::default().with_max_page_size(1000);
        let err = PageableCriteria::decode_with(br#"{"page":0,"size":800}"#, &config).unwrap_err();
        let violations = err.violations().unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "size");
        assert_eq!(violations[0].message, "must be between 1 and 500");

        let pageable = PageableCriteria::decode_with(br#"{"page":0,"size":500}"#, &config).unwrap();
        assert!(pageable.validate().is_ok());
    }

    #[test]
    fn test_empty_sort_decodes_as_absent() {
        let criteria = Criteria::decode_str(r#"{"sort":{"ascending":[]}}"#).unwrap();
        assert!(criteria.sort().is_none());
        assert_eq!(criteria.encode_string(), "{}");
    }

    #[test]
    fn test_unknown_operator_carries_path() {
        let payload = json!({
            "filters": [
                {"type":"basic","field":"a","operator":"equal","value":"1"},
                {"type":"basic","field":"b","operator":"like","value":"2"}
            ]
        });
        let err = Criteria::decode_value(payload).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownOperator {
                path: "filters[1].operator".to_string(),
                filter_type: FilterType::Basic,
                token: "like".to_string(),
            }
        );
    }

    #[test]
    fn test_operator_tokens_are_lenient_on_decode() {
        let filter = Filter::decode_str(
            r#"{"type":"datetime","field":"updated_at","operator":" AFTER_OR_EQUAL ","value":"2025-08-01T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(filter.operator_token(), "after_or_equal");
        assert!(filter.encode_string().contains(r#""operator":"after_or_equal""#));
    }

    #[test]
    fn test_fixed_operator_may_be_omitted() {
        let filter =
            Filter::decode_str(r#"{"type":"contains","field":"status","values":["OPEN"]}"#)
                .unwrap();
        assert_eq!(
            filter.encode_value(),
            json!({"type":"contains","field":"status","operator":"in","values":["OPEN"]})
        );

        let err = Filter::decode_str(
            r#"{"type":"contains","field":"status","operator":"equal","values":["OPEN"]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnknownOperator { filter_type: FilterType::Contains, .. }
        ));
    }

    #[test]
    fn test_standalone_between_reports_invalid_range() {
        let err = Filter::decode_value(json!({
            "type": "between",
            "field": "created_at",
            "start_date_time": "2025-01-31T00:00:00.000Z",
            "end_date_time": "2025-01-01T00:00:00.000Z"
        }))
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidRange { .. }));

        let ok = Filter::decode_value(json!({
            "type": "between",
            "field": "created_at",
            "start_date_time": "2025-01-01T00:00:00.000Z",
            "end_date_time": "2025-01-31T00:00:00.000Z"
        }));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_criteria_range_violation_is_aggregated() {
        let err = Criteria::decode_value(json!({
            "filters": [{
                "type": "between",
                "field": "created_at",
                "start_date_time": "2025-01-31T00:00:00.000Z",
                "end_date_time": "2025-01-01T00:00:00.000Z"
            }],
            "sort": {"ascending": ["a", "b"], "descending": ["b"]}
        }))
        .unwrap_err();
        let violations = err.violations().unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].path, "filters[0]");
        assert_eq!(violations[0].kind, ViolationKind::InvalidRange);
        assert_eq!(violations[1].path, "sort");
        assert_eq!(violations[1].kind, ViolationKind::NotDisjoint);
    }

    #[test]
    fn test_missing_operands_are_required_violations() {
        let err = Criteria::decode_value(json!({
            "filters": [
                {"type": "basic", "field": "bad field", "value": " "},
                {"type": "datetime", "field": "at", "operator": "before", "value": "not a date"}
            ],
            "joins": [{"filter": {"type": "contains", "field": "tags", "values": []}}]
        }))
        .unwrap_err();
        let violations = err.violations().unwrap();
        let found: Vec<_> = violations.iter().map(|v| (v.path.as_str(), v.kind)).collect();
        assert_eq!(
            found,
            vec![
                ("joins[0].join", ViolationKind::Required),
                ("joins[0].filter.values", ViolationKind::Empty),
                ("filters[0].operator", ViolationKind::Required),
                ("filters[0].field", ViolationKind::Pattern),
                ("filters[0].value", ViolationKind::Blank),
                ("filters[1].value", ViolationKind::InvalidTimestamp),
            ]
        );
    }

    #[test]
    fn test_basic_value_coerces_scalars() {
        let filter = Filter::decode_str(
            r#"{"type":"basic","field":"age","operator":"greater_than","value":30}"#,
        )
        .unwrap();
        match filter {
            Filter::Basic(basic) => assert_eq!(basic.value(), "30"),
            other => panic!("Expected basic filter, got: {:?}", other),
        }

        let err =
            Filter::decode_str(r#"{"type":"basic","field":"age","operator":"equal","value":[1]}"#)
                .unwrap_err();
        assert!(matches!(err, QueryError::Malformed { .. }));
    }

    #[test]
    fn test_instants_accept_any_offset() {
        let filter = Filter::decode_str(
            r#"{"type":"datetime","field":"at","operator":"equal","value":"2025-01-01T05:30:00.000+05:30"}"#,
        )
        .unwrap();
        assert!(filter.encode_string().contains("2025-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_malformed_json() {
        let err = Criteria::decode(b"{\"filters\": [").unwrap_err();
        assert!(matches!(err, QueryError::Malformed { .. }));

        let err = Criteria::decode_str(r#"{"filters": "basic"}"#).unwrap_err();
        assert!(matches!(err, QueryError::Malformed { .. }));
    }

    #[test]
    fn test_pageable_bounds() {
        let decode = |page: i64, size: i64| {
            PageableCriteria::decode_value(json!({"page": page, "size": size}))
        };
        assert!(decode(0, 1).is_ok());
        assert!(decode(0, 500).is_ok());

        let err = decode(-1, 10).unwrap_err();
        assert_eq!(err.violations().unwrap()[0].path, "page");
        for size in [0, 501] {
            let err = decode(0, size).unwrap_err();
            assert_eq!(err.violations().unwrap()[0].path, "size");
        }
    }

    #[test]
    fn test_pageable_requires_page_and_size() {
        let err = PageableCriteria::decode_str("{}").unwrap_err();
        let paths: Vec<_> = err.violations().unwrap().iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["page", "size"]);
    }

    #[test]
    fn test_config_limits() {
        let config = DecodeConfig::default()
            .with_max_filters(1)
            .with_max_contains_values(2)
            .with_max_page_size(50);
        let payload = json!({
            "filters": [
                {"type": "contains", "field": "s", "values": ["a", "b", "c"]},
                {"type": "basic", "field": "t", "operator": "equal", "value": "x"}
            ],
            "page": 0,
            "size": 51
        });
        let err = PageableCriteria::decode_value_with(payload, &config).unwrap_err();
        let found: Vec<_> = err
            .violations()
            .unwrap()
            .iter()
            .map(|v| (v.path.as_str(), v.kind))
            .collect();
        assert_eq!(
            found,
            vec![
                ("filters", ViolationKind::TooMany),
                ("filters[0].values", ViolationKind::TooMany),
                ("size", ViolationKind::OutOfBounds),
            ]
        );
    }

    #[test]
    fn test_property_order_independent() {
        let a = Filter::decode_str(r#"{"value":"1","operator":"equal","field":"x","type":"basic"}"#)
            .unwrap();
        let b = Filter::decode_str(r#"{"type":"basic","field":"x","operator":"equal","value":"1"}"#)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.encode_string(),
            r#"{"type":"basic","field":"x","operator":"equal","value":"1"}"#
        );
    }
}
