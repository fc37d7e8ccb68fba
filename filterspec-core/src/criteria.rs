//! Criteria envelope: joins, filters, sort, and paging.

use crate::error::{QueryResult, ViolationKind};
use crate::filter::Filter;
use crate::validation::{child_path, index_path, Validate, Violations};
use serde::Serialize;
use std::collections::HashSet;

/// Largest page size a [`PageableCriteria`] may request.
pub const MAX_PAGE_SIZE: u32 = 500;

// ============================================================================
// JOIN SPEC
// ============================================================================

/// Join path paired with an optional filter applied inside the joined scope.
///
/// The path is opaque here; the query executor resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JoinSpec {
    join: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
}

impl JoinSpec {
    pub fn new(join: impl Into<String>, filter: Option<Filter>) -> QueryResult<Self> {
        let spec = Self::from_parts(join.into(), filter);
        spec.validate()?;
        Ok(spec)
    }

    pub(crate) fn from_parts(join: String, filter: Option<Filter>) -> Self {
        Self { join, filter }
    }

    pub fn join(&self) -> &str {
        &self.join
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }
}

impl Validate for JoinSpec {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        violations.require_non_blank(&child_path(path, "join"), &self.join);
        self.filter
            .validate_into(&child_path(path, "filter"), violations);
    }
}

// ============================================================================
// SORT SPEC
// ============================================================================

/// Ascending and descending field lists; earlier entries take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SortSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ascending: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    descending: Vec<String>,
}

impl SortSpec {
    pub fn new<A, D>(ascending: A, descending: D) -> QueryResult<Self>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        let spec = Self::from_parts(
            ascending.into_iter().map(Into::into).collect(),
            descending.into_iter().map(Into::into).collect(),
        );
        spec.validate()?;
        Ok(spec)
    }

    pub fn by_ascending<I, S>(fields: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(fields, Vec::<String>::new())
    }

    pub fn by_descending<I, S>(fields: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Vec::<String>::new(), fields)
    }

    pub(crate) fn from_parts(ascending: Vec<String>, descending: Vec<String>) -> Self {
        Self {
            ascending,
            descending,
        }
    }

    pub fn ascending(&self) -> &[String] {
        &self.ascending
    }

    pub fn descending(&self) -> &[String] {
        &self.descending
    }

    pub fn is_empty(&self) -> bool {
        self.ascending.is_empty() && self.descending.is_empty()
    }

    /// Fields listed in both directions, in descending-list order.
    pub fn overlap(&self) -> Vec<&str> {
        let ascending: HashSet<&str> = self.ascending.iter().map(String::as_str).collect();
        self.descending
            .iter()
            .map(String::as_str)
            .filter(|field| ascending.contains(field))
            .collect()
    }

    pub fn is_disjoint(&self) -> bool {
        self.overlap().is_empty()
    }
}

impl Validate for SortSpec {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        for (name, fields) in [("ascending", &self.ascending), ("descending", &self.descending)] {
            let list_path = child_path(path, name);
            for (i, field) in fields.iter().enumerate() {
                violations.require_field_name(&index_path(&list_path, i), field);
            }
        }

        let overlap = self.overlap();
        if !overlap.is_empty() {
            violations.push(
                path,
                ViolationKind::NotDisjoint,
                format!(
                    "ascending and descending must be disjoint, both contain: {}",
                    overlap.join(", ")
                ),
            );
        }
    }
}

// ============================================================================
// CRITERIA
// ============================================================================

/// Joins, filters, and sort handed to a query executor.
///
/// How multiple filters combine is decided by the executor; this type only
/// preserves their order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Criteria {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    joins: Vec<JoinSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    filters: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<SortSpec>,
}

impl Criteria {
    pub fn new(
        joins: Vec<JoinSpec>,
        filters: Vec<Filter>,
        sort: Option<SortSpec>,
    ) -> QueryResult<Self> {
        let criteria = Self::from_parts(joins, filters, sort);
        criteria.validate()?;
        Ok(criteria)
    }

    /// An empty sort is stored as no sort.
    pub(crate) fn from_parts(
        joins: Vec<JoinSpec>,
        filters: Vec<Filter>,
        sort: Option<SortSpec>,
    ) -> Self {
        Self {
            joins,
            filters,
            sort: sort.filter(|sort| !sort.is_empty()),
        }
    }

    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::default()
    }

    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// True when the criteria constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty() && self.filters.is_empty() && self.sort.is_none()
    }

    pub fn into_parts(self) -> (Vec<JoinSpec>, Vec<Filter>, Option<SortSpec>) {
        (self.joins, self.filters, self.sort)
    }
}

impl Validate for Criteria {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        self.joins
            .validate_into(&child_path(path, "joins"), violations);
        self.filters
            .validate_into(&child_path(path, "filters"), violations);
        self.sort.validate_into(&child_path(path, "sort"), violations);
    }
}

/// Fluent assembly of a [`Criteria`] from already-validated parts.
#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
    joins: Vec<JoinSpec>,
    filters: Vec<Filter>,
    sort: Option<SortSpec>,
}

impl CriteriaBuilder {
    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = Filter>,
    {
        self.filters.extend(filters);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn build(self) -> Criteria {
        Criteria::from_parts(self.joins, self.filters, self.sort)
    }

    /// Finish as a [`PageableCriteria`], validating the paging bounds.
    pub fn paged(self, page: u32, size: u32) -> QueryResult<PageableCriteria> {
        PageableCriteria::new(self.build(), page, size)
    }
}

// ============================================================================
// PAGEABLE CRITERIA
// ============================================================================

/// Record presence and bound violations for `page` and `size` under `path`.
pub(crate) fn check_paging(
    path: &str,
    page: Option<i64>,
    size: Option<i64>,
    max_size: u32,
    violations: &mut Violations,
) {
    let page_path = child_path(path, "page");
    if let Some(page) = violations.require_present(&page_path, page) {
        violations.require_within(&page_path, page, 0, i64::from(u32::MAX));
    }
    let size_path = child_path(path, "size");
    if let Some(size) = violations.require_present(&size_path, size) {
        violations.require_within(&size_path, size, 1, i64::from(max_size));
    }
}

/// Criteria with zero-based page index and bounded page size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PageableCriteria {
    #[serde(flatten)]
    criteria: Criteria,
    page: u32,
    size: u32,
}

impl PageableCriteria {
    pub fn new(criteria: Criteria, page: u32, size: u32) -> QueryResult<Self> {
        let pageable = Self::from_parts(criteria, page, size);
        pageable.validate()?;
        Ok(pageable)
    }

    pub(crate) fn from_parts(criteria: Criteria, page: u32, size: u32) -> Self {
        Self {
            criteria,
            page,
            size,
        }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn joins(&self) -> &[JoinSpec] {
        self.criteria.joins()
    }

    pub fn filters(&self) -> &[Filter] {
        self.criteria.filters()
    }

    /// Sort applied to the paged result set.
    pub fn sort(&self) -> Option<&SortSpec> {
        self.criteria.sort()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Index of the first row on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn into_criteria(self) -> Criteria {
        self.criteria
    }
}

impl AsRef<Criteria> for PageableCriteria {
    fn as_ref(&self) -> &Criteria {
        &self.criteria
    }
}

impl Validate for PageableCriteria {
    fn validate_into(&self, path: &str, violations: &mut Violations) {
        self.criteria.validate_into(path, violations);
        check_paging(
            path,
            Some(i64::from(self.page)),
            Some(i64::from(self.size)),
            MAX_PAGE_SIZE,
            violations,
        );
    }
}
