//! Decode configuration

use crate::criteria::MAX_PAGE_SIZE;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Limits applied while decoding wire payloads.
///
/// Defaults reproduce the schema's own bounds and leave collection sizes
/// uncapped. Deployments may tighten `max_page_size` but never raise it above
/// [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DecodeConfig {
    pub max_page_size: u32,
    pub max_filters: Option<usize>,
    pub max_joins: Option<usize>,
    /// Cap on the `values` list of a single contains filter
    pub max_contains_values: Option<usize>,
    /// Cap on each of the ascending and descending lists
    pub max_sort_fields: Option<usize>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_page_size: MAX_PAGE_SIZE,
            max_filters: None,
            max_joins: None,
            max_contains_values: None,
            max_sort_fields: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

impl DecodeConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `FILTERSPEC_MAX_PAGE_SIZE`: Largest accepted page size (default: 500)
    /// - `FILTERSPEC_MAX_FILTERS`: Maximum top-level filters (default: unbounded)
    /// - `FILTERSPEC_MAX_JOINS`: Maximum joins (default: unbounded)
    /// - `FILTERSPEC_MAX_CONTAINS_VALUES`: Maximum values per contains filter (default: unbounded)
    /// - `FILTERSPEC_MAX_SORT_FIELDS`: Maximum fields per sort direction (default: unbounded)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_page_size = env_parse::<u32>("FILTERSPEC_MAX_PAGE_SIZE")
            .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
            .unwrap_or(defaults.max_page_size);

        Self {
            max_page_size,
            max_filters: env_parse("FILTERSPEC_MAX_FILTERS").or(defaults.max_filters),
            max_joins: env_parse("FILTERSPEC_MAX_JOINS").or(defaults.max_joins),
            max_contains_values: env_parse("FILTERSPEC_MAX_CONTAINS_VALUES")
                .or(defaults.max_contains_values),
            max_sort_fields: env_parse("FILTERSPEC_MAX_SORT_FIELDS").or(defaults.max_sort_fields),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - max_page_size in [1, 500]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 || self.max_page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "max_page_size".to_string(),
                value: self.max_page_size.to_string(),
                reason: format!("max_page_size must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }

        Ok(())
    }

    /// Largest page size decoding accepts; never above [`MAX_PAGE_SIZE`].
    pub fn page_size_limit(&self) -> u32 {
        self.max_page_size.min(MAX_PAGE_SIZE)
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn with_max_filters(mut self, max: usize) -> Self {
        self.max_filters = Some(max);
        self
    }

    pub fn with_max_joins(mut self, max: usize) -> Self {
        self.max_joins = Some(max);
        self
    }

    pub fn with_max_contains_values(mut self, max: usize) -> Self {
        self.max_contains_values = Some(max);
        self
    }

    pub fn with_max_sort_fields(mut self, max: usize) -> Self {
        self.max_sort_fields = Some(max);
        self
    }
}
