//! Filter discriminator and per-variant operator vocabularies.
//!
//! Every vocabulary is closed: tokens parse case-insensitively after trimming
//! and always render as lower snake case.

use crate::error::{FilterTypeParseError, OperatorParseError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Filter kind carried in the `type` property of every wire filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum FilterType {
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "datetime")]
    DateTime,
}

impl FilterType {
    pub const ALL: &'static [FilterType] = &[
        FilterType::Basic,
        FilterType::Between,
        FilterType::Contains,
        FilterType::DateTime,
    ];

    /// Canonical wire token.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Basic => "basic",
            FilterType::Between => "between",
            FilterType::Contains => "contains",
            FilterType::DateTime => "datetime",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = FilterTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == norm)
            .ok_or_else(|| FilterTypeParseError(s.to_string()))
    }
}

/// Declares a closed operator vocabulary bound to one filter type.
macro_rules! operator_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident for $filter_type:expr => {
            $( $(#[$vmeta:meta])* $variant:ident = $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical lower snake token.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }

            /// Filter type this vocabulary belongs to.
            pub fn filter_type() -> FilterType {
                $filter_type
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = OperatorParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let norm = s.trim().to_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|op| op.as_str() == norm)
                    .ok_or_else(|| OperatorParseError {
                        filter_type: $filter_type,
                        token: s.to_string(),
                    })
            }
        }
    };
}

operator_vocabulary! {
    /// Comparison operators of a basic filter.
    BasicOperator for FilterType::Basic => {
        Equal = "equal",
        NotEqual = "not_equal",
        GreaterThan = "greater_than",
        LessThan = "less_than",
        GreaterThanOrEqual = "greater_than_or_equal",
        LessThanOrEqual = "less_than_or_equal",
    }
}

operator_vocabulary! {
    /// The single operator of a between filter.
    BetweenOperator for FilterType::Between => {
        Between = "between",
    }
}

operator_vocabulary! {
    /// The single operator of a contains filter.
    ContainsOperator for FilterType::Contains => {
        In = "in",
    }
}

operator_vocabulary! {
    /// Temporal comparison operators of a date-time filter.
    DateTimeOperator for FilterType::DateTime => {
        After = "after",
        AfterOrEqual = "after_or_equal",
        Before = "before",
        BeforeOrEqual = "before_or_equal",
        Equal = "equal",
        NotEqual = "not_equal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_and_whitespace_insensitive() {
        assert_eq!(" Equal ".parse::<BasicOperator>(), Ok(BasicOperator::Equal));
        assert_eq!("equal".parse::<BasicOperator>(), Ok(BasicOperator::Equal));
        assert_eq!(
            "\tGREATER_THAN_OR_EQUAL\n".parse::<BasicOperator>(),
            Ok(BasicOperator::GreaterThanOrEqual)
        );
        assert_eq!("IN".parse::<ContainsOperator>(), Ok(ContainsOperator::In));
    }

    #[test]
    fn test_unknown_token_names_vocabulary() {
        let err = "like".parse::<BasicOperator>().unwrap_err();
        assert_eq!(err.filter_type, FilterType::Basic);
        assert_eq!(err.token, "like");

        // Same token is valid in one vocabulary and not another
        assert!("after".parse::<DateTimeOperator>().is_ok());
        let err = "after".parse::<BasicOperator>().unwrap_err();
        assert_eq!(err.filter_type, FilterType::Basic);
    }

    #[test]
    fn test_render_round_trips_every_member() {
        for op in BasicOperator::ALL {
            assert_eq!(op.as_str().parse::<BasicOperator>(), Ok(*op));
        }
        for op in DateTimeOperator::ALL {
            assert_eq!(op.as_str().parse::<DateTimeOperator>(), Ok(*op));
        }
        assert_eq!(BetweenOperator::Between.to_string(), "between");
        assert_eq!(ContainsOperator::In.to_string(), "in");
    }

    #[test]
    fn test_serialize_uses_canonical_token() {
        let json = serde_json::to_string(&BasicOperator::LessThanOrEqual).unwrap();
        assert_eq!(json, "\"less_than_or_equal\"");
        let json = serde_json::to_string(&DateTimeOperator::AfterOrEqual).unwrap();
        assert_eq!(json, "\"after_or_equal\"");
        let json = serde_json::to_string(&FilterType::DateTime).unwrap();
        assert_eq!(json, "\"datetime\"");
    }

    #[test]
    fn test_filter_type_parse() {
        assert_eq!(" DateTime ".parse::<FilterType>(), Ok(FilterType::DateTime));
        assert_eq!("between".parse::<FilterType>(), Ok(FilterType::Between));
        assert_eq!(
            "range".parse::<FilterType>(),
            Err(FilterTypeParseError("range".to_string()))
        );
        assert_eq!(BasicOperator::filter_type(), FilterType::Basic);
    }
}
