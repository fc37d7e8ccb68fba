//! UTC instant handling for date-time operands.
//!
//! Wire form is ISO-8601 with millisecond precision and a `Z` suffix
//! (`2025-01-01T00:00:00.000Z`). Parsing accepts any zone offset.

use crate::Timestamp;
use chrono::{DateTime, Datelike, SecondsFormat, SubsecRound, Utc};
use serde::Serializer;

/// Truncate to the millisecond precision carried on the wire.
pub fn to_millis(ts: Timestamp) -> Timestamp {
    ts.trunc_subsecs(3)
}

/// Render an instant in canonical wire form.
pub fn format_instant(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 instant with an explicit offset, normalized to UTC.
///
/// Instants whose UTC year leaves `0000..=9999` are rejected since they have
/// no four-digit wire form.
pub fn parse_instant(s: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| to_millis(dt.with_timezone(&Utc)))
        .filter(has_wire_form)
}

/// True when the instant renders with a four-digit year.
pub fn has_wire_form(ts: &Timestamp) -> bool {
    (0..=9999).contains(&ts.year())
}

pub(crate) fn serialize<S>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_instant(ts))
}
