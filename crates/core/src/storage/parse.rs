//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Error as SqlError;

use crate::models::DATE_FORMAT;

fn conversion_error<E>(column: usize, err: E) -> SqlError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SqlError::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Format a timestamp for storage.
///
/// Fixed-width microseconds keep lexical order equal to time order.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time, formatted for storage
pub fn now_string() -> String {
    format_datetime(Utc::now())
}

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(0, e))
}

/// Parse an optional DateTime from an RFC3339 string
pub fn parse_datetime_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>, SqlError> {
    s.map(|s| parse_datetime(&s)).transpose()
}

/// Format a calendar date for storage (`YYYY-MM-DD`, sorts lexically)
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a calendar date column
pub fn parse_date(s: &str) -> Result<NaiveDate, SqlError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| conversion_error(0, e))
}

/// Parse one of the closed enums stored as text
pub fn parse_enum<T>(s: &str) -> Result<T, SqlError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| conversion_error(0, UnknownVariant(e.to_string())))
}

#[derive(Debug)]
struct UnknownVariant(String);

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomStatus;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_roundtrip_and_order() {
        let early = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let late = early + chrono::Duration::microseconds(5);

        let a = format_datetime(early);
        let b = format_datetime(late);
        assert!(a < b);
        assert_eq!(parse_datetime(&a).unwrap(), early);
    }

    #[test]
    fn test_unknown_enum_is_conversion_failure() {
        let err = parse_enum::<RoomStatus>("occupied").unwrap_err();
        assert!(matches!(err, SqlError::FromSqlConversionFailure(..)));
    }
}
