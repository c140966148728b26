//! Column decoding helpers shared by the repositories

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

use crate::util::from_millis;

/// Read a TEXT column holding a UUID-backed identifier.
pub fn id<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error)))
}

/// Read an INTEGER column holding Unix milliseconds.
pub fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    from_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

/// Read a nullable INTEGER column holding Unix milliseconds.
pub fn optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let millis: Option<i64> = row.get(idx)?;
    millis
        .map(|millis| from_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis)))
        .transpose()
}

/// Read a TEXT column holding a JSON string array.
pub fn string_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error)))
}

/// Convert a row count into a `usize`, saturating negative values to zero.
pub fn count(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Convert a `LIMIT`/`OFFSET` value for SQLite, saturating at `i64::MAX`.
pub fn sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
