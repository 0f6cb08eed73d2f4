//! Raw row to [`CanonicalRecord`] conversion.

use crate::error::{RowError, RowErrorCause};
use crate::normalize::time::{ClockTime, normalize_time};
use crate::types::{CanonicalRecord, RawRow};

/// Field names read from a raw row.
pub mod fields {
    pub const PERFORMER: &str = "Performer";
    pub const STAGE: &str = "Stage";
    pub const DATE: &str = "Date";
    pub const START: &str = "Start";
    pub const END: &str = "End";
    pub const POPULARITY: &str = "Popularity";
}

/// Normalize one raw row.
///
/// - `Performer`, `Stage` and `Date` are required and trimmed; `Performer` and `Stage`
///   must not be empty after trimming. `Date` is passed through as-is.
/// - `Start` and `End` go through [`normalize_time`].
/// - `Popularity` goes through [`parse_popularity_lenient`] and never fails the row.
///
/// On failure the original row is returned inside the [`RowError`]; nothing is partially
/// built.
pub fn normalize_row(row: &RawRow) -> Result<CanonicalRecord, RowError> {
    build(row).map_err(|cause| RowError {
        row: row.clone(),
        cause,
    })
}

fn build(row: &RawRow) -> Result<CanonicalRecord, RowErrorCause> {
    let performer = non_empty(row, fields::PERFORMER)?;
    let stage = non_empty(row, fields::STAGE)?;
    let date = required(row, fields::DATE)?;
    let start = time_field(row, fields::START)?;
    let end = time_field(row, fields::END)?;
    let popularity = parse_popularity_lenient(row.get(fields::POPULARITY));

    Ok(CanonicalRecord::new(performer, stage, date, start, end, popularity))
}

fn required<'a>(row: &'a RawRow, field: &'static str) -> Result<&'a str, RowErrorCause> {
    row.get(field)
        .map(str::trim)
        .ok_or(RowErrorCause::MissingField(field))
}

fn non_empty<'a>(row: &'a RawRow, field: &'static str) -> Result<&'a str, RowErrorCause> {
    let value = required(row, field)?;
    if value.is_empty() {
        return Err(RowErrorCause::EmptyField(field));
    }
    Ok(value)
}

fn time_field(row: &RawRow, field: &'static str) -> Result<ClockTime, RowErrorCause> {
    let raw = row.get(field).ok_or(RowErrorCause::MissingField(field))?;
    normalize_time(raw).map_err(|source| RowErrorCause::InvalidTime { field, source })
}

/// Parse the optional popularity field.
///
/// Popularity is a bonus field: a missing, empty or non-integer value yields `None`
/// rather than an error.
pub fn parse_popularity_lenient(raw: Option<&str>) -> Option<i64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}
