//! Conversions between absolute calendar dates and day offsets.
//!
//! Offsets are whole calendar days relative to a reference date (the tournament
//! start). Arithmetic is done on `NaiveDate`, so there is no time-of-day and no
//! daylight-saving drift.

use chrono::{Days, NaiveDate};
use thiserror::Error;

/// Signed number of calendar days relative to the reference date.
pub type DayOffset = i64;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid calendar date '{0}'")]
    InvalidDate(String),
    #[error("no reference date available")]
    MissingReference,
    #[error("offset {offset} from {reference} is outside the supported calendar")]
    OutOfRange {
        offset: DayOffset,
        reference: NaiveDate,
    },
}

/// Number of calendar days from `reference` to `date`. Negative when `date`
/// falls before the reference.
#[must_use]
pub fn to_offset(date: NaiveDate, reference: NaiveDate) -> DayOffset {
    date.signed_duration_since(reference).num_days()
}

/// Calendar date `offset` days after `reference`.
///
/// # Errors
///
/// Returns [`CodecError::OutOfRange`] if the result is not representable.
pub fn to_date(offset: DayOffset, reference: NaiveDate) -> Result<NaiveDate, CodecError> {
    let magnitude = Days::new(offset.unsigned_abs());
    let shifted = if offset >= 0 {
        reference.checked_add_days(magnitude)
    } else {
        reference.checked_sub_days(magnitude)
    };
    shifted.ok_or(CodecError::OutOfRange { offset, reference })
}

/// Parse a date as sent by the backend.
///
/// Accepts plain `YYYY-MM-DD` as well as full ISO-8601 timestamps; only the
/// calendar part before `T` is kept.
///
/// # Errors
///
/// Returns [`CodecError::InvalidDate`] for empty or malformed input.
pub fn parse_date(raw: &str) -> Result<NaiveDate, CodecError> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split_once(['T', ' '])
        .map_or(trimmed, |(date, _)| date);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|_| CodecError::InvalidDate(raw.to_string()))
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse `raw` and express it as an offset from `reference`.
///
/// # Errors
///
/// Fails with [`CodecError::MissingReference`] when there is no reference, or
/// [`CodecError::InvalidDate`] when `raw` does not parse.
pub fn offset_between(raw: &str, reference: Option<NaiveDate>) -> Result<DayOffset, CodecError> {
    let reference = reference.ok_or(CodecError::MissingReference)?;
    Ok(to_offset(parse_date(raw)?, reference))
}

/// Resolve an offset into a formatted date string.
///
/// # Errors
///
/// Same failure modes as [`to_date`], plus [`CodecError::MissingReference`].
pub fn date_string(offset: DayOffset, reference: Option<NaiveDate>) -> Result<String, CodecError> {
    let reference = reference.ok_or(CodecError::MissingReference)?;
    to_date(offset, reference).map(format_date)
}
