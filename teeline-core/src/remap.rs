//! Proportional remapping of round dates into a new tournament range.
//!
//! This is the "tournament dates changed" algorithm: each date keeps its
//! relative position inside the old span of round dates, rescaled onto the
//! new start/end range. It does not preserve fixed offsets; for that see
//! [`crate::reconcile::set_reference_date`].

use chrono::NaiveDate;
use thiserror::Error;

use crate::codec::{CodecError, to_date, to_offset};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemapError {
    #[error("new range ends {end} before it starts {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Map `dates` from their own `[min, max]` span onto `[new_start, new_end]`.
///
/// A date at relative position `p` lands `round(p * (new_end - new_start))`
/// days after `new_start`, clamped into the new range. When every input date
/// is the same day, `p` is 0 for all of them.
///
/// # Errors
///
/// Returns [`RemapError::InvertedRange`] when `new_end < new_start`.
pub fn remap_dates(
    dates: &[NaiveDate],
    new_start: NaiveDate,
    new_end: NaiveDate,
) -> Result<Vec<NaiveDate>, RemapError> {
    if new_end < new_start {
        return Err(RemapError::InvertedRange {
            start: new_start,
            end: new_end,
        });
    }
    let (Some(old_min), Some(old_max)) = (dates.iter().min(), dates.iter().max()) else {
        return Ok(Vec::new());
    };

    let old_span = to_offset(*old_max, *old_min);
    let new_span = to_offset(new_end, new_start);

    dates
        .iter()
        .map(|date| {
            let position = relative_position(to_offset(*date, *old_min), old_span);
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            let offset = (position * new_span as f64).round() as i64;
            to_date(offset.clamp(0, new_span), new_start).map_err(RemapError::from)
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn relative_position(distance: i64, span: i64) -> f64 {
    if span == 0 {
        0.0
    } else {
        distance as f64 / span as f64
    }
}
