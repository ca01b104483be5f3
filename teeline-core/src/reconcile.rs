//! Moves a tournament between its stored form (absolute dates) and the wizard's
//! working form (offsets from the start date).
//!
//! Loading never fails: dates that cannot be expressed as offsets are left
//! unset or replaced by an index fallback, and every such case is reported in
//! the [`LoadReport`]. Saving is strict and refuses to emit invalid dates.

use chrono::{NaiveDate, NaiveTime};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::codec::{CodecError, DayOffset, date_string, format_date, parse_date, to_date, to_offset};
use crate::config::{TEE_TIME_FORMAT, WizardConfig};
use crate::record::{StoredRound, StoredTeeTime, TournamentPatch, TournamentRecord};
use crate::remap::{RemapError, remap_dates};
use crate::state::{
    DivisionRounds, OffsetPath, RegistrationWindow, RoundSchedule, Section, TeeTimeOffset,
    WizardState,
};
use crate::validate::{ValidationIssue, validate_for_save};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("tournament start date is not set")]
    MissingReferenceDate,
    #[error("invalid tournament dates: {}", describe_issues(.0))]
    InvalidDateRange(Vec<ValidationIssue>),
    #[error("unknown division '{0}'")]
    UnknownDivision(String),
    #[error("division '{division_id}' has {len} round(s); index {round_index} is out of bounds")]
    RoundIndexOutOfBounds {
        division_id: String,
        round_index: usize,
        len: usize,
    },
    #[error("tee-time slot {slot} is out of bounds ({len} slot(s))")]
    TeeTimeSlotOutOfBounds { slot: usize, len: usize },
    #[error("tee-time slot {slot} cannot move to day {day}, outside the tournament")]
    TeeTimeOutsideTournament { slot: usize, day: DayOffset },
    #[error("day {day} already has a tee time (slot {taken_by})")]
    TeeTimeDayTaken { day: DayOffset, taken_by: usize },
    #[error("tournament ends on day {end_offset}, past the limit of day {max}")]
    TournamentTooLong { end_offset: DayOffset, max: DayOffset },
    #[error("'{0}' is not a HH:MM wall-clock time")]
    InvalidTeeTime(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Remap(#[from] RemapError),
}

fn describe_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a round's stored date was not used as its offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackReason {
    MissingReferenceDate,
    MissingRoundDate,
    UnparseableDate(String),
    OutsideSanityWindow { computed: DayOffset },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReferenceDate => write!(f, "no tournament start date"),
            Self::MissingRoundDate => write!(f, "round has no stored date"),
            Self::UnparseableDate(raw) => write!(f, "stored date '{raw}' does not parse"),
            Self::OutsideSanityWindow { computed } => {
                write!(f, "stored date is day {computed}, outside the plausible window")
            }
        }
    }
}

/// Offset chosen for a round on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOffset {
    Exact(DayOffset),
    FallbackUsed {
        offset: DayOffset,
        reason: FallbackReason,
    },
}

impl RoundOffset {
    #[must_use]
    pub const fn offset(&self) -> DayOffset {
        match self {
            Self::Exact(offset) | Self::FallbackUsed { offset, .. } => *offset,
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::FallbackUsed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResolution {
    pub division_id: String,
    pub round_index: usize,
    pub resolution: RoundOffset,
}

/// Degraded data found while loading a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LoadDiagnostic {
    MissingReferenceDate { field: &'static str },
    UnparseableDate { field: &'static str, value: String },
    RoundFallback {
        division_id: String,
        round_index: usize,
        reason: FallbackReason,
    },
    TeeTimeDropped { index: usize, reason: String },
    TeeTimeStartReset { index: usize, value: String },
    TournamentTooLong { end_offset: DayOffset, max: DayOffset },
}

impl fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReferenceDate { field } => {
                write!(f, "{field} kept unset: no tournament start date")
            }
            Self::UnparseableDate { field, value } => {
                write!(f, "{field} kept unset: '{value}' is not a date")
            }
            Self::RoundFallback {
                division_id,
                round_index,
                reason,
            } => write!(
                f,
                "division '{division_id}' round {} uses its index as offset: {reason}",
                round_index + 1
            ),
            Self::TeeTimeDropped { index, reason } => {
                write!(f, "tee time {} dropped: {reason}", index + 1)
            }
            Self::TeeTimeStartReset { index, value } => write!(
                f,
                "tee time {} start '{value}' replaced with the default",
                index + 1
            ),
            Self::TournamentTooLong { end_offset, max } => write!(
                f,
                "endDate is day {end_offset}, past the limit of day {max}; tee times kept as stored"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct LoadReport {
    pub rounds: Vec<RoundResolution>,
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl LoadReport {
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.rounds
            .iter()
            .filter(|round| round.resolution.is_fallback())
            .count()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub state: WizardState,
    pub report: LoadReport,
}

/// Build the working state from a stored record.
#[must_use]
pub fn from_record(record: &TournamentRecord, config: &WizardConfig) -> LoadOutcome {
    let mut diagnostics = Vec::new();
    let basic = &record.basic_info;

    let reference = match basic.start_date.as_deref().map(parse_date) {
        Some(Ok(date)) => Some(date),
        Some(Err(_)) => {
            let value = basic.start_date.clone().unwrap_or_default();
            warn!("startDate '{value}' does not parse; offsets cannot be computed");
            diagnostics.push(LoadDiagnostic::UnparseableDate {
                field: "startDate",
                value,
            });
            None
        }
        None => {
            debug!("record has no startDate yet");
            None
        }
    };

    let mut resolve = |field: &'static str, raw: Option<&str>| {
        resolve_offset(field, raw, reference, &mut diagnostics)
    };
    let end_date_offset = resolve("endDate", basic.end_date.as_deref());
    let reg = &record.reg_payment_info;
    let registration = RegistrationWindow {
        open: resolve("regStartDate", reg.reg_start_date.as_deref()),
        close: resolve("regEndDate", reg.reg_end_date.as_deref()),
        withdrawal_deadline: resolve(
            "maxAllowedWithdraDate",
            reg.max_allowed_withdra_date.as_deref(),
        ),
    };

    let mut resolutions = Vec::new();
    let mut schedule = RoundSchedule::default();
    for division in &record.divisions {
        let mut offsets = Vec::with_capacity(division.rounds.len());
        for (round_index, round) in division.rounds.iter().enumerate() {
            let resolution = resolve_round(round_index, round, reference, config);
            if let RoundOffset::FallbackUsed { offset, reason } = &resolution {
                warn!(
                    "division '{}' round {}: {reason}; falling back to offset {offset}",
                    division.id,
                    round_index + 1
                );
                diagnostics.push(LoadDiagnostic::RoundFallback {
                    division_id: division.id.clone(),
                    round_index,
                    reason: reason.clone(),
                });
            }
            offsets.push(resolution.offset());
            resolutions.push(RoundResolution {
                division_id: division.id.clone(),
                round_index,
                resolution,
            });
        }
        schedule.divisions.push(DivisionRounds {
            division_id: division.id.clone(),
            offsets,
        });
    }

    // tee-time slots are only sized from a plausible duration
    let tee_time_span = match end_date_offset {
        Some(end_offset) if end_offset > config.max_duration_days => {
            warn!(
                "endDate is day {end_offset}, past the limit of day {}; tee times kept as stored",
                config.max_duration_days
            );
            diagnostics.push(LoadDiagnostic::TournamentTooLong {
                end_offset,
                max: config.max_duration_days,
            });
            None
        }
        span => span,
    };
    let tee_times = load_tee_times(
        &basic.tee_times,
        reference,
        tee_time_span,
        config,
        &mut diagnostics,
    );

    debug!(
        "loaded tournament: {} division(s), {} round fallback(s), {} diagnostic(s)",
        schedule.divisions.len(),
        resolutions.iter().filter(|r| r.resolution.is_fallback()).count(),
        diagnostics.len()
    );

    LoadOutcome {
        state: WizardState {
            reference_date: reference,
            end_date_offset,
            registration,
            rounds: schedule,
            tee_times,
            details: record.without_dates(),
        },
        report: LoadReport {
            rounds: resolutions,
            diagnostics,
        },
    }
}

fn resolve_offset(
    field: &'static str,
    raw: Option<&str>,
    reference: Option<NaiveDate>,
    diagnostics: &mut Vec<LoadDiagnostic>,
) -> Option<DayOffset> {
    let raw = raw?;
    let Some(reference) = reference else {
        warn!("{field} present but no start date; leaving offset unset");
        diagnostics.push(LoadDiagnostic::MissingReferenceDate { field });
        return None;
    };
    match parse_date(raw) {
        Ok(date) => Some(to_offset(date, reference)),
        Err(err) => {
            warn!("{field}: {err}; leaving offset unset");
            diagnostics.push(LoadDiagnostic::UnparseableDate {
                field,
                value: raw.to_string(),
            });
            None
        }
    }
}

fn resolve_round(
    round_index: usize,
    round: &StoredRound,
    reference: Option<NaiveDate>,
    config: &WizardConfig,
) -> RoundOffset {
    let fallback = |reason| RoundOffset::FallbackUsed {
        offset: index_offset(round_index),
        reason,
    };
    let Some(reference) = reference else {
        return fallback(FallbackReason::MissingReferenceDate);
    };
    let Some(raw) = round.date.as_deref() else {
        return fallback(FallbackReason::MissingRoundDate);
    };
    let Ok(date) = parse_date(raw) else {
        return fallback(FallbackReason::UnparseableDate(raw.to_string()));
    };
    let computed = to_offset(date, reference);
    if config.round_sanity_window.contains(computed) {
        RoundOffset::Exact(computed)
    } else {
        fallback(FallbackReason::OutsideSanityWindow { computed })
    }
}

fn index_offset(index: usize) -> DayOffset {
    DayOffset::try_from(index).unwrap_or(DayOffset::MAX)
}

fn load_tee_times(
    stored: &[StoredTeeTime],
    reference: Option<NaiveDate>,
    end_date_offset: Option<DayOffset>,
    config: &WizardConfig,
    diagnostics: &mut Vec<LoadDiagnostic>,
) -> Vec<TeeTimeOffset> {
    let mut start_time_for = |index: usize, raw: &str| match normalize_time(raw) {
        Some(time) => time,
        None => {
            warn!("tee time {}: start '{raw}' invalid, using default", index + 1);
            diagnostics.push(LoadDiagnostic::TeeTimeStartReset {
                index,
                value: raw.to_string(),
            });
            config.default_tee_time.clone()
        }
    };

    let computed: Vec<(usize, Result<DayOffset, String>, String)> = stored
        .iter()
        .enumerate()
        .map(|(index, tee_time)| {
            let offset = match (reference, tee_time.date.as_deref()) {
                (Some(reference), Some(raw)) => parse_date(raw)
                    .map(|date| to_offset(date, reference))
                    .map_err(|err| err.to_string()),
                (None, _) => Err("no tournament start date".to_string()),
                (_, None) => Err("no stored date".to_string()),
            };
            (index, offset, start_time_for(index, &tee_time.start_time))
        })
        .collect();

    let Some(last_day) = end_date_offset.filter(|offset| *offset >= 0) else {
        // Unknown duration: keep every stored entry, by date where possible.
        return computed
            .into_iter()
            .map(|(index, offset, start_time)| TeeTimeOffset {
                start_time,
                day_offset: offset.unwrap_or_else(|_| index_offset(index)),
                extra: stored[index].extra.clone(),
            })
            .collect();
    };

    let mut slots: Vec<Option<TeeTimeOffset>> = (0..=last_day).map(|_| None).collect();
    for (index, offset, start_time) in computed {
        let reason = match offset {
            Err(reason) => reason,
            Ok(day) if day < 0 || day > last_day => {
                format!("day {day} is outside the tournament")
            }
            Ok(day) => {
                let slot = &mut slots[usize::try_from(day).unwrap_or_default()];
                if slot.is_none() {
                    *slot = Some(TeeTimeOffset {
                        start_time,
                        day_offset: day,
                        extra: stored[index].extra.clone(),
                    });
                    continue;
                }
                format!("day {day} already has a tee time")
            }
        };
        warn!("tee time {} dropped: {reason}", index + 1);
        diagnostics.push(LoadDiagnostic::TeeTimeDropped { index, reason });
    }

    (0..=last_day)
        .zip(slots)
        .map(|(day, slot)| slot.unwrap_or_else(|| default_tee_time(day, config)))
        .collect()
}

fn default_tee_time(day_offset: DayOffset, config: &WizardConfig) -> TeeTimeOffset {
    TeeTimeOffset {
        start_time: config.default_tee_time.clone(),
        day_offset,
        extra: crate::record::Extra::new(),
    }
}

fn normalize_time(raw: &str) -> Option<String> {
    NaiveTime::parse_from_str(raw.trim(), TEE_TIME_FORMAT)
        .ok()
        .map(|time| time.format(TEE_TIME_FORMAT).to_string())
}

/// Resize tee times to exactly one slot per day `0..=last_day`, keeping
/// existing slots whose day is still inside the tournament.
fn fit_tee_times(
    tee_times: &[TeeTimeOffset],
    last_day: DayOffset,
    config: &WizardConfig,
) -> Vec<TeeTimeOffset> {
    (0..=last_day)
        .map(|day| {
            tee_times
                .iter()
                .find(|tee_time| tee_time.day_offset == day)
                .cloned()
                .unwrap_or_else(|| default_tee_time(day, config))
        })
        .collect()
}

/// Update one offset field. No other field, and not the reference date, is
/// touched.
///
/// # Errors
///
/// Fails when `path` names a division, round or tee-time slot that does not
/// exist, or would move a tee time outside the tournament or onto a day that
/// already has one.
pub fn set_offset(
    state: &WizardState,
    path: &OffsetPath,
    new_offset: DayOffset,
) -> Result<WizardState, ReconcileError> {
    let mut next = state.clone();
    match path {
        OffsetPath::RegistrationOpen => next.registration.open = Some(new_offset),
        OffsetPath::RegistrationClose => next.registration.close = Some(new_offset),
        OffsetPath::WithdrawalDeadline => {
            next.registration.withdrawal_deadline = Some(new_offset);
        }
        OffsetPath::Round {
            division_id,
            round_index,
        } => {
            let division = next
                .rounds
                .division_mut(division_id)
                .ok_or_else(|| ReconcileError::UnknownDivision(division_id.clone()))?;
            let len = division.offsets.len();
            let slot = division.offsets.get_mut(*round_index).ok_or_else(|| {
                ReconcileError::RoundIndexOutOfBounds {
                    division_id: division_id.clone(),
                    round_index: *round_index,
                    len,
                }
            })?;
            *slot = new_offset;
        }
        OffsetPath::TeeTime { slot } => {
            let len = state.tee_times.len();
            if *slot >= len {
                return Err(ReconcileError::TeeTimeSlotOutOfBounds { slot: *slot, len });
            }
            check_tee_time_day(state, *slot, new_offset)?;
            next.tee_times[*slot].day_offset = new_offset;
        }
    }
    Ok(next)
}

/// A tee time may only move to a free day inside the tournament.
fn check_tee_time_day(
    state: &WizardState,
    slot: usize,
    day: DayOffset,
) -> Result<(), ReconcileError> {
    let past_end = state.end_date_offset.is_some_and(|end| day > end);
    if day < 0 || past_end {
        return Err(ReconcileError::TeeTimeOutsideTournament { slot, day });
    }
    match state
        .tee_times
        .iter()
        .enumerate()
        .find(|(other, tee_time)| *other != slot && tee_time.day_offset == day)
    {
        Some((taken_by, _)) => Err(ReconcileError::TeeTimeDayTaken { day, taken_by }),
        None => Ok(()),
    }
}

fn check_duration(end_offset: DayOffset, config: &WizardConfig) -> Result<(), ReconcileError> {
    if end_offset > config.max_duration_days {
        return Err(ReconcileError::TournamentTooLong {
            end_offset,
            max: config.max_duration_days,
        });
    }
    Ok(())
}

/// Move the tournament start. Offsets are kept as-is, so every dependent
/// date shifts by the same number of days as the start.
#[must_use]
pub fn set_reference_date(state: &WizardState, reference: NaiveDate) -> WizardState {
    WizardState {
        reference_date: Some(reference),
        ..state.clone()
    }
}

/// Change the tournament length and resize tee times to one per day.
///
/// # Errors
///
/// Rejects a negative offset (end before start), a tournament longer than
/// [`WizardConfig::max_duration_days`] and an end date past the calendar.
pub fn set_end_date_offset(
    state: &WizardState,
    end_date_offset: DayOffset,
    config: &WizardConfig,
) -> Result<WizardState, ReconcileError> {
    if end_date_offset < 0 {
        return Err(ReconcileError::InvalidDateRange(vec![
            ValidationIssue::EndBeforeStart {
                end_offset: end_date_offset,
            },
        ]));
    }
    check_duration(end_date_offset, config)?;
    if let Some(reference) = state.reference_date {
        to_date(end_date_offset, reference)?;
    }
    let mut next = state.clone();
    next.end_date_offset = Some(end_date_offset);
    next.tee_times = fit_tee_times(&state.tee_times, end_date_offset, config);
    Ok(next)
}

/// # Errors
///
/// Fails for an unknown slot or a start time that is not `HH:MM`.
pub fn set_tee_time_start(
    state: &WizardState,
    slot: usize,
    start_time: &str,
) -> Result<WizardState, ReconcileError> {
    let start_time = normalize_time(start_time)
        .ok_or_else(|| ReconcileError::InvalidTeeTime(start_time.to_string()))?;
    let mut next = state.clone();
    let len = next.tee_times.len();
    next.tee_times
        .get_mut(slot)
        .ok_or(ReconcileError::TeeTimeSlotOutOfBounds { slot, len })?
        .start_time = start_time;
    Ok(next)
}

/// Grow or shrink a division's rounds. New rounds are placed on the day
/// matching their index, capped at the last tournament day.
///
/// # Errors
///
/// Fails for an unknown division.
pub fn set_round_count(
    state: &WizardState,
    division_id: &str,
    count: usize,
) -> Result<WizardState, ReconcileError> {
    let mut next = state.clone();
    let last_day = next.end_date_offset.map(|offset| offset.max(0));
    let division = next
        .rounds
        .division_mut(division_id)
        .ok_or_else(|| ReconcileError::UnknownDivision(division_id.to_string()))?;
    let existing = division.offsets.len();
    division.offsets.truncate(count);
    division.offsets.extend((existing..count).map(|index| {
        let offset = index_offset(index);
        last_day.map_or(offset, |last| offset.min(last))
    }));
    if let Some(details) = next
        .details
        .divisions
        .iter_mut()
        .find(|division| division.id == division_id)
    {
        details.rounds.resize_with(count, StoredRound::default);
    }
    Ok(next)
}

/// Rescale round dates into `[new_start, new_end]` by relative position.
///
/// Use this only when both tournament dates change on a tournament whose
/// rounds are already scheduled. One span is taken across all divisions so
/// rounds that ran in parallel stay in parallel. Registration offsets are
/// left unchanged.
///
/// # Errors
///
/// Fails without a reference date, for an inverted or over-long range, or
/// when a current round offset is not a representable date.
pub fn remap_to_range(
    state: &WizardState,
    new_start: NaiveDate,
    new_end: NaiveDate,
    config: &WizardConfig,
) -> Result<WizardState, ReconcileError> {
    let reference = state
        .reference_date
        .ok_or(ReconcileError::MissingReferenceDate)?;
    let last_day = to_offset(new_end, new_start);
    check_duration(last_day, config)?;
    let current = state
        .rounds
        .iter()
        .map(|(_, _, offset)| to_date(offset, reference))
        .collect::<Result<Vec<_>, _>>()?;
    let remapped = remap_dates(&current, new_start, new_end)?;

    let mut next = state.clone();
    let mut remapped = remapped.into_iter();
    for offset in next
        .rounds
        .divisions
        .iter_mut()
        .flat_map(|division| division.offsets.iter_mut())
    {
        if let Some(date) = remapped.next() {
            *offset = to_offset(date, new_start);
        }
    }
    next.reference_date = Some(new_start);
    next.end_date_offset = Some(last_day);
    next.tee_times = fit_tee_times(&state.tee_times, last_day, config);
    debug!(
        "remapped {} round(s) from {reference} onto {new_start}..={new_end}",
        current.len()
    );
    Ok(next)
}

/// Resolve every offset back to an absolute date.
///
/// # Errors
///
/// Returns [`ReconcileError::MissingReferenceDate`] without a start date and
/// [`ReconcileError::InvalidDateRange`] when validation finds any problem.
pub fn to_record(state: &WizardState) -> Result<TournamentRecord, ReconcileError> {
    let issues = validate_for_save(state);
    if issues.contains(&ValidationIssue::MissingReferenceDate) {
        return Err(ReconcileError::MissingReferenceDate);
    }
    if !issues.is_empty() {
        return Err(ReconcileError::InvalidDateRange(issues));
    }
    let reference = state
        .reference_date
        .ok_or(ReconcileError::MissingReferenceDate)?;
    let resolve = |offset: Option<DayOffset>| -> Result<Option<String>, CodecError> {
        offset
            .map(|offset| date_string(offset, Some(reference)))
            .transpose()
    };

    let mut record = state.details.clone();
    record.basic_info.start_date = Some(format_date(reference));
    record.basic_info.end_date = resolve(state.end_date_offset)?;
    record.basic_info.tee_times = state
        .tee_times
        .iter()
        .map(|tee_time| -> Result<StoredTeeTime, CodecError> {
            Ok(StoredTeeTime {
                start_time: tee_time.start_time.clone(),
                date: Some(date_string(tee_time.day_offset, Some(reference))?),
                extra: tee_time.extra.clone(),
            })
        })
        .collect::<Result<_, _>>()?;

    let reg = &mut record.reg_payment_info;
    reg.reg_start_date = resolve(state.registration.open)?;
    reg.reg_end_date = resolve(state.registration.close)?;
    reg.max_allowed_withdra_date = resolve(state.registration.withdrawal_deadline)?;

    for (division, schedule) in record.divisions.iter_mut().zip(&state.rounds.divisions) {
        division
            .rounds
            .resize_with(schedule.offsets.len(), StoredRound::default);
        for (round, offset) in division.rounds.iter_mut().zip(&schedule.offsets) {
            round.date = Some(date_string(*offset, Some(reference))?);
        }
    }
    Ok(record)
}

/// Resolve dates like [`to_record`] and keep only `sections`.
///
/// # Errors
///
/// Same as [`to_record`].
pub fn to_patch<'a>(
    state: &WizardState,
    sections: impl IntoIterator<Item = &'a Section>,
) -> Result<TournamentPatch, ReconcileError> {
    let record = to_record(state)?;
    Ok(TournamentPatch::from_record(&record, sections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BasicInfo, Division, RegPaymentInfo};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn round(date: &str) -> StoredRound {
        StoredRound {
            date: Some(date.to_string()),
            ..StoredRound::default()
        }
    }

    fn record() -> TournamentRecord {
        TournamentRecord {
            basic_info: BasicInfo {
                start_date: Some("2026-04-01".to_string()),
                end_date: Some("2026-04-03".to_string()),
                ..BasicInfo::default()
            },
            reg_payment_info: RegPaymentInfo {
                reg_start_date: Some("2026-03-02".to_string()),
                reg_end_date: Some("2026-03-29".to_string()),
                max_allowed_withdra_date: Some("2026-03-25".to_string()),
                ..RegPaymentInfo::default()
            },
            divisions: vec![Division {
                id: "open".to_string(),
                rounds: vec![round("2026-04-01"), round("2026-04-02"), round("2026-04-03")],
                ..Division::default()
            }],
            ..TournamentRecord::default()
        }
    }

    #[test]
    fn load_computes_offsets_against_start() {
        let outcome = from_record(&record(), &WizardConfig::default());
        let state = &outcome.state;
        assert_eq!(state.reference_date, Some(ymd(2026, 4, 1)));
        assert_eq!(state.end_date_offset, Some(2));
        assert_eq!(
            state.registration,
            RegistrationWindow {
                open: Some(-30),
                close: Some(-3),
                withdrawal_deadline: Some(-7),
            }
        );
        assert_eq!(state.rounds.division("open").unwrap().offsets, vec![0, 1, 2]);
        assert_eq!(state.tee_times.len(), 3);
        assert!(outcome.report.is_clean());
        assert_eq!(outcome.report.fallback_count(), 0);
    }

    #[test]
    fn load_without_start_defers_offsets_and_flags_rounds() {
        let mut stored = record();
        stored.basic_info.start_date = None;
        let outcome = from_record(&stored, &WizardConfig::default());
        assert_eq!(outcome.state.reference_date, None);
        assert_eq!(outcome.state.end_date_offset, None);
        assert_eq!(outcome.state.registration, RegistrationWindow::default());
        assert_eq!(outcome.report.fallback_count(), 3);
        assert!(outcome.report.diagnostics.contains(&LoadDiagnostic::MissingReferenceDate {
            field: "regEndDate"
        }));
        assert_eq!(
            outcome.report.rounds[2].resolution,
            RoundOffset::FallbackUsed {
                offset: 2,
                reason: FallbackReason::MissingReferenceDate,
            }
        );
    }

    #[test]
    fn implausible_round_falls_back_to_index_and_is_reported() {
        let mut stored = record();
        stored.divisions[0].rounds[1] = round("2026-04-11");
        stored.divisions[0].rounds[2] = round("not a date");
        let outcome = from_record(&stored, &WizardConfig::default());
        assert_eq!(
            outcome.state.rounds.division("open").unwrap().offsets,
            vec![0, 1, 2]
        );
        assert_eq!(
            outcome.report.rounds[1].resolution,
            RoundOffset::FallbackUsed {
                offset: 1,
                reason: FallbackReason::OutsideSanityWindow { computed: 10 },
            }
        );
        assert!(matches!(
            outcome.report.rounds[2].resolution,
            RoundOffset::FallbackUsed {
                reason: FallbackReason::UnparseableDate(_),
                ..
            }
        ));
        assert_eq!(outcome.report.diagnostics.len(), 2);
    }

    #[test]
    fn tee_times_normalize_to_one_per_day() {
        let mut stored = record();
        stored.basic_info.tee_times = vec![
            StoredTeeTime {
                start_time: "7:30".to_string(),
                date: Some("2026-04-02".to_string()),
                ..StoredTeeTime::default()
            },
            StoredTeeTime {
                start_time: "09:00".to_string(),
                date: Some("2026-04-02".to_string()),
                ..StoredTeeTime::default()
            },
            StoredTeeTime {
                start_time: "09:00".to_string(),
                date: Some("2026-05-02".to_string()),
                ..StoredTeeTime::default()
            },
        ];
        let outcome = from_record(&stored, &WizardConfig::default());
        let tee_times = &outcome.state.tee_times;
        let days: Vec<_> = tee_times.iter().map(|t| t.day_offset).collect();
        assert_eq!(days, vec![0, 1, 2]);
        assert_eq!(tee_times[0].start_time, "08:00");
        assert_eq!(tee_times[1].start_time, "07:30");
        assert_eq!(
            outcome
                .report
                .diagnostics
                .iter()
                .filter(|d| matches!(d, LoadDiagnostic::TeeTimeDropped { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn set_offset_touches_only_its_field() {
        let state = from_record(&record(), &WizardConfig::default()).state;
        let edited = set_offset(&state, &OffsetPath::round("open", 1), 2).unwrap();
        assert_eq!(edited.rounds.get("open", 1), Some(2));
        assert_eq!(edited.rounds.get("open", 0), Some(0));
        assert_eq!(edited.registration, state.registration);
        assert_eq!(edited.reference_date, state.reference_date);

        let edited = set_offset(&state, &OffsetPath::RegistrationClose, -1).unwrap();
        assert_eq!(edited.registration.close, Some(-1));
        assert_eq!(edited.registration.open, Some(-30));
        assert_eq!(edited.rounds, state.rounds);
    }

    #[test]
    fn set_offset_rejects_unknown_targets() {
        let state = from_record(&record(), &WizardConfig::default()).state;
        assert_eq!(
            set_offset(&state, &OffsetPath::round("junior", 0), 0),
            Err(ReconcileError::UnknownDivision("junior".to_string()))
        );
        assert_eq!(
            set_offset(&state, &OffsetPath::round("open", 3), 0),
            Err(ReconcileError::RoundIndexOutOfBounds {
                division_id: "open".to_string(),
                round_index: 3,
                len: 3,
            })
        );
        assert_eq!(
            set_offset(&state, &OffsetPath::TeeTime { slot: 9 }, 0),
            Err(ReconcileError::TeeTimeSlotOutOfBounds { slot: 9, len: 3 })
        );
    }

    #[test]
    fn end_date_changes_resize_tee_times() {
        let config = WizardConfig::default();
        let state = from_record(&record(), &config).state;
        let state = set_tee_time_start(&state, 1, "06:45").unwrap();
        let longer = set_end_date_offset(&state, 4, &config).unwrap();
        assert_eq!(longer.tee_times.len(), 5);
        assert_eq!(longer.tee_times[1].start_time, "06:45");
        assert_eq!(longer.tee_times[4].start_time, "08:00");
        let shorter = set_end_date_offset(&longer, 0, &config).unwrap();
        assert_eq!(shorter.tee_times.len(), 1);
        assert!(matches!(
            set_end_date_offset(&state, -1, &config),
            Err(ReconcileError::InvalidDateRange(_))
        ));
        assert_eq!(
            set_tee_time_start(&state, 0, "noon"),
            Err(ReconcileError::InvalidTeeTime("noon".to_string()))
        );
    }

    #[test]
    fn end_date_edits_are_bounded() {
        let config = WizardConfig::default();
        let state = from_record(&record(), &config).state;
        assert_eq!(
            set_end_date_offset(&state, i64::MAX, &config),
            Err(ReconcileError::TournamentTooLong {
                end_offset: i64::MAX,
                max: 30,
            })
        );
        assert!(matches!(
            set_end_date_offset(&state, 1_000_000_000, &config),
            Err(ReconcileError::TournamentTooLong { .. })
        ));
        assert_eq!(set_end_date_offset(&state, 30, &config).unwrap().tee_times.len(), 31);

        let unbounded = WizardConfig {
            max_duration_days: i64::MAX,
            ..WizardConfig::default()
        };
        assert!(matches!(
            set_end_date_offset(&state, i64::MAX, &unbounded),
            Err(ReconcileError::Codec(CodecError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn far_future_end_date_keeps_stored_tee_times() {
        let mut stored = record();
        stored.basic_info.end_date = Some("9999-12-31".to_string());
        stored.basic_info.tee_times = vec![StoredTeeTime {
            start_time: "07:10".to_string(),
            date: Some("2026-04-02".to_string()),
            ..StoredTeeTime::default()
        }];
        let config = WizardConfig::default();
        let outcome = from_record(&stored, &config);
        let end_offset = outcome.state.end_date_offset.unwrap();
        assert!(end_offset > config.max_duration_days);
        assert_eq!(outcome.state.tee_times.len(), 1);
        assert_eq!(outcome.state.tee_times[0].day_offset, 1);
        assert!(outcome.report.diagnostics.contains(&LoadDiagnostic::TournamentTooLong {
            end_offset,
            max: 30,
        }));
        assert_eq!(to_record(&outcome.state).unwrap().basic_info.tee_times.len(), 1);
    }

    #[test]
    fn remap_rejects_over_long_range() {
        let config = WizardConfig::default();
        let state = from_record(&record(), &config).state;
        assert_eq!(
            remap_to_range(&state, ymd(2026, 5, 1), NaiveDate::MAX, &config),
            Err(ReconcileError::TournamentTooLong {
                end_offset: to_offset(NaiveDate::MAX, ymd(2026, 5, 1)),
                max: 30,
            })
        );
    }

    #[test]
    fn tee_time_days_stay_unique_and_inside_the_tournament() {
        let config = WizardConfig::default();
        let state = from_record(&record(), &config).state;
        let state = set_tee_time_start(&state, 1, "10:00").unwrap();
        assert_eq!(
            set_offset(&state, &OffsetPath::TeeTime { slot: 0 }, 1),
            Err(ReconcileError::TeeTimeDayTaken { day: 1, taken_by: 1 })
        );
        assert_eq!(
            set_offset(&state, &OffsetPath::TeeTime { slot: 0 }, 3),
            Err(ReconcileError::TeeTimeOutsideTournament { slot: 0, day: 3 })
        );
        assert_eq!(
            set_offset(&state, &OffsetPath::TeeTime { slot: 0 }, -1),
            Err(ReconcileError::TeeTimeOutsideTournament { slot: 0, day: -1 })
        );

        let starts = |state: &WizardState| -> Vec<(DayOffset, String)> {
            state
                .tee_times
                .iter()
                .map(|t| (t.day_offset, t.start_time.clone()))
                .collect()
        };
        let reloaded = from_record(&to_record(&state).unwrap(), &config);
        assert!(reloaded.report.is_clean());
        assert_eq!(starts(&reloaded.state), starts(&state));
        assert_eq!(reloaded.state.tee_times[1].start_time, "10:00");

        // with an open-ended tournament a tee time can move to a free day
        let mut stored = record();
        stored.basic_info.end_date = None;
        stored.basic_info.tee_times = ["2026-04-01", "2026-04-02"]
            .into_iter()
            .map(|date| StoredTeeTime {
                start_time: "09:30".to_string(),
                date: Some(date.to_string()),
                ..StoredTeeTime::default()
            })
            .collect();
        let state = from_record(&stored, &config).state;
        assert_eq!(
            set_offset(&state, &OffsetPath::TeeTime { slot: 1 }, 0),
            Err(ReconcileError::TeeTimeDayTaken { day: 0, taken_by: 0 })
        );
        let moved = set_offset(&state, &OffsetPath::TeeTime { slot: 1 }, 2).unwrap();
        let moved = set_tee_time_start(&moved, 1, "11:15").unwrap();
        let reloaded = from_record(&to_record(&moved).unwrap(), &config);
        assert!(reloaded.report.is_clean());
        assert_eq!(
            starts(&reloaded.state),
            vec![(0, "09:30".to_string()), (2, "11:15".to_string())]
        );
    }

    #[test]
    fn round_count_keeps_indices_contiguous() {
        let state = from_record(&record(), &WizardConfig::default()).state;
        let grown = set_round_count(&state, "open", 5).unwrap();
        assert_eq!(grown.rounds.division("open").unwrap().offsets, vec![0, 1, 2, 2, 2]);
        assert_eq!(grown.details.divisions[0].rounds.len(), 5);
        let shrunk = set_round_count(&grown, "open", 1).unwrap();
        assert_eq!(shrunk.rounds.division("open").unwrap().offsets, vec![0]);
        let saved = to_record(&shrunk).unwrap();
        assert_eq!(saved.divisions[0].rounds.len(), 1);
    }

    #[test]
    fn save_writes_back_absolute_dates() {
        let state = from_record(&record(), &WizardConfig::default()).state;
        let moved = set_reference_date(&state, ymd(2026, 5, 1));
        let saved = to_record(&moved).unwrap();
        assert_eq!(saved.basic_info.start_date.as_deref(), Some("2026-05-01"));
        assert_eq!(saved.basic_info.end_date.as_deref(), Some("2026-05-03"));
        assert_eq!(
            saved.reg_payment_info.reg_start_date.as_deref(),
            Some("2026-04-01")
        );
        assert_eq!(
            saved.divisions[0].rounds[2].date.as_deref(),
            Some("2026-05-03")
        );
        assert_eq!(saved.basic_info.tee_times[2].date.as_deref(), Some("2026-05-03"));
    }

    #[test]
    fn save_rejects_missing_start_and_inverted_range() {
        let mut stored = record();
        stored.basic_info.start_date = None;
        let state = from_record(&stored, &WizardConfig::default()).state;
        assert_eq!(to_record(&state), Err(ReconcileError::MissingReferenceDate));

        let mut state = from_record(&record(), &WizardConfig::default()).state;
        state.end_date_offset = Some(-2);
        let err = to_record(&state).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidDateRange(_)));
        assert!(err.to_string().contains("end date is 2 day(s) before start date"));
    }

    #[test]
    fn remap_rescales_rounds_and_keeps_registration() {
        let config = WizardConfig::default();
        let state = from_record(&record(), &config).state;
        let remapped = remap_to_range(&state, ymd(2026, 5, 1), ymd(2026, 5, 9), &config).unwrap();
        assert_eq!(remapped.reference_date, Some(ymd(2026, 5, 1)));
        assert_eq!(remapped.end_date_offset, Some(8));
        assert_eq!(
            remapped.rounds.division("open").unwrap().offsets,
            vec![0, 4, 8]
        );
        assert_eq!(remapped.registration, state.registration);
        assert_eq!(remapped.tee_times.len(), 9);
    }

    #[test]
    fn patch_contains_requested_sections_only() {
        let state = from_record(&record(), &WizardConfig::default()).state;
        let patch = to_patch(&state, &[Section::Divisions]).unwrap();
        assert!(patch.basic_info.is_none());
        assert_eq!(patch.divisions.unwrap()[0].rounds.len(), 3);
    }
}
