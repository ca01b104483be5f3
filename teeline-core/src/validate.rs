use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::codec::{DayOffset, to_date};
use crate::state::WizardState;

/// A single problem that blocks saving or publishing a tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationIssue {
    MissingReferenceDate,
    EndBeforeStart {
        end_offset: DayOffset,
    },
    RegistrationOpensAfterClose {
        open: DayOffset,
        close: DayOffset,
    },
    RegistrationClosesAfterStart {
        close: DayOffset,
    },
    WithdrawalAfterStart {
        deadline: DayOffset,
    },
    RoundOutsideTournament {
        division_id: String,
        round_index: usize,
        offset: DayOffset,
    },
    UnrepresentableDate {
        field: String,
        offset: DayOffset,
    },
    TeeTimeOutsideTournament {
        slot: usize,
        day_offset: DayOffset,
    },
    DuplicateTeeTimeDay {
        slot: usize,
        day_offset: DayOffset,
    },
}

impl ValidationIssue {
    /// Whether this issue describes an inverted or otherwise invalid date range.
    #[must_use]
    pub const fn is_date_range(&self) -> bool {
        matches!(
            self,
            Self::EndBeforeStart { .. } | Self::RegistrationOpensAfterClose { .. }
        )
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReferenceDate => write!(f, "tournament start date is not set"),
            Self::EndBeforeStart { end_offset } => {
                write!(f, "end date is {} day(s) before start date", -end_offset)
            }
            Self::RegistrationOpensAfterClose { open, close } => write!(
                f,
                "registration opens at day {open} but closes at day {close}"
            ),
            Self::RegistrationClosesAfterStart { close } => {
                write!(f, "registration closes {close} day(s) after the start date")
            }
            Self::WithdrawalAfterStart { deadline } => write!(
                f,
                "withdrawal deadline is {deadline} day(s) after the start date"
            ),
            Self::RoundOutsideTournament {
                division_id,
                round_index,
                offset,
            } => write!(
                f,
                "round {} of division '{division_id}' is on day {offset}, outside the tournament",
                round_index + 1
            ),
            Self::UnrepresentableDate { field, offset } => {
                write!(f, "{field} at offset {offset} is not a valid calendar date")
            }
            Self::TeeTimeOutsideTournament { slot, day_offset } => write!(
                f,
                "tee time {} is on day {day_offset}, outside the tournament",
                slot + 1
            ),
            Self::DuplicateTeeTimeDay { slot, day_offset } => write!(
                f,
                "tee time {} repeats day {day_offset}, which already has a tee time",
                slot + 1
            ),
        }
    }
}

/// Checks that must pass before any date is sent to the backend.
#[must_use]
pub fn validate_for_save(state: &WizardState) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Some(reference) = state.reference_date else {
        issues.push(ValidationIssue::MissingReferenceDate);
        return issues;
    };

    if let Some(end_offset) = state.end_date_offset
        && end_offset < 0
    {
        issues.push(ValidationIssue::EndBeforeStart { end_offset });
    }

    let window = state.registration;
    if let (Some(open), Some(close)) = (window.open, window.close)
        && open > close
    {
        issues.push(ValidationIssue::RegistrationOpensAfterClose { open, close });
    }

    let mut check = |field: String, offset: DayOffset| {
        if to_date(offset, reference).is_err() {
            issues.push(ValidationIssue::UnrepresentableDate { field, offset });
        }
    };
    if let Some(end_offset) = state.end_date_offset {
        check("endDate".to_string(), end_offset);
    }
    for (field, offset) in [
        ("regStartDate", window.open),
        ("regEndDate", window.close),
        ("maxAllowedWithdraDate", window.withdrawal_deadline),
    ] {
        if let Some(offset) = offset {
            check(field.to_string(), offset);
        }
    }
    for (division_id, round_index, offset) in state.rounds.iter() {
        check(format!("{division_id} round {}", round_index + 1), offset);
    }
    for (slot, tee_time) in state.tee_times.iter().enumerate() {
        check(format!("tee time {}", slot + 1), tee_time.day_offset);
    }

    let mut seen = HashSet::new();
    for (slot, tee_time) in state.tee_times.iter().enumerate() {
        let day_offset = tee_time.day_offset;
        let past_end = state.end_date_offset.is_some_and(|end| day_offset > end);
        if day_offset < 0 || past_end {
            issues.push(ValidationIssue::TeeTimeOutsideTournament { slot, day_offset });
        } else if !seen.insert(day_offset) {
            issues.push(ValidationIssue::DuplicateTeeTimeDay { slot, day_offset });
        }
    }

    issues
}

/// Save checks plus the stricter rules applied before a tournament goes live.
#[must_use]
pub fn validate_for_publish(state: &WizardState) -> Vec<ValidationIssue> {
    let mut issues = validate_for_save(state);
    if state.reference_date.is_none() {
        return issues;
    }

    if let Some(close) = state.registration.close
        && close > 0
    {
        issues.push(ValidationIssue::RegistrationClosesAfterStart { close });
    }
    if let Some(deadline) = state.registration.withdrawal_deadline
        && deadline > 0
    {
        issues.push(ValidationIssue::WithdrawalAfterStart { deadline });
    }
    let last_day = state.end_date_offset.unwrap_or(0);
    for (division_id, round_index, offset) in state.rounds.iter() {
        if offset < 0 || offset > last_day {
            issues.push(ValidationIssue::RoundOutsideTournament {
                division_id: division_id.to_string(),
                round_index,
                offset,
            });
        }
    }
    // save checks already bound tee times by a known end date
    if state.end_date_offset.is_none() {
        for (slot, tee_time) in state.tee_times.iter().enumerate() {
            if tee_time.day_offset > last_day {
                issues.push(ValidationIssue::TeeTimeOutsideTournament {
                    slot,
                    day_offset: tee_time.day_offset,
                });
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DivisionRounds, RegistrationWindow, RoundSchedule, TeeTimeOffset};
    use chrono::NaiveDate;

    fn valid_state() -> WizardState {
        WizardState {
            reference_date: NaiveDate::from_ymd_opt(2026, 4, 1),
            end_date_offset: Some(2),
            registration: RegistrationWindow {
                open: Some(-30),
                close: Some(-3),
                withdrawal_deadline: Some(-7),
            },
            rounds: RoundSchedule {
                divisions: vec![DivisionRounds {
                    division_id: "open".to_string(),
                    offsets: vec![0, 1, 2],
                }],
            },
            ..WizardState::default()
        }
    }

    #[test]
    fn valid_state_passes_both_levels() {
        let state = valid_state();
        assert!(validate_for_save(&state).is_empty());
        assert!(validate_for_publish(&state).is_empty());
    }

    #[test]
    fn save_rejects_inverted_ranges() {
        let mut state = valid_state();
        state.end_date_offset = Some(-1);
        state.registration.open = Some(-2);
        let issues = validate_for_save(&state);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(ValidationIssue::is_date_range));
        assert_eq!(
            issues[0].to_string(),
            "end date is 1 day(s) before start date"
        );
    }

    #[test]
    fn save_requires_reference() {
        let mut state = valid_state();
        state.reference_date = None;
        assert_eq!(
            validate_for_save(&state),
            vec![ValidationIssue::MissingReferenceDate]
        );
        assert_eq!(
            validate_for_publish(&state),
            vec![ValidationIssue::MissingReferenceDate]
        );
    }

    #[test]
    fn publish_enforces_registration_and_round_bounds() {
        let mut state = valid_state();
        state.registration.close = Some(1);
        state.registration.withdrawal_deadline = Some(2);
        state.rounds.divisions[0].offsets[2] = 5;
        assert!(validate_for_save(&state).is_empty());
        let issues = validate_for_publish(&state);
        assert_eq!(
            issues,
            vec![
                ValidationIssue::RegistrationClosesAfterStart { close: 1 },
                ValidationIssue::WithdrawalAfterStart { deadline: 2 },
                ValidationIssue::RoundOutsideTournament {
                    division_id: "open".to_string(),
                    round_index: 2,
                    offset: 5,
                },
            ]
        );

        let mut state = valid_state();
        state.tee_times = vec![tee_time(0), tee_time(1), tee_time(4)];
        assert!(validate_for_publish(&state).contains(
            &ValidationIssue::TeeTimeOutsideTournament {
                slot: 2,
                day_offset: 4,
            }
        ));

        // without an end date the tournament is a single day
        state.end_date_offset = None;
        state.rounds.divisions[0].offsets = vec![0];
        state.tee_times = vec![tee_time(0), tee_time(1)];
        assert!(validate_for_save(&state).is_empty());
        assert_eq!(
            validate_for_publish(&state),
            vec![ValidationIssue::TeeTimeOutsideTournament {
                slot: 1,
                day_offset: 1,
            }]
        );
    }

    #[test]
    fn unrepresentable_offsets_are_reported() {
        let mut state = valid_state();
        state.tee_times.push(TeeTimeOffset {
            start_time: "08:00".to_string(),
            day_offset: i64::MAX,
            extra: crate::record::Extra::new(),
        });
        let issues = validate_for_save(&state);
        assert!(matches!(
            issues.as_slice(),
            [
                ValidationIssue::UnrepresentableDate { field, .. },
                ValidationIssue::TeeTimeOutsideTournament { slot: 0, .. },
            ] if field == "tee time 1"
        ));
    }

    fn tee_time(day_offset: DayOffset) -> TeeTimeOffset {
        TeeTimeOffset {
            start_time: "08:00".to_string(),
            day_offset,
            extra: crate::record::Extra::new(),
        }
    }

    #[test]
    fn save_rejects_tee_times_sharing_a_day_or_outside_the_range() {
        let mut state = valid_state();
        state.tee_times = vec![tee_time(1), tee_time(1), tee_time(2)];
        assert_eq!(
            validate_for_save(&state),
            vec![ValidationIssue::DuplicateTeeTimeDay {
                slot: 1,
                day_offset: 1,
            }]
        );

        state.tee_times = vec![tee_time(-1), tee_time(0), tee_time(3)];
        let issues = validate_for_save(&state);
        assert_eq!(
            issues,
            vec![
                ValidationIssue::TeeTimeOutsideTournament {
                    slot: 0,
                    day_offset: -1,
                },
                ValidationIssue::TeeTimeOutsideTournament {
                    slot: 2,
                    day_offset: 3,
                },
            ]
        );
        assert_eq!(
            issues[1].to_string(),
            "tee time 3 is on day 3, outside the tournament"
        );
    }
}
