use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::codec::DayOffset;
use crate::record::{Extra, TournamentRecord};

/// Top-level part of a tournament, tracked for dirtiness and saved as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    BasicInfo,
    Courses,
    Divisions,
    RegistrationInfo,
    ColorTheme,
}

impl Section {
    pub const ALL: [Self; 5] = [
        Self::BasicInfo,
        Self::Courses,
        Self::Divisions,
        Self::RegistrationInfo,
        Self::ColorTheme,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::BasicInfo => "basicInfo",
            Self::Courses => "courses",
            Self::Divisions => "divisions",
            Self::RegistrationInfo => "regPaymentInfo",
            Self::ColorTheme => "colorTheme",
        }
    }
}

/// Registration deadlines, as offsets from the tournament start. `None` means
/// the stored date was absent or could not be expressed as an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegistrationWindow {
    pub open: Option<DayOffset>,
    pub close: Option<DayOffset>,
    pub withdrawal_deadline: Option<DayOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionRounds {
    pub division_id: String,
    /// Round offsets; the position is the round index.
    pub offsets: Vec<DayOffset>,
}

/// Per-division round offsets. Round indices are contiguous from 0 because
/// they are vector positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RoundSchedule {
    pub divisions: Vec<DivisionRounds>,
}

impl RoundSchedule {
    #[must_use]
    pub fn division(&self, division_id: &str) -> Option<&DivisionRounds> {
        self.divisions.iter().find(|d| d.division_id == division_id)
    }

    pub fn division_mut(&mut self, division_id: &str) -> Option<&mut DivisionRounds> {
        self.divisions
            .iter_mut()
            .find(|d| d.division_id == division_id)
    }

    #[must_use]
    pub fn get(&self, division_id: &str, round_index: usize) -> Option<DayOffset> {
        self.division(division_id)
            .and_then(|d| d.offsets.get(round_index).copied())
    }

    /// Every `(division_id, round_index, offset)` in schedule order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize, DayOffset)> + '_ {
        self.divisions.iter().flat_map(|division| {
            division
                .offsets
                .iter()
                .enumerate()
                .map(move |(index, offset)| (division.division_id.as_str(), index, *offset))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeeTimeOffset {
    /// Wall-clock `HH:MM`.
    pub start_time: String,
    pub day_offset: DayOffset,
    /// Backend fields of the tee time the wizard does not edit.
    #[serde(default)]
    pub extra: Extra,
}

/// Addressable offset fields of a [`WizardState`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OffsetPath {
    RegistrationOpen,
    RegistrationClose,
    WithdrawalDeadline,
    Round {
        division_id: String,
        round_index: usize,
    },
    TeeTime {
        slot: usize,
    },
}

impl OffsetPath {
    #[must_use]
    pub fn round(division_id: impl Into<String>, round_index: usize) -> Self {
        Self::Round {
            division_id: division_id.into(),
            round_index,
        }
    }

    /// Section marked dirty when this field changes.
    #[must_use]
    pub const fn section(&self) -> Section {
        match self {
            Self::RegistrationOpen | Self::RegistrationClose | Self::WithdrawalDeadline => {
                Section::RegistrationInfo
            }
            Self::Round { .. } => Section::Divisions,
            Self::TeeTime { .. } => Section::BasicInfo,
        }
    }
}

/// Offset-based working copy of a tournament.
///
/// Dates live here only as offsets from `reference_date`; everything else the
/// record carried sits in `details` with its date fields cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WizardState {
    pub reference_date: Option<NaiveDate>,
    pub end_date_offset: Option<DayOffset>,
    pub registration: RegistrationWindow,
    pub rounds: RoundSchedule,
    pub tee_times: Vec<TeeTimeOffset>,
    pub details: TournamentRecord,
}

impl WizardState {
    /// Number of tournament days, when the duration is known and not inverted.
    #[must_use]
    pub fn tournament_days(&self) -> Option<usize> {
        self.end_date_offset
            .and_then(|offset| usize::try_from(offset).ok())
            .map(|offset| offset + 1)
    }

    #[must_use]
    pub fn offset_at(&self, path: &OffsetPath) -> Option<DayOffset> {
        match path {
            OffsetPath::RegistrationOpen => self.registration.open,
            OffsetPath::RegistrationClose => self.registration.close,
            OffsetPath::WithdrawalDeadline => self.registration.withdrawal_deadline,
            OffsetPath::Round {
                division_id,
                round_index,
            } => self.rounds.get(division_id, *round_index),
            OffsetPath::TeeTime { slot } => self.tee_times.get(*slot).map(|t| t.day_offset),
        }
    }
}
