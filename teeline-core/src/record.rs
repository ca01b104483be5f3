use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::Section;

/// Key/value pairs the wizard does not interpret but must send back untouched.
pub type Extra = Map<String, Value>;

/// Tee time as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoredTeeTime {
    #[serde(default)]
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tee_times: Vec<StoredTeeTime>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Registration and payment settings. Field names follow the backend,
/// including its `maxAllowedWithdraDate` spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegPaymentInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_allowed_withdra_date: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoredRound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Division {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub rounds: Vec<StoredRound>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A tournament as loaded from and saved to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TournamentRecord {
    #[serde(default)]
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub reg_payment_info: RegPaymentInfo,
    #[serde(default)]
    pub divisions: Vec<Division>,
    #[serde(default)]
    pub courses: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl TournamentRecord {
    /// Load a tournament record from backend JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a record.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Copy of this record with every date field cleared. This is the part of
    /// the record the wizard carries through unchanged.
    #[must_use]
    pub fn without_dates(&self) -> Self {
        let mut stripped = self.clone();
        stripped.basic_info.start_date = None;
        stripped.basic_info.end_date = None;
        stripped.basic_info.tee_times.clear();
        stripped.reg_payment_info.reg_start_date = None;
        stripped.reg_payment_info.reg_end_date = None;
        stripped.reg_payment_info.max_allowed_withdra_date = None;
        for round in stripped
            .divisions
            .iter_mut()
            .flat_map(|division| division.rounds.iter_mut())
        {
            round.date = None;
        }
        stripped
    }

    /// Overwrite the sections of `self` that are present in `patch`.
    pub fn apply_patch(&mut self, patch: &TournamentPatch) {
        if let Some(basic_info) = &patch.basic_info {
            self.basic_info = basic_info.clone();
        }
        if let Some(reg_payment_info) = &patch.reg_payment_info {
            self.reg_payment_info = reg_payment_info.clone();
        }
        if let Some(divisions) = &patch.divisions {
            self.divisions = divisions.clone();
        }
        if let Some(courses) = &patch.courses {
            self.courses = courses.clone();
        }
        if let Some(color_theme) = &patch.color_theme {
            self.color_theme = Some(color_theme.clone());
        }
    }
}

/// Partial update sent to the backend. Sections left as `None` are omitted
/// from the JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TournamentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_info: Option<BasicInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_payment_info: Option<RegPaymentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisions: Option<Vec<Division>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme: Option<Value>,
}

impl TournamentPatch {
    /// Select `sections` out of a fully resolved record.
    #[must_use]
    pub fn from_record<'a>(
        record: &TournamentRecord,
        sections: impl IntoIterator<Item = &'a Section>,
    ) -> Self {
        let mut patch = Self::default();
        for section in sections {
            match section {
                Section::BasicInfo => patch.basic_info = Some(record.basic_info.clone()),
                Section::RegistrationInfo => {
                    patch.reg_payment_info = Some(record.reg_payment_info.clone());
                }
                Section::Divisions => patch.divisions = Some(record.divisions.clone()),
                Section::Courses => patch.courses = Some(record.courses.clone()),
                Section::ColorTheme => patch.color_theme = record.color_theme.clone(),
            }
        }
        patch
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.basic_info.is_none()
            && self.reg_payment_info.is_none()
            && self.divisions.is_none()
            && self.courses.is_none()
            && self.color_theme.is_none()
    }
}
