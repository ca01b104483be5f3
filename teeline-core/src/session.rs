use chrono::NaiveDate;
use log::{debug, error, info};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::codec::DayOffset;
use crate::config::WizardConfig;
use crate::reconcile::{self, LoadReport, ReconcileError};
use crate::record::{TournamentPatch, TournamentRecord};
use crate::state::{OffsetPath, Section, WizardState};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a save is already in flight for tournament '{0}'")]
    SaveInFlight(String),
    #[error("save ticket {0} does not match the save in flight")]
    StaleTicket(u64),
    #[error("section {0:?} has no free-form fields")]
    NotEditable(Section),
    #[error("backend rejected the save: {0}")]
    Store(String),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Editing,
    Saving,
    /// Working state matches the last saved record.
    Saved,
    /// Working state was reverted to the last saved record.
    Discarded,
}

/// Claim on the single in-flight save of a session. Hand it back through
/// [`WizardSession::complete_save`] or [`WizardSession::fail_save`].
#[derive(Debug)]
pub struct SaveTicket {
    id: u64,
    generation: u64,
    patch: TournamentPatch,
}

impl SaveTicket {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn patch(&self) -> &TournamentPatch {
        &self.patch
    }
}

/// Edit session over one tournament: working state, per-section dirty
/// tracking, and save serialization.
#[derive(Debug, Clone)]
pub struct WizardSession {
    tournament_id: String,
    config: WizardConfig,
    last_saved: TournamentRecord,
    state: WizardState,
    report: LoadReport,
    /// Section -> edit generation of its most recent change.
    dirty: BTreeMap<Section, u64>,
    generation: u64,
    next_ticket: u64,
    in_flight: Option<u64>,
    status: SessionStatus,
}

impl WizardSession {
    #[must_use]
    pub fn new(
        tournament_id: impl Into<String>,
        record: TournamentRecord,
        config: WizardConfig,
    ) -> Self {
        let outcome = reconcile::from_record(&record, &config);
        Self {
            tournament_id: tournament_id.into(),
            config,
            last_saved: record,
            state: outcome.state,
            report: outcome.report,
            dirty: BTreeMap::new(),
            generation: 0,
            next_ticket: 1,
            in_flight: None,
            status: SessionStatus::Saved,
        }
    }

    #[must_use]
    pub fn tournament_id(&self) -> &str {
        &self.tournament_id
    }

    #[must_use]
    pub const fn state(&self) -> &WizardState {
        &self.state
    }

    /// Report from the most recent load (initial open or cancel).
    #[must_use]
    pub const fn report(&self) -> &LoadReport {
        &self.report
    }

    #[must_use]
    pub const fn last_saved(&self) -> &TournamentRecord {
        &self.last_saved
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn dirty_sections(&self) -> Vec<Section> {
        self.dirty.keys().copied().collect()
    }

    #[must_use]
    pub fn is_dirty(&self, section: Section) -> bool {
        self.dirty.contains_key(&section)
    }

    #[must_use]
    pub const fn save_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    fn commit(&mut self, next: WizardState, sections: &[Section]) {
        self.state = next;
        self.generation += 1;
        for section in sections {
            self.dirty.insert(*section, self.generation);
        }
        if self.in_flight.is_none() {
            self.status = SessionStatus::Editing;
        }
    }

    /// # Errors
    ///
    /// Propagates [`reconcile::set_offset`] failures; state is unchanged.
    pub fn set_offset(&mut self, path: &OffsetPath, offset: DayOffset) -> Result<(), SessionError> {
        let next = reconcile::set_offset(&self.state, path, offset)?;
        self.commit(next, &[path.section()]);
        Ok(())
    }

    /// Move the start date keeping every offset. Registration and round dates
    /// move with it, so their sections are saved too.
    pub fn set_reference_date(&mut self, reference: NaiveDate) {
        let next = reconcile::set_reference_date(&self.state, reference);
        self.commit(
            next,
            &[
                Section::BasicInfo,
                Section::RegistrationInfo,
                Section::Divisions,
            ],
        );
    }

    /// # Errors
    ///
    /// Rejects an end before the start.
    pub fn set_end_date_offset(&mut self, offset: DayOffset) -> Result<(), SessionError> {
        let next = reconcile::set_end_date_offset(&self.state, offset, &self.config)?;
        self.commit(next, &[Section::BasicInfo]);
        Ok(())
    }

    /// # Errors
    ///
    /// Rejects an unknown slot or a malformed time.
    pub fn set_tee_time_start(&mut self, slot: usize, start_time: &str) -> Result<(), SessionError> {
        let next = reconcile::set_tee_time_start(&self.state, slot, start_time)?;
        self.commit(next, &[Section::BasicInfo]);
        Ok(())
    }

    /// # Errors
    ///
    /// Rejects an unknown division.
    pub fn set_round_count(&mut self, division_id: &str, count: usize) -> Result<(), SessionError> {
        let next = reconcile::set_round_count(&self.state, division_id, count)?;
        self.commit(next, &[Section::Divisions]);
        Ok(())
    }

    /// Both tournament dates changed: rescale scheduled rounds proportionally.
    ///
    /// # Errors
    ///
    /// See [`reconcile::remap_to_range`].
    pub fn change_tournament_dates(
        &mut self,
        new_start: NaiveDate,
        new_end: NaiveDate,
    ) -> Result<(), SessionError> {
        let next = reconcile::remap_to_range(&self.state, new_start, new_end, &self.config)?;
        self.commit(
            next,
            &[
                Section::BasicInfo,
                Section::RegistrationInfo,
                Section::Divisions,
            ],
        );
        Ok(())
    }

    pub fn set_courses(&mut self, courses: Vec<Value>) {
        let mut next = self.state.clone();
        next.details.courses = courses;
        self.commit(next, &[Section::Courses]);
    }

    pub fn set_color_theme(&mut self, theme: Value) {
        let mut next = self.state.clone();
        next.details.color_theme = Some(theme);
        self.commit(next, &[Section::ColorTheme]);
    }

    /// Set a non-date field such as the tournament name or entry fee.
    ///
    /// # Errors
    ///
    /// Only basic info and registration info carry free-form fields.
    pub fn set_detail(
        &mut self,
        section: Section,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), SessionError> {
        let mut next = self.state.clone();
        let extra = match section {
            Section::BasicInfo => &mut next.details.basic_info.extra,
            Section::RegistrationInfo => &mut next.details.reg_payment_info.extra,
            other => return Err(SessionError::NotEditable(other)),
        };
        extra.insert(key.into(), value);
        self.commit(next, &[section]);
        Ok(())
    }

    /// Start saving the dirty sections. Returns `Ok(None)` when nothing is
    /// dirty.
    ///
    /// # Errors
    ///
    /// [`SessionError::SaveInFlight`] while a previous ticket is outstanding,
    /// or a reconcile error when the dates cannot be saved.
    pub fn begin_save(&mut self) -> Result<Option<SaveTicket>, SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::SaveInFlight(self.tournament_id.clone()));
        }
        if self.dirty.is_empty() {
            return Ok(None);
        }
        let patch = reconcile::to_patch(&self.state, self.dirty.keys())?;
        let ticket = SaveTicket {
            id: self.next_ticket,
            generation: self.generation,
            patch,
        };
        self.next_ticket += 1;
        self.in_flight = Some(ticket.id);
        self.status = SessionStatus::Saving;
        debug!(
            "save {} started for '{}' ({} section(s))",
            ticket.id,
            self.tournament_id,
            self.dirty.len()
        );
        Ok(Some(ticket))
    }

    fn release(&mut self, ticket: &SaveTicket) -> Result<(), SessionError> {
        if self.in_flight != Some(ticket.id) {
            return Err(SessionError::StaleTicket(ticket.id));
        }
        self.in_flight = None;
        Ok(())
    }

    /// The backend accepted `ticket`. Sections edited after the ticket was
    /// issued stay dirty.
    ///
    /// # Errors
    ///
    /// [`SessionError::StaleTicket`] if `ticket` is not the save in flight.
    pub fn complete_save(&mut self, ticket: SaveTicket) -> Result<(), SessionError> {
        self.release(&ticket)?;
        self.last_saved.apply_patch(&ticket.patch);
        self.dirty
            .retain(|_, edited_at| *edited_at > ticket.generation);
        self.status = if self.dirty.is_empty() {
            SessionStatus::Saved
        } else {
            SessionStatus::Editing
        };
        info!("save {} completed for '{}'", ticket.id, self.tournament_id);
        Ok(())
    }

    /// The backend rejected `ticket`. Dirty flags are kept and nothing is
    /// retried; the returned error is meant for the user.
    pub fn fail_save(&mut self, ticket: SaveTicket, reason: impl Into<String>) -> SessionError {
        if let Err(stale) = self.release(&ticket) {
            return stale;
        }
        self.status = SessionStatus::Editing;
        let reason = reason.into();
        error!("save {} failed for '{}': {reason}", ticket.id, self.tournament_id);
        SessionError::Store(reason)
    }

    /// Drop every unsaved edit and reload from the last saved record.
    ///
    /// # Errors
    ///
    /// Cancelling while a save is in flight is not supported.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::SaveInFlight(self.tournament_id.clone()));
        }
        let outcome = reconcile::from_record(&self.last_saved, &self.config);
        self.state = outcome.state;
        self.report = outcome.report;
        self.dirty.clear();
        self.status = SessionStatus::Discarded;
        Ok(())
    }
}
