//! Teeline wizard core
//!
//! Date and day-offset reconciliation for the tournament-creation wizard.
//! Tournaments are stored with absolute calendar dates; the wizard edits them
//! as offsets from the start date so that moving the start cascades to
//! registration deadlines, round days and tee times. This crate has no UI or
//! transport dependencies; the REST layer plugs in through [`TournamentStore`].

pub mod codec;
pub mod config;
pub mod reconcile;
pub mod record;
pub mod remap;
pub mod session;
pub mod state;
pub mod validate;

use anyhow::Context;

// Re-export commonly used types
pub use codec::{
    CodecError, DayOffset, date_string, format_date, offset_between, parse_date, to_date,
    to_offset,
};
pub use config::{ConfigError, OffsetWindow, WizardConfig};
pub use reconcile::{
    FallbackReason, LoadDiagnostic, LoadOutcome, LoadReport, ReconcileError, RoundOffset,
    RoundResolution, from_record, remap_to_range, set_end_date_offset, set_offset,
    set_reference_date, set_round_count, set_tee_time_start, to_patch, to_record,
};
pub use record::{
    BasicInfo, Division, RegPaymentInfo, StoredRound, StoredTeeTime, TournamentPatch,
    TournamentRecord,
};
pub use remap::{RemapError, remap_dates};
pub use session::{SaveTicket, SessionError, SessionStatus, WizardSession};
pub use state::{
    DivisionRounds, OffsetPath, RegistrationWindow, RoundSchedule, Section, TeeTimeOffset,
    WizardState,
};
pub use validate::{ValidationIssue, validate_for_publish, validate_for_save};

/// Trait for abstracting the tournament backend.
/// The REST client (or a test double) provides this.
pub trait TournamentStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch a tournament record
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or the record is
    /// malformed.
    fn load_tournament(&self, tournament_id: &str) -> Result<Option<TournamentRecord>, Self::Error>;

    /// Persist the sections present in `patch`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    fn save_tournament(
        &self,
        tournament_id: &str,
        patch: &TournamentPatch,
    ) -> Result<(), Self::Error>;
}

/// Opens wizard sessions against a store and pushes their saves back.
pub struct WizardEngine<S>
where
    S: TournamentStore,
{
    store: S,
    config: WizardConfig,
}

impl<S> WizardEngine<S>
where
    S: TournamentStore,
{
    #[must_use]
    pub const fn new(store: S, config: WizardConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub const fn config(&self) -> &WizardConfig {
        &self.config
    }

    /// Start a session over a tournament that has not been stored yet.
    #[must_use]
    pub fn create(&self, tournament_id: &str) -> WizardSession {
        WizardSession::new(
            tournament_id,
            TournamentRecord::default(),
            self.config.clone(),
        )
    }

    /// Load a tournament and reconcile it into a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn open(&self, tournament_id: &str) -> Result<Option<WizardSession>, anyhow::Error> {
        let record = self
            .store
            .load_tournament(tournament_id)
            .with_context(|| format!("loading tournament '{tournament_id}'"))?;
        Ok(record.map(|record| {
            let session = WizardSession::new(tournament_id, record, self.config.clone());
            if session.report().fallback_count() > 0 {
                log::warn!(
                    "tournament '{tournament_id}' opened with {} round fallback(s)",
                    session.report().fallback_count()
                );
            }
            session
        }))
    }

    /// Save the session's dirty sections. Returns `false` when there was
    /// nothing to save.
    ///
    /// # Errors
    ///
    /// Fails when another save is in flight, when dates cannot be saved, or
    /// when the store rejects the patch. Failed saves are not retried.
    pub fn save(&self, session: &mut WizardSession) -> Result<bool, SessionError> {
        let Some(ticket) = session.begin_save()? else {
            return Ok(false);
        };
        match self
            .store
            .save_tournament(session.tournament_id(), ticket.patch())
        {
            Ok(()) => session.complete_save(ticket).map(|()| true),
            Err(err) => Err(session.fail_save(ticket, err.to_string())),
        }
    }
}
