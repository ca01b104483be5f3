use anyhow::{Result, anyhow, bail, ensure};
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde_json::json;
use teeline_core::{
    BasicInfo, DayOffset, Division, OffsetPath, Section, SessionError, SessionStatus,
    StoredRound, TournamentRecord, ValidationIssue, WizardConfig, WizardSession, WizardState,
    date_string, format_date, from_record, offset_between, remap_to_range, set_offset,
    set_reference_date, to_date, to_offset, to_record, validate_for_publish, validate_for_save,
};

use super::generator::{TournamentShape, generate_record, random_date};

pub type ScenarioCheck = fn(&mut ChaCha20Rng, &WizardConfig) -> Result<()>;

/// A named property checked once per iteration against a fresh seeded RNG.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    check: ScenarioCheck,
}

impl Scenario {
    const fn new(key: &'static str, description: &'static str, check: ScenarioCheck) -> Self {
        Self {
            key,
            description,
            check,
        }
    }

    pub fn run(&self, rng: &mut ChaCha20Rng, config: &WizardConfig) -> Result<()> {
        (self.check)(rng, config)
    }
}

pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "round-trip",
            "offset -> date -> offset is lossless",
            round_trip,
        ),
        Scenario::new(
            "sign-convention",
            "dates before the start have negative offsets",
            sign_convention,
        ),
        Scenario::new(
            "reference-shift",
            "moving the start keeps every offset",
            reference_shift,
        ),
        Scenario::new(
            "proportional-remap",
            "changing both dates rescales rounds in order",
            proportional_remap,
        ),
        Scenario::new(
            "fallback-window",
            "implausible round dates fall back to their index",
            fallback_window,
        ),
        Scenario::new(
            "save-load-idempotent",
            "loading a saved state gives the same state",
            save_load_idempotent,
        ),
        Scenario::new(
            "single-day",
            "one-day tournaments keep exactly one tee time",
            single_day,
        ),
        Scenario::new(
            "save-gate",
            "one save in flight per session, failures keep edits",
            save_gate,
        ),
        Scenario::new(
            "publish-checks",
            "publishing rejects registration after the start",
            publish_checks,
        ),
    ]
}

pub fn find_scenario(key: &str) -> Option<Scenario> {
    catalog().into_iter().find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

fn random_state(rng: &mut ChaCha20Rng, config: &WizardConfig) -> WizardState {
    let shape = TournamentShape::random(rng);
    from_record(&generate_record(rng, &shape), config).state
}

fn round_trip(rng: &mut ChaCha20Rng, _config: &WizardConfig) -> Result<()> {
    let reference = random_date(rng);
    let date = random_date(rng);
    let offset = to_offset(date, reference);
    let back = to_date(offset, reference)?;
    ensure!(
        back == date,
        "{date} -> offset {offset} -> {back} against {reference}"
    );
    Ok(())
}

fn sign_convention(rng: &mut ChaCha20Rng, _config: &WizardConfig) -> Result<()> {
    let reference = random_date(rng);
    let days: DayOffset = rng.gen_range(-60..=60);
    let date = to_date(days, reference)?;
    let offset = to_offset(date, reference);
    ensure!(offset == days, "{date} is {days} day(s) from {reference}, got {offset}");
    ensure!(
        (date < reference) == (offset < 0),
        "{date} vs {reference} has offset {offset} with the wrong sign"
    );
    Ok(())
}

fn reference_shift(rng: &mut ChaCha20Rng, config: &WizardConfig) -> Result<()> {
    let state = random_state(rng, config);
    let new_start = random_date(rng);
    let moved = set_reference_date(&state, new_start);
    let saved = to_record(&moved)?;

    let reg = &saved.reg_payment_info;
    for (field, stored, expected) in [
        (
            "regStartDate",
            reg.reg_start_date.as_deref(),
            state.registration.open,
        ),
        (
            "regEndDate",
            reg.reg_end_date.as_deref(),
            state.registration.close,
        ),
        (
            "maxAllowedWithdraDate",
            reg.max_allowed_withdra_date.as_deref(),
            state.registration.withdrawal_deadline,
        ),
    ] {
        let offset = stored
            .map(|raw| offset_between(raw, Some(new_start)))
            .transpose()?;
        ensure!(
            offset == expected,
            "{field} moved to offset {offset:?}, expected {expected:?}"
        );
    }
    ensure!(
        moved.rounds == state.rounds,
        "round offsets changed when the start moved"
    );
    Ok(())
}

fn proportional_remap(rng: &mut ChaCha20Rng, config: &WizardConfig) -> Result<()> {
    let state = random_state(rng, config);
    let new_start = random_date(rng);
    let span: DayOffset = rng.gen_range(0..=10);
    let new_end = to_date(span, new_start)?;
    let remapped = remap_to_range(&state, new_start, new_end, config)?;

    let before: Vec<DayOffset> = state.rounds.iter().map(|(_, _, offset)| offset).collect();
    let after: Vec<DayOffset> = remapped
        .rounds
        .iter()
        .map(|(_, _, offset)| offset)
        .collect();
    ensure!(before.len() == after.len(), "round count changed");
    ensure!(
        after.iter().all(|offset| (0..=span).contains(offset)),
        "remapped rounds {after:?} leave 0..={span}"
    );
    for (i, (a_before, a_after)) in before.iter().zip(&after).enumerate() {
        for (b_before, b_after) in before.iter().zip(&after).skip(i + 1) {
            if a_before <= b_before {
                ensure!(a_after <= b_after, "order broken: {before:?} -> {after:?}");
            }
            if b_before <= a_before {
                ensure!(b_after <= a_after, "order broken: {before:?} -> {after:?}");
            }
        }
    }
    if let (Some(min), Some(max)) = (before.iter().min(), before.iter().max())
        && min < max
    {
        for (old, new) in before.iter().zip(&after) {
            ensure!(old != min || *new == 0, "earliest round not on the new start");
            ensure!(old != max || *new == span, "latest round not on the new end");
        }
    }
    ensure!(
        remapped.registration == state.registration,
        "registration offsets changed during remap"
    );
    ensure!(
        remapped.tournament_days() == Some(remapped.tee_times.len()),
        "tee times were not refit to the new range"
    );
    Ok(())
}

fn fallback_window(rng: &mut ChaCha20Rng, config: &WizardConfig) -> Result<()> {
    let window = config.round_sanity_window;
    let start = random_date(rng);
    let inside = rng.gen_range(window.min..=window.max);
    let outside = if rng.gen_bool(0.5) {
        window.max + rng.gen_range(1..=30)
    } else {
        window.min - rng.gen_range(1..=30)
    };
    let round_at = |offset: DayOffset| -> Result<StoredRound> {
        Ok(StoredRound {
            date: Some(date_string(offset, Some(start))?),
            ..StoredRound::default()
        })
    };
    let record = TournamentRecord {
        basic_info: BasicInfo {
            start_date: Some(format_date(start)),
            ..BasicInfo::default()
        },
        divisions: vec![Division {
            id: "sweep".to_string(),
            rounds: vec![round_at(inside)?, round_at(outside)?],
            ..Division::default()
        }],
        ..TournamentRecord::default()
    };

    let outcome = from_record(&record, config);
    ensure!(
        outcome.state.rounds.get("sweep", 0) == Some(inside),
        "round at plausible offset {inside} was not kept"
    );
    ensure!(
        outcome.state.rounds.get("sweep", 1) == Some(1),
        "round at offset {outside} did not fall back to index 1"
    );
    ensure!(
        outcome.report.fallback_count() == 1,
        "expected one reported fallback, got {}",
        outcome.report.fallback_count()
    );
    Ok(())
}

fn save_load_idempotent(rng: &mut ChaCha20Rng, config: &WizardConfig) -> Result<()> {
    let state = random_state(rng, config);
    let saved = to_record(&state)?;
    let reloaded = from_record(&saved, config).state;
    ensure!(
        reloaded == state,
        "state changed across save/load: {}",
        serde_json::to_string(&saved)?
    );
    Ok(())
}

fn single_day(rng: &mut ChaCha20Rng, config: &WizardConfig) -> Result<()> {
    let shape = TournamentShape::single_day(random_date(rng));
    let state = from_record(&generate_record(rng, &shape), config).state;
    ensure!(
        state.end_date_offset == Some(0),
        "end offset {:?}",
        state.end_date_offset
    );
    ensure!(
        state.tee_times.len() == 1,
        "{} tee times for one day",
        state.tee_times.len()
    );
    let reloaded = from_record(&to_record(&state)?, config).state;
    ensure!(reloaded.tee_times.len() == 1, "tee times grew after save");
    Ok(())
}

fn save_gate(rng: &mut ChaCha20Rng, config: &WizardConfig) -> Result<()> {
    let shape = TournamentShape::random(rng);
    let record = generate_record(rng, &shape);
    let mut session = WizardSession::new("sweep", record, config.clone());

    session.set_offset(&OffsetPath::RegistrationClose, -rng.gen_range(1..=5))?;
    let ticket = session
        .begin_save()?
        .ok_or_else(|| anyhow!("edit did not mark the session dirty"))?;
    match session.begin_save() {
        Err(SessionError::SaveInFlight(_)) => {}
        other => bail!("second save was not rejected: {other:?}"),
    }

    session.set_color_theme(json!({ "primary": "#0b6623" }));
    session.complete_save(ticket)?;
    ensure!(
        session.dirty_sections() == vec![Section::ColorTheme],
        "dirty after save: {:?}",
        session.dirty_sections()
    );

    let ticket = session
        .begin_save()?
        .ok_or_else(|| anyhow!("theme edit was lost"))?;
    let err = session.fail_save(ticket, "simulated outage");
    ensure!(
        matches!(err, SessionError::Store(_)),
        "unexpected failure {err:?}"
    );
    ensure!(
        session.is_dirty(Section::ColorTheme) && !session.save_in_flight(),
        "failed save did not release the gate with edits kept"
    );

    session.cancel()?;
    let restored = from_record(session.last_saved(), config).state;
    ensure!(
        session.status() == SessionStatus::Discarded && session.state() == &restored,
        "cancel did not restore the last saved record"
    );
    Ok(())
}

fn publish_checks(rng: &mut ChaCha20Rng, config: &WizardConfig) -> Result<()> {
    let state = random_state(rng, config);
    ensure!(
        validate_for_publish(&state).is_empty(),
        "generated tournament not publishable"
    );
    let close = rng.gen_range(1..=5);
    let late = set_offset(&state, &OffsetPath::RegistrationClose, close)?;
    ensure!(
        validate_for_save(&late).is_empty(),
        "late registration should still save"
    );
    ensure!(
        validate_for_publish(&late).contains(&ValidationIssue::RegistrationClosesAfterStart {
            close
        }),
        "publish accepted registration closing after the start"
    );
    let past_end = state.end_date_offset.unwrap_or(0) + 1;
    ensure!(
        set_offset(&state, &OffsetPath::TeeTime { slot: 0 }, past_end).is_err(),
        "tee time moved past the last tournament day"
    );
    Ok(())
}
