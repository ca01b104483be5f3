use chrono::{Days, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use teeline_core::{
    BasicInfo, Division, OffsetPath, ReconcileError, RegPaymentInfo, RoundOffset, StoredRound,
    StoredTeeTime, TournamentRecord, ValidationIssue, WizardConfig, WizardState, format_date,
    from_record, remap_to_range, set_end_date_offset, set_offset, set_reference_date, to_date,
    to_offset, to_record,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn random_date(rng: &mut ChaCha20Rng) -> NaiveDate {
    ymd(2000, 1, 1)
        .checked_add_days(Days::new(rng.gen_range(0..20_000)))
        .unwrap()
}

/// A well-formed record: every round inside the sanity window and one tee time
/// per day.
fn random_record(rng: &mut ChaCha20Rng) -> TournamentRecord {
    let start = random_date(rng);
    let last_day: i64 = rng.gen_range(0..=4);
    let at = |offset: i64| format_date(to_date(offset, start).unwrap());
    let divisions = (0..rng.gen_range(1..=3))
        .map(|index| Division {
            id: format!("division-{index}"),
            rounds: (0..rng.gen_range(1..=3))
                .map(|_| StoredRound {
                    date: Some(at(rng.gen_range(0..=last_day))),
                    ..StoredRound::default()
                })
                .collect(),
            ..Division::default()
        })
        .collect();
    TournamentRecord {
        basic_info: BasicInfo {
            start_date: Some(format_date(start)),
            end_date: Some(at(last_day)),
            tee_times: (0..=last_day)
                .map(|day| StoredTeeTime {
                    start_time: format!(
                        "{:02}:{:02}",
                        rng.gen_range(6..=10),
                        rng.gen_range(0..4) * 15
                    ),
                    date: Some(at(day)),
                    ..StoredTeeTime::default()
                })
                .collect(),
            ..BasicInfo::default()
        },
        reg_payment_info: RegPaymentInfo {
            reg_start_date: Some(at(-rng.gen_range(20..=60))),
            reg_end_date: Some(at(-rng.gen_range(1..=10))),
            max_allowed_withdra_date: Some(at(-rng.gen_range(1..=14))),
            ..RegPaymentInfo::default()
        },
        divisions,
        ..TournamentRecord::default()
    }
}

fn load(record: &TournamentRecord) -> WizardState {
    from_record(record, &WizardConfig::default()).state
}

#[test]
fn offsets_round_trip_through_dates() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x7EE_71E);
    for _ in 0..500 {
        let reference = random_date(&mut rng);
        let date = random_date(&mut rng);
        let offset = to_offset(date, reference);
        assert_eq!(to_date(offset, reference).unwrap(), date);
    }
}

#[test]
fn sign_convention_matches_calendar() {
    let reference = ymd(2026, 4, 1);
    assert_eq!(to_offset(ymd(2026, 3, 25), reference), -7);
    assert_eq!(to_offset(ymd(2026, 4, 5), reference), 4);
    assert_eq!(to_date(-7, reference).unwrap(), ymd(2026, 3, 25));
}

#[test]
fn moving_start_keeps_registration_offsets() {
    let record = TournamentRecord {
        basic_info: BasicInfo {
            start_date: Some("2026-04-01".to_string()),
            end_date: Some("2026-04-01".to_string()),
            ..BasicInfo::default()
        },
        reg_payment_info: RegPaymentInfo {
            reg_start_date: Some("2026-03-02".to_string()),
            reg_end_date: Some("2026-03-29".to_string()),
            ..RegPaymentInfo::default()
        },
        ..TournamentRecord::default()
    };
    let state = load(&record);
    assert_eq!(state.registration.open, Some(-30));
    assert_eq!(state.registration.close, Some(-3));

    let moved = set_reference_date(&state, ymd(2026, 5, 1));
    assert_eq!(moved.registration, state.registration);
    let saved = to_record(&moved).unwrap();
    assert_eq!(
        saved.reg_payment_info.reg_start_date.as_deref(),
        Some("2026-04-01")
    );
    assert_eq!(
        saved.reg_payment_info.reg_end_date.as_deref(),
        Some("2026-04-28")
    );
    assert_eq!(saved.basic_info.start_date.as_deref(), Some("2026-05-01"));
}

#[test]
fn remapping_keeps_relative_positions() {
    let record = TournamentRecord {
        basic_info: BasicInfo {
            start_date: Some("2026-04-01".to_string()),
            end_date: Some("2026-04-03".to_string()),
            ..BasicInfo::default()
        },
        divisions: vec![Division {
            id: "open".to_string(),
            rounds: ["2026-04-01", "2026-04-02", "2026-04-03"]
                .into_iter()
                .map(|date| StoredRound {
                    date: Some(date.to_string()),
                    ..StoredRound::default()
                })
                .collect(),
            ..Division::default()
        }],
        ..TournamentRecord::default()
    };
    let config = WizardConfig::default();
    let state = load(&record);
    let remapped = remap_to_range(&state, ymd(2026, 5, 1), ymd(2026, 5, 9), &config).unwrap();
    assert_eq!(remapped.rounds.division("open").unwrap().offsets, vec![0, 4, 8]);
    assert_eq!(remapped.tee_times.len(), 9);

    let saved = to_record(&remapped).unwrap();
    let dates: Vec<_> = saved.divisions[0]
        .rounds
        .iter()
        .map(|round| round.date.clone().unwrap())
        .collect();
    assert_eq!(dates, vec!["2026-05-01", "2026-05-05", "2026-05-09"]);
}

#[test]
fn implausible_round_falls_back_to_its_index() {
    let record = TournamentRecord {
        basic_info: BasicInfo {
            start_date: Some("2026-04-01".to_string()),
            end_date: Some("2026-04-03".to_string()),
            ..BasicInfo::default()
        },
        divisions: vec![Division {
            id: "open".to_string(),
            rounds: vec![
                StoredRound::default(),
                StoredRound::default(),
                StoredRound {
                    date: Some("2026-04-11".to_string()),
                    ..StoredRound::default()
                },
            ],
            ..Division::default()
        }],
        ..TournamentRecord::default()
    };
    let outcome = from_record(&record, &WizardConfig::default());
    assert_eq!(outcome.state.rounds.get("open", 2), Some(2));
    assert!(matches!(
        outcome.report.rounds[2].resolution,
        RoundOffset::FallbackUsed { offset: 2, .. }
    ));
}

#[test]
fn save_then_load_is_idempotent() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5A7E);
    for _ in 0..200 {
        let state = load(&random_record(&mut rng));
        let reloaded = load(&to_record(&state).unwrap());
        assert_eq!(reloaded, state);
    }
}

#[test]
fn edits_survive_save_and_load() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xED17);
    let config = WizardConfig::default();
    for _ in 0..100 {
        let state = load(&random_record(&mut rng));
        let end = rng.gen_range(0..=6);
        let edited = set_end_date_offset(&state, end, &config).unwrap();
        let edited = set_offset(&edited, &OffsetPath::round("division-0", 0), end).unwrap();
        let edited = set_reference_date(&edited, random_date(&mut rng));
        let reloaded = load(&to_record(&edited).unwrap());
        assert_eq!(reloaded, edited);
    }
}

#[test]
fn single_day_tournament_has_one_tee_time() {
    let record = TournamentRecord {
        basic_info: BasicInfo {
            start_date: Some("2026-07-04".to_string()),
            end_date: Some("2026-07-04".to_string()),
            ..BasicInfo::default()
        },
        ..TournamentRecord::default()
    };
    let state = load(&record);
    assert_eq!(state.end_date_offset, Some(0));
    assert_eq!(state.tee_times.len(), 1);
    assert_eq!(state.tee_times[0].day_offset, 0);
    assert_eq!(state.tournament_days(), Some(1));
}

#[test]
fn inverted_dates_never_reach_the_record() {
    let record = TournamentRecord {
        basic_info: BasicInfo {
            start_date: Some("2026-04-05".to_string()),
            end_date: Some("2026-04-01".to_string()),
            ..BasicInfo::default()
        },
        ..TournamentRecord::default()
    };
    let state = load(&record);
    assert_eq!(state.end_date_offset, Some(-4));
    assert_eq!(
        to_record(&state),
        Err(ReconcileError::InvalidDateRange(vec![
            ValidationIssue::EndBeforeStart { end_offset: -4 }
        ]))
    );
}
