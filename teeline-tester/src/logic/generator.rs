//! Seeded random tournaments shaped like backend records.

use chrono::{Days, NaiveDate};
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde_json::json;
use teeline_core::{
    BasicInfo, DayOffset, Division, RegPaymentInfo, StoredRound, StoredTeeTime, TournamentRecord,
    date_string, format_date,
};

const EPOCH: (i32, u32, u32) = (2020, 1, 1);
const EPOCH_SPAN_DAYS: u64 = 365 * 15;

pub fn random_date(rng: &mut ChaCha20Rng) -> NaiveDate {
    let (y, m, d) = EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    epoch
        .checked_add_days(Days::new(rng.gen_range(0..EPOCH_SPAN_DAYS)))
        .unwrap_or(epoch)
}

/// Shape of a generated tournament.
#[derive(Debug, Clone, Copy)]
pub struct TournamentShape {
    pub start: NaiveDate,
    /// Offset of the last tournament day.
    pub last_day: DayOffset,
    pub divisions: usize,
}

impl TournamentShape {
    pub fn random(rng: &mut ChaCha20Rng) -> Self {
        Self {
            start: random_date(rng),
            last_day: rng.gen_range(0..=4),
            divisions: rng.gen_range(1..=3),
        }
    }

    pub fn single_day(start: NaiveDate) -> Self {
        Self {
            start,
            last_day: 0,
            divisions: 1,
        }
    }
}

fn date_at(shape: &TournamentShape, offset: DayOffset) -> String {
    date_string(offset, Some(shape.start)).unwrap_or_else(|_| format_date(shape.start))
}

/// Build a well-formed record: rounds fall inside the tournament, every day
/// has one tee time, and registration closes before the start.
pub fn generate_record(rng: &mut ChaCha20Rng, shape: &TournamentShape) -> TournamentRecord {
    let divisions = (0..shape.divisions)
        .map(|index| {
            let rounds = (0..rng.gen_range(1..=4))
                .map(|_| StoredRound {
                    date: Some(date_at(shape, rng.gen_range(0..=shape.last_day))),
                    extra: json!({ "holes": 18 })
                        .as_object()
                        .cloned()
                        .unwrap_or_default(),
                })
                .collect();
            Division {
                id: format!("division-{}", index + 1),
                rounds,
                ..Division::default()
            }
        })
        .collect();

    let tee_times = (0..=shape.last_day)
        .map(|day| StoredTeeTime {
            start_time: format!(
                "{:02}:{:02}",
                rng.gen_range(6..=10),
                rng.gen_range(0..4) * 15
            ),
            date: Some(date_at(shape, day)),
            ..StoredTeeTime::default()
        })
        .collect();

    let mut basic_info = BasicInfo {
        start_date: Some(format_date(shape.start)),
        end_date: Some(date_at(shape, shape.last_day)),
        tee_times,
        ..BasicInfo::default()
    };
    basic_info
        .extra
        .insert("name".to_string(), json!(format!("Sweep {}", shape.start)));

    TournamentRecord {
        basic_info,
        reg_payment_info: RegPaymentInfo {
            reg_start_date: Some(date_at(shape, -rng.gen_range(14..=90))),
            reg_end_date: Some(date_at(shape, -rng.gen_range(1..=10))),
            max_allowed_withdra_date: Some(date_at(shape, -rng.gen_range(1..=14))),
            ..RegPaymentInfo::default()
        },
        divisions,
        ..TournamentRecord::default()
    }
}
