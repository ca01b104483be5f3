use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;
use std::time::Instant;
use teeline_core::{
    TournamentRecord, WizardConfig, from_record, to_record, validate_for_publish,
};

use super::ScenarioResult;

/// Load a stored tournament, save it back, and reload it.
///
/// Load diagnostics and publish problems become notes. A failed save or a
/// state that changes across save/load is a failure.
pub fn check_record_file(path: &Path, config: &WizardConfig) -> Result<ScenarioResult> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record = TournamentRecord::from_json(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let name = format!("record {}", path.display());
    Ok(check_record(name, &record, config))
}

pub fn check_record(
    name: String,
    record: &TournamentRecord,
    config: &WizardConfig,
) -> ScenarioResult {
    let start_time = Instant::now();
    let outcome = from_record(record, config);
    let mut notes: Vec<String> = outcome
        .report
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect();
    notes.extend(
        validate_for_publish(&outcome.state)
            .iter()
            .map(|issue| format!("not publishable: {issue}")),
    );

    let mut failures = Vec::new();
    match to_record(&outcome.state) {
        Ok(saved) => {
            let reloaded = from_record(&saved, config);
            if reloaded.state != outcome.state {
                failures.push("state changed across save/load".to_string());
            }
        }
        Err(err) => failures.push(format!("save refused: {err}")),
    }

    let performance_data = if failures.is_empty() {
        vec![start_time.elapsed()]
    } else {
        Vec::new()
    };
    if notes.is_empty() {
        info!("{name}: clean");
    } else {
        warn!("{name}: {} note(s)", notes.len());
    }

    let mut result = ScenarioResult::from_runs(name, 1, failures, performance_data);
    result.notes = notes;
    result
}
