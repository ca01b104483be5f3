use anyhow::{Result, bail};
use std::collections::HashSet;

/// Seed used when no seed tokens are given.
pub const DEFAULT_SEED: u64 = 1337;

/// Number of seeds the `sweep` keyword expands to.
pub const SWEEP_LEN: u64 = 64;

/// Resolve CLI seed tokens into a deduplicated, ordered seed list.
///
/// Accepts decimal integers (negative values use their magnitude), `0x` hex
/// literals, and the keyword `sweep`, which adds `1..=SWEEP_LEN`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("sweep") {
            pending.extend(1..=SWEEP_LEN);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(hex, 16)
        {
            pending.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|seed| seen.insert(*seed));

    if pending.is_empty() {
        pending.push(DEFAULT_SEED);
    }

    Ok(pending)
}
