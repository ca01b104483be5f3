use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::DayOffset;

pub(crate) const TEE_TIME_FORMAT: &str = "%H:%M";

/// Errors raised when wizard configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("round sanity window invalid (min {min} > max {max})")]
    SanityWindowRange { min: DayOffset, max: DayOffset },
    #[error("default tee time '{0}' is not a HH:MM wall-clock time")]
    TeeTime(String),
    #[error("max duration must be at least 0 days (got {0})")]
    MaxDuration(DayOffset),
    #[error("failed to parse wizard config: {0}")]
    Parse(String),
}

/// Inclusive range of round offsets accepted as plausible when loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetWindow {
    pub min: DayOffset,
    pub max: DayOffset,
}

impl OffsetWindow {
    #[must_use]
    pub const fn contains(&self, offset: DayOffset) -> bool {
        offset >= self.min && offset <= self.max
    }
}

impl Default for OffsetWindow {
    fn default() -> Self {
        Self { min: 0, max: 6 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardConfig {
    #[serde(default)]
    pub round_sanity_window: OffsetWindow,
    /// Start time given to tee-time slots created for days that had none.
    #[serde(default = "WizardConfig::default_tee_time")]
    pub default_tee_time: String,
    /// Longest accepted tournament, as the offset of its last day.
    #[serde(default = "WizardConfig::default_max_duration_days")]
    pub max_duration_days: DayOffset,
}

impl WizardConfig {
    fn default_tee_time() -> String {
        "08:00".to_string()
    }

    const fn default_max_duration_days() -> DayOffset {
        30
    }

    /// Parse and validate a config from JSON. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the matching
    /// variant for any violated invariant.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = self.round_sanity_window;
        if window.min > window.max {
            return Err(ConfigError::SanityWindowRange {
                min: window.min,
                max: window.max,
            });
        }
        if NaiveTime::parse_from_str(&self.default_tee_time, TEE_TIME_FORMAT).is_err() {
            return Err(ConfigError::TeeTime(self.default_tee_time.clone()));
        }
        if self.max_duration_days < 0 {
            return Err(ConfigError::MaxDuration(self.max_duration_days));
        }
        Ok(())
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            round_sanity_window: OffsetWindow::default(),
            default_tee_time: Self::default_tee_time(),
            max_duration_days: Self::default_max_duration_days(),
        }
    }
}
