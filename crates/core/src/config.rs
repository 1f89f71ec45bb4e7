//! Monitoring thresholds and sampling cadence.
//!
//! [`MonitorConfig`] can be built three ways: [`Default`] (the reference
//! values), [`MonitorConfig::from_json`] for hosts that embed the monitor
//! and carry their own settings, or [`MonitorConfig::from_env`] for the
//! daemon.
//!
//! | Option           | Env var                      | Default |
//! |------------------|------------------------------|---------|
//! | `warningDbm`     | `PROXIMITY_WARNING_DBM`      | `-75`   |
//! | `criticalDbm`    | `PROXIMITY_CRITICAL_DBM`     | `-85`   |
//! | `samplePeriodMs` | `PROXIMITY_SAMPLE_PERIOD_MS` | `2000`  |

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hysteresis::Thresholds;
use crate::types::Dbm;

pub const DEFAULT_WARNING_DBM: Dbm = -75;
pub const DEFAULT_CRITICAL_DBM: Dbm = -85;
pub const DEFAULT_SAMPLE_PERIOD_MS: u64 = 2000;

pub const ENV_WARNING_DBM: &str = "PROXIMITY_WARNING_DBM";
pub const ENV_CRITICAL_DBM: &str = "PROXIMITY_CRITICAL_DBM";
pub const ENV_SAMPLE_PERIOD_MS: &str = "PROXIMITY_SAMPLE_PERIOD_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    /// Samples at or below this strength raise a warning.
    pub warning_dbm: Dbm,
    /// Samples at or below this strength raise a critical alert.
    pub critical_dbm: Dbm,
    /// Delay between the end of one sample and the next request.
    pub sample_period_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            warning_dbm: DEFAULT_WARNING_DBM,
            critical_dbm: DEFAULT_CRITICAL_DBM,
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
        }
    }
}

impl MonitorConfig {
    /// Load from environment variables, falling back to defaults for
    /// anything unset. Set-but-unparseable values are rejected.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            warning_dbm: parse_var(&lookup, ENV_WARNING_DBM)?.unwrap_or(defaults.warning_dbm),
            critical_dbm: parse_var(&lookup, ENV_CRITICAL_DBM)?.unwrap_or(defaults.critical_dbm),
            sample_period_ms: parse_var(&lookup, ENV_SAMPLE_PERIOD_MS)?
                .unwrap_or(defaults.sample_period_ms),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON object using the recognised option names. Missing keys
    /// take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("invalid monitor config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.critical_dbm > self.warning_dbm {
            return Err(CoreError::Validation(format!(
                "criticalDbm ({}) must not be stronger than warningDbm ({})",
                self.critical_dbm, self.warning_dbm
            )));
        }
        if self.sample_period_ms == 0 {
            return Err(CoreError::Validation(
                "samplePeriodMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            warning: self.warning_dbm,
            critical: self.critical_dbm,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CoreError::Validation(format!("{key}='{raw}' is invalid: {e}"))),
    }
}
