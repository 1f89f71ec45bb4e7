use proximity_core::config::MonitorConfig;
use proximity_core::error::CoreError;

use crate::simulated::{parse_profile, SimStep};

pub const ENV_DEVICE_ID: &str = "PROXIMITY_DEVICE_ID";
pub const ENV_RADIO_ENABLED: &str = "PROXIMITY_RADIO_ENABLED";
pub const ENV_SIM_PROFILE: &str = "PROXIMITY_SIM_PROFILE";

const DEFAULT_SIM_PROFILE: &str = "-60,-70,-80,-90,-90,-60";

/// Daemon configuration loaded from environment variables.
///
/// | Env Var                      | Default                   |
/// |------------------------------|---------------------------|
/// | `PROXIMITY_DEVICE_ID`        | required                  |
/// | `PROXIMITY_RADIO_ENABLED`    | `true`                    |
/// | `PROXIMITY_SIM_PROFILE`      | `-60,-70,-80,-90,-90,-60` |
///
/// Threshold and timer settings come from [`MonitorConfig::from_env`].
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Identifier of the peripheral to monitor.
    pub device_id: String,
    /// Whether the host grants the radio capability.
    pub radio_enabled: bool,
    /// Steps replayed by the simulated signal source.
    pub profile: Vec<SimStep>,
    pub monitor: MonitorConfig,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, AgentConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AgentConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let device_id = lookup(ENV_DEVICE_ID)
            .filter(|v| !v.trim().is_empty())
            .ok_or(AgentConfigError::Missing(ENV_DEVICE_ID))?;

        let radio_enabled = match lookup(ENV_RADIO_ENABLED) {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or_else(|| AgentConfigError::Invalid {
                key: ENV_RADIO_ENABLED,
                reason: format!("'{raw}' is not a boolean"),
            })?,
        };

        let raw_profile = lookup(ENV_SIM_PROFILE).unwrap_or_else(|| DEFAULT_SIM_PROFILE.into());
        let profile = parse_profile(&raw_profile).map_err(|reason| AgentConfigError::Invalid {
            key: ENV_SIM_PROFILE,
            reason,
        })?;

        let monitor = MonitorConfig::from_lookup(&lookup)?;

        Ok(Self {
            device_id,
            radio_enabled,
            profile,
            monitor,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error(transparent)]
    Monitor(#[from] CoreError),
}
