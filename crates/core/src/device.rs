//! Peripheral identifiers.
//!
//! The core treats the identifier as opaque: it only has to be something
//! the signal source can connect to. Validation rejects values that can
//! never name a real peripheral (empty, oversized, or containing
//! whitespace / control characters).

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;

/// Upper bound on identifier length.
pub const MAX_DEVICE_ID_LEN: usize = 128;

/// A validated, externally-selected peripheral identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Validate `raw` and wrap it.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        if raw.is_empty() {
            return Err(CoreError::InvalidDevice(
                "device identifier must not be empty".to_string(),
            ));
        }

        if raw.chars().count() > MAX_DEVICE_ID_LEN {
            return Err(CoreError::InvalidDevice(format!(
                "device identifier exceeds {MAX_DEVICE_ID_LEN} characters"
            )));
        }

        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CoreError::InvalidDevice(format!(
                "device identifier '{}' contains whitespace or control characters",
                raw.escape_debug()
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
