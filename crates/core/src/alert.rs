//! Alert events emitted by the proximity monitor.
//!
//! An [`AlertEvent`] is produced for every hysteresis evaluation that has
//! something to say and for every connection loss. It is handed to the
//! notifier and broadcast to subscribers, then dropped.

use chrono::Utc;
use serde::Serialize;

use crate::types::{Dbm, Timestamp};

/// How bad the current proximity situation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Signal is above the warning threshold.
    Normal,
    /// Signal is at or below the warning threshold.
    Warning,
    /// Signal is at or below the critical threshold.
    Critical,
    /// The link to the peripheral is gone.
    Disconnected,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertEvent {
    pub severity: Severity,
    /// Short headline for the notifier.
    pub title: String,
    /// Human-readable body.
    pub message: String,
    /// Whether the notifier should interrupt the user (sound / vibration).
    pub loud: bool,
    /// Strength that triggered the event. `None` for disconnects.
    pub rssi: Option<Dbm>,
    pub timestamp: Timestamp,
}

impl AlertEvent {
    pub fn normal(rssi: Dbm) -> Self {
        let (title, message) = status_text(Severity::Normal, rssi);
        Self::new(Severity::Normal, title, message, false, Some(rssi))
    }

    pub fn warning(rssi: Dbm) -> Self {
        Self::new(
            Severity::Warning,
            "Proximity warning",
            format!("You are moving away from the device ({rssi} dBm). The signal is weakening."),
            false,
            Some(rssi),
        )
    }

    pub fn critical(rssi: Dbm) -> Self {
        Self::new(
            Severity::Critical,
            "Critical alert",
            format!(
                "You are moving too far from the device ({rssi} dBm). Come back soon or it will disconnect."
            ),
            true,
            Some(rssi),
        )
    }

    /// The link dropped, or could never be established (`reason`).
    pub fn disconnected(reason: Option<&str>) -> Self {
        let message = match reason {
            Some(reason) => format!("Connection to the device was lost: {reason}"),
            None => "Connection to the device was lost".to_string(),
        };
        Self::new(Severity::Disconnected, "Device disconnected", message, true, None)
    }

    fn new(
        severity: Severity,
        title: &str,
        message: String,
        loud: bool,
        rssi: Option<Dbm>,
    ) -> Self {
        Self {
            severity,
            title: title.to_string(),
            message,
            loud,
            rssi,
            timestamp: Utc::now(),
        }
    }
}

/// Status-display text for a reading that falls in `band`.
///
/// Used for the persistent status line, which is refreshed on every sample
/// regardless of whether an alert fired.
pub fn status_text(band: Severity, rssi: Dbm) -> (&'static str, String) {
    match band {
        Severity::Normal => ("Signal stable", format!("{rssi} dBm - connection good")),
        Severity::Warning => ("Signal weakening", format!("{rssi} dBm - moving out of range")),
        Severity::Critical => ("Signal critical", format!("{rssi} dBm - almost out of range")),
        Severity::Disconnected => ("Device disconnected", "No signal".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loudness_per_severity() {
        assert!(!AlertEvent::normal(-60).loud);
        assert!(!AlertEvent::warning(-80).loud);
        assert!(AlertEvent::critical(-90).loud);
        assert!(AlertEvent::disconnected(None).loud);
    }

    #[test]
    fn messages_carry_strength() {
        assert_eq!(AlertEvent::normal(-60).message, "-60 dBm - connection good");
        assert!(AlertEvent::warning(-80).message.contains("(-80 dBm)"));
        assert!(AlertEvent::critical(-91).message.contains("(-91 dBm)"));
    }

    #[test]
    fn status_text_per_band() {
        assert_eq!(status_text(Severity::Normal, -60).0, "Signal stable");
        assert_eq!(status_text(Severity::Warning, -80).1, "-80 dBm - moving out of range");
        assert_eq!(status_text(Severity::Critical, -90).0, "Signal critical");
    }

    #[test]
    fn serializes_lowercase_severity() {
        let json = serde_json::to_value(AlertEvent::critical(-90)).unwrap();
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["loud"], true);
        assert_eq!(json["rssi"], -90);

        let json = serde_json::to_value(AlertEvent::disconnected(Some("timeout"))).unwrap();
        assert_eq!(json["severity"], "disconnected");
        assert!(json["rssi"].is_null());
    }
}
