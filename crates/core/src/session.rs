//! The single active monitoring session.
//!
//! [`MonitoringSession`] holds everything that changes while a device is
//! monitored: connection state, the last reading, and the alert flags.
//! Runtime resources (timers, the radio link) are owned by the monitor
//! that wraps it; this type is plain data plus transition helpers.

use chrono::Utc;
use serde::Serialize;

use crate::alert::AlertEvent;
use crate::device::DeviceId;
use crate::hysteresis::{AlertFlags, Thresholds};
use crate::state::ConnectionState;
use crate::types::{Dbm, SessionId, Timestamp};

/// One signal-strength reading. Consumed once, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSample {
    pub strength: Dbm,
    pub timestamp: Timestamp,
}

impl SignalSample {
    pub fn now(strength: Dbm) -> Self {
        Self {
            strength,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSession {
    pub id: SessionId,
    pub device: DeviceId,
    pub state: ConnectionState,
    /// `None` until the first sample, and again after a connection loss.
    pub last_rssi: Option<Dbm>,
    pub flags: AlertFlags,
}

impl MonitoringSession {
    /// A fresh session in `Connecting`.
    pub fn new(id: SessionId, device: DeviceId) -> Self {
        Self {
            id,
            device,
            state: ConnectionState::Connecting,
            last_rssi: None,
            flags: AlertFlags::default(),
        }
    }

    pub fn mark_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.flags.reset();
    }

    pub fn mark_lost(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.last_rssi = None;
    }

    /// Record `sample` and run the hysteresis evaluator on it.
    pub fn apply_sample(
        &mut self,
        sample: &SignalSample,
        thresholds: &Thresholds,
    ) -> Option<AlertEvent> {
        self.last_rssi = Some(sample.strength);
        self.flags.evaluate(sample.strength, thresholds)
    }
}
