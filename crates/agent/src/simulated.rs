//! Simulated radio transport.
//!
//! [`SimulatedSignalSource`] stands in for a BLE stack on hosts without
//! one. It replays a fixed profile of steps in a loop, one step per sample
//! request. A step is either a reading, a failed read, or a link drop.
//!
//! Profiles are written as comma-separated steps: a dBm value (`-72`),
//! `fail` for a failed read, or `lost` for an unsolicited disconnect.

use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use proximity_core::device::DeviceId;
use proximity_core::types::Dbm;
use proximity_monitor::{LinkEvent, SignalSource, SourceError};
use tokio::sync::broadcast;

const LINK_EVENT_CAPACITY: usize = 16;

/// Default simulated connect latency.
const DEFAULT_CONNECT_LATENCY: Duration = Duration::from_millis(250);

/// One entry in a simulation profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStep {
    Reading(Dbm),
    Failure,
    LinkLost,
}

impl FromStr for SimStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fail" => Ok(Self::Failure),
            "lost" => Ok(Self::LinkLost),
            other => other
                .parse::<Dbm>()
                .map(Self::Reading)
                .map_err(|_| format!("'{other}' is not a dBm value, 'fail' or 'lost'")),
        }
    }
}

/// Parse a comma-separated profile. Empty profiles are rejected.
pub fn parse_profile(raw: &str) -> Result<Vec<SimStep>, String> {
    let steps = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SimStep::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    if steps.is_empty() {
        return Err("profile must contain at least one step".to_string());
    }
    Ok(steps)
}

struct SimState {
    cursor: usize,
    connected: Option<DeviceId>,
}

pub struct SimulatedSignalSource {
    profile: Vec<SimStep>,
    connect_latency: Duration,
    state: Mutex<SimState>,
    link_tx: broadcast::Sender<LinkEvent>,
}

impl SimulatedSignalSource {
    /// `profile` must not be empty; see [`parse_profile`].
    pub fn new(profile: Vec<SimStep>) -> Self {
        let (link_tx, _) = broadcast::channel(LINK_EVENT_CAPACITY);
        Self {
            profile,
            connect_latency: DEFAULT_CONNECT_LATENCY,
            state: Mutex::new(SimState {
                cursor: 0,
                connected: None,
            }),
            link_tx,
        }
    }

    pub fn with_connect_latency(mut self, latency: Duration) -> Self {
        self.connect_latency = latency;
        self
    }

    pub fn connected_device(&self) -> Option<DeviceId> {
        self.lock().connected.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        // A poisoned lock only means a panic elsewhere; the state is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_step(&self) -> Option<SimStep> {
        if self.profile.is_empty() {
            return None;
        }
        let mut state = self.lock();
        let step = self.profile[state.cursor % self.profile.len()];
        state.cursor += 1;
        Some(step)
    }
}

#[async_trait]
impl SignalSource for SimulatedSignalSource {
    async fn connect(&self, device: &DeviceId) -> Result<(), SourceError> {
        tokio::time::sleep(self.connect_latency).await;
        self.lock().connected = Some(device.clone());
        tracing::info!(device = %device, "Simulated link established");
        Ok(())
    }

    fn disconnect(&self, device: &DeviceId) {
        let mut state = self.lock();
        if state.connected.as_ref() == Some(device) {
            state.connected = None;
        }
        tracing::info!(device = %device, "Simulated link closed");
    }

    async fn request_sample(&self, device: &DeviceId) -> Result<Dbm, SourceError> {
        if self.lock().connected.as_ref() != Some(device) {
            return Err(SourceError::Sample(format!("{device} is not connected")));
        }

        match self.next_step() {
            Some(SimStep::Reading(rssi)) => Ok(rssi),
            Some(SimStep::Failure) | None => {
                Err(SourceError::Sample("simulated read failure".to_string()))
            }
            Some(SimStep::LinkLost) => {
                self.lock().connected = None;
                let _ = self.link_tx.send(LinkEvent::Lost {
                    device: device.clone(),
                    reason: "simulated link drop".to_string(),
                });
                Err(SourceError::Sample("link dropped during read".to_string()))
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.link_tx.subscribe()
    }
}
