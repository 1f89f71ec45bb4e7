//! Items on the monitor's inbound queue and its published status.

use proximity_core::device::DeviceId;
use proximity_core::hysteresis::AlertFlags;
use proximity_core::session::MonitoringSession;
use proximity_core::state::ConnectionState;
use proximity_core::types::{Dbm, SessionId};
use serde::Serialize;

use crate::source::SourceError;

/// One unit of work for the monitor task.
///
/// Caller requests and collaborator results share a single queue and are
/// processed strictly in enqueue order. Collaborator results carry the
/// session they were issued for; results for a session that is no longer
/// current are discarded.
#[derive(Debug)]
pub enum MonitorEvent {
    /// Tear down any current session and start a new one.
    Start { device: DeviceId },

    /// Tear down the current session, if any.
    Stop,

    /// A connect attempt finished.
    ConnectFinished {
        session_id: SessionId,
        result: Result<(), SourceError>,
    },

    /// The transport reported an unsolicited link loss.
    LinkLost { session_id: SessionId, reason: String },

    /// The sampling timer elapsed.
    TimerFired { session_id: SessionId },

    /// A sample request finished.
    SampleFinished {
        session_id: SessionId,
        result: Result<Dbm, SourceError>,
    },

    /// Stop monitoring and end the monitor task.
    Shutdown,
}

/// Snapshot of the monitor, republished after every processed event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStatus {
    pub state: ConnectionState,
    pub session_id: Option<SessionId>,
    pub device: Option<DeviceId>,
    pub last_rssi: Option<Dbm>,
    pub flags: AlertFlags,
}

impl MonitorStatus {
    pub fn idle() -> Self {
        Self::default()
    }
}

impl From<&MonitoringSession> for MonitorStatus {
    fn from(session: &MonitoringSession) -> Self {
        Self {
            state: session.state,
            session_id: Some(session.id),
            device: Some(session.device.clone()),
            last_rssi: session.last_rssi,
            flags: session.flags,
        }
    }
}
