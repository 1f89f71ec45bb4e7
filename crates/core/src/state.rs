use serde::Serialize;

/// Connection lifecycle of the monitored peripheral.
///
/// `Idle -> Connecting -> Connected -> Disconnected`. `Disconnected` is
/// terminal until a new start request re-enters `Connecting`; a stop
/// request returns any state to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionState {
    /// Connecting or connected: a link is being held or sought.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
