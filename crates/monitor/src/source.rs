//! The radio transport the monitor consumes.
//!
//! [`SignalSource`] is implemented by the platform layer (a BLE stack, a
//! simulator, a test fake). The monitor never owns it: it holds an
//! `Arc<dyn SignalSource>` and scopes each connection with a
//! [`ConnectionGuard`](crate::guard::ConnectionGuard).

use async_trait::async_trait;
use proximity_core::device::DeviceId;
use proximity_core::types::Dbm;
use tokio::sync::broadcast;

/// Unsolicited notification from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The peripheral dropped the link without being asked to.
    Lost { device: DeviceId, reason: String },
}

#[async_trait]
pub trait SignalSource: Send + Sync + 'static {
    /// Establish a link to `device`. Resolves once the link is usable.
    async fn connect(&self, device: &DeviceId) -> Result<(), SourceError>;

    /// Tear down the link to `device` and free its resources.
    ///
    /// Must not block. Also aborts a connect attempt still in progress.
    fn disconnect(&self, device: &DeviceId);

    /// Read the current signal strength of the connected `device`.
    async fn request_sample(&self, device: &DeviceId) -> Result<Dbm, SourceError>;

    /// Subscribe to unsolicited link events for all devices.
    fn subscribe(&self) -> broadcast::Receiver<LinkEvent>;
}

/// Failures reported by a [`SignalSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The link could not be established.
    #[error("Connection error: {0}")]
    Connect(String),

    /// A signal-strength read did not complete successfully.
    #[error("Sample error: {0}")]
    Sample(String),
}
