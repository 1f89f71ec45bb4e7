//! Scoped ownership of a source connection.

use std::sync::Arc;

use proximity_core::device::DeviceId;

use crate::source::SignalSource;

/// Holds the link to one device for the lifetime of a session.
///
/// The link is released exactly once: either explicitly through
/// [`release`](Self::release) or when the guard is dropped, whichever
/// comes first. This covers abnormal exits (panics, task aborts) too.
pub struct ConnectionGuard {
    source: Arc<dyn SignalSource>,
    device: DeviceId,
    released: bool,
}

impl ConnectionGuard {
    /// Take ownership of the (pending) link to `device`.
    pub fn acquire(source: Arc<dyn SignalSource>, device: DeviceId) -> Self {
        Self {
            source,
            device,
            released: false,
        }
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Disconnect and close the link. Later calls are no-ops.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        tracing::info!(device = %self.device, "Releasing signal source connection");
        self.source.disconnect(&self.device);
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.release();
    }
}
