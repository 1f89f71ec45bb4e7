//! Sampling timer and sample requests.
//!
//! The timer is not a free-running interval. Each firing issues one
//! sample request, and the next firing is armed only after that request's
//! result has been processed by the monitor, so requests never overlap.
//! Both the sleep and the request are bound to the connection's
//! [`CancellationToken`]; once it is cancelled neither posts anything.

use std::sync::Arc;
use std::time::Duration;

use proximity_core::device::DeviceId;
use proximity_core::types::SessionId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::event::MonitorEvent;
use crate::source::SignalSource;

/// Post `TimerFired` after `period` unless `cancel` fires first.
pub fn arm_timer(
    period: Duration,
    session_id: SessionId,
    queue: &mpsc::UnboundedSender<MonitorEvent>,
    cancel: &CancellationToken,
) {
    let queue = queue.clone();
    let cancel = cancel.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::trace!(session_id, "Sampling timer disarmed");
            }
            _ = tokio::time::sleep(period) => {
                let _ = queue.send(MonitorEvent::TimerFired { session_id });
            }
        }
    });
}

/// Ask `source` for one reading and post the result back to the queue.
pub fn request_sample(
    source: Arc<dyn SignalSource>,
    device: DeviceId,
    session_id: SessionId,
    queue: &mpsc::UnboundedSender<MonitorEvent>,
    cancel: &CancellationToken,
) {
    let queue = queue.clone();
    let cancel = cancel.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(session_id, device = %device, "In-flight sample abandoned");
            }
            result = source.request_sample(&device) => {
                let _ = queue.send(MonitorEvent::SampleFinished { session_id, result });
            }
        }
    });
}
