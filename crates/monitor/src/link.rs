//! Connection attempt and link-loss watcher tasks.

use std::sync::Arc;

use proximity_core::device::DeviceId;
use proximity_core::types::SessionId;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::event::MonitorEvent;
use crate::source::{LinkEvent, SignalSource};

/// Start connecting to `device`; the outcome is posted as
/// `ConnectFinished`. No retry is attempted on failure.
pub fn connect(
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
                tracing::debug!(session_id, device = %device, "Connect attempt abandoned");
            }
            result = source.connect(&device) => {
                let _ = queue.send(MonitorEvent::ConnectFinished { session_id, result });
            }
        }
    });
}

/// Forward the first loss of `device` reported on `events` as `LinkLost`.
///
/// `events` must be subscribed before the connect attempt starts so that
/// an early loss is not missed. A lagged receiver may have skipped that
/// loss, so lag is reported as a loss too.
pub fn watch_for_loss(
    mut events: broadcast::Receiver<LinkEvent>,
    device: DeviceId,
    session_id: SessionId,
    queue: &mpsc::UnboundedSender<MonitorEvent>,
    cancel: &CancellationToken,
) {
    let queue = queue.clone();
    let cancel = cancel.clone();

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => return,
                event = events.recv() => event,
            };

            match event {
                Ok(LinkEvent::Lost { device: lost, reason }) if lost == device => {
                    let _ = queue.send(MonitorEvent::LinkLost { session_id, reason });
                    return;
                }
                Ok(LinkEvent::Lost { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        session_id,
                        device = %device,
                        skipped,
                        "Link event receiver lagged, treating link as lost",
                    );
                    let _ = queue.send(MonitorEvent::LinkLost {
                        session_id,
                        reason: format!("{skipped} link events missed"),
                    });
                    return;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!(session_id, "Link event channel closed");
                    return;
                }
            }
        }
    });
}
