//! The proximity monitor actor.
//!
//! [`ProximityMonitor`] owns the single [`MonitoringSession`] and runs as
//! one tokio task draining a serialized event queue. Caller requests
//! arrive through a [`MonitorHandle`]; connect results, link losses,
//! timer firings and sample results are posted to the same queue by
//! short-lived helper tasks (see [`crate::link`] and [`crate::sampling`]).
//!
//! Output goes three ways: the [`Notifier`] (status line and alerts), a
//! [`broadcast`] channel of [`AlertEvent`]s, and a [`watch`] channel of
//! [`MonitorStatus`] snapshots.

use std::sync::Arc;

use proximity_core::alert::{self, AlertEvent, Severity};
use proximity_core::config::MonitorConfig;
use proximity_core::device::DeviceId;
use proximity_core::error::CoreError;
use proximity_core::hysteresis::Thresholds;
use proximity_core::session::{MonitoringSession, SignalSample};
use proximity_core::state::ConnectionState;
use proximity_core::types::{Dbm, SessionId};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::event::{MonitorEvent, MonitorStatus};
use crate::guard::ConnectionGuard;
use crate::notifier::Notifier;
use crate::permission::RadioPermission;
use crate::source::{SignalSource, SourceError};
use crate::{link, sampling};

/// Broadcast channel capacity for alert events.
const ALERT_CHANNEL_CAPACITY: usize = 64;

const STATUS_TITLE_MONITORING: &str = "Monitoring device";
const STATUS_TITLE_STOPPED: &str = "Monitoring stopped";

// ---------------------------------------------------------------------------
// ActiveSession
// ---------------------------------------------------------------------------

/// The session plus the runtime resources scoped to it.
struct ActiveSession {
    session: MonitoringSession,
    /// Dropping the session releases the link.
    guard: ConnectionGuard,
    /// Cancels the connect attempt and the link watcher.
    cancel: CancellationToken,
    /// Present only while `Connected`. Cancelling it disarms the timer and
    /// abandons any in-flight sample.
    sampling: Option<CancellationToken>,
}

impl ActiveSession {
    fn stop_sampling(&mut self) {
        if let Some(token) = self.sampling.take() {
            token.cancel();
        }
    }

    fn teardown(mut self) {
        self.stop_sampling();
        self.cancel.cancel();
        self.guard.release();
    }
}

// ---------------------------------------------------------------------------
// ProximityMonitor
// ---------------------------------------------------------------------------

/// Monitors one peripheral at a time.
///
/// Created with [`ProximityMonitor::spawn`], which moves the monitor onto
/// its own task and returns the handle used to drive it.
pub struct ProximityMonitor {
    source: Arc<dyn SignalSource>,
    notifier: Arc<dyn Notifier>,
    permission: RadioPermission,
    config: MonitorConfig,
    thresholds: Thresholds,
    queue_tx: mpsc::UnboundedSender<MonitorEvent>,
    queue_rx: mpsc::UnboundedReceiver<MonitorEvent>,
    alert_tx: broadcast::Sender<AlertEvent>,
    status_tx: watch::Sender<MonitorStatus>,
    active: Option<ActiveSession>,
    next_session_id: SessionId,
    /// Parent of every session token; cancelled when the task exits.
    cancel: CancellationToken,
}

impl ProximityMonitor {
    /// Spawn the monitor task.
    ///
    /// The task runs until [`MonitorHandle::shutdown`] is called or every
    /// clone of the returned handle has been dropped.
    pub fn spawn(
        source: Arc<dyn SignalSource>,
        notifier: Arc<dyn Notifier>,
        permission: RadioPermission,
        config: MonitorConfig,
    ) -> (MonitorHandle, JoinHandle<()>) {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (alert_tx, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(MonitorStatus::idle());

        let handle = MonitorHandle {
            inner: Arc::new(HandleInner {
                queue: queue_tx.clone(),
                permission: permission.clone(),
                alert_tx: alert_tx.clone(),
                status_rx,
            }),
        };

        let monitor = Self {
            source,
            notifier,
            permission,
            thresholds: config.thresholds(),
            config,
            queue_tx,
            queue_rx,
            alert_tx,
            status_tx,
            active: None,
            next_session_id: 1,
            cancel: CancellationToken::new(),
        };

        let task = tokio::spawn(monitor.run());
        (handle, task)
    }

    async fn run(mut self) {
        tracing::info!(
            warning_dbm = self.config.warning_dbm,
            critical_dbm = self.config.critical_dbm,
            sample_period_ms = self.config.sample_period_ms,
            "Proximity monitor started",
        );

        while let Some(event) = self.queue_rx.recv().await {
            let keep_running = self.handle_event(event);
            self.publish_status();
            if !keep_running {
                break;
            }
        }

        if let Some(active) = self.active.take() {
            active.teardown();
        }
        self.cancel.cancel();
        self.publish_status();
        tracing::info!("Proximity monitor stopped");
    }

    /// Process one queue item. Returns `false` when the task should exit.
    fn handle_event(&mut self, event: MonitorEvent) -> bool {
        match event {
            MonitorEvent::Start { device } => self.on_start(device),
            MonitorEvent::Stop => self.on_stop(),
            MonitorEvent::ConnectFinished { session_id, result } => {
                self.on_connect_finished(session_id, result)
            }
            MonitorEvent::LinkLost { session_id, reason } => self.on_link_lost(session_id, reason),
            MonitorEvent::TimerFired { session_id } => self.on_timer_fired(session_id),
            MonitorEvent::SampleFinished { session_id, result } => {
                self.on_sample_finished(session_id, result)
            }
            MonitorEvent::Shutdown => {
                self.on_stop();
                return false;
            }
        }
        true
    }

    // ---- caller requests ----

    fn on_start(&mut self, device: DeviceId) {
        if let Some(previous) = self.active.take() {
            tracing::info!(
                session_id = previous.session.id,
                device = %previous.session.device,
                "Replacing existing monitoring session",
            );
            previous.teardown();
        }

        let session_id = self.next_session_id;
        self.next_session_id += 1;

        // Subscribe before connecting so an immediate loss is observed.
        let link_events = self.source.subscribe();
        let guard = ConnectionGuard::acquire(Arc::clone(&self.source), device.clone());
        let cancel = self.cancel.child_token();

        tracing::info!(session_id, device = %device, "Starting monitoring session");
        self.notifier
            .show_status(STATUS_TITLE_MONITORING, &format!("Connecting to {device}"));

        link::watch_for_loss(link_events, device.clone(), session_id, &self.queue_tx, &cancel);
        link::connect(
            Arc::clone(&self.source),
            device.clone(),
            session_id,
            &self.queue_tx,
            &cancel,
        );

        self.active = Some(ActiveSession {
            session: MonitoringSession::new(session_id, device),
            guard,
            cancel,
            sampling: None,
        });
    }

    fn on_stop(&mut self) {
        let Some(active) = self.active.take() else {
            tracing::debug!("Stop requested while idle");
            return;
        };

        tracing::info!(
            session_id = active.session.id,
            device = %active.session.device,
            state = %active.session.state,
            "Stopping monitoring session",
        );
        let device = active.session.device.clone();
        active.teardown();
        self.notifier
            .show_status(STATUS_TITLE_STOPPED, &format!("No longer monitoring {device}"));
    }

    // ---- collaborator events ----

    fn on_connect_finished(&mut self, session_id: SessionId, result: Result<(), SourceError>) {
        let Some(active) = self.current(session_id, ConnectionState::Connecting) else {
            tracing::debug!(session_id, "Discarding stale connect result");
            return;
        };

        match result {
            Ok(()) => {
                active.session.mark_connected();
                let token = active.cancel.child_token();
                active.sampling = Some(token.clone());
                let device = active.session.device.clone();

                tracing::info!(session_id, device = %device, "Connected, sampling armed");
                self.notifier
                    .show_status(STATUS_TITLE_MONITORING, &format!("Connected to {device}"));

                // First reading right away; subsequent ones follow the period.
                self.issue_sample(session_id, device, &token);
            }
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Connection attempt failed");
                active.session.mark_lost();
                let reason = e.to_string();
                self.emit(AlertEvent::disconnected(Some(&reason)));
            }
        }
    }

    fn on_link_lost(&mut self, session_id: SessionId, reason: String) {
        let Some(active) = self.active.as_mut().filter(|a| {
            a.session.id == session_id && a.session.state.is_active()
        }) else {
            tracing::debug!(session_id, "Discarding stale link loss");
            return;
        };

        active.stop_sampling();
        active.session.mark_lost();
        tracing::warn!(
            session_id,
            device = %active.session.device,
            reason = %reason,
            "Connection lost",
        );
        self.emit(AlertEvent::disconnected(Some(&reason)));
    }

    fn on_timer_fired(&mut self, session_id: SessionId) {
        let Some(active) = self.current(session_id, ConnectionState::Connected) else {
            return;
        };
        let Some(token) = active.sampling.clone() else {
            return;
        };
        let device = active.session.device.clone();
        self.issue_sample(session_id, device, &token);
    }

    fn on_sample_finished(&mut self, session_id: SessionId, result: Result<Dbm, SourceError>) {
        let thresholds = self.thresholds;
        let Some(active) = self.current(session_id, ConnectionState::Connected) else {
            tracing::debug!(session_id, "Discarding sample for inactive session");
            return;
        };
        let Some(token) = active.sampling.clone() else {
            return;
        };

        match result {
            Ok(strength) => {
                let sample = SignalSample::now(strength);
                tracing::debug!(session_id, rssi = strength, "Signal sample");

                let event = active.session.apply_sample(&sample, &thresholds);
                let (title, message) =
                    alert::status_text(thresholds.classify(strength), strength);
                self.notifier.show_status(title, &message);

                if let Some(event) = event {
                    self.emit(event);
                }
            }
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Signal sample failed, ignoring");
            }
        }

        sampling::arm_timer(
            self.config.sample_period(),
            session_id,
            &self.queue_tx,
            &token,
        );
    }

    // ---- helpers ----

    /// The active session, if it is `session_id` and in `state`.
    fn current(
        &mut self,
        session_id: SessionId,
        state: ConnectionState,
    ) -> Option<&mut ActiveSession> {
        self.active
            .as_mut()
            .filter(|a| a.session.id == session_id && a.session.state == state)
    }

    /// Request one sample, or skip straight to rearming if the radio
    /// capability has been revoked since the session started.
    fn issue_sample(&self, session_id: SessionId, device: DeviceId, token: &CancellationToken) {
        if let Err(e) = self.permission.ensure_granted() {
            tracing::warn!(session_id, error = %e, "Skipping signal sample");
            sampling::arm_timer(self.config.sample_period(), session_id, &self.queue_tx, token);
            return;
        }

        sampling::request_sample(
            Arc::clone(&self.source),
            device,
            session_id,
            &self.queue_tx,
            token,
        );
    }

    /// Deliver an alert event to the notifier and to subscribers.
    fn emit(&self, event: AlertEvent) {
        match event.severity {
            // The status line already reflects normal readings.
            Severity::Normal => {}
            Severity::Warning | Severity::Critical | Severity::Disconnected => {
                tracing::info!(
                    severity = ?event.severity,
                    rssi = ?event.rssi,
                    loud = event.loud,
                    "Proximity alert",
                );
                self.notifier
                    .show_alert(&event.title, &event.message, event.loud);
            }
        }
        // Zero subscribers is fine.
        let _ = self.alert_tx.send(event);
    }

    fn publish_status(&self) {
        let status = self
            .active
            .as_ref()
            .map(|a| MonitorStatus::from(&a.session))
            .unwrap_or_else(MonitorStatus::idle);
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

// ---------------------------------------------------------------------------
// MonitorHandle
// ---------------------------------------------------------------------------

struct HandleInner {
    queue: mpsc::UnboundedSender<MonitorEvent>,
    permission: RadioPermission,
    alert_tx: broadcast::Sender<AlertEvent>,
    status_rx: watch::Receiver<MonitorStatus>,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        // Last handle gone: nobody can stop the session any more.
        let _ = self.queue.send(MonitorEvent::Shutdown);
    }
}

/// Cheaply cloneable entry point to a running [`ProximityMonitor`].
///
/// Requests are enqueued and return immediately; their effects are
/// observed through [`subscribe_alerts`](Self::subscribe_alerts) and
/// [`status`](Self::status).
#[derive(Clone)]
pub struct MonitorHandle {
    inner: Arc<HandleInner>,
}

impl MonitorHandle {
    /// Begin monitoring `device_id`, replacing any current session.
    ///
    /// Fails without touching the current session when the identifier is
    /// invalid or the radio capability has not been granted.
    pub fn start_monitoring(&self, device_id: &str) -> Result<(), CoreError> {
        let device = DeviceId::parse(device_id)?;
        self.inner.permission.ensure_granted()?;
        self.send(MonitorEvent::Start { device });
        Ok(())
    }

    /// Stop monitoring. A no-op when idle.
    pub fn stop_monitoring(&self) {
        self.send(MonitorEvent::Stop);
    }

    /// Stop monitoring and end the monitor task.
    pub fn shutdown(&self) {
        self.send(MonitorEvent::Shutdown);
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertEvent> {
        self.inner.alert_tx.subscribe()
    }

    /// A receiver that observes every status change.
    pub fn status(&self) -> watch::Receiver<MonitorStatus> {
        self.inner.status_rx.clone()
    }

    pub fn current_status(&self) -> MonitorStatus {
        self.inner.status_rx.borrow().clone()
    }

    fn send(&self, event: MonitorEvent) {
        if self.inner.queue.send(event).is_err() {
            tracing::warn!("Proximity monitor is no longer running, request dropped");
        }
    }
}
