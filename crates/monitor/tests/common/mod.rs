//! Shared fakes for monitor integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use proximity_core::alert::AlertEvent;
use proximity_core::config::MonitorConfig;
use proximity_core::device::DeviceId;
use proximity_core::types::Dbm;
use proximity_monitor::{
    LinkEvent, MonitorHandle, Notifier, ProximityMonitor, RadioPermission, SignalSource,
    SourceError,
};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEVICE: &str = "AA:BB:CC:DD:EE:FF";
pub const OTHER_DEVICE: &str = "11:22:33:44:55:66";

// ---------------------------------------------------------------------------
// FakeSignalSource
// ---------------------------------------------------------------------------

/// Scripted signal source. Samples are served from a queue; once it runs
/// dry every request fails.
pub struct FakeSignalSource {
    script: Mutex<VecDeque<Result<Dbm, SourceError>>>,
    connect_error: Mutex<Option<SourceError>>,
    connect_delay: Mutex<Duration>,
    sample_delay: Mutex<Duration>,
    link_tx: broadcast::Sender<LinkEvent>,
    connects: Mutex<Vec<DeviceId>>,
    disconnects: Mutex<Vec<DeviceId>>,
    request_times: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    held: AtomicBool,
    gate: Notify,
    pub sample_requested: Notify,
}

impl FakeSignalSource {
    pub fn new() -> Arc<Self> {
        let (link_tx, _) = broadcast::channel(16);
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            connect_error: Mutex::new(None),
            connect_delay: Mutex::new(Duration::ZERO),
            sample_delay: Mutex::new(Duration::ZERO),
            link_tx,
            connects: Mutex::new(Vec::new()),
            disconnects: Mutex::new(Vec::new()),
            request_times: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            held: AtomicBool::new(false),
            gate: Notify::new(),
            sample_requested: Notify::new(),
        })
    }

    pub fn with_samples(samples: &[Dbm]) -> Arc<Self> {
        let source = Self::new();
        for &s in samples {
            source.push_sample(Ok(s));
        }
        source
    }

    pub fn push_sample(&self, sample: Result<Dbm, SourceError>) {
        self.script.lock().unwrap().push_back(sample);
    }

    pub fn fail_connect(&self, reason: &str) {
        *self.connect_error.lock().unwrap() = Some(SourceError::Connect(reason.to_string()));
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock().unwrap() = delay;
    }

    pub fn set_sample_delay(&self, delay: Duration) {
        *self.sample_delay.lock().unwrap() = delay;
    }

    /// Park every sample request until [`release_samples`](Self::release_samples).
    pub fn hold_samples(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release_samples(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.gate.notify_waiters();
    }

    pub fn lose_link(&self, device: &str, reason: &str) {
        let _ = self.link_tx.send(LinkEvent::Lost {
            device: DeviceId::parse(device).unwrap(),
            reason: reason.to_string(),
        });
    }

    pub fn connect_count(&self, device: &str) -> usize {
        count(&self.connects, device)
    }

    pub fn disconnect_count(&self, device: &str) -> usize {
        count(&self.disconnects, device)
    }

    pub fn sample_requests(&self) -> usize {
        self.request_times.lock().unwrap().len()
    }

    pub fn request_times(&self) -> Vec<Instant> {
        self.request_times.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn count(log: &Mutex<Vec<DeviceId>>, device: &str) -> usize {
    log.lock()
        .unwrap()
        .iter()
        .filter(|d| d.as_str() == device)
        .count()
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SignalSource for FakeSignalSource {
    async fn connect(&self, device: &DeviceId) -> Result<(), SourceError> {
        self.connects.lock().unwrap().push(device.clone());

        let delay = *self.connect_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.connect_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn disconnect(&self, device: &DeviceId) {
        self.disconnects.lock().unwrap().push(device.clone());
    }

    async fn request_sample(&self, _device: &DeviceId) -> Result<Dbm, SourceError> {
        self.request_times.lock().unwrap().push(Instant::now());
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);
        self.sample_requested.notify_one();

        if self.held.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }

        let delay = *self.sample_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::Sample("script exhausted".to_string())))
    }

    fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.link_tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Status { title: String, message: String },
    Alert { title: String, message: String, loud: bool },
}

#[derive(Default)]
pub struct RecordingNotifier {
    log: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn entries(&self) -> Vec<Notification> {
        self.log.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<(String, bool)> {
        self.entries()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Alert { title, loud, .. } => Some((title, loud)),
                Notification::Status { .. } => None,
            })
            .collect()
    }

    pub fn status_titles(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Status { title, .. } => Some(title),
                Notification::Alert { .. } => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn show_status(&self, title: &str, message: &str) {
        self.log.lock().unwrap().push(Notification::Status {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn show_alert(&self, title: &str, message: &str, loud: bool) {
        self.log.lock().unwrap().push(Notification::Alert {
            title: title.to_string(),
            message: message.to_string(),
            loud,
        });
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub struct Harness {
    pub handle: MonitorHandle,
    pub task: JoinHandle<()>,
    pub source: Arc<FakeSignalSource>,
    pub notifier: Arc<RecordingNotifier>,
    pub permission: RadioPermission,
}

pub fn spawn_monitor(source: Arc<FakeSignalSource>) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let permission = RadioPermission::granted();
    let (handle, task) = ProximityMonitor::spawn(
        source.clone(),
        notifier.clone(),
        permission.clone(),
        MonitorConfig::default(),
    );
    Harness {
        handle,
        task,
        source,
        notifier,
        permission,
    }
}

/// Next alert, failing the test if none arrives within a minute of
/// (virtual) time.
pub async fn next_alert(rx: &mut broadcast::Receiver<AlertEvent>) -> AlertEvent {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for an alert")
        .expect("alert channel closed")
}
