//! Proximity monitoring runtime.
//!
//! - [`ProximityMonitor`]: the actor that owns the monitoring session,
//!   the sampling timer and the alert hysteresis.
//! - [`MonitorHandle`]: the entry points the surrounding application
//!   calls (`start_monitoring`, `stop_monitoring`).
//! - [`SignalSource`] and [`Notifier`]: the collaborator traits the
//!   platform layer implements.

pub mod event;
pub mod guard;
pub mod link;
pub mod monitor;
pub mod notifier;
pub mod permission;
pub mod sampling;
pub mod source;

pub use event::{MonitorEvent, MonitorStatus};
pub use monitor::{MonitorHandle, ProximityMonitor};
pub use notifier::Notifier;
pub use permission::RadioPermission;
pub use source::{LinkEvent, SignalSource, SourceError};
