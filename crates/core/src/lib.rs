//! Domain logic for single-peripheral proximity monitoring.
//!
//! Everything here is runtime-free: the connection state enum, the
//! monitoring session, the alert-hysteresis evaluator, configuration and
//! the error taxonomy. The event loop that drives it lives in
//! `proximity-monitor`.

pub mod alert;
pub mod config;
pub mod device;
pub mod error;
pub mod hysteresis;
pub mod session;
pub mod state;
pub mod types;
