//! `proximity-agent` -- headless proximity monitoring daemon.
//!
//! Monitors one peripheral, logs status and proximity alerts, and shuts
//! down cleanly on SIGINT / SIGTERM. The radio is simulated by replaying a
//! signal profile, so the daemon runs on any host.
//!
//! # Environment variables
//!
//! | Variable                     | Required | Default                   | Description                         |
//! |------------------------------|----------|---------------------------|-------------------------------------|
//! | `PROXIMITY_DEVICE_ID`        | yes      | --                        | Peripheral to monitor               |
//! | `PROXIMITY_RADIO_ENABLED`    | no       | `true`                    | Whether the radio capability is granted |
//! | `PROXIMITY_SIM_PROFILE`      | no       | `-60,-70,-80,-90,-90,-60` | Simulated readings (`fail`, `lost` allowed) |
//! | `PROXIMITY_WARNING_DBM`      | no       | `-75`                     | Warning threshold                   |
//! | `PROXIMITY_CRITICAL_DBM`     | no       | `-85`                     | Critical threshold                  |
//! | `PROXIMITY_SAMPLE_PERIOD_MS` | no       | `2000`                    | Delay between samples               |

use std::sync::Arc;

use proximity_agent::config::AgentConfig;
use proximity_agent::notifier::LogNotifier;
use proximity_agent::simulated::SimulatedSignalSource;
use proximity_monitor::{ProximityMonitor, RadioPermission};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "proximity_agent=info,proximity_monitor=info,proximity=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        device = %config.device_id,
        radio_enabled = config.radio_enabled,
        profile_steps = config.profile.len(),
        "Starting proximity-agent",
    );

    let source = Arc::new(SimulatedSignalSource::new(config.profile.clone()));
    let permission = if config.radio_enabled {
        RadioPermission::granted()
    } else {
        RadioPermission::denied()
    };

    let (handle, task) =
        ProximityMonitor::spawn(source, Arc::new(LogNotifier), permission, config.monitor);

    if let Err(e) = handle.start_monitoring(&config.device_id) {
        tracing::error!(error = %e, "Failed to start monitoring");
        handle.shutdown();
        let _ = task.await;
        std::process::exit(1);
    }

    shutdown_signal().await;

    handle.shutdown();
    if let Err(e) = task.await {
        tracing::error!(error = %e, "Monitor task ended abnormally");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
