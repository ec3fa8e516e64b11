//! Comfort - home environmental-monitoring dashboard client
//!
//! Keeps a local cache of sensors, sensor groups and controllers in sync
//! with the comfort backend, applies user edits optimistically, and derives
//! the charts and panels the dashboard shows.

pub mod cache;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod io;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;
pub mod notifier;
pub mod sync;
pub mod view;
pub mod weather;

pub use config::{load_config, Config};
pub use dashboard::Dashboard;
pub use error::{ComfortError, Failure, FailureKind, MutationResult, Result};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::chart::LogChartRenderer;
use crate::gateway::RestGateway;
use crate::io::ReqwestHttpClient;
use crate::notifier::LogNotifier;
use crate::weather::LogHomeRenderer;

/// Run a dashboard session against the configured backend until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new());
    let gateway = Arc::new(RestGateway::new(&config.server.base_url, http));
    let cancel = CancellationToken::new();

    let mut dashboard = Dashboard::new(
        gateway,
        Arc::new(LogNotifier),
        Arc::new(LogChartRenderer),
        Arc::new(LogHomeRenderer),
        config.polling.weather_interval(),
    );

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel_for_signal.cancel();
    });

    tracing::info!("Connecting to comfort server at {}", config.server.base_url);
    dashboard.start().await?;
    dashboard.mount_home();

    if let Some(panel) = dashboard.sensor_panel().await {
        tracing::info!(
            "Sensor {}: battery {}",
            panel.label,
            panel
                .voltage
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
    }
    if let Some(panel) = dashboard.group_panel().await {
        tracing::info!("Sensor group {}: {}", panel.name, panel.controller_label);
    }

    // Periodic resync (blocks until cancelled)
    let sync = Arc::clone(dashboard.sync());
    sync.run(config.polling.refresh_interval(), cancel).await;

    dashboard.unmount_home();
    tracing::info!("Comfort dashboard stopped");

    Ok(())
}
