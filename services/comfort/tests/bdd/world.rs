//! BDD test world for the comfort dashboard client

use std::sync::Arc;
use std::time::Duration;

use cucumber::World;

use comfort::chart::MemoryChartRenderer;
use comfort::mock::MockBackend;
use comfort::notifier::MemoryNotifier;
use comfort::weather::{MemoryHomeRenderer, DEFAULT_WEATHER_INTERVAL};
use comfort::{Dashboard, MutationResult};

#[derive(Debug, Default, World)]
pub struct ComfortWorld {
    // Server state, built up before the dashboard starts
    pub pending_backend: Option<MockBackend>,
    pub backend: Option<Arc<MockBackend>>,

    // Rendering surfaces
    pub notifier: Arc<MemoryNotifier>,
    pub charts: Arc<MemoryChartRenderer>,
    pub home: Arc<MemoryHomeRenderer>,

    pub dashboard: Option<Dashboard>,
    pub last_result: Option<MutationResult>,
    pub noted_weather_polls: Option<usize>,
}

impl ComfortWorld {
    /// Apply a builder step to the not-yet-started server
    pub fn configure(&mut self, build: impl FnOnce(MockBackend) -> MockBackend) {
        let backend = self.pending_backend.take().unwrap_or_else(MockBackend::new);
        self.pending_backend = Some(build(backend));
    }

    /// The server, whether or not the dashboard has started
    pub fn server(&mut self) -> &MockBackend {
        if let Some(backend) = &self.backend {
            return backend;
        }
        self.pending_backend.get_or_insert_with(MockBackend::new)
    }

    pub async fn start_dashboard(&mut self, weather_interval: Duration) {
        let backend = Arc::new(self.pending_backend.take().unwrap_or_else(MockBackend::new));
        let mut dashboard = Dashboard::new(
            backend.clone(),
            self.notifier.clone(),
            self.charts.clone(),
            self.home.clone(),
            weather_interval,
        );
        dashboard.start().await.expect("dashboard failed to start");
        self.backend = Some(backend);
        self.dashboard = Some(dashboard);
    }

    pub async fn start_default_dashboard(&mut self) {
        self.start_dashboard(DEFAULT_WEATHER_INTERVAL).await;
    }

    pub fn dashboard(&mut self) -> &mut Dashboard {
        self.dashboard.as_mut().expect("dashboard not started")
    }
}
