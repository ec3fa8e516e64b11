//! Outdoor weather on the home view
//!
//! While the home view is mounted, a background task fetches the current
//! weather immediately and then once per interval, storing each snapshot in
//! the cache and pushing a rendered [`HomeView`]. Unmounting cancels the
//! timer at once.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{DashboardSettings, TemperatureUnit};
use crate::model::WeatherSnapshot;
use crate::sync::SyncController;

pub const DEFAULT_WEATHER_INTERVAL: Duration = Duration::from_secs(300);

const ICON_BASE_URL: &str = "http://openweathermap.org/img/w";
const ZERO_CELSIUS_IN_KELVIN: f64 = 273.15;

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - ZERO_CELSIUS_IN_KELVIN
}

pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    kelvin_to_celsius(kelvin) * 1.8 + 32.0
}

/// Two decimals and the unit suffix, e.g. "26.85 C"
pub fn format_temperature(kelvin: f64, unit: TemperatureUnit) -> String {
    let value = match unit {
        TemperatureUnit::Celsius => kelvin_to_celsius(kelvin),
        TemperatureUnit::Fahrenheit => kelvin_to_fahrenheit(kelvin),
    };
    format!("{:.2} {}", value, unit.suffix())
}

pub fn icon_url(icon: &str) -> String {
    format!("{}/{}.png", ICON_BASE_URL, icon)
}

/// The weather block of the home view, ready to display
#[derive(Debug, Clone, PartialEq)]
pub struct HomeView {
    pub location: Option<String>,
    pub description: String,
    pub icon_url: String,
    pub temperature: String,
    pub humidity: String,
}

impl HomeView {
    pub fn new(weather: &WeatherSnapshot, settings: &DashboardSettings) -> Self {
        Self {
            location: settings.location.clone(),
            description: weather.description.clone(),
            icon_url: icon_url(&weather.icon),
            temperature: format_temperature(weather.temperature_kelvin, settings.temperature_unit),
            humidity: format!("{}%", weather.humidity),
        }
    }
}

pub trait HomeRenderer: Send + Sync + fmt::Debug {
    fn render_home(&self, view: &HomeView);
}

#[derive(Debug, Default)]
pub struct LogHomeRenderer;

impl HomeRenderer for LogHomeRenderer {
    fn render_home(&self, view: &HomeView) {
        tracing::info!(
            "{}: {}, {}, humidity {}",
            view.location.as_deref().unwrap_or("outside"),
            view.description,
            view.temperature,
            view.humidity
        );
    }
}

/// Keeps every rendered home view
#[derive(Debug, Default)]
pub struct MemoryHomeRenderer {
    views: Mutex<Vec<HomeView>>,
}

impl MemoryHomeRenderer {
    pub fn views(&self) -> Vec<HomeView> {
        self.views.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<HomeView> {
        self.views().pop()
    }
}

impl HomeRenderer for MemoryHomeRenderer {
    fn render_home(&self, view: &HomeView) {
        self.views
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(view.clone());
    }
}

/// Owns the weather timer for one mounted home view
pub struct WeatherPoller {
    sync: Arc<SyncController>,
    renderer: Arc<dyn HomeRenderer>,
    interval: Duration,
    mounted: Option<(CancellationToken, JoinHandle<()>)>,
}

impl fmt::Debug for WeatherPoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherPoller")
            .field("interval", &self.interval)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

impl WeatherPoller {
    pub fn new(
        sync: Arc<SyncController>,
        renderer: Arc<dyn HomeRenderer>,
        interval: Duration,
    ) -> Self {
        Self {
            sync,
            renderer,
            interval,
            mounted: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Poll now and then every interval. Mounting twice keeps one timer.
    pub fn mount(&mut self, settings: &DashboardSettings) {
        if self.is_mounted() {
            return;
        }
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.sync),
            Arc::clone(&self.renderer),
            settings.clone(),
            self.interval,
            cancel.clone(),
        ));
        tracing::debug!("Weather polling mounted every {:?}", self.interval);
        self.mounted = Some((cancel, task));
    }

    /// Stop the timer; an in-flight poll is abandoned, not awaited.
    pub fn unmount(&mut self) {
        if let Some((cancel, task)) = self.mounted.take() {
            cancel.cancel();
            task.abort();
            tracing::debug!("Weather polling unmounted");
        }
    }
}

impl Drop for WeatherPoller {
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn poll_loop(
    sync: Arc<SyncController>,
    renderer: Arc<dyn HomeRenderer>,
    settings: DashboardSettings,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = sync.refresh_weather() => match result {
                Ok(weather) => renderer.render_home(&HomeView::new(&weather, &settings)),
                Err(e) => tracing::warn!("Weather refresh failed: {}", e),
            },
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
