//! Dashboard session: ties the cache, sync controller, selection and
//! renderers together behind the actions a user can take

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{new_cache_handle, CacheHandle};
use crate::chart::{
    group_chart, sensor_chart, voltage_status, ChartRenderer, ChartTarget, MemberSeries,
};
use crate::config::DashboardSettings;
use crate::error::{Failure, FailureKind, MutationResult};
use crate::gateway::EntityGateway;
use crate::model::Measurement;
use crate::notifier::Notifier;
use crate::sync::SyncController;
use crate::view::{GroupPanel, SensorPanel, ViewState};
use crate::weather::{HomeRenderer, WeatherPoller};

/// Voltage status only considers the last hour of samples
const VOLTAGE_HOURS: u32 = 1;

/// One user's dashboard session
#[derive(Debug)]
pub struct Dashboard {
    sync: Arc<SyncController>,
    view: ViewState,
    settings: DashboardSettings,
    charts: Arc<dyn ChartRenderer>,
    weather: WeatherPoller,
}

impl Dashboard {
    pub fn new(
        gateway: Arc<dyn EntityGateway>,
        notifier: Arc<dyn Notifier>,
        charts: Arc<dyn ChartRenderer>,
        home: Arc<dyn HomeRenderer>,
        weather_interval: Duration,
    ) -> Self {
        let sync = Arc::new(SyncController::new(gateway, new_cache_handle(), notifier));
        let weather = WeatherPoller::new(Arc::clone(&sync), home, weather_interval);
        Self {
            sync,
            view: ViewState::new(),
            settings: DashboardSettings::default(),
            charts,
            weather,
        }
    }

    pub fn sync(&self) -> &Arc<SyncController> {
        &self.sync
    }

    pub fn cache(&self) -> &CacheHandle {
        self.sync.cache()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Load settings and every collection, then pick default selections
    pub async fn start(&mut self) -> crate::Result<()> {
        match self.sync.fetch_settings().await {
            Ok(settings) => self.settings = settings,
            Err(e) => tracing::warn!("Using default dashboard settings: {}", e),
        }
        self.sync.refresh_all().await?;
        {
            let cache = self.sync.cache().read().await;
            self.view.select_defaults(&cache);
            tracing::info!(
                "Dashboard started with {} sensors, {} groups, {} controllers",
                cache.sensors.len(),
                cache.sensor_groups.len(),
                cache.controllers.len()
            );
        }
        self.render_sensor_chart().await;
        self.render_group_chart().await;
        Ok(())
    }

    pub fn mount_home(&mut self) {
        self.weather.mount(&self.settings);
    }

    pub fn unmount_home(&mut self) {
        self.weather.unmount();
    }

    pub fn is_home_mounted(&self) -> bool {
        self.weather.is_mounted()
    }

    pub async fn select_sensor(&mut self, sensor_id: &str) -> crate::Result<()> {
        self.view
            .select_sensor(&*self.sync.cache().read().await, sensor_id)?;
        self.render_sensor_chart().await;
        Ok(())
    }

    pub async fn select_group(&mut self, group_id: &str) -> crate::Result<()> {
        self.view
            .select_group(&*self.sync.cache().read().await, group_id)?;
        self.render_group_chart().await;
        Ok(())
    }

    pub fn begin_new_group(&mut self) {
        self.view.begin_new_group();
    }

    pub async fn save_sensor_name(&mut self, name: &str) -> MutationResult {
        let sensor_id = self
            .view
            .active_sensor()
            .map(str::to_string)
            .ok_or_else(|| Failure::new(FailureKind::NotFound, "no sensor selected"))?;
        let text = self.sync.rename_sensor(&sensor_id, name).await?;
        self.reconcile().await;
        Ok(text)
    }

    /// Rename the active group, or create one when none is active
    pub async fn save_group_name(&mut self, name: &str) -> MutationResult {
        match self.view.active_group().map(str::to_string) {
            Some(group_id) => {
                let text = self.sync.rename_sensor_group(&group_id, name).await?;
                self.reconcile().await;
                Ok(text)
            }
            None => {
                let text = self.sync.create_sensor_group(name).await?;
                // The new group is the last one listed
                self.view.select_defaults(&*self.sync.cache().read().await);
                self.render_group_chart().await;
                Ok(text)
            }
        }
    }

    pub async fn delete_active_group(&mut self) -> MutationResult {
        let group_id = self.active_group()?;
        let text = self.sync.delete_sensor_group(&group_id).await?;
        self.reconcile().await;
        self.render_group_chart().await;
        Ok(text)
    }

    /// Attach a controller to the active group; `None` detaches
    pub async fn assign_controller(&mut self, controller_id: Option<&str>) -> MutationResult {
        let group_id = self.active_group()?;
        let text = self.sync.assign_controller(&group_id, controller_id).await?;
        self.render_group_chart().await;
        Ok(text)
    }

    /// Tick or untick a sensor in the active group's member list
    pub async fn toggle_member(&mut self, sensor_id: &str, included: bool) -> MutationResult {
        let group_id = self.active_group()?;
        let text = self
            .sync
            .set_group_membership(sensor_id, &group_id, included)
            .await?;
        self.render_group_chart().await;
        Ok(text)
    }

    /// Resync everything and repair selections that no longer exist
    pub async fn refresh(&mut self) -> crate::Result<()> {
        self.sync.refresh_all().await?;
        self.reconcile().await;
        Ok(())
    }

    pub async fn sensor_panel(&self) -> Option<SensorPanel> {
        let sensor_id = self.view.active_sensor()?.to_string();
        let voltage = match self
            .sync
            .fetch_series(&sensor_id, Measurement::Voltage, VOLTAGE_HOURS)
            .await
        {
            Ok(samples) => voltage_status(&samples),
            Err(e) => {
                tracing::warn!("Voltage of sensor {} unavailable: {}", sensor_id, e);
                None
            }
        };
        self.view
            .sensor_panel(&*self.sync.cache().read().await, voltage)
    }

    pub async fn group_panel(&self) -> Option<GroupPanel> {
        self.view.group_panel(&*self.sync.cache().read().await)
    }

    /// Render the active sensor's chart once both series are in.
    /// Returns whether a chart was rendered.
    pub async fn render_sensor_chart(&self) -> bool {
        let Some(sensor_id) = self.view.active_sensor().map(str::to_string) else {
            return false;
        };
        let hours = self.settings.graph_hours;
        let temperature = self.series(&sensor_id, Measurement::Temperature, hours).await;
        let humidity = self.series(&sensor_id, Measurement::Humidity, hours).await;

        match sensor_chart(&temperature, &humidity, self.settings.temperature_unit) {
            Some(chart) => {
                self.charts.render(ChartTarget::Sensor, &chart);
                true
            }
            None => {
                tracing::debug!("No temperature data for sensor {}", sensor_id);
                false
            }
        }
    }

    /// Render the active group's chart once every member's series is in.
    /// Returns whether a chart was rendered.
    pub async fn render_group_chart(&self) -> bool {
        let (members, band) = {
            let cache = self.sync.cache().read().await;
            let Some(group) = self
                .view
                .active_group()
                .and_then(|id| cache.sensor_groups.get(id))
            else {
                return false;
            };
            // Memberships of sensors that no longer exist are skipped
            let members: Vec<(String, String)> = cache
                .sensors
                .list()
                .filter(|s| group.has_member(&s.id))
                .map(|s| (s.id.clone(), s.label()))
                .collect();
            (members, self.view.active_band(&cache))
        };

        let hours = self.settings.graph_hours;
        let mut series = Vec::with_capacity(members.len());
        for (sensor_id, name) in members {
            series.push(MemberSeries {
                temperature: self.series(&sensor_id, Measurement::Temperature, hours).await,
                humidity: self.series(&sensor_id, Measurement::Humidity, hours).await,
                name,
            });
        }

        let chart = group_chart(&series, band.as_ref(), self.settings.temperature_unit);
        self.charts.render(ChartTarget::SensorGroup, &chart);
        true
    }

    async fn series(
        &self,
        sensor_id: &str,
        measurement: Measurement,
        hours: u32,
    ) -> Vec<crate::model::DataPoint> {
        match self.sync.fetch_series(sensor_id, measurement, hours).await {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!("No {} data for sensor {}: {}", measurement, sensor_id, e);
                Vec::new()
            }
        }
    }

    async fn reconcile(&mut self) {
        let cache = self.sync.cache().read().await;
        self.view.reconcile(&cache);
    }

    fn active_group(&self) -> Result<String, Failure> {
        self.view
            .active_group()
            .map(str::to_string)
            .ok_or_else(|| Failure::new(FailureKind::NotFound, "no sensor group selected"))
    }
}
