//! Synchronization controller: mutations, optimistic patches and resyncs
//!
//! Every mutation follows the same two phases: issue the remote call, and on
//! success patch the cache immediately, then resync the affected collection
//! from the backend. The patch is applied before the resync is dispatched,
//! so whatever the server reports always wins. On failure the cache is left
//! untouched and a [`Failure`] is returned and shown to the user.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cache::{CacheHandle, EntityKind};
use crate::config::DashboardSettings;
use crate::error::{Failure, MutationResult};
use crate::gateway::EntityGateway;
use crate::model::{DataPoint, Measurement, WeatherSnapshot};
use crate::notifier::{Notification, Notifier};

/// How long edge and assignment confirmations stay on screen
pub const QUICK_FEEDBACK: Duration = Duration::from_secs(1);

/// Bridges user mutations and periodic refresh to the entity cache
pub struct SyncController {
    gateway: Arc<dyn EntityGateway>,
    cache: CacheHandle,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl SyncController {
    pub fn new(
        gateway: Arc<dyn EntityGateway>,
        cache: CacheHandle,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            cache,
            notifier,
        }
    }

    pub fn cache(&self) -> &CacheHandle {
        &self.cache
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub async fn refresh_sensors(&self) -> crate::Result<()> {
        let sensors = self.gateway.list_sensors().await?;
        let count = sensors.len();
        let stale = self.cache.write().await.sensors.replace_all(sensors);
        tracing::debug!("Refreshed {} sensors ({} stale removed)", count, stale);
        Ok(())
    }

    pub async fn refresh_sensor_groups(&self) -> crate::Result<()> {
        let groups = self.gateway.list_sensor_groups().await?;
        let count = groups.len();
        let stale = self.cache.write().await.sensor_groups.replace_all(groups);
        tracing::debug!("Refreshed {} sensor groups ({} stale removed)", count, stale);
        Ok(())
    }

    pub async fn refresh_controllers(&self) -> crate::Result<()> {
        let controllers = self.gateway.list_controllers().await?;
        let count = controllers.len();
        let stale = self.cache.write().await.controllers.replace_all(controllers);
        tracing::debug!("Refreshed {} controllers ({} stale removed)", count, stale);
        Ok(())
    }

    /// Resync every entity collection
    pub async fn refresh_all(&self) -> crate::Result<()> {
        self.refresh_sensors().await?;
        self.refresh_sensor_groups().await?;
        self.refresh_controllers().await?;
        Ok(())
    }

    pub async fn refresh(&self, kind: EntityKind) -> crate::Result<()> {
        match kind {
            EntityKind::Sensor => self.refresh_sensors().await,
            EntityKind::SensorGroup => self.refresh_sensor_groups().await,
            EntityKind::Controller => self.refresh_controllers().await,
        }
    }

    /// Fetch current weather into the cache's weather slot
    pub async fn refresh_weather(&self) -> crate::Result<WeatherSnapshot> {
        let weather = self.gateway.fetch_weather().await?;
        self.cache.write().await.weather = Some(weather.clone());
        tracing::debug!(
            "Weather: {} at {:.2} K",
            weather.description,
            weather.temperature_kelvin
        );
        Ok(weather)
    }

    pub async fn fetch_settings(&self) -> crate::Result<DashboardSettings> {
        self.gateway.fetch_settings().await
    }

    pub async fn fetch_series(
        &self,
        sensor_id: &str,
        measurement: Measurement,
        hours: u32,
    ) -> crate::Result<Vec<DataPoint>> {
        self.gateway
            .fetch_sensor_data(sensor_id, measurement, hours)
            .await
    }

    pub async fn rename_sensor(&self, sensor_id: &str, name: &str) -> MutationResult {
        let text = self
            .gateway
            .rename_sensor(sensor_id, name)
            .await
            .map_err(|e| self.fail(&e, "error on saving name", None))?;

        if let Some(sensor) = self.cache.write().await.sensors.get_mut(sensor_id) {
            sensor.display_name = Some(name.to_string());
        }
        self.confirm(&text, None);
        self.resync(EntityKind::Sensor).await;
        Ok(text)
    }

    pub async fn rename_sensor_group(&self, group_id: &str, name: &str) -> MutationResult {
        let text = self
            .gateway
            .rename_sensor_group(group_id, name)
            .await
            .map_err(|e| self.fail(&e, "error on saving name", None))?;

        if let Some(group) = self.cache.write().await.sensor_groups.get_mut(group_id) {
            group.display_name = name.to_string();
        }
        self.confirm(&text, None);
        self.resync(EntityKind::SensorGroup).await;
        Ok(text)
    }

    /// The new group's id is only learned from the resync
    pub async fn create_sensor_group(&self, name: &str) -> MutationResult {
        let text = self
            .gateway
            .create_sensor_group(name)
            .await
            .map_err(|e| self.fail(&e, "error on saving new group", None))?;

        self.confirm(&text, None);
        self.resync(EntityKind::SensorGroup).await;
        Ok(text)
    }

    /// Other groups' references to controllers are left alone
    pub async fn delete_sensor_group(&self, group_id: &str) -> MutationResult {
        let text = self
            .gateway
            .delete_sensor_group(group_id)
            .await
            .map_err(|e| self.fail(&e, "error on deleting group", None))?;

        self.cache.write().await.sensor_groups.delete(group_id);
        self.confirm(&text, None);
        self.resync(EntityKind::SensorGroup).await;
        Ok(text)
    }

    /// Attach `controller_id` to the group, or detach with `None`
    pub async fn assign_controller(
        &self,
        group_id: &str,
        controller_id: Option<&str>,
    ) -> MutationResult {
        self.gateway
            .assign_controller(group_id, controller_id)
            .await
            .map_err(|e| self.fail(&e, "error on assigning controller", Some(QUICK_FEEDBACK)))?;

        if let Some(group) = self.cache.write().await.sensor_groups.get_mut(group_id) {
            group.controller_id = controller_id.map(str::to_string);
        }
        let text = if controller_id.is_some() {
            "added"
        } else {
            "removed"
        };
        self.confirm(text, Some(QUICK_FEEDBACK));
        self.resync(EntityKind::SensorGroup).await;
        Ok(text.to_string())
    }

    /// Add or remove a single membership edge
    pub async fn set_group_membership(
        &self,
        sensor_id: &str,
        group_id: &str,
        included: bool,
    ) -> MutationResult {
        let result = if included {
            self.gateway.add_group_member(group_id, sensor_id).await
        } else {
            self.gateway.remove_group_member(group_id, sensor_id).await
        };
        let (done, fallback) = if included {
            ("added", "failure to add")
        } else {
            ("removed", "failure to remove")
        };
        result.map_err(|e| self.fail(&e, fallback, Some(QUICK_FEEDBACK)))?;

        if let Some(group) = self.cache.write().await.sensor_groups.get_mut(group_id) {
            if included {
                group.members.insert(sensor_id.to_string());
            } else {
                group.members.remove(sensor_id);
            }
        }
        self.confirm(done, Some(QUICK_FEEDBACK));
        self.resync(EntityKind::SensorGroup).await;
        Ok(done.to_string())
    }

    /// Periodically resync all collections until `cancel` fires
    pub async fn run(&self, interval: Duration, cancel: CancellationToken) {
        loop {
            if let Err(e) = self.refresh_all().await {
                tracing::warn!("Periodic refresh failed: {}", e);
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!("Periodic refresh cancelled");
                    break;
                }
            }
        }
    }

    /// Post-mutation reconcile; the mutation already succeeded, so a failed
    /// resync only leaves the optimistic patch in place until the next one
    async fn resync(&self, kind: EntityKind) {
        if let Err(e) = self.refresh(kind).await {
            tracing::warn!("Refresh of {} after mutation failed: {}", kind, e);
        }
    }

    fn confirm(&self, text: &str, auto_hide: Option<Duration>) {
        if text.is_empty() {
            return;
        }
        let notification = Notification::info(text);
        self.notifier.notify(&with_auto_hide(notification, auto_hide));
    }

    fn fail(
        &self,
        err: &crate::ComfortError,
        fallback: &str,
        auto_hide: Option<Duration>,
    ) -> Failure {
        let failure = Failure::from_error(err, fallback);
        tracing::warn!("{} ({})", failure, err);
        let notification = Notification::error(failure.message.clone());
        self.notifier.notify(&with_auto_hide(notification, auto_hide));
        failure
    }
}

fn with_auto_hide(notification: Notification, auto_hide: Option<Duration>) -> Notification {
    match auto_hide {
        Some(after) => notification.auto_hide(after),
        None => notification,
    }
}
