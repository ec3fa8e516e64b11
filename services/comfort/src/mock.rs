//! In-memory backend for testing
//!
//! [`MockBackend`] implements [`EntityGateway`] over a simulated server
//! store so the sync controller, view state and dashboard can be exercised
//! without a running comfort server. Failures can be injected per operation,
//! names can be normalized the way a real server might, and every call is
//! recorded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::cache::{CacheHandle, Collection, EntityCache};
use crate::config::DashboardSettings;
use crate::error::{ComfortError, Result};
use crate::gateway::EntityGateway;
use crate::model::{Controller, DataPoint, Measurement, Sensor, SensorGroup, WeatherSnapshot};

/// Gateway operations, used to inject failures and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListSensors,
    ListSensorGroups,
    ListControllers,
    FetchWeather,
    FetchSettings,
    FetchSensorData,
    RenameSensor,
    RenameSensorGroup,
    CreateSensorGroup,
    DeleteSensorGroup,
    AssignController,
    AddGroupMember,
    RemoveGroupMember,
}

/// Simulated server-side store
#[derive(Debug, Default)]
struct MockStore {
    sensors: Collection<Sensor>,
    groups: Collection<SensorGroup>,
    controllers: Collection<Controller>,
    weather: Option<WeatherSnapshot>,
    settings: DashboardSettings,
    series: HashMap<(String, Measurement), Vec<DataPoint>>,
    failures: HashMap<Operation, ComfortError>,
    next_group_id: u64,
    uppercase_names: bool,
}

/// An [`EntityGateway`] backed by memory instead of HTTP
#[derive(Debug, Default)]
pub struct MockBackend {
    store: Mutex<MockStore>,
    calls: Mutex<Vec<Operation>>,
    weather_polls: AtomicUsize,
    observed: Mutex<Option<CacheHandle>>,
    snapshots: Mutex<Vec<EntityCache>>,
}

impl MockBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.store().next_group_id = 100;
        backend
    }

    fn store(&self) -> std::sync::MutexGuard<'_, MockStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_sensor(self, sensor: Sensor) -> Self {
        self.store().sensors.replace(sensor);
        self
    }

    pub fn with_group(self, group: SensorGroup) -> Self {
        self.store().groups.replace(group);
        self
    }

    pub fn with_controller(self, controller: Controller) -> Self {
        self.store().controllers.replace(controller);
        self
    }

    pub fn with_weather(self, weather: WeatherSnapshot) -> Self {
        self.store().weather = Some(weather);
        self
    }

    pub fn with_settings(self, settings: DashboardSettings) -> Self {
        self.store().settings = settings;
        self
    }

    pub fn with_series(
        self,
        sensor_id: &str,
        measurement: Measurement,
        points: Vec<DataPoint>,
    ) -> Self {
        self.store()
            .series
            .insert((sensor_id.to_string(), measurement), points);
        self
    }

    /// Store names uppercased, as a normalizing server would
    pub fn normalizing_names(self) -> Self {
        self.store().uppercase_names = true;
        self
    }

    /// Make every subsequent call of `operation` fail with `error`
    pub fn fail(&self, operation: Operation, error: ComfortError) {
        self.store().failures.insert(operation, error);
    }

    pub fn recover(&self, operation: Operation) {
        self.store().failures.remove(&operation);
    }

    /// Simulate a change made by someone else on the server
    pub fn server_rename_sensor(&self, sensor_id: &str, name: &str) {
        if let Some(sensor) = self.store().sensors.get_mut(sensor_id) {
            sensor.display_name = Some(name.to_string());
        }
    }

    pub fn server_delete_controller(&self, controller_id: &str) {
        self.store().controllers.delete(controller_id);
    }

    pub fn server_delete_sensor(&self, sensor_id: &str) {
        self.store().sensors.delete(sensor_id);
    }

    pub fn server_group(&self, group_id: &str) -> Option<SensorGroup> {
        self.store().groups.get(group_id).cloned()
    }

    pub fn server_group_ids(&self) -> Vec<String> {
        self.store().groups.ids().map(str::to_string).collect()
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls().iter().filter(|op| **op == operation).count()
    }

    pub fn weather_polls(&self) -> usize {
        self.weather_polls.load(Ordering::SeqCst)
    }

    /// Snapshot `cache` whenever a collection is listed, to observe what the
    /// client held at the moment it asked for a refresh
    pub fn observe_cache(&self, cache: CacheHandle) {
        *self.observed.lock().unwrap_or_else(|e| e.into_inner()) = Some(cache);
    }

    pub fn cache_snapshots(&self) -> Vec<EntityCache> {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn snapshot_cache(&self) {
        let observed = self.observed.lock().unwrap_or_else(|e| e.into_inner());
        let Some(cache) = observed.as_ref() else {
            return;
        };
        // A held write lock means the client is mid-patch; nothing to see yet
        let Ok(cache) = cache.try_read() else {
            return;
        };
        let snapshot = cache.clone();
        drop(cache);
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(snapshot);
    }

    /// Record the call and return the injected failure, if any
    fn enter(&self, operation: Operation) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(operation);
        match self.store().failures.get(&operation) {
            Some(err) => Err(clone_error(err)),
            None => Ok(()),
        }
    }

    fn normalize(&self, name: &str) -> String {
        if self.store().uppercase_names {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }
}

fn clone_error(err: &ComfortError) -> ComfortError {
    match err {
        ComfortError::Status { status, message } => ComfortError::Status {
            status: *status,
            message: message.clone(),
        },
        ComfortError::NotFound { kind, id } => ComfortError::NotFound {
            kind: *kind,
            id: id.clone(),
        },
        other => ComfortError::Http(other.to_string()),
    }
}

fn rejected(message: &str) -> ComfortError {
    ComfortError::Status {
        status: 400,
        message: message.to_string(),
    }
}

#[async_trait]
impl EntityGateway for MockBackend {
    async fn list_sensors(&self) -> Result<Vec<Sensor>> {
        self.enter(Operation::ListSensors)?;
        self.snapshot_cache();
        Ok(self.store().sensors.list().cloned().collect())
    }

    async fn list_sensor_groups(&self) -> Result<Vec<SensorGroup>> {
        self.enter(Operation::ListSensorGroups)?;
        self.snapshot_cache();
        Ok(self.store().groups.list().cloned().collect())
    }

    async fn list_controllers(&self) -> Result<Vec<Controller>> {
        self.enter(Operation::ListControllers)?;
        Ok(self.store().controllers.list().cloned().collect())
    }

    async fn fetch_weather(&self) -> Result<WeatherSnapshot> {
        self.weather_polls.fetch_add(1, Ordering::SeqCst);
        self.enter(Operation::FetchWeather)?;
        self.store()
            .weather
            .clone()
            .ok_or_else(|| rejected("weather unavailable"))
    }

    async fn fetch_settings(&self) -> Result<DashboardSettings> {
        self.enter(Operation::FetchSettings)?;
        Ok(self.store().settings.clone())
    }

    async fn fetch_sensor_data(
        &self,
        sensor_id: &str,
        measurement: Measurement,
        _hours: u32,
    ) -> Result<Vec<DataPoint>> {
        self.enter(Operation::FetchSensorData)?;
        Ok(self
            .store()
            .series
            .get(&(sensor_id.to_string(), measurement))
            .cloned()
            .unwrap_or_default())
    }

    async fn rename_sensor(&self, sensor_id: &str, name: &str) -> Result<String> {
        self.enter(Operation::RenameSensor)?;
        let name = self.normalize(name);
        let mut store = self.store();
        let sensor = store
            .sensors
            .get_mut(sensor_id)
            .ok_or_else(|| rejected("no such sensor"))?;
        sensor.display_name = Some(name);
        Ok("name saved".to_string())
    }

    async fn rename_sensor_group(&self, group_id: &str, name: &str) -> Result<String> {
        self.enter(Operation::RenameSensorGroup)?;
        let name = self.normalize(name);
        let mut store = self.store();
        let group = store
            .groups
            .get_mut(group_id)
            .ok_or_else(|| rejected("no such sensor group"))?;
        group.display_name = name;
        Ok("name saved".to_string())
    }

    async fn create_sensor_group(&self, name: &str) -> Result<String> {
        self.enter(Operation::CreateSensorGroup)?;
        if name.trim().is_empty() {
            return Err(rejected("name must not be empty"));
        }
        let name = self.normalize(name);
        let mut store = self.store();
        store.next_group_id += 1;
        let id = store.next_group_id.to_string();
        store.groups.replace(SensorGroup::new(id, name));
        Ok("sensor group created".to_string())
    }

    async fn delete_sensor_group(&self, group_id: &str) -> Result<String> {
        self.enter(Operation::DeleteSensorGroup)?;
        self.store()
            .groups
            .delete(group_id)
            .ok_or_else(|| rejected("no such sensor group"))?;
        Ok("sensor group deleted".to_string())
    }

    async fn assign_controller(
        &self,
        group_id: &str,
        controller_id: Option<&str>,
    ) -> Result<String> {
        self.enter(Operation::AssignController)?;
        let mut store = self.store();
        if let Some(id) = controller_id {
            if !store.controllers.contains(id) {
                return Err(rejected("no such controller"));
            }
        }
        let group = store
            .groups
            .get_mut(group_id)
            .ok_or_else(|| rejected("no such sensor group"))?;
        group.controller_id = controller_id.map(str::to_string);
        Ok(String::new())
    }

    async fn add_group_member(&self, group_id: &str, sensor_id: &str) -> Result<String> {
        self.enter(Operation::AddGroupMember)?;
        let mut store = self.store();
        let group = store
            .groups
            .get_mut(group_id)
            .ok_or_else(|| rejected("no such sensor group"))?;
        group.members.insert(sensor_id.to_string());
        Ok(String::new())
    }

    async fn remove_group_member(&self, group_id: &str, sensor_id: &str) -> Result<String> {
        self.enter(Operation::RemoveGroupMember)?;
        let mut store = self.store();
        let group = store
            .groups
            .get_mut(group_id)
            .ok_or_else(|| rejected("no such sensor group"))?;
        group.members.remove(sensor_id);
        Ok(String::new())
    }
}
