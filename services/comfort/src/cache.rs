//! In-memory cache of the last known server state

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::model::{Controller, Sensor, SensorGroup, WeatherSnapshot};

/// The cached entity collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Sensor,
    SensorGroup,
    Controller,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Sensor => write!(f, "sensor"),
            EntityKind::SensorGroup => write!(f, "sensor group"),
            EntityKind::Controller => write!(f, "controller"),
        }
    }
}

/// Anything stored in a [`Collection`] is keyed by its own id
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Sensor {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for SensorGroup {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Controller {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Id-keyed entities in arrival order
#[derive(Debug, Clone)]
pub struct Collection<T> {
    order: Vec<String>,
    entries: HashMap<String, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

impl<T: Keyed> Collection<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entities in the order they first arrived
    pub fn list(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    pub fn first(&self) -> Option<&T> {
        self.order.first().and_then(|id| self.entries.get(id))
    }

    pub fn last(&self) -> Option<&T> {
        self.order.last().and_then(|id| self.entries.get(id))
    }

    /// Insert or overwrite; an overwritten entry keeps its position.
    pub fn replace(&mut self, entity: T) {
        let id = entity.key().to_string();
        if self.entries.insert(id.clone(), entity).is_none() {
            self.order.push(id);
        }
    }

    pub fn delete(&mut self, id: &str) -> Option<T> {
        let removed = self.entries.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    /// Drop every entry whose id is not in `keep`, returning how many went.
    pub fn retain_only(&mut self, keep: &HashSet<String>) -> usize {
        let before = self.order.len();
        self.order.retain(|id| keep.contains(id));
        self.entries.retain(|id, _| keep.contains(id));
        before - self.order.len()
    }

    /// Full resync: replace every fetched entity and drop the stale rest.
    pub fn replace_all(&mut self, fetched: Vec<T>) -> usize {
        let keep: HashSet<String> = fetched.iter().map(|e| e.key().to_string()).collect();
        for entity in fetched {
            self.replace(entity);
        }
        self.retain_only(&keep)
    }
}

/// Borrowed view of any cached entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Sensor(&'a Sensor),
    SensorGroup(&'a SensorGroup),
    Controller(&'a Controller),
}

/// Owned entity of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Sensor(Sensor),
    SensorGroup(SensorGroup),
    Controller(Controller),
}

/// Last known state of every entity the dashboard shows
#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    pub sensors: Collection<Sensor>,
    pub sensor_groups: Collection<SensorGroup>,
    pub controllers: Collection<Controller>,
    pub weather: Option<WeatherSnapshot>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: EntityKind, id: &str) -> Option<EntityRef<'_>> {
        match kind {
            EntityKind::Sensor => self.sensors.get(id).map(EntityRef::Sensor),
            EntityKind::SensorGroup => self.sensor_groups.get(id).map(EntityRef::SensorGroup),
            EntityKind::Controller => self.controllers.get(id).map(EntityRef::Controller),
        }
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.get(kind, id).is_some()
    }

    pub fn list(&self, kind: EntityKind) -> Vec<EntityRef<'_>> {
        match kind {
            EntityKind::Sensor => self.sensors.list().map(EntityRef::Sensor).collect(),
            EntityKind::SensorGroup => self
                .sensor_groups
                .list()
                .map(EntityRef::SensorGroup)
                .collect(),
            EntityKind::Controller => self.controllers.list().map(EntityRef::Controller).collect(),
        }
    }

    pub fn replace(&mut self, entity: Entity) {
        match entity {
            Entity::Sensor(sensor) => self.sensors.replace(sensor),
            Entity::SensorGroup(group) => self.sensor_groups.replace(group),
            Entity::Controller(controller) => self.controllers.replace(controller),
        }
    }

    /// Remove an entity, returning true if it was cached
    pub fn delete(&mut self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::Sensor => self.sensors.delete(id).is_some(),
            EntityKind::SensorGroup => self.sensor_groups.delete(id).is_some(),
            EntityKind::Controller => self.controllers.delete(id).is_some(),
        }
    }

    /// Resolve a group's controller, treating a dangling reference as none
    pub fn controller_of(&self, group: &SensorGroup) -> Option<&Controller> {
        group
            .controller_id
            .as_deref()
            .and_then(|id| self.controllers.get(id))
    }
}

/// Shared cache handle passed to the sync controller, view and poller
pub type CacheHandle = Arc<RwLock<EntityCache>>;

pub fn new_cache_handle() -> CacheHandle {
    Arc::new(RwLock::new(EntityCache::new()))
}
