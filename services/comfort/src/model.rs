//! Entity snapshots as last reported by the backend

use std::collections::HashSet;
use std::fmt;

/// A single sensor node
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub id: String,
    pub display_name: Option<String>,
}

impl Sensor {
    pub fn new(id: impl Into<String>, display_name: Option<&str>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.map(str::to_string),
        }
    }

    /// Name shown in lists; unnamed sensors are labelled by id.
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => format!("sensor {}", self.id),
        }
    }
}

/// A named set of sensors, optionally driven by a controller
#[derive(Debug, Clone, PartialEq)]
pub struct SensorGroup {
    pub id: String,
    pub display_name: String,
    /// Weak reference; may point at a controller that no longer exists
    pub controller_id: Option<String>,
    pub members: HashSet<String>,
}

impl SensorGroup {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            controller_id: None,
            members: HashSet::new(),
        }
    }

    pub fn with_controller(mut self, controller_id: impl Into<String>) -> Self {
        self.controller_id = Some(controller_id.into());
        self
    }

    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_member(&self, sensor_id: &str) -> bool {
        self.members.contains(sensor_id)
    }
}

/// What a controller regulates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerKind {
    Temperature,
    Other(String),
}

impl ControllerKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "temperature" => ControllerKind::Temperature,
            other => ControllerKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerKind::Temperature => write!(f, "temperature"),
            ControllerKind::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// A climate controller with an optional setpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Controller {
    pub id: String,
    pub display_name: String,
    pub kind: ControllerKind,
    pub setpoint: Option<f64>,
    pub tolerance: Option<f64>,
}

impl Controller {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, kind: ControllerKind) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind,
            setpoint: None,
            tolerance: None,
        }
    }

    pub fn with_setpoint(mut self, setpoint: f64, tolerance: f64) -> Self {
        self.setpoint = Some(setpoint);
        self.tolerance = Some(tolerance);
        self
    }
}

/// Current outdoor conditions
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub description: String,
    pub icon: String,
    pub temperature_kelvin: f64,
    pub humidity: f64,
}

/// Quantities a sensor reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    Temperature,
    Humidity,
    Voltage,
}

impl Measurement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::Temperature => "temperature",
            Measurement::Humidity => "humidity",
            Measurement::Voltage => "voltage",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sample of a sensor time series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub epoch_ms: f64,
    pub value: f64,
}
