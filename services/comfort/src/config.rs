//! Configuration types for the comfort dashboard client
//!
//! [`Config`] is the local client configuration loaded from a JSON file.
//! [`DashboardSettings`] is owned by the backend and only ever read here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Where the comfort backend lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Timer intervals for the background refresh loops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_weather_interval")]
    pub weather_interval_seconds: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
}

impl PollingConfig {
    pub fn weather_interval(&self) -> Duration {
        Duration::from_secs(self.weather_interval_seconds)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    /// Both loops sleep for their interval between polls, so zero is rejected
    pub fn validate(&self) -> crate::Result<()> {
        if self.weather_interval_seconds == 0 {
            return Err(crate::ComfortError::Config(
                "weather_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.refresh_interval_seconds == 0 {
            return Err(crate::ComfortError::Config(
                "refresh_interval_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            weather_interval_seconds: default_weather_interval(),
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_weather_interval() -> u64 {
    300
}

fn default_refresh_interval() -> u64 {
    60
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::ComfortError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.polling.validate()?;
    Ok(config)
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Anything the backend sends other than "Celsius" means Fahrenheit.
    pub fn from_setting(value: &str) -> Self {
        if value == "Celsius" {
            TemperatureUnit::Celsius
        } else {
            TemperatureUnit::Fahrenheit
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Celsius => write!(f, "Celsius"),
            TemperatureUnit::Fahrenheit => write!(f, "Fahrenheit"),
        }
    }
}

/// Dashboard-wide settings served by the backend's `/api/config`
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub location: Option<String>,
    pub temperature_unit: TemperatureUnit,
    pub graph_hours: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            location: None,
            temperature_unit: TemperatureUnit::Celsius,
            graph_hours: default_graph_hours(),
        }
    }
}

fn default_graph_hours() -> u32 {
    24
}

/// Wire shape of `/api/config`: every setting is wrapped as `{"value": ...}`
#[derive(Debug, Deserialize)]
struct SettingsResponse {
    #[serde(default)]
    location: Option<SettingValue>,
    #[serde(default)]
    tempunits: Option<SettingValue>,
    #[serde(default)]
    graphtime: Option<SettingValue>,
}

#[derive(Debug, Deserialize)]
struct SettingValue {
    #[serde(default)]
    value: serde_json::Value,
}

impl SettingValue {
    fn as_text(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl DashboardSettings {
    /// Parse the body of `/api/config`, falling back to defaults per field.
    pub fn from_json(body: &str) -> crate::Result<Self> {
        let response: SettingsResponse = serde_json::from_str(body)?;
        let defaults = Self::default();

        let location = response.location.as_ref().and_then(SettingValue::as_text);
        let temperature_unit = response
            .tempunits
            .as_ref()
            .and_then(SettingValue::as_text)
            .map(|v| TemperatureUnit::from_setting(&v))
            .unwrap_or(defaults.temperature_unit);
        let graph_hours = response
            .graphtime
            .as_ref()
            .and_then(SettingValue::as_text)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults.graph_hours);

        Ok(Self {
            location,
            temperature_unit,
            graph_hours,
        })
    }
}
