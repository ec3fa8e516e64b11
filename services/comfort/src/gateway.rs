//! Remote entity gateway: the comfort backend's REST API

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::DashboardSettings;
use crate::io::{HttpClient, HttpResponse};
use crate::model::{
    Controller, ControllerKind, DataPoint, Measurement, Sensor, SensorGroup, WeatherSnapshot,
};

/// Controller id the backend reads as "detach whatever controller is assigned"
pub const NO_CONTROLLER_ID: &str = "0";

/// Everything the dashboard needs from the backend
#[async_trait]
pub trait EntityGateway: Send + Sync {
    async fn list_sensors(&self) -> crate::Result<Vec<Sensor>>;

    async fn list_sensor_groups(&self) -> crate::Result<Vec<SensorGroup>>;

    async fn list_controllers(&self) -> crate::Result<Vec<Controller>>;

    async fn fetch_weather(&self) -> crate::Result<WeatherSnapshot>;

    async fn fetch_settings(&self) -> crate::Result<DashboardSettings>;

    /// Samples for the last `hours`, oldest first
    async fn fetch_sensor_data(
        &self,
        sensor_id: &str,
        measurement: Measurement,
        hours: u32,
    ) -> crate::Result<Vec<DataPoint>>;

    /// Mutations return the server's confirmation text, possibly empty
    async fn rename_sensor(&self, sensor_id: &str, name: &str) -> crate::Result<String>;

    async fn rename_sensor_group(&self, group_id: &str, name: &str) -> crate::Result<String>;

    async fn create_sensor_group(&self, name: &str) -> crate::Result<String>;

    async fn delete_sensor_group(&self, group_id: &str) -> crate::Result<String>;

    /// `None` detaches the group's controller
    async fn assign_controller(
        &self,
        group_id: &str,
        controller_id: Option<&str>,
    ) -> crate::Result<String>;

    async fn add_group_member(&self, group_id: &str, sensor_id: &str) -> crate::Result<String>;

    async fn remove_group_member(
        &self,
        group_id: &str,
        sensor_id: &str,
    ) -> crate::Result<String>;
}

/// Body of every mutation response, success or error
#[derive(Debug, Deserialize)]
struct TextResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SensorRecord {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SensorGroupRecord {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    controller_id: Value,
    #[serde(default)]
    members: Value,
}

#[derive(Debug, Deserialize)]
struct ControllerRecord {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    setpoint: Value,
    #[serde(default)]
    tolerance: Value,
}

#[derive(Debug, Deserialize)]
struct SensorDataResponse {
    result: bool,
    #[serde(default)]
    payload: Vec<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<WeatherCondition>,
    main: WeatherMain,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
    #[serde(default)]
    humidity: f64,
}

/// Ids arrive as strings or integers depending on the backend's store
fn id_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric fields are sometimes serialized as strings
fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Group membership is an object keyed by sensor id, or a plain list
fn members_from(value: &Value) -> impl Iterator<Item = String> + '_ {
    let ids: Vec<String> = match value {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => items.iter().filter_map(id_from).collect(),
        _ => Vec::new(),
    };
    ids.into_iter()
}

/// Parse a JSON object keyed by id, preserving the response order
fn parse_collection<R, T>(body: &str, build: impl Fn(String, R) -> T) -> crate::Result<Vec<T>>
where
    R: serde::de::DeserializeOwned,
{
    let map: serde_json::Map<String, Value> = serde_json::from_str(body)?;
    map.into_iter()
        .map(|(id, raw)| -> crate::Result<T> { Ok(build(id, serde_json::from_value(raw)?)) })
        .collect()
}

/// [`EntityGateway`] over the backend's HTTP API
pub struct RestGateway {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestGateway")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RestGateway {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::debug!("Created RestGateway for {}", base_url);
        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Map non-2xx responses to [`crate::ComfortError::Status`] with the server's text
    fn check(response: HttpResponse) -> crate::Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }
        let message = serde_json::from_str::<TextResponse>(&response.body)
            .ok()
            .and_then(|r| r.text)
            .unwrap_or_default();
        tracing::debug!("Backend rejected request: status={} text={:?}", response.status, message);
        Err(crate::ComfortError::Status {
            status: response.status,
            message,
        })
    }

    /// Confirmation text of a successful mutation; empty when the body carries none
    fn confirmation(response: HttpResponse) -> crate::Result<String> {
        let response = Self::check(response)?;
        Ok(serde_json::from_str::<TextResponse>(&response.body)
            .ok()
            .and_then(|r| r.text)
            .unwrap_or_default())
    }

    async fn get_body(&self, path: &str) -> crate::Result<String> {
        let response = self.http.get(&self.url(path)).await?;
        Ok(Self::check(response)?.body)
    }
}

#[async_trait]
impl EntityGateway for RestGateway {
    async fn list_sensors(&self) -> crate::Result<Vec<Sensor>> {
        let body = self.get_body("sensors").await?;
        parse_collection(&body, |id, record: SensorRecord| Sensor {
            id,
            display_name: record.display_name,
        })
    }

    async fn list_sensor_groups(&self) -> crate::Result<Vec<SensorGroup>> {
        let body = self.get_body("sensorgroups").await?;
        parse_collection(&body, |id, record: SensorGroupRecord| SensorGroup {
            display_name: record.display_name.unwrap_or_else(|| id.clone()),
            controller_id: id_from(&record.controller_id),
            members: members_from(&record.members).collect(),
            id,
        })
    }

    async fn list_controllers(&self) -> crate::Result<Vec<Controller>> {
        let body = self.get_body("controllers").await?;
        parse_collection(&body, |id, record: ControllerRecord| Controller {
            display_name: record.display_name.unwrap_or_else(|| id.clone()),
            kind: ControllerKind::from_wire(record.kind.as_deref().unwrap_or_default()),
            setpoint: number_from(&record.setpoint),
            tolerance: number_from(&record.tolerance),
            id,
        })
    }

    async fn fetch_weather(&self) -> crate::Result<WeatherSnapshot> {
        let body = self.get_body("weather").await?;
        let response: WeatherResponse = serde_json::from_str(&body)?;
        let condition = response.weather.into_iter().next();
        Ok(WeatherSnapshot {
            description: condition
                .as_ref()
                .map(|c| c.description.clone())
                .unwrap_or_default(),
            icon: condition.map(|c| c.icon).unwrap_or_default(),
            temperature_kelvin: response.main.temp,
            humidity: response.main.humidity,
        })
    }

    async fn fetch_settings(&self) -> crate::Result<DashboardSettings> {
        let body = self.get_body("config").await?;
        DashboardSettings::from_json(&body)
    }

    async fn fetch_sensor_data(
        &self,
        sensor_id: &str,
        measurement: Measurement,
        hours: u32,
    ) -> crate::Result<Vec<DataPoint>> {
        let path = format!(
            "sensors/{}/data?value={}&hours={}",
            sensor_id, measurement, hours
        );
        let body = self.get_body(&path).await?;
        let response: SensorDataResponse = serde_json::from_str(&body)?;
        if !response.result {
            tracing::debug!("No {} data for sensor {}", measurement, sensor_id);
            return Ok(Vec::new());
        }

        Ok(response
            .payload
            .iter()
            .filter_map(|sample| {
                let epoch = sample.get("epoch").and_then(number_from)?;
                let value = sample.get(measurement.as_str()).and_then(number_from)?;
                Some(DataPoint {
                    epoch_ms: epoch * 1000.0,
                    value,
                })
            })
            .collect())
    }

    async fn rename_sensor(&self, sensor_id: &str, name: &str) -> crate::Result<String> {
        let url = self.url(&format!("sensors/{}/name", sensor_id));
        let response = self.http.post_form(&url, &[("value", name)]).await?;
        Self::confirmation(response)
    }

    async fn rename_sensor_group(&self, group_id: &str, name: &str) -> crate::Result<String> {
        let url = self.url(&format!("sensorgroups/{}/name", group_id));
        let response = self.http.post_form(&url, &[("value", name)]).await?;
        Self::confirmation(response)
    }

    async fn create_sensor_group(&self, name: &str) -> crate::Result<String> {
        let url = self.url("sensorgroups");
        let response = self.http.put_form(&url, &[("value", name)]).await?;
        Self::confirmation(response)
    }

    async fn delete_sensor_group(&self, group_id: &str) -> crate::Result<String> {
        let url = self.url(&format!("sensorgroups/{}", group_id));
        let response = self.http.delete(&url).await?;
        Self::confirmation(response)
    }

    async fn assign_controller(
        &self,
        group_id: &str,
        controller_id: Option<&str>,
    ) -> crate::Result<String> {
        let controller_id = controller_id.unwrap_or(NO_CONTROLLER_ID);
        let url = self.url(&format!("controllers/{}/sensorgroup", controller_id));
        let response = self.http.post_form(&url, &[("value", group_id)]).await?;
        Self::confirmation(response)
    }

    async fn add_group_member(&self, group_id: &str, sensor_id: &str) -> crate::Result<String> {
        let url = self.url(&format!("sensorgroups/{}/sensors/{}", group_id, sensor_id));
        let response = self.http.put_form(&url, &[]).await?;
        Self::confirmation(response)
    }

    async fn remove_group_member(
        &self,
        group_id: &str,
        sensor_id: &str,
    ) -> crate::Result<String> {
        let url = self.url(&format!("sensorgroups/{}/sensors/{}", group_id, sensor_id));
        let response = self.http.delete(&url).await?;
        Self::confirmation(response)
    }
}
