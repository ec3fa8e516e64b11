//! BDD step definitions for server state and dashboard startup

use std::time::Duration;

use cucumber::{given, when};

use comfort::config::{DashboardSettings, TemperatureUnit};
use comfort::mock::Operation;
use comfort::model::{Controller, ControllerKind, Sensor, SensorGroup, WeatherSnapshot};
use comfort::ComfortError;

use crate::world::ComfortWorld;

#[given(expr = "a sensor {string} named {string}")]
fn sensor_named(world: &mut ComfortWorld, id: String, name: String) {
    world.configure(|b| b.with_sensor(Sensor::new(id, Some(name.as_str()))));
}

#[given(expr = "an unnamed sensor {string}")]
fn unnamed_sensor(world: &mut ComfortWorld, id: String) {
    world.configure(|b| b.with_sensor(Sensor::new(id, None)));
}

#[given(expr = "a temperature controller {string} named {string} with setpoint {int} and tolerance {int}")]
fn temperature_controller(
    world: &mut ComfortWorld,
    id: String,
    name: String,
    setpoint: i32,
    tolerance: i32,
) {
    let controller = Controller::new(id, name, ControllerKind::Temperature)
        .with_setpoint(f64::from(setpoint), f64::from(tolerance));
    world.configure(|b| b.with_controller(controller));
}

#[given(expr = "a sensor group {string} named {string} containing sensor {string}")]
fn group_with_member(world: &mut ComfortWorld, id: String, name: String, sensor: String) {
    world.configure(|b| b.with_group(SensorGroup::new(id, name).with_members([sensor])));
}

#[given(expr = "a sensor group {string} named {string} driven by controller {string}")]
fn group_with_controller(world: &mut ComfortWorld, id: String, name: String, controller: String) {
    world.configure(|b| b.with_group(SensorGroup::new(id, name).with_controller(controller)));
}

#[given("the server normalizes names")]
fn normalizing(world: &mut ComfortWorld) {
    world.configure(|b| b.normalizing_names());
}

#[given(expr = "the current weather is {string} at {int} kelvin with {int} percent humidity")]
fn current_weather(world: &mut ComfortWorld, description: String, kelvin: i32, humidity: i32) {
    let weather = WeatherSnapshot {
        description,
        icon: "01d".to_string(),
        temperature_kelvin: f64::from(kelvin),
        humidity: f64::from(humidity),
    };
    world.configure(|b| b.with_weather(weather));
}

#[given(expr = "the temperature unit setting is {string}")]
fn temperature_unit(world: &mut ComfortWorld, unit: String) {
    let settings = DashboardSettings {
        temperature_unit: TemperatureUnit::from_setting(&unit),
        ..DashboardSettings::default()
    };
    world.configure(|b| b.with_settings(settings));
}

#[given(expr = "the server rejects group renames with {string}")]
fn rejects_group_renames(world: &mut ComfortWorld, message: String) {
    world.server().fail(
        Operation::RenameSensorGroup,
        ComfortError::Status {
            status: 400,
            message,
        },
    );
}

#[given("the server is unreachable for membership changes")]
fn membership_unreachable(world: &mut ComfortWorld) {
    let server = world.server();
    server.fail(
        Operation::AddGroupMember,
        ComfortError::Http("connection refused".to_string()),
    );
    server.fail(
        Operation::RemoveGroupMember,
        ComfortError::Http("connection refused".to_string()),
    );
}

#[given(expr = "the server deletes controller {string}")]
fn server_deletes_controller(world: &mut ComfortWorld, id: String) {
    world.server().server_delete_controller(&id);
}

#[given("the dashboard is started")]
async fn dashboard_started(world: &mut ComfortWorld) {
    world.start_default_dashboard().await;
}

#[given(expr = "the dashboard is started with a weather interval of {int} milliseconds")]
async fn dashboard_started_with_interval(world: &mut ComfortWorld, millis: u64) {
    world.start_dashboard(Duration::from_millis(millis)).await;
}

#[when("the dashboard refreshes")]
async fn dashboard_refreshes(world: &mut ComfortWorld) {
    world
        .dashboard()
        .refresh()
        .await
        .expect("refresh failed");
}
