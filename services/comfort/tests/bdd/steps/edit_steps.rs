//! BDD step definitions for user edits and their feedback

use cucumber::{then, when};

use comfort::notifier::Severity;
use comfort::FailureKind;

use crate::world::ComfortWorld;

#[when(expr = "I save the sensor name {string}")]
async fn save_sensor_name(world: &mut ComfortWorld, name: String) {
    let result = world.dashboard().save_sensor_name(&name).await;
    world.last_result = Some(result);
}

#[when(expr = "I save the group name {string}")]
async fn save_group_name(world: &mut ComfortWorld, name: String) {
    let result = world.dashboard().save_group_name(&name).await;
    world.last_result = Some(result);
}

#[when("I start a new sensor group")]
fn start_new_group(world: &mut ComfortWorld) {
    world.dashboard().begin_new_group();
}

#[when(expr = "I include sensor {string} in the group")]
async fn include_sensor(world: &mut ComfortWorld, sensor_id: String) {
    let result = world.dashboard().toggle_member(&sensor_id, true).await;
    world.last_result = Some(result);
}

#[when(expr = "I exclude sensor {string} from the group")]
async fn exclude_sensor(world: &mut ComfortWorld, sensor_id: String) {
    let result = world.dashboard().toggle_member(&sensor_id, false).await;
    world.last_result = Some(result);
}

#[when("I detach the controller")]
async fn detach_controller(world: &mut ComfortWorld) {
    let result = world.dashboard().assign_controller(None).await;
    world.last_result = Some(result);
}

#[when("I delete the active sensor group")]
async fn delete_active_group(world: &mut ComfortWorld) {
    let result = world.dashboard().delete_active_group().await;
    world.last_result = Some(result);
}

#[then(expr = "the action fails with a validation failure {string}")]
fn fails_with_validation(world: &mut ComfortWorld, message: String) {
    let failure = world
        .last_result
        .clone()
        .expect("no action taken")
        .expect_err("action succeeded");
    assert_eq!(failure.kind, FailureKind::Validation);
    assert_eq!(failure.message, message);
}

#[then(expr = "the action fails with a network failure {string}")]
fn fails_with_network(world: &mut ComfortWorld, message: String) {
    let failure = world
        .last_result
        .clone()
        .expect("no action taken")
        .expect_err("action succeeded");
    assert_eq!(failure.kind, FailureKind::Network);
    assert_eq!(failure.message, message);
}

#[then(expr = "the last notification says {string}")]
fn last_notification(world: &mut ComfortWorld, message: String) {
    let notification = world.notifier.last().expect("no notification shown");
    assert_eq!(notification.severity, Severity::Info);
    assert_eq!(notification.message, message);
}

#[then(expr = "the last notification is an error saying {string}")]
fn last_error_notification(world: &mut ComfortWorld, message: String) {
    let notification = world.notifier.last().expect("no notification shown");
    assert_eq!(notification.severity, Severity::Error);
    assert_eq!(notification.message, message);
}

#[then(expr = "the sensor {string} is labelled {string}")]
async fn sensor_labelled(world: &mut ComfortWorld, id: String, label: String) {
    let cache = world.dashboard().cache().read().await;
    let sensor = cache.sensors.get(&id).expect("sensor not cached");
    assert_eq!(sensor.label(), label);
}

#[then(expr = "the sensor group {string} is named {string}")]
async fn group_named(world: &mut ComfortWorld, id: String, name: String) {
    let cache = world.dashboard().cache().read().await;
    let group = cache.sensor_groups.get(&id).expect("group not cached");
    assert_eq!(group.display_name, name);
}

#[then(expr = "sensor group {string} has {int} member(s)")]
async fn group_member_count(world: &mut ComfortWorld, id: String, count: usize) {
    let cache = world.dashboard().cache().read().await;
    let group = cache.sensor_groups.get(&id).expect("group not cached");
    assert_eq!(group.members.len(), count);
}

#[then(expr = "there are {int} sensor groups")]
async fn group_count(world: &mut ComfortWorld, count: usize) {
    let cache = world.dashboard().cache().read().await;
    assert_eq!(cache.sensor_groups.len(), count);
}
