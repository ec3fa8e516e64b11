//! BDD step definitions for selection, panels and charts

use cucumber::{then, when};

use comfort::chart::ChartTarget;

use crate::world::ComfortWorld;

#[when(expr = "I select sensor {string}")]
async fn select_sensor(world: &mut ComfortWorld, id: String) {
    world
        .dashboard()
        .select_sensor(&id)
        .await
        .expect("sensor not selectable");
}

#[when(expr = "I select sensor group {string}")]
async fn select_group(world: &mut ComfortWorld, id: String) {
    world
        .dashboard()
        .select_group(&id)
        .await
        .expect("sensor group not selectable");
}

#[then(expr = "the active sensor is {string}")]
fn active_sensor(world: &mut ComfortWorld, id: String) {
    assert_eq!(world.dashboard().view().active_sensor(), Some(id.as_str()));
}

#[then(expr = "the active sensor group is {string}")]
fn active_group(world: &mut ComfortWorld, id: String) {
    assert_eq!(world.dashboard().view().active_group(), Some(id.as_str()));
}

#[then("no sensor group is active")]
fn no_active_group(world: &mut ComfortWorld) {
    assert_eq!(world.dashboard().view().active_group(), None);
}

#[then(expr = "the active sensor group is named {string}")]
async fn active_group_named(world: &mut ComfortWorld, name: String) {
    let panel = world
        .dashboard()
        .group_panel()
        .await
        .expect("no group panel");
    assert_eq!(panel.name, name);
}

#[then(expr = "the controller label is {string}")]
async fn controller_label(world: &mut ComfortWorld, label: String) {
    let panel = world
        .dashboard()
        .group_panel()
        .await
        .expect("no group panel");
    assert_eq!(panel.controller_label, label);
}

#[then(expr = "the acceptance band is {int} to {int}")]
async fn acceptance_band(world: &mut ComfortWorld, lower: i32, upper: i32) {
    let panel = world
        .dashboard()
        .group_panel()
        .await
        .expect("no group panel");
    let band = panel.band.expect("no acceptance band");
    assert_eq!(band.lower, f64::from(lower));
    assert_eq!(band.upper, f64::from(upper));
}

#[then("there is no acceptance band")]
async fn no_acceptance_band(world: &mut ComfortWorld) {
    let panel = world
        .dashboard()
        .group_panel()
        .await
        .expect("no group panel");
    assert!(panel.band.is_none());
}

#[then(expr = "the member list shows {string} as {string}")]
async fn member_listed(world: &mut ComfortWorld, sensor_id: String, state: String) {
    let panel = world
        .dashboard()
        .group_panel()
        .await
        .expect("no group panel");
    let member = panel
        .members
        .iter()
        .find(|m| m.sensor_id == sensor_id)
        .expect("sensor missing from member list");
    assert_eq!(member.checked, state == "checked");
}

#[then(expr = "the group chart shows series {string}")]
fn group_chart_series(world: &mut ComfortWorld, labels: String) {
    let chart = world
        .charts
        .last(ChartTarget::SensorGroup)
        .expect("no group chart rendered");
    let rendered: Vec<&str> = chart.series.iter().map(|s| s.label.as_str()).collect();
    let expected: Vec<&str> = labels.split(", ").collect();
    assert_eq!(rendered, expected);
}
