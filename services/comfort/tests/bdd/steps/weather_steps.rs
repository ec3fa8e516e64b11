//! BDD step definitions for the home view weather feature

use std::time::Duration;

use cucumber::{then, when};

use crate::world::ComfortWorld;

fn weather_polls(world: &mut ComfortWorld) -> usize {
    world
        .backend
        .as_ref()
        .expect("dashboard not started")
        .weather_polls()
}

#[when("the home view is mounted")]
fn home_mounted(world: &mut ComfortWorld) {
    world.dashboard().mount_home();
}

#[when("the home view is unmounted")]
fn home_unmounted(world: &mut ComfortWorld) {
    world.dashboard().unmount_home();
}

#[when(expr = "{int} milliseconds pass")]
async fn time_passes(_world: &mut ComfortWorld, millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

#[when("the weather poll count is noted")]
fn note_polls(world: &mut ComfortWorld) {
    world.noted_weather_polls = Some(weather_polls(world));
}

#[then(expr = "the home view shows {string}")]
fn home_shows(world: &mut ComfortWorld, temperature: String) {
    let view = world.home.last().expect("home view never rendered");
    assert_eq!(view.temperature, temperature);
}

#[then(expr = "the home view describes {string}")]
fn home_describes(world: &mut ComfortWorld, description: String) {
    let view = world.home.last().expect("home view never rendered");
    assert_eq!(view.description, description);
}

#[then(expr = "the weather was polled at least {int} times")]
fn polled_at_least(world: &mut ComfortWorld, count: usize) {
    let polls = weather_polls(world);
    assert!(polls >= count, "only {} weather polls", polls);
}

#[then("the weather was not polled again")]
fn not_polled_again(world: &mut ComfortWorld) {
    let noted = world.noted_weather_polls.expect("poll count not noted");
    assert_eq!(weather_polls(world), noted);
    assert!(!world.dashboard().is_home_mounted());
}
