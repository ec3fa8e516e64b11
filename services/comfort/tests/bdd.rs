//! BDD test entry point for the comfort dashboard client

#[path = "bdd/world.rs"]
mod world;

#[path = "bdd/steps/mod.rs"]
mod steps;

use cucumber::World as _;
use world::ComfortWorld;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    ComfortWorld::run("tests/features").await;
}
