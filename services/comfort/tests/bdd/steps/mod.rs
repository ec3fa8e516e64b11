//! BDD step definitions for the comfort dashboard client

pub mod edit_steps;
pub mod selection_steps;
pub mod server_steps;
pub mod weather_steps;
