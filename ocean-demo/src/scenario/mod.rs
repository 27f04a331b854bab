//! Scenario definitions and the built-in library

pub mod library;
pub mod model;

pub use library::ScenarioLibrary;
pub use model::{Scenario, Step, StepAction, StepTarget};
