//! Engine controller and periodic collection loop.

pub mod controller;
pub mod tick;

pub use controller::{EngineController, EngineState};
pub use tick::TickSettings;
