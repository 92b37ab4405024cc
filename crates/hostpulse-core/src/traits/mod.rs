//! Core traits defined in `hostpulse-core` and implemented by other crates.

pub mod collector;

pub use collector::Collector;
