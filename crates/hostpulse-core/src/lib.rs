//! # hostpulse-core
//!
//! Core crate for HostPulse. Contains the configuration schemas, the
//! metric sample types produced by collectors, the MessagePack wire
//! snapshot, the [`Collector`](traits::collector::Collector) contract,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other HostPulse crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
