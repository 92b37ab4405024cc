//! # hostpulse-collectors
//!
//! Concrete metric sources for HostPulse. Every type here implements
//! [`hostpulse_core::traits::Collector`]; the engine only sees that trait.
//!
//! Blocking reads (sysinfo refreshes) run on the blocking pool, and external
//! tools (`nvidia-smi`, `docker`) are spawned as child processes that are
//! killed if the engine abandons the read.

pub mod builder;
mod command;
pub mod cpu;
pub mod disk;
pub mod docker;
pub mod gpu;
pub mod network;
pub mod ram;
mod system;
pub mod temperature;

pub use builder::build_collectors;
pub use cpu::CpuCollector;
pub use disk::DiskCollector;
pub use docker::DockerCollector;
pub use gpu::{AmdGpuCollector, NvidiaGpuCollector};
pub use network::NetworkCollector;
pub use ram::RamCollector;
pub use temperature::TemperatureCollector;
