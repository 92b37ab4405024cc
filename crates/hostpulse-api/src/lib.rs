//! # hostpulse-api
//!
//! HTTP layer for HostPulse built on Axum.
//!
//! Provides the WebSocket endpoint that streams binary frames to viewers,
//! health and engine statistics endpoints, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{build_app, run_server, serve};
pub use state::AppState;
