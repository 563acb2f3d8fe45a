//! Live bus tracking service.
//!
//! Drivers stream GPS fixes over a WebSocket; every fix lands in the
//! [`LocationRegistry`](services::LocationRegistry) and is fanned out to
//! connected clients through a [`BroadcastHub`](services::BroadcastHub).
//! Passengers ask for the next bus and how many are nearby, answered by
//! the [`ProximityEngine`](services::ProximityEngine) over a registry
//! snapshot. A small REST API covers registration, login and profiles.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logger;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;

pub use config::Config;
pub use error::{TrackerError, TrackerResult};
pub use router::create_router;
pub use services::AppState;
