//! Error types shared by the tracking core and its collaborators.

use thiserror::Error;

/// Errors raised by the registry, the proximity engine and the collaborators
/// they lean on (user store, credential service).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("invalid position: latitude {latitude}, longitude {longitude}")]
    InvalidPosition { latitude: f64, longitude: f64 },

    #[error("invalid query origin: latitude {latitude}, longitude {longitude}")]
    InvalidQuery { latitude: f64, longitude: f64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("update for {vehicle_id} is older than the stored position")]
    OutOfOrder { vehicle_id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid token")]
    InvalidToken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
