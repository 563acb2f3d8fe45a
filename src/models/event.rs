use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Events pushed to socket clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum HubEvent {
    #[serde(rename_all = "camelCase")]
    BusLocationUpdate {
        bus_number: String,
        location: Coordinates,
        observed_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    PassengerNotification {
        passenger_name: String,
        message: String,
    },
}

/// Messages sent by socket clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    UpdateLocation {
        bus_number: String,
        location: Coordinates,
    },
    #[serde(rename_all = "camelCase")]
    PassengerOnBus {
        bus_number: String,
        passenger_name: String,
        message: String,
    },
}
