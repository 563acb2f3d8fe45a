//! Live tracking: ties the registry, the proximity engine and the
//! broadcast hub together behind the operations clients actually call.

use std::sync::Arc;

use crate::error::TrackerResult;
use crate::models::{Coordinates, HubEvent, UserFilter, VehiclePosition};
use crate::repository::UserStore;
use crate::services::broadcast::BroadcastHub;
use crate::services::proximity::{ProximityEngine, ProximityResult};
use crate::services::registry::{LocationRegistry, RegistrySnapshot};

pub struct TrackingService {
    registry: Arc<LocationRegistry>,
    engine: ProximityEngine,
    hub: BroadcastHub<HubEvent>,
    users: Arc<dyn UserStore>,
}

impl TrackingService {
    pub fn new(
        registry: Arc<LocationRegistry>,
        engine: ProximityEngine,
        hub: BroadcastHub<HubEvent>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            registry,
            engine,
            hub,
            users,
        }
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn hub(&self) -> &BroadcastHub<HubEvent> {
        &self.hub
    }

    /// Record a vehicle's position and fan it out to every subscriber.
    /// Nothing is published when the registry rejects the update.
    pub fn update_location(&self, vehicle_id: &str, location: Coordinates) -> TrackerResult<VehiclePosition> {
        let position = VehiclePosition::observed_now(vehicle_id, location);
        self.registry.set(vehicle_id, position.clone())?;

        let delivered = self.hub.publish(HubEvent::BusLocationUpdate {
            bus_number: vehicle_id.to_string(),
            location,
            observed_at: position.observed_at,
        });
        tracing::debug!(vehicle_id, delivered, "Location update published");

        Ok(position)
    }

    /// Forward a passenger's message to whoever drives `vehicle_id`.
    ///
    /// Best effort: an unknown bus, an offline driver or a failing user
    /// store all end in a dropped message, never an error. Returns
    /// whether the message was queued for a driver.
    pub async fn notify_driver(&self, vehicle_id: &str, passenger_name: &str, message: &str) -> bool {
        let drivers = match self.users.find_many(&UserFilter::driver_of(vehicle_id)).await {
            Ok(drivers) => drivers,
            Err(e) => {
                tracing::warn!(vehicle_id, error = %e, "Driver lookup failed, dropping notification");
                return false;
            }
        };
        let Some(driver) = drivers.first() else {
            tracing::debug!(vehicle_id, "No driver registered for bus");
            return false;
        };

        let sent = self.hub.notify(
            &driver.id.to_string(),
            HubEvent::PassengerNotification {
                passenger_name: passenger_name.to_string(),
                message: message.to_string(),
            },
        );
        if sent {
            tracing::info!(vehicle_id, "Notification sent to driver");
        }
        sent
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    /// Nearest bus and nearby count for a passenger at `origin`.
    pub fn live_info(&self, origin: Coordinates) -> TrackerResult<ProximityResult> {
        self.engine.query(origin, &self.registry.snapshot())
    }
}
