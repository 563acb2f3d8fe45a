//! Nearest-vehicle and nearby-count computation over a registry snapshot.
//!
//! Distances are great-circle distances on a spherical Earth (haversine).
//! The "next" vehicle is the one with the smallest projected arrival time
//! at a fixed average speed, which under a single speed is the same as the
//! smallest distance.

use serde::Serialize;

use crate::error::{TrackerError, TrackerResult};
use crate::models::Coordinates;
use crate::services::registry::RegistrySnapshot;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 2.0;

/// Planning assumption for buses in city traffic.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 20.0;

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Whole minutes, halves rounded away from zero.
pub fn round_eta(minutes: f64) -> i64 {
    minutes.round() as i64
}

#[derive(Debug, Clone, Copy)]
pub struct ProximityConfig {
    pub radius_km: f64,
    pub speed_kmh: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_NEARBY_RADIUS_KM,
            speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

/// A single proximity request.
#[derive(Debug, Clone, Copy)]
pub struct ProximityQuery {
    pub origin: Coordinates,
    pub radius_km: f64,
    pub speed_kmh: f64,
}

impl ProximityQuery {
    pub fn new(origin: Coordinates, config: &ProximityConfig) -> Self {
        Self {
            origin,
            radius_km: config.radius_km,
            speed_kmh: config.speed_kmh,
        }
    }

    /// Arrival time in minutes for a vehicle `distance_km` away.
    pub fn arrival_minutes(&self, distance_km: f64) -> f64 {
        (distance_km / self.speed_kmh) * 60.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityResult {
    pub nearest_vehicle_id: Option<String>,
    pub eta_minutes: Option<i64>,
    pub nearest_distance_km: Option<f64>,
    pub nearby_count: usize,
}

impl ProximityResult {
    pub fn empty() -> Self {
        Self {
            nearest_vehicle_id: None,
            eta_minutes: None,
            nearest_distance_km: None,
            nearby_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProximityEngine {
    config: ProximityConfig,
}

impl ProximityEngine {
    pub fn new(config: ProximityConfig) -> Self {
        Self { config }
    }

    /// Scan `snapshot` once from `origin`.
    pub fn query(
        &self,
        origin: Coordinates,
        snapshot: &RegistrySnapshot,
    ) -> TrackerResult<ProximityResult> {
        if !origin.is_valid() {
            return Err(TrackerError::InvalidQuery {
                latitude: origin.latitude,
                longitude: origin.longitude,
            });
        }
        let query = ProximityQuery::new(origin, &self.config);

        let mut result = ProximityResult::empty();
        let mut min_arrival = f64::INFINITY;

        for position in snapshot.iter() {
            let distance = haversine_km(query.origin, position.coordinates());
            if distance <= query.radius_km {
                result.nearby_count += 1;
            }

            let arrival = query.arrival_minutes(distance);
            // Strict comparison: first entry wins on ties.
            if arrival < min_arrival {
                min_arrival = arrival;
                result.nearest_vehicle_id = Some(position.vehicle_id.clone());
                result.eta_minutes = Some(round_eta(arrival));
                result.nearest_distance_km = Some(distance);
            }
        }

        tracing::debug!(
            scanned = snapshot.len(),
            nearby = result.nearby_count,
            nearest = ?result.nearest_vehicle_id,
            "Proximity query"
        );

        Ok(result)
    }
}
