//! Proximity engine: nearest bus, ETA and nearby count.

use bustrack::models::{Coordinates, VehiclePosition};
use bustrack::services::proximity::{haversine_km, round_eta};
use bustrack::services::{LocationRegistry, ProximityConfig, ProximityEngine, RegistrySnapshot};
use bustrack::TrackerError;

fn snapshot_of(vehicles: &[(&str, f64, f64)]) -> RegistrySnapshot {
    let registry = LocationRegistry::new();
    for (id, lat, lon) in vehicles {
        registry
            .set(id, VehiclePosition::observed_now(*id, Coordinates::new(*lat, *lon)))
            .unwrap();
    }
    registry.snapshot()
}

#[test]
fn test_delhi_example() {
    let engine = ProximityEngine::default();
    let origin = Coordinates::new(28.7041, 77.1025);
    let snapshot = snapshot_of(&[("DL1PC0001", 28.7100, 77.1100)]);

    let result = engine.query(origin, &snapshot).unwrap();
    assert_eq!(result.nearest_vehicle_id.as_deref(), Some("DL1PC0001"));
    assert_eq!(result.eta_minutes, Some(3));
    assert_eq!(result.nearby_count, 1);

    let distance = result.nearest_distance_km.unwrap();
    assert!(distance > 0.9 && distance < 1.1, "distance {}", distance);
}

#[test]
fn test_empty_snapshot_gives_empty_result() {
    let engine = ProximityEngine::default();
    let result = engine
        .query(Coordinates::new(12.97, 77.59), &RegistrySnapshot::empty())
        .unwrap();
    assert!(result.nearest_vehicle_id.is_none());
    assert!(result.eta_minutes.is_none());
    assert_eq!(result.nearby_count, 0);
}

#[test]
fn test_vehicle_at_origin_has_zero_eta() {
    let engine = ProximityEngine::default();
    for &(lat, lon) in &[(0.0, 0.0), (90.0, 180.0), (-90.0, -180.0), (-33.86, 151.2)] {
        let snapshot = snapshot_of(&[("HERE", lat, lon)]);
        let result = engine.query(Coordinates::new(lat, lon), &snapshot).unwrap();
        assert_eq!(result.eta_minutes, Some(0));
        assert_eq!(result.nearby_count, 1);
    }
}

#[test]
fn test_far_vehicles_not_counted_as_nearby() {
    let engine = ProximityEngine::default();
    let origin = Coordinates::new(28.7041, 77.1025);
    // ~0.1 km, ~3.3 km and ~11 km away.
    let snapshot = snapshot_of(&[
        ("NEAR", 28.7050, 77.1025),
        ("MID", 28.7341, 77.1025),
        ("FAR", 28.8041, 77.1025),
    ]);

    let result = engine.query(origin, &snapshot).unwrap();
    assert_eq!(result.nearby_count, 1);
    assert_eq!(result.nearest_vehicle_id.as_deref(), Some("NEAR"));

    for position in snapshot.iter() {
        let d = haversine_km(origin, position.coordinates());
        if position.vehicle_id != "NEAR" {
            assert!(d > 2.0);
        }
    }
}

#[test]
fn test_nearest_is_minimum_arrival_time() {
    let engine = ProximityEngine::default();
    let origin = Coordinates::new(0.0, 0.0);
    // 0.1 degree of latitude is ~11.1 km: 33.4 minutes at 20 km/h.
    let snapshot = snapshot_of(&[("B", 0.2, 0.0), ("A", 0.1, 0.0), ("C", 0.3, 0.0)]);

    let result = engine.query(origin, &snapshot).unwrap();
    assert_eq!(result.nearest_vehicle_id.as_deref(), Some("A"));
    assert_eq!(result.eta_minutes, Some(33));
    assert_eq!(result.nearby_count, 0);
}

#[test]
fn test_eta_rounds_half_away_from_zero() {
    assert_eq!(round_eta(2.5), 3);
    assert_eq!(round_eta(0.5), 1);
    assert_eq!(round_eta(2.49), 2);
    assert_eq!(round_eta(3.27), 3);
}

#[test]
fn test_eta_uses_configured_speed() {
    // At 60 km/h minutes equal kilometres.
    let engine = ProximityEngine::new(ProximityConfig {
        radius_km: 2.0,
        speed_kmh: 60.0,
    });
    let snapshot = snapshot_of(&[("X", 0.1, 0.0)]);
    let result = engine.query(Coordinates::new(0.0, 0.0), &snapshot).unwrap();
    assert_eq!(result.eta_minutes, Some(11));
}

#[test]
fn test_invalid_origin_is_rejected() {
    let engine = ProximityEngine::default();
    let snapshot = snapshot_of(&[("A", 1.0, 1.0)]);

    for origin in [
        Coordinates::new(91.0, 0.0),
        Coordinates::new(0.0, -200.0),
        Coordinates::new(f64::NAN, 0.0),
    ] {
        assert!(matches!(
            engine.query(origin, &snapshot),
            Err(TrackerError::InvalidQuery { .. })
        ));
    }
}

#[test]
fn test_custom_radius_widens_nearby_count() {
    let engine = ProximityEngine::new(ProximityConfig {
        radius_km: 5.0,
        speed_kmh: 20.0,
    });
    let origin = Coordinates::new(28.7041, 77.1025);
    let snapshot = snapshot_of(&[("NEAR", 28.7050, 77.1025), ("MID", 28.7341, 77.1025)]);
    assert_eq!(engine.query(origin, &snapshot).unwrap().nearby_count, 2);
}
