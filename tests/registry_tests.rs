//! Location registry behaviour under normal and concurrent use.

use std::sync::Arc;
use std::thread;

use bustrack::models::{Coordinates, VehiclePosition};
use bustrack::services::LocationRegistry;
use bustrack::TrackerError;

fn fix(lat: f64, lon: f64) -> VehiclePosition {
    VehiclePosition::observed_now("", Coordinates::new(lat, lon))
}

#[test]
fn test_set_then_get_returns_written_position() {
    let registry = LocationRegistry::new();
    registry.set("DL1PC0001", fix(28.7041, 77.1025)).unwrap();

    let stored = registry.get("DL1PC0001").unwrap();
    assert_eq!(stored.latitude, 28.7041);
    assert_eq!(stored.longitude, 77.1025);
}

#[test]
fn test_get_unknown_vehicle_is_not_found() {
    let registry = LocationRegistry::new();
    assert!(matches!(registry.get("NOPE"), Err(TrackerError::NotFound(_))));
}

#[test]
fn test_out_of_range_latitude_rejected_and_prior_entry_kept() {
    let registry = LocationRegistry::new();
    registry.set("DL1PC0001", fix(28.0, 77.0)).unwrap();

    let err = registry.set("DL1PC0001", fix(1000.0, 77.0)).unwrap_err();
    assert!(matches!(err, TrackerError::InvalidPosition { .. }));

    let stored = registry.get("DL1PC0001").unwrap();
    assert_eq!(stored.latitude, 28.0);
}

#[test]
fn test_out_of_range_longitude_rejected_without_prior_entry() {
    let registry = LocationRegistry::new();
    assert!(registry.set("DL1PC0002", fix(10.0, 181.0)).is_err());
    assert!(registry.is_empty());
}

#[test]
fn test_snapshot_does_not_see_later_writes() {
    let registry = LocationRegistry::new();
    registry.set("A", fix(1.0, 1.0)).unwrap();

    let snapshot = registry.snapshot();
    registry.set("B", fix(2.0, 2.0)).unwrap();
    registry.set("A", fix(3.0, 3.0)).unwrap();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("A").unwrap().latitude, 1.0);
    assert!(snapshot.get("B").is_none());
}

#[test]
fn test_concurrent_writes_to_distinct_vehicles_are_all_kept() {
    let registry = Arc::new(LocationRegistry::new());
    let n = 64;

    let handles: Vec<_> = (0..n)
        .map(|i| {
            let registry = registry.clone();
            thread::spawn(move || {
                let id = format!("BUS-{}", i);
                for step in 0..50 {
                    let lat = (i as f64 * 0.5 + step as f64 * 0.01) % 90.0;
                    registry.set(&id, fix(lat, 77.0)).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().expect("writer thread panicked");
    }

    let snapshot = registry.snapshot();
    assert_eq!(snapshot.len(), n);
    for i in 0..n {
        assert!(snapshot.get(&format!("BUS-{}", i)).is_some());
    }
}

#[test]
fn test_snapshots_taken_during_writes_stay_consistent() {
    let registry = Arc::new(LocationRegistry::new());
    let writer = {
        let registry = registry.clone();
        thread::spawn(move || {
            for i in 0..500 {
                registry.set(&format!("BUS-{}", i % 20), fix(1.0, 1.0)).unwrap();
            }
        })
    };

    let mut last = 0;
    for _ in 0..200 {
        let len = registry.snapshot().len();
        // Vehicles are never removed, so snapshot size never shrinks.
        assert!(len >= last);
        assert!(len <= 20);
        last = len;
    }

    writer.join().expect("writer thread panicked");
    assert_eq!(registry.snapshot().len(), 20);
}
