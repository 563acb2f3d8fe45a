//! Live location registry
//!
//! Holds the last-known position of every vehicle that has reported in.
//! One entry per vehicle id, overwritten in place; no history is kept.
//!
//! Entries are never evicted unless `stale_after` is configured. With the
//! default configuration a vehicle that goes offline keeps its last
//! position until it reports again or the process shuts down.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{TrackerError, TrackerResult};
use crate::models::VehiclePosition;

#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Exclude entries older than this from snapshots. `None` keeps
    /// everything.
    pub stale_after: Option<Duration>,

    /// Reject updates whose `observed_at` predates the stored entry.
    pub reject_out_of_order: bool,
}

/// Point-in-time copy of the registry, keyed by vehicle id.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entries: HashMap<String, VehiclePosition>,
}

impl RegistrySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = VehiclePosition>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|p| (p.vehicle_id.clone(), p))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VehiclePosition> {
        self.entries.values()
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&VehiclePosition> {
        self.entries.get(vehicle_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct LocationRegistry {
    entries: RwLock<HashMap<String, VehiclePosition>>,
    config: RegistryConfig,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        if config.stale_after.is_some() || config.reject_out_of_order {
            tracing::info!(
                stale_after = ?config.stale_after,
                reject_out_of_order = config.reject_out_of_order,
                "Location registry hardening enabled"
            );
        }
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Insert or overwrite the entry for `vehicle_id`.
    ///
    /// Coordinates are validated before the lock is taken; a rejected
    /// update leaves the previous entry untouched.
    pub fn set(&self, vehicle_id: &str, mut position: VehiclePosition) -> TrackerResult<()> {
        if !position.coordinates().is_valid() {
            return Err(TrackerError::InvalidPosition {
                latitude: position.latitude,
                longitude: position.longitude,
            });
        }
        position.vehicle_id = vehicle_id.to_string();

        let mut entries = self.entries.write();
        if self.config.reject_out_of_order {
            if let Some(existing) = entries.get(vehicle_id) {
                if position.observed_at < existing.observed_at {
                    return Err(TrackerError::OutOfOrder {
                        vehicle_id: vehicle_id.to_string(),
                    });
                }
            }
        }
        entries.insert(vehicle_id.to_string(), position);
        Ok(())
    }

    pub fn get(&self, vehicle_id: &str) -> TrackerResult<VehiclePosition> {
        self.entries
            .read()
            .get(vehicle_id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("vehicle {}", vehicle_id)))
    }

    /// Copy every current entry under the read lock.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let cutoff = self.stale_cutoff();
        let entries = self.entries.read();
        let entries: HashMap<String, VehiclePosition> = match cutoff {
            Some(cutoff) => entries
                .iter()
                .filter(|(_, p)| p.observed_at >= cutoff)
                .map(|(id, p)| (id.clone(), p.clone()))
                .collect(),
            None => entries.clone(),
        };
        RegistrySnapshot { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry. Called once on shutdown.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        tracing::info!(vehicles = entries.len(), "Clearing location registry");
        entries.clear();
    }

    fn stale_cutoff(&self) -> Option<DateTime<Utc>> {
        let stale_after = self.config.stale_after?;
        let stale_after = ChronoDuration::from_std(stale_after).ok()?;
        Some(Utc::now() - stale_after)
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
