use serde::Deserialize;
use std::time::Duration;

use crate::services::broadcast::DEFAULT_QUEUE_CAPACITY;
use crate::services::credentials::DEFAULT_TOKEN_TTL_SECS;
use crate::services::proximity::{ProximityConfig, DEFAULT_AVERAGE_SPEED_KMH, DEFAULT_NEARBY_RADIUS_KM};
use crate::services::registry::RegistryConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub subscriber_queue_capacity: usize,
    pub stale_after_secs: Option<u64>,
    pub reject_out_of_order: bool,
    pub nearby_radius_km: f64,
    pub average_speed_kmh: f64,
    pub log_format: String,
}

impl Config {
    /// Defaults overlaid with process environment variables
    /// (`PORT`, `JWT_SECRET`, `STALE_AFTER_SECS`, ...).
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .set_default("port", 5000_i64)?
            .set_default("token_ttl_secs", DEFAULT_TOKEN_TTL_SECS)?
            .set_default("subscriber_queue_capacity", DEFAULT_QUEUE_CAPACITY as i64)?
            .set_default("reject_out_of_order", false)?
            .set_default("nearby_radius_km", DEFAULT_NEARBY_RADIUS_KM)?
            .set_default("average_speed_kmh", DEFAULT_AVERAGE_SPEED_KMH)?
            .set_default("log_format", "text")?
            .add_source(::config::Environment::default().try_parsing(true))
            .build()?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must be set");
        }
        if self.token_ttl_secs <= 0 {
            anyhow::bail!("TOKEN_TTL_SECS must be positive, got {}", self.token_ttl_secs);
        }
        if !(self.nearby_radius_km.is_finite() && self.nearby_radius_km > 0.0) {
            anyhow::bail!("NEARBY_RADIUS_KM must be positive, got {}", self.nearby_radius_km);
        }
        if !(self.average_speed_kmh.is_finite() && self.average_speed_kmh > 0.0) {
            anyhow::bail!("AVERAGE_SPEED_KMH must be positive, got {}", self.average_speed_kmh);
        }
        if self.subscriber_queue_capacity == 0 {
            anyhow::bail!("SUBSCRIBER_QUEUE_CAPACITY must be at least 1");
        }
        Ok(())
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            stale_after: self.stale_after_secs.map(Duration::from_secs),
            reject_out_of_order: self.reject_out_of_order,
        }
    }

    pub fn proximity_config(&self) -> ProximityConfig {
        ProximityConfig {
            radius_km: self.nearby_radius_km,
            speed_kmh: self.average_speed_kmh,
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            jwt_secret: String::new(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            subscriber_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            stale_after_secs: None,
            reject_out_of_order: false,
            nearby_radius_km: DEFAULT_NEARBY_RADIUS_KM,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            log_format: "text".to_string(),
        }
    }
}
