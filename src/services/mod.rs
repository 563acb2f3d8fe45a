pub mod broadcast;
pub mod credentials;
pub mod proximity;
pub mod registry;
pub mod session;
pub mod tracking;

use std::sync::Arc;

use crate::config::Config;
use crate::models::HubEvent;
use crate::repository::{InMemoryUserStore, UserStore};

pub use broadcast::{BroadcastHub, Subscription, SubscriptionId};
pub use credentials::{CredentialService, Identity};
pub use proximity::{ProximityConfig, ProximityEngine, ProximityResult};
pub use registry::{LocationRegistry, RegistryConfig, RegistrySnapshot};
pub use session::ClientSession;
pub use tracking::TrackingService;

pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub credentials: Arc<CredentialService>,
    pub tracking: Arc<TrackingService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_store(config, Arc::new(InMemoryUserStore::new()))
    }

    pub fn with_store(config: Config, users: Arc<dyn UserStore>) -> Self {
        let credentials = Arc::new(CredentialService::with_ttl(
            &config.jwt_secret,
            chrono::Duration::seconds(config.token_ttl_secs),
        ));
        let registry = Arc::new(LocationRegistry::with_config(config.registry_config()));
        let engine = ProximityEngine::new(config.proximity_config());
        let hub: BroadcastHub<HubEvent> = BroadcastHub::with_capacity(config.subscriber_queue_capacity);
        let tracking = Arc::new(TrackingService::new(registry, engine, hub, users.clone()));

        Self {
            config,
            users,
            credentials,
            tracking,
        }
    }
}
