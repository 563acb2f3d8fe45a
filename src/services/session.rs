//! Per-connection state for socket clients, independent of the transport.
//!
//! A session always gets a broadcast subscription. Only a connection that
//! presented a valid driver token is also bound as a notification target
//! under its user id; a missing or bad token still gets the public feed.

use std::sync::Arc;

use crate::models::{ClientMessage, HubEvent, RoleKind};
use crate::services::broadcast::{Subscription, SubscriptionId};
use crate::services::credentials::{CredentialService, Identity};
use crate::services::tracking::TrackingService;

pub struct ClientSession {
    tracking: Arc<TrackingService>,
    subscription: Subscription<HubEvent>,
    identity: Option<Identity>,
    target_key: Option<String>,
}

impl ClientSession {
    pub fn open(
        tracking: Arc<TrackingService>,
        credentials: &CredentialService,
        token: Option<&str>,
    ) -> Self {
        let subscription = tracking.hub().subscribe();

        let identity = match token.filter(|t| !t.is_empty()) {
            Some(token) => match credentials.verify_token(token) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    tracing::warn!(error = %e, "Socket authentication failed");
                    None
                }
            },
            None => None,
        };

        let target_key = identity
            .filter(|identity| identity.role == RoleKind::Driver)
            .map(|identity| identity.user_id.to_string());
        if let Some(key) = &target_key {
            tracking.hub().register_target(key, subscription.id());
        }

        tracing::info!(
            subscription = %subscription.id(),
            authenticated = identity.is_some(),
            driver = target_key.is_some(),
            "Client connected"
        );

        Self {
            tracking,
            subscription,
            identity,
            target_key,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.subscription.id()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity
    }

    pub fn is_notification_target(&self) -> bool {
        self.target_key.is_some()
    }

    /// Parse and apply one text frame. Malformed frames are logged and
    /// ignored so a single bad message does not end the connection.
    pub async fn handle_text(&self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle(message).await,
            Err(e) => tracing::debug!(subscription = %self.id(), error = %e, "Ignoring malformed frame"),
        }
    }

    pub async fn handle(&self, message: ClientMessage) {
        match message {
            ClientMessage::UpdateLocation {
                bus_number,
                location,
            } => {
                if let Err(e) = self.tracking.update_location(&bus_number, location) {
                    tracing::warn!(bus_number = %bus_number, error = %e, "Location update rejected");
                }
            }
            ClientMessage::PassengerOnBus {
                bus_number,
                passenger_name,
                message,
            } => {
                self.tracking
                    .notify_driver(&bus_number, &passenger_name, &message)
                    .await;
            }
        }
    }

    /// Wait for the next event addressed to this client.
    pub async fn next_event(&self) -> Option<HubEvent> {
        self.subscription.recv().await
    }

    pub fn try_next_event(&self) -> Option<HubEvent> {
        self.subscription.try_recv()
    }

    /// Unregister from the notification table and the hub.
    pub fn close(self) {
        let hub = self.tracking.hub();
        if let Some(key) = &self.target_key {
            hub.unregister_target(key, self.subscription.id());
        }
        hub.unsubscribe(self.subscription.id());
        tracing::info!(subscription = %self.subscription.id(), "Client disconnected");
    }
}
