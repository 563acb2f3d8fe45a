use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a user is allowed to do. Driver-only details live on the
/// variant, so a passenger can never carry a bus assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Role {
    Driver {
        #[serde(rename = "busNumber")]
        vehicle_id: String,
        #[serde(rename = "busRoute")]
        route_label: String,
        #[serde(rename = "busTiming")]
        schedule_label: String,
    },
    Passenger,
}

impl Role {
    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Driver { .. } => RoleKind::Driver,
            Role::Passenger => RoleKind::Passenger,
        }
    }

    pub fn vehicle_id(&self) -> Option<&str> {
        match self {
            Role::Driver { vehicle_id, .. } => Some(vehicle_id),
            Role::Passenger => None,
        }
    }
}

/// Role without its payload, as carried in tokens and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Driver,
    Passenger,
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleKind::Driver => f.write_str("driver"),
            RoleKind::Passenger => f.write_str("passenger"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub display_name: String,
    pub contact_number: String,
    pub password_hash: String,
    pub role: Role,
}

impl UserRecord {
    pub fn new(display_name: &str, contact_number: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            contact_number: contact_number.to_string(),
            password_hash,
            role,
        }
    }

    /// The record with credentials stripped, for responses.
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            name: self.display_name.clone(),
            mobile_number: self.contact_number.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub mobile_number: String,
    #[serde(flatten)]
    pub role: Role,
}

/// Criteria for `UserStore::find_many`. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<RoleKind>,
    pub vehicle_id: Option<String>,
    pub contact_number: Option<String>,
}

impl UserFilter {
    pub fn drivers() -> Self {
        Self {
            role: Some(RoleKind::Driver),
            ..Self::default()
        }
    }

    pub fn driver_of(vehicle_id: &str) -> Self {
        Self {
            role: Some(RoleKind::Driver),
            vehicle_id: Some(vehicle_id.to_string()),
            ..Self::default()
        }
    }

    pub fn with_contact(contact_number: &str) -> Self {
        Self {
            contact_number: Some(contact_number.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        if let Some(role) = self.role {
            if user.role.kind() != role {
                return false;
            }
        }
        if let Some(vehicle_id) = &self.vehicle_id {
            if user.role.vehicle_id() != Some(vehicle_id.as_str()) {
                return false;
            }
        }
        if let Some(contact) = &self.contact_number {
            if &user.contact_number != contact {
                return false;
            }
        }
        true
    }
}
