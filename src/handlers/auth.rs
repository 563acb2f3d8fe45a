use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{ApiError, ApiResult};
use crate::error::TrackerError;
use crate::logger::sanitize_for_log;
use crate::models::{Role, RoleKind, UserFilter, UserRecord};
use crate::services::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: RoleKind,
    pub bus_number: Option<String>,
    pub bus_route: Option<String>,
    pub bus_timing: Option<String>,
}

fn default_role() -> RoleKind {
    RoleKind::Passenger
}

impl RegisterRequest {
    /// Build the role, requiring every bus field for drivers and ignoring
    /// them for passengers.
    fn role(&self) -> ApiResult<Role> {
        match self.role {
            RoleKind::Passenger => Ok(Role::Passenger),
            RoleKind::Driver => {
                let field = |value: &Option<String>, name: &str| {
                    value
                        .as_deref()
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                        .ok_or_else(|| ApiError::BadRequest(format!("{} is required for drivers", name)))
                };
                Ok(Role::Driver {
                    vehicle_id: field(&self.bus_number, "busNumber")?.to_uppercase(),
                    route_label: field(&self.bus_route, "busRoute")?,
                    schedule_label: field(&self.bus_timing, "busTiming")?,
                })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub mobile_number: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: RoleKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_route: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let name = request.name.trim();
    let mobile_number = request.mobile_number.trim();
    if name.is_empty() || mobile_number.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    }
    let role = request.role()?;

    let existing = state
        .users
        .find_many(&UserFilter::with_contact(mobile_number))
        .await?;
    if !existing.is_empty() {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let password_hash = state
        .credentials
        .clone()
        .hash_password_blocking(request.password.clone())
        .await?;
    let user = UserRecord::new(name, mobile_number, password_hash, role);
    state.users.save(&user).await?;

    tracing::info!(
        user_id = %user.id,
        mobile = %sanitize_for_log(&user.contact_number),
        role = %user.role.kind(),
        "User registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let invalid = || ApiError::BadRequest("Invalid credentials".to_string());
    let mobile_number = request.mobile_number.trim();

    let user = state
        .users
        .find_many(&UserFilter::with_contact(mobile_number))
        .await?
        .into_iter()
        .next()
        .ok_or_else(invalid)?;

    let verified = state
        .credentials
        .clone()
        .verify_password_blocking(request.password, user.password_hash.clone())
        .await;
    match verified {
        Ok(()) => {}
        Err(TrackerError::InvalidCredentials) => {
            tracing::warn!(mobile = %sanitize_for_log(mobile_number), "Login failed");
            return Err(invalid());
        }
        Err(e) => return Err(e.into()),
    }

    let token = state.credentials.issue_token(user.id, user.role.kind())?;
    tracing::info!(user_id = %user.id, "Login succeeded");

    let (bus_number, bus_route) = match &user.role {
        Role::Driver {
            vehicle_id,
            route_label,
            ..
        } => (Some(vehicle_id.clone()), Some(route_label.clone())),
        Role::Passenger => (None, None),
    };

    Ok(Json(LoginResponse {
        token,
        role: user.role.kind(),
        name: user.display_name,
        bus_number,
        bus_route,
    }))
}
