use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{lookup_error, ApiResult};
use crate::models::Profile;
use crate::services::{AppState, Identity};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Profile>> {
    let user = state
        .users
        .find_by_key(identity.user_id)
        .await
        .map_err(lookup_error("User not found"))?;
    Ok(Json(user.profile()))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Json<Value>> {
    let mut user = state
        .users
        .find_by_key(identity.user_id)
        .await
        .map_err(lookup_error("User not found"))?;

    if let Some(name) = request.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        user.display_name = name.to_string();
    }
    if let Some(password) = request.password.filter(|p| !p.is_empty()) {
        user.password_hash = state.credentials.clone().hash_password_blocking(password).await?;
    }
    state.users.save(&user).await?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "name": user.display_name,
    })))
}
