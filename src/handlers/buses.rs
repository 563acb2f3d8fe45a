use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::{lookup_error, ApiError, ApiResult};
use crate::models::{Coordinates, Role, UserFilter, UserRecord, VehiclePosition};
use crate::services::{AppState, Identity};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    pub driver_name: String,
    pub bus_number: String,
    pub bus_route: String,
    pub bus_timing: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusInfo {
    pub driver_name: String,
    pub driver_mobile: String,
    pub bus_route: String,
    pub bus_timing: String,
    pub bus_number: String,
}

#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub number: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBus {
    pub bus_number: String,
    pub bus_route: String,
    pub bus_timing: String,
    pub driver_name: String,
    pub live: Option<VehiclePosition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveInfoParams {
    pub user_lat: Option<String>,
    pub user_lon: Option<String>,
}

impl LiveInfoParams {
    /// The caller's position. Absent or empty parameters are a missing
    /// location; anything else that is not a number is an invalid origin.
    fn origin(&self) -> ApiResult<Coordinates> {
        let (Some(lat), Some(lon)) = (non_empty(&self.user_lat), non_empty(&self.user_lon)) else {
            return Err(ApiError::BadRequest("User location is required".to_string()));
        };
        match (lat.parse::<f64>(), lon.parse::<f64>()) {
            (Ok(latitude), Ok(longitude)) => Ok(Coordinates::new(latitude, longitude)),
            _ => Err(ApiError::BadRequest(format!(
                "Invalid user location: userLat={}, userLon={}",
                lat, lon
            ))),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextBus {
    pub bus_number: String,
    pub arrival_time: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveInfo {
    pub nearby_bus_count: usize,
    pub next_bus: Option<NextBus>,
}

/// Driver fields of a record, or `None` for passengers.
fn driver_fields(user: &UserRecord) -> Option<(&str, &str, &str)> {
    match &user.role {
        Role::Driver {
            vehicle_id,
            route_label,
            schedule_label,
        } => Some((vehicle_id, route_label, schedule_label)),
        Role::Passenger => None,
    }
}

pub async fn driver_info(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<DriverInfo>> {
    let user = state
        .users
        .find_by_key(identity.user_id)
        .await
        .map_err(lookup_error("Driver not found"))?;
    let (bus_number, bus_route, bus_timing) =
        driver_fields(&user).ok_or_else(|| ApiError::NotFound("Driver not found".to_string()))?;

    Ok(Json(DriverInfo {
        driver_name: user.display_name.clone(),
        bus_number: bus_number.to_string(),
        bus_route: bus_route.to_string(),
        bus_timing: bus_timing.to_string(),
    }))
}

pub async fn bus_info(
    State(state): State<Arc<AppState>>,
    Path(bus_number): Path<String>,
) -> ApiResult<Json<BusInfo>> {
    let bus_number = bus_number.to_uppercase();
    let drivers = state.users.find_many(&UserFilter::driver_of(&bus_number)).await?;
    let driver = drivers
        .first()
        .ok_or_else(|| ApiError::NotFound("Bus not found".to_string()))?;
    let (bus_number, bus_route, bus_timing) =
        driver_fields(driver).ok_or_else(|| ApiError::NotFound("Bus not found".to_string()))?;

    Ok(Json(BusInfo {
        driver_name: driver.display_name.clone(),
        driver_mobile: driver.contact_number.clone(),
        bus_route: bus_route.to_string(),
        bus_timing: bus_timing.to_string(),
        bus_number: bus_number.to_string(),
    }))
}

pub async fn all_routes(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let drivers = state.users.find_many(&UserFilter::drivers()).await?;

    let mut seen = HashSet::new();
    let routes: Vec<RouteSummary> = drivers
        .iter()
        .filter_map(driver_fields)
        .filter(|(_, route, _)| seen.insert(route.to_string()))
        .map(|(_, route, _)| RouteSummary {
            number: route.to_string(),
            name: format!("Route {}", route),
        })
        .collect();

    Ok(Json(serde_json::json!({ "routes": routes })))
}

pub async fn live_info(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LiveInfoParams>,
) -> ApiResult<Json<LiveInfo>> {
    let result = state.tracking.live_info(params.origin()?)?;
    let next_bus = match (result.nearest_vehicle_id, result.eta_minutes) {
        (Some(bus_number), Some(arrival_time)) => Some(NextBus {
            bus_number,
            arrival_time,
        }),
        _ => None,
    };

    Ok(Json(LiveInfo {
        nearby_bus_count: result.nearby_count,
        next_bus,
    }))
}

pub async fn all_active(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let drivers = state.users.find_many(&UserFilter::drivers()).await?;
    let snapshot = state.tracking.snapshot();

    let active_buses: Vec<ActiveBus> = drivers
        .iter()
        .filter_map(|driver| {
            let (bus_number, bus_route, bus_timing) = driver_fields(driver)?;
            Some(ActiveBus {
                bus_number: bus_number.to_string(),
                bus_route: bus_route.to_string(),
                bus_timing: bus_timing.to_string(),
                driver_name: driver.display_name.clone(),
                live: snapshot.get(bus_number).cloned(),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "activeBuses": active_buses })))
}
