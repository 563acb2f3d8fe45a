use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::{request_logging, require_auth};
use crate::services::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/buses/driver-info", get(handlers::buses::driver_info))
        .route(
            "/api/profile",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Auth
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        // Buses
        .route("/api/buses/info/:bus_number", get(handlers::buses::bus_info))
        .route("/api/buses/all-routes", get(handlers::buses::all_routes))
        .route("/api/buses/live-info", get(handlers::buses::live_info))
        .route("/api/buses/all-active", get(handlers::buses::all_active))
        // Live feed
        .route("/ws", get(handlers::socket::ws_handler))
        // Health
        .route("/health", get(handlers::health::health_check))
        .merge(protected)
        .with_state(state)
        .layer(from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
