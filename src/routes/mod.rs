pub mod destinations;
pub mod diary_entries;
pub mod fuel_stations;
pub mod health;
pub mod packing_items;
pub mod tags;
pub mod trip_destinations;
pub mod trips;

use axum::{http::StatusCode, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(health::router())
        .merge(trips::router())
        .merge(trip_destinations::router())
        .merge(destinations::router())
        .merge(fuel_stations::router())
        .merge(packing_items::router())
        .merge(tags::router())
        .merge(diary_entries::router());

    Router::new()
        .nest("/api", api)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "errors": ["Route not found"] })),
    )
}
