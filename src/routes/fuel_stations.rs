use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    extract::{parse_id, ValidQuery},
    services::fuel_stations::{
        FuelStation, FuelStationQuery, DEFAULT_RADIUS_METERS, MAX_RADIUS_METERS, MIN_RADIUS_METERS,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/destinations/:id/fuel-stations", get(fuel_stations_near))
}

#[derive(Debug, Default, Deserialize)]
struct RadiusParams {
    radius: Option<String>,
}

fn parse_radius(raw: Option<&str>) -> Result<u32, AppError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_RADIUS_METERS);
    };
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|radius| (MIN_RADIUS_METERS..=MAX_RADIUS_METERS).contains(radius))
        .ok_or_else(|| {
            AppError::invalid(format!(
                "radius must be an integer between {MIN_RADIUS_METERS} and {MAX_RADIUS_METERS}"
            ))
        })
}

async fn fuel_stations_near(
    State(state): State<AppState>,
    Path(destination_id): Path<String>,
    ValidQuery(params): ValidQuery<RadiusParams>,
) -> Result<Json<Vec<FuelStation>>, AppError> {
    let destination_id = parse_id("destinationId", &destination_id)?;
    let radius_meters = parse_radius(params.radius.as_deref())?;

    let (latitude, longitude) = state
        .destinations
        .coordinates(&destination_id)
        .await?
        .ok_or_else(|| AppError::not_found("Destination"))?
        .ok_or_else(|| AppError::invalid("Destination has no coordinates"))?;

    let query = FuelStationQuery {
        latitude,
        longitude,
        radius_meters,
    };
    let stations = state
        .places
        .fuel_stations(&query)
        .await
        .map_err(|err| AppError::Upstream(err.to_string()))?;
    Ok(Json(stations))
}
