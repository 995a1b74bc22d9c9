//! Links between trips and destinations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::StoreError,
    error::AppError,
    extract::{parse_id, parse_id_pair, ValidJson},
    models::{Destination, LinkDates, Trip, TripDestination},
    state::AppState,
    validation::Problems,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips/:id/destinations", get(destinations_for_trip))
        .route(
            "/trips/:id/destinations/:destination_id",
            post(add_destination)
                .put(update_destination_dates)
                .delete(remove_destination),
        )
        .route("/destinations/:id/trips", get(trips_for_destination))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkPayload {
    start_date: Option<String>,
    end_date: Option<String>,
}

impl LinkPayload {
    fn into_dates(self) -> Result<LinkDates, AppError> {
        let mut problems = Problems::new();
        let start_date = problems.date("startDate", self.start_date.as_deref());
        let end_date = problems.date("endDate", self.end_date.as_deref());
        problems.date_range("startDate", start_date, "endDate", end_date);
        problems.finish()?;
        Ok(LinkDates {
            start_date,
            end_date,
        })
    }
}

fn link_ids(trip_id: &str, destination_id: &str) -> Result<(Uuid, Uuid), AppError> {
    parse_id_pair(("tripId", trip_id), ("destinationId", destination_id))
}

async fn ensure_both_exist(
    state: &AppState,
    trip_id: &Uuid,
    destination_id: &Uuid,
) -> Result<(), AppError> {
    if !state.trips.exists(trip_id).await? {
        return Err(AppError::not_found("Trip"));
    }
    if !state.destinations.exists(destination_id).await? {
        return Err(AppError::not_found("Destination"));
    }
    Ok(())
}

async fn destinations_for_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<Vec<Destination>>, AppError> {
    let trip_id = parse_id("tripId", &trip_id)?;
    if !state.trips.exists(&trip_id).await? {
        return Err(AppError::not_found("Trip"));
    }
    let destinations = state
        .trip_destinations
        .list_destinations_for_trip(&trip_id)
        .await?;
    Ok(Json(destinations))
}

async fn trips_for_destination(
    State(state): State<AppState>,
    Path(destination_id): Path<String>,
) -> Result<Json<Vec<Trip>>, AppError> {
    let destination_id = parse_id("id", &destination_id)?;
    if !state.destinations.exists(&destination_id).await? {
        return Err(AppError::not_found("Destination"));
    }
    let trips = state
        .trip_destinations
        .list_trips_for_destination(&destination_id)
        .await?;
    Ok(Json(trips))
}

async fn add_destination(
    State(state): State<AppState>,
    Path((trip_id, destination_id)): Path<(String, String)>,
    ValidJson(payload): ValidJson<LinkPayload>,
) -> Result<(StatusCode, Json<TripDestination>), AppError> {
    let (trip_id, destination_id) = link_ids(&trip_id, &destination_id)?;
    let dates = payload.into_dates()?;
    ensure_both_exist(&state, &trip_id, &destination_id).await?;

    let link = state
        .trip_destinations
        .add(&trip_id, &destination_id, dates)
        .await
        .map_err(|err| match err {
            StoreError::Conflict => {
                AppError::Conflict("Destination is already part of this trip".into())
            }
            StoreError::MissingReference => AppError::not_found("Trip or destination"),
            other => other.into(),
        })?;
    info!(%trip_id, %destination_id, "destination added to trip");
    Ok((StatusCode::CREATED, Json(link)))
}

async fn update_destination_dates(
    State(state): State<AppState>,
    Path((trip_id, destination_id)): Path<(String, String)>,
    ValidJson(payload): ValidJson<LinkPayload>,
) -> Result<Json<TripDestination>, AppError> {
    let (trip_id, destination_id) = link_ids(&trip_id, &destination_id)?;
    let dates = payload.into_dates()?;
    ensure_both_exist(&state, &trip_id, &destination_id).await?;
    let current = state
        .trip_destinations
        .find(&trip_id, &destination_id)
        .await?
        .ok_or_else(|| AppError::not_found("Destination link"))?;
    let mut problems = Problems::new();
    problems.date_range(
        "startDate",
        dates.start_date.or(current.start_date),
        "endDate",
        dates.end_date.or(current.end_date),
    );
    problems.finish()?;

    state
        .trip_destinations
        .update(&trip_id, &destination_id, dates)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Destination link"))
}

async fn remove_destination(
    State(state): State<AppState>,
    Path((trip_id, destination_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let (trip_id, destination_id) = link_ids(&trip_id, &destination_id)?;
    if state
        .trip_destinations
        .remove(&trip_id, &destination_id)
        .await?
    {
        info!(%trip_id, %destination_id, "destination removed from trip");
    }
    Ok(StatusCode::NO_CONTENT)
}
