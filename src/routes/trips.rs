use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::AppError,
    extract::{flag_enabled, parse_id, RelationsQuery, ValidJson, ValidQuery},
    models::{NewTrip, StringListInput, Trip, TripSearch, TripUpdate, TripView},
    state::AppState,
    validation::Problems,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips).post(create_trip))
        .route("/trips/search", get(search_trips))
        .route("/trips/by-destination/:destination_id", get(trips_by_destination))
        .route(
            "/trips/:id",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TripPayload {
    name: Option<String>,
    description: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    image_url: Option<String>,
    participants: Option<StringListInput>,
}

impl TripPayload {
    fn into_new(self) -> Result<NewTrip, AppError> {
        let mut problems = Problems::new();
        let name = problems.required_text("name", self.name);
        let start_date = problems.date("startDate", self.start_date.as_deref());
        let end_date = problems.date("endDate", self.end_date.as_deref());
        problems.date_range("startDate", start_date, "endDate", end_date);
        problems.finish()?;

        Ok(NewTrip {
            name: name.unwrap_or_default(),
            description: self.description,
            start_date,
            end_date,
            image_url: self.image_url,
            participants: self.participants,
        })
    }

    fn into_update(self) -> Result<TripUpdate, AppError> {
        let mut problems = Problems::new();
        let name = problems.non_blank("name", self.name);
        let start_date = problems.date("startDate", self.start_date.as_deref());
        let end_date = problems.date("endDate", self.end_date.as_deref());
        problems.date_range("startDate", start_date, "endDate", end_date);
        problems.finish()?;

        Ok(TripUpdate {
            name,
            description: self.description,
            start_date,
            end_date,
            image_url: self.image_url,
            participants: self.participants,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    query: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    with_relations: Option<String>,
}

async fn list_trips(
    State(state): State<AppState>,
    ValidQuery(relations): ValidQuery<RelationsQuery>,
) -> Result<Json<Vec<TripView>>, AppError> {
    Ok(Json(state.trips.list_all(relations.enabled()).await?))
}

async fn create_trip(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<TripPayload>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let data = payload.into_new()?;
    let trip = state.trips.create(&data).await?;
    info!(trip_id = %trip.id, "trip created");
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidQuery(relations): ValidQuery<RelationsQuery>,
) -> Result<Json<TripView>, AppError> {
    let id = parse_id("id", &id)?;
    state
        .trips
        .get_by_id(&id, relations.enabled())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Trip"))
}

async fn update_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<TripPayload>,
) -> Result<Json<Trip>, AppError> {
    let id = parse_id("id", &id)?;
    let changes = payload.into_update()?;
    let current = state
        .trips
        .find(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Trip"))?;
    let mut problems = Problems::new();
    problems.date_range(
        "startDate",
        changes.start_date.or(current.start_date),
        "endDate",
        changes.end_date.or(current.end_date),
    );
    problems.finish()?;

    state
        .trips
        .update(&id, &changes)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Trip"))
}

async fn delete_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id("id", &id)?;
    if state.trips.delete(&id).await? {
        info!(trip_id = %id, "trip deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn search_trips(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<Vec<TripView>>, AppError> {
    let mut problems = Problems::new();
    let start_date = problems.date("startDate", params.start_date.as_deref());
    let end_date = problems.date("endDate", params.end_date.as_deref());
    problems.finish()?;

    let filter = TripSearch {
        query: params.query.filter(|query| !query.is_empty()),
        start_date,
        end_date,
    };
    let trips = state
        .trips
        .search(&filter, flag_enabled(params.with_relations.as_deref()))
        .await?;
    Ok(Json(trips))
}

async fn trips_by_destination(
    State(state): State<AppState>,
    Path(destination_id): Path<String>,
    ValidQuery(relations): ValidQuery<RelationsQuery>,
) -> Result<Json<Vec<TripView>>, AppError> {
    let destination_id = parse_id("destinationId", &destination_id)?;
    let trips = state
        .trips
        .list_by_destination(&destination_id, relations.enabled())
        .await?;
    Ok(Json(trips))
}
