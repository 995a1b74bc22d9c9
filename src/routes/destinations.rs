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
    extract::{parse_id, RelationsQuery, ValidJson, ValidQuery},
    models::{Destination, DestinationUpdate, DestinationView, NewDestination, StringListInput},
    state::AppState,
    validation::Problems,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/destinations", get(list_destinations).post(create_destination))
        .route(
            "/destinations/:id",
            get(get_destination)
                .put(update_destination)
                .delete(delete_destination),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DestinationPayload {
    name: Option<String>,
    description: Option<String>,
    activities: Option<StringListInput>,
    photos: Option<StringListInput>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl DestinationPayload {
    /// Coordinates come as a pair and must be on the globe.
    fn check_coordinates(&self, problems: &mut Problems) {
        match (self.latitude, self.longitude) {
            (Some(_), None) | (None, Some(_)) => {
                problems.push("latitude and longitude must be provided together")
            }
            _ => {}
        }
        if let Some(latitude) = self.latitude {
            if !(-90.0..=90.0).contains(&latitude) {
                problems.push("latitude must be between -90 and 90");
            }
        }
        if let Some(longitude) = self.longitude {
            if !(-180.0..=180.0).contains(&longitude) {
                problems.push("longitude must be between -180 and 180");
            }
        }
    }

    fn into_new(self) -> Result<NewDestination, AppError> {
        let mut problems = Problems::new();
        self.check_coordinates(&mut problems);
        let name = problems.required_text("name", self.name);
        problems.finish()?;

        Ok(NewDestination {
            name: name.unwrap_or_default(),
            description: self.description,
            activities: self.activities,
            photos: self.photos,
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }

    fn into_update(self) -> Result<DestinationUpdate, AppError> {
        let mut problems = Problems::new();
        self.check_coordinates(&mut problems);
        let name = problems.non_blank("name", self.name);
        problems.finish()?;

        Ok(DestinationUpdate {
            name,
            description: self.description,
            activities: self.activities,
            photos: self.photos,
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

async fn list_destinations(
    State(state): State<AppState>,
    ValidQuery(relations): ValidQuery<RelationsQuery>,
) -> Result<Json<Vec<DestinationView>>, AppError> {
    Ok(Json(state.destinations.list_all(relations.enabled()).await?))
}

async fn create_destination(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<DestinationPayload>,
) -> Result<(StatusCode, Json<Destination>), AppError> {
    let data = payload.into_new()?;
    let destination = state.destinations.create(&data).await?;
    info!(destination_id = %destination.id, "destination created");
    Ok((StatusCode::CREATED, Json(destination)))
}

async fn get_destination(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidQuery(relations): ValidQuery<RelationsQuery>,
) -> Result<Json<DestinationView>, AppError> {
    let id = parse_id("id", &id)?;
    state
        .destinations
        .get_by_id(&id, relations.enabled())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Destination"))
}

async fn update_destination(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<DestinationPayload>,
) -> Result<Json<Destination>, AppError> {
    let id = parse_id("id", &id)?;
    let changes = payload.into_update()?;
    state
        .destinations
        .update(&id, &changes)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Destination"))
}

async fn delete_destination(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id("id", &id)?;
    if state.destinations.delete(&id).await? {
        info!(destination_id = %id, "destination deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_must_be_paired_and_in_range() {
        let payload = DestinationPayload {
            name: Some("Reykjavik".into()),
            latitude: Some(95.0),
            ..DestinationPayload::default()
        };
        let Err(AppError::Validation(messages)) = payload.into_new() else {
            panic!("expected validation failure");
        };
        assert_eq!(
            messages,
            vec![
                "latitude and longitude must be provided together",
                "latitude must be between -90 and 90",
            ]
        );
    }

    #[test]
    fn update_may_omit_everything() {
        let changes = DestinationPayload::default().into_update().unwrap();
        assert!(changes.name.is_none());
        assert!(changes.latitude.is_none());
    }
}
