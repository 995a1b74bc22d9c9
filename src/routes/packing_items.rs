use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    extract::{parse_id, RelationsQuery, ValidJson, ValidQuery},
    models::{NewPackingItem, PackingItem, PackingItemUpdate, PackingItemView},
    state::AppState,
    validation::Problems,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/packing-items", get(list_items).post(create_item))
        .route(
            "/packing-items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route(
            "/trips/:id/packing-items",
            get(items_for_trip).delete(clear_trip_items),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackingItemPayload {
    name: Option<String>,
    amount: Option<i64>,
    trip_id: Option<String>,
}

fn check_amount(problems: &mut Problems, amount: Option<i64>) {
    if amount.is_some_and(|amount| amount < 1) {
        problems.push("amount must be a positive integer");
    }
}

impl PackingItemPayload {
    fn into_new(self) -> Result<NewPackingItem, AppError> {
        let mut problems = Problems::new();
        let name = problems.required_text("name", self.name);
        check_amount(&mut problems, self.amount);
        let trip_id = match self.trip_id.as_deref() {
            Some(raw) => problems.uuid("tripId", Some(raw)),
            None => {
                problems.push("tripId is required");
                None
            }
        };
        problems.finish()?;

        Ok(NewPackingItem {
            name: name.unwrap_or_default(),
            amount: self.amount,
            trip_id: trip_id.unwrap_or_default(),
        })
    }

    fn into_update(self) -> Result<PackingItemUpdate, AppError> {
        let mut problems = Problems::new();
        let name = problems.non_blank("name", self.name);
        check_amount(&mut problems, self.amount);
        let trip_id = problems.uuid("tripId", self.trip_id.as_deref());
        problems.finish()?;

        Ok(PackingItemUpdate {
            name,
            amount: self.amount,
            trip_id,
        })
    }
}

async fn ensure_trip(state: &AppState, trip_id: &Uuid) -> Result<(), AppError> {
    if state.trips.exists(trip_id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Trip"))
    }
}

async fn list_items(
    State(state): State<AppState>,
    ValidQuery(relations): ValidQuery<RelationsQuery>,
) -> Result<Json<Vec<PackingItemView>>, AppError> {
    Ok(Json(state.packing_items.list_all(relations.enabled()).await?))
}

async fn create_item(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<PackingItemPayload>,
) -> Result<(StatusCode, Json<PackingItem>), AppError> {
    let data = payload.into_new()?;
    ensure_trip(&state, &data.trip_id).await?;
    let item = state.packing_items.create(&data).await?;
    info!(item_id = %item.id, trip_id = %item.trip_id, "packing item created");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidQuery(relations): ValidQuery<RelationsQuery>,
) -> Result<Json<PackingItemView>, AppError> {
    let id = parse_id("id", &id)?;
    state
        .packing_items
        .get_by_id(&id, relations.enabled())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Packing item"))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<PackingItemPayload>,
) -> Result<Json<PackingItem>, AppError> {
    let id = parse_id("id", &id)?;
    let changes = payload.into_update()?;
    if let Some(trip_id) = &changes.trip_id {
        ensure_trip(&state, trip_id).await?;
    }
    state
        .packing_items
        .update(&id, &changes)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Packing item"))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id("id", &id)?;
    state.packing_items.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn items_for_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    ValidQuery(relations): ValidQuery<RelationsQuery>,
) -> Result<Json<Vec<PackingItemView>>, AppError> {
    let trip_id = parse_id("tripId", &trip_id)?;
    ensure_trip(&state, &trip_id).await?;
    let items = state
        .packing_items
        .list_by_trip(&trip_id, relations.enabled())
        .await?;
    Ok(Json(items))
}

async fn clear_trip_items(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let trip_id = parse_id("tripId", &trip_id)?;
    ensure_trip(&state, &trip_id).await?;
    let removed = state.packing_items.delete_all_for_trip(&trip_id).await?;
    info!(%trip_id, removed, "packing list cleared");
    Ok(StatusCode::NO_CONTENT)
}
