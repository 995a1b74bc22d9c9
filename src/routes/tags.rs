use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    extract::{parse_id, ValidJson},
    models::{NewTag, Tag},
    state::AppState,
    validation::Problems,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/:user_id/tags", get(list_tags).post(create_tag))
        .route("/tags/:id", get(get_tag).put(update_tag).delete(delete_tag))
}

#[derive(Debug, Default, Deserialize)]
struct TagPayload {
    name: Option<String>,
}

async fn list_tags(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Tag>>, AppError> {
    let user_id = parse_id("userId", &user_id)?;
    Ok(Json(state.tags.list_for_user(&user_id).await?))
}

async fn create_tag(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ValidJson(payload): ValidJson<TagPayload>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let user_id = parse_id("userId", &user_id)?;
    let mut problems = Problems::new();
    let name = problems.required_text("name", payload.name);
    problems.finish()?;

    let tag = state
        .tags
        .create(&NewTag {
            name: name.unwrap_or_default(),
            user_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Tag>, AppError> {
    let id = parse_id("id", &id)?;
    state
        .tags
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Tag"))
}

async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<TagPayload>,
) -> Result<Json<Tag>, AppError> {
    let id = parse_id("id", &id)?;
    let mut problems = Problems::new();
    let name = problems.non_blank("name", payload.name);
    problems.finish()?;

    state
        .tags
        .update(&id, name.as_deref())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Tag"))
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id("id", &id)?;
    state.tags.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
