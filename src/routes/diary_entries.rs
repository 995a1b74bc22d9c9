use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::StoreError,
    error::AppError,
    extract::{parse_id, RelationsQuery, ValidJson, ValidQuery},
    models::{
        DiaryEntry, DiaryEntryUpdate, DiaryEntryView, DiaryEntryWithTags, NewDiaryEntry, Tag,
    },
    state::AppState,
    validation::Problems,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:user_id/diary-entries",
            get(list_entries).post(create_entry),
        )
        .route(
            "/diary-entries/:id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/diary-entries/:id/tags", put(replace_tags))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiaryEntryPayload {
    title: Option<String>,
    content: Option<String>,
    entry_date: Option<String>,
    location: Option<String>,
    tag_ids: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagIdsPayload {
    tag_ids: Option<Vec<String>>,
}

fn parse_tag_ids(problems: &mut Problems, raw: &[String]) -> Vec<Uuid> {
    raw.iter()
        .filter_map(|id| problems.uuid("tagIds", Some(id.as_str())))
        .collect()
}

fn unknown_tags(err: StoreError) -> AppError {
    match err {
        StoreError::MissingReference => AppError::not_found("Tag"),
        other => other.into(),
    }
}

async fn list_entries(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ValidQuery(relations): ValidQuery<RelationsQuery>,
) -> Result<Json<Vec<DiaryEntryView>>, AppError> {
    let user_id = parse_id("userId", &user_id)?;
    let entries = state
        .diary_entries
        .list_for_user(&user_id, relations.enabled())
        .await?;
    Ok(Json(entries))
}

/// Creates the entry, then attaches `tagIds` in a second step. Tags are
/// checked against the user before anything is written.
async fn create_entry(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ValidJson(payload): ValidJson<DiaryEntryPayload>,
) -> Result<(StatusCode, Json<DiaryEntryWithTags>), AppError> {
    let user_id = parse_id("userId", &user_id)?;
    let mut problems = Problems::new();
    let title = problems.required_text("title", payload.title);
    let entry_date = problems.date("entryDate", payload.entry_date.as_deref());
    let tag_ids = parse_tag_ids(&mut problems, payload.tag_ids.as_deref().unwrap_or_default());
    problems.finish()?;

    if !state.tags.all_owned_by(&user_id, &tag_ids).await? {
        return Err(AppError::not_found("Tag"));
    }

    let entry = state
        .diary_entries
        .create(&NewDiaryEntry {
            title: title.unwrap_or_default(),
            content: payload.content,
            entry_date,
            location: payload.location,
            user_id,
        })
        .await?;
    info!(entry_id = %entry.id, "diary entry created");

    let tags = if tag_ids.is_empty() {
        Vec::new()
    } else {
        let entry_id = parse_id("id", &entry.id)?;
        state
            .diary_entries
            .set_tags(&entry_id, &tag_ids)
            .await
            .map_err(|err| {
                warn!(entry_id = %entry.id, "diary entry saved without its tags");
                unknown_tags(err)
            })?
    };
    Ok((StatusCode::CREATED, Json(DiaryEntryWithTags { entry, tags })))
}

async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidQuery(relations): ValidQuery<RelationsQuery>,
) -> Result<Json<DiaryEntryView>, AppError> {
    let id = parse_id("id", &id)?;
    state
        .diary_entries
        .get_by_id(&id, relations.enabled())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Diary entry"))
}

async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<DiaryEntryPayload>,
) -> Result<Json<DiaryEntry>, AppError> {
    let id = parse_id("id", &id)?;
    let mut problems = Problems::new();
    let title = problems.non_blank("title", payload.title);
    let entry_date = problems.date("entryDate", payload.entry_date.as_deref());
    problems.finish()?;

    let changes = DiaryEntryUpdate {
        title,
        content: payload.content,
        entry_date,
        location: payload.location,
    };
    state
        .diary_entries
        .update(&id, &changes)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Diary entry"))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id("id", &id)?;
    state.diary_entries.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn replace_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<TagIdsPayload>,
) -> Result<Json<Vec<Tag>>, AppError> {
    let id = parse_id("id", &id)?;
    let mut problems = Problems::new();
    let tag_ids = match payload.tag_ids.as_deref() {
        Some(raw) => parse_tag_ids(&mut problems, raw),
        None => {
            problems.push("tagIds is required");
            Vec::new()
        }
    };
    problems.finish()?;

    if state.diary_entries.get_by_id(&id, false).await?.is_none() {
        return Err(AppError::not_found("Diary entry"));
    }
    let tags = state
        .diary_entries
        .set_tags(&id, &tag_ids)
        .await
        .map_err(unknown_tags)?;
    Ok(Json(tags))
}
