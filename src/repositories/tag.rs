use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use super::unique_ids;
use crate::{
    db::{DbPool, StoreResult},
    models::{NewTag, Tag},
};

pub(crate) const TAG_COLUMNS: &str = "id, name, user_id, created_at, updated_at";

#[derive(Clone)]
pub struct TagRepository {
    pool: DbPool,
}

impl TagRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: &Uuid) -> StoreResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE user_id = ?1 ORDER BY name, id"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    pub async fn get_by_id(&self, id: &Uuid) -> StoreResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(&format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    pub async fn create(&self, data: &NewTag) -> StoreResult<Tag> {
        let tag = sqlx::query_as::<_, Tag>(&format!(
            "INSERT INTO tags ({TAG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?4) RETURNING {TAG_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&data.name)
        .bind(data.user_id.to_string())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(tag)
    }

    pub async fn update(&self, id: &Uuid, name: Option<&str>) -> StoreResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(&format!(
            "UPDATE tags SET name = COALESCE(?1, name), updated_at = ?2 WHERE id = ?3 \
             RETURNING {TAG_COLUMNS}"
        ))
        .bind(name)
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(tag)
    }

    /// True when every id names a tag owned by `user_id`. Duplicates count
    /// once.
    pub async fn all_owned_by(&self, user_id: &Uuid, tag_ids: &[Uuid]) -> StoreResult<bool> {
        let ids = distinct_ids(tag_ids);
        if ids.is_empty() {
            return Ok(true);
        }
        let mut query = count_owned_query(&user_id.to_string(), &ids);
        let owned: i64 = query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(owned == ids.len() as i64)
    }

    pub async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub(crate) fn distinct_ids(tag_ids: &[Uuid]) -> Vec<String> {
    let ids: Vec<String> = tag_ids.iter().map(Uuid::to_string).collect();
    unique_ids(ids.iter().map(String::as_str))
}

/// `SELECT COUNT(*)` of the given tags that belong to `user_id`.
pub(crate) fn count_owned_query(user_id: &str, ids: &[String]) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tags WHERE user_id = ");
    builder.push_bind(user_id.to_string()).push(" AND id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");
    builder
}
