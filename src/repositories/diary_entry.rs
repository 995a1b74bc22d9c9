use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;
use uuid::Uuid;

use super::{
    fetch_where_in, group_by,
    tag::{count_owned_query, distinct_ids},
};
use crate::{
    db::{DbPool, StoreError, StoreResult},
    models::{DiaryEntry, DiaryEntryUpdate, DiaryEntryView, DiaryEntryWithTags, NewDiaryEntry, Tag},
};

pub(crate) const DIARY_COLUMNS: &str =
    "id, title, content, entry_date, location, user_id, created_at, updated_at";

/// Tag row joined with the entry it is attached to.
#[derive(sqlx::FromRow)]
struct EntryTagRow {
    diary_entry_id: String,
    #[sqlx(flatten)]
    tag: Tag,
}

#[derive(Clone)]
pub struct DiaryEntryRepository {
    pool: DbPool,
}

impl DiaryEntryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(
        &self,
        user_id: &Uuid,
        with_relations: bool,
    ) -> StoreResult<Vec<DiaryEntryView>> {
        let entries = sqlx::query_as::<_, DiaryEntry>(&format!(
            "SELECT {DIARY_COLUMNS} FROM diary_entries WHERE user_id = ?1 \
             ORDER BY entry_date DESC, created_at DESC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        self.load_relations(entries, with_relations).await
    }

    pub async fn get_by_id(
        &self,
        id: &Uuid,
        with_relations: bool,
    ) -> StoreResult<Option<DiaryEntryView>> {
        let entry = sqlx::query_as::<_, DiaryEntry>(&format!(
            "SELECT {DIARY_COLUMNS} FROM diary_entries WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        let Some(entry) = entry else {
            return Ok(None);
        };
        let mut views = self.load_relations(vec![entry], with_relations).await?;
        Ok(views.pop())
    }

    pub async fn create(&self, data: &NewDiaryEntry) -> StoreResult<DiaryEntry> {
        let entry = sqlx::query_as::<_, DiaryEntry>(&format!(
            "INSERT INTO diary_entries ({DIARY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) \
             RETURNING {DIARY_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.entry_date)
        .bind(&data.location)
        .bind(data.user_id.to_string())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    pub async fn update(
        &self,
        id: &Uuid,
        changes: &DiaryEntryUpdate,
    ) -> StoreResult<Option<DiaryEntry>> {
        let entry = sqlx::query_as::<_, DiaryEntry>(&format!(
            "UPDATE diary_entries SET \
                title = COALESCE(?1, title), \
                content = COALESCE(?2, content), \
                entry_date = COALESCE(?3, entry_date), \
                location = COALESCE(?4, location), \
                updated_at = ?5 \
             WHERE id = ?6 RETURNING {DIARY_COLUMNS}"
        ))
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(changes.entry_date)
        .bind(&changes.location)
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    pub async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM diary_entries WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replaces the entry's tag set in one transaction.
    ///
    /// Fails with `MissingReference`, leaving the current tags untouched, when
    /// the entry is unknown or any tag is unknown or owned by another user.
    pub async fn set_tags(&self, entry_id: &Uuid, tag_ids: &[Uuid]) -> StoreResult<Vec<Tag>> {
        let entry_id = entry_id.to_string();
        let mut tx = self.pool.begin().await?;

        let owner: Option<String> =
            sqlx::query_scalar("SELECT user_id FROM diary_entries WHERE id = ?1")
                .bind(&entry_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(owner) = owner else {
            return Err(StoreError::MissingReference);
        };

        let ids = distinct_ids(tag_ids);
        if !ids.is_empty() {
            let mut count = count_owned_query(&owner, &ids);
            let owned: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;
            if owned != ids.len() as i64 {
                debug!(%entry_id, requested = ids.len(), owned, "rejecting tags");
                return Err(StoreError::MissingReference);
            }
        }

        sqlx::query("DELETE FROM diary_entry_tags WHERE diary_entry_id = ?1")
            .bind(&entry_id)
            .execute(&mut *tx)
            .await?;
        if !ids.is_empty() {
            let mut insert = QueryBuilder::<Sqlite>::new(
                "INSERT INTO diary_entry_tags (diary_entry_id, tag_id) ",
            );
            insert.push_values(&ids, |mut row, tag_id| {
                row.push_bind(entry_id.clone()).push_bind(tag_id.clone());
            });
            insert.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        self.list_tags_by_key(&entry_id).await
    }

    pub async fn list_tags(&self, entry_id: &Uuid) -> StoreResult<Vec<Tag>> {
        self.list_tags_by_key(&entry_id.to_string()).await
    }

    async fn list_tags_by_key(&self, entry_id: &str) -> StoreResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name, t.user_id, t.created_at, t.updated_at \
             FROM tags t \
             INNER JOIN diary_entry_tags det ON det.tag_id = t.id \
             WHERE det.diary_entry_id = ?1 \
             ORDER BY t.name, t.id",
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    async fn load_relations(
        &self,
        entries: Vec<DiaryEntry>,
        with_relations: bool,
    ) -> StoreResult<Vec<DiaryEntryView>> {
        if !with_relations {
            return Ok(entries.into_iter().map(DiaryEntryView::Bare).collect());
        }

        let entry_ids: Vec<String> = entries.iter().map(|entry| entry.id.clone()).collect();
        let rows: Vec<EntryTagRow> = fetch_where_in(
            &self.pool,
            "SELECT det.diary_entry_id, t.id, t.name, t.user_id, t.created_at, t.updated_at \
             FROM diary_entry_tags det INNER JOIN tags t ON t.id = det.tag_id",
            "det.diary_entry_id",
            &entry_ids,
            "ORDER BY t.name, t.id",
        )
        .await?;
        let mut tags_by_entry = group_by(rows, |row| row.diary_entry_id.as_str());

        Ok(entries
            .into_iter()
            .map(|entry| {
                let tags = tags_by_entry
                    .remove(&entry.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|row| row.tag)
                    .collect();
                DiaryEntryView::WithRelations(DiaryEntryWithTags { entry, tags })
            })
            .collect())
    }
}
