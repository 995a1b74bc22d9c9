use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Tag;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntryWithTags {
    #[serde(flatten)]
    pub entry: DiaryEntry,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DiaryEntryView {
    Bare(DiaryEntry),
    WithRelations(DiaryEntryWithTags),
}

impl DiaryEntryView {
    pub fn entry(&self) -> &DiaryEntry {
        match self {
            DiaryEntryView::Bare(entry) => entry,
            DiaryEntryView::WithRelations(full) => &full.entry,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewDiaryEntry {
    pub title: String,
    pub content: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct DiaryEntryUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub location: Option<String>,
}
