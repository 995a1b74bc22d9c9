use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Trip;

pub const DEFAULT_AMOUNT: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PackingItem {
    pub id: String,
    pub name: String,
    pub amount: i64,
    pub trip_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingItemWithTrip {
    #[serde(flatten)]
    pub item: PackingItem,
    pub trip: Trip,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PackingItemView {
    Bare(PackingItem),
    WithRelations(PackingItemWithTrip),
}

impl PackingItemView {
    pub fn item(&self) -> &PackingItem {
        match self {
            PackingItemView::Bare(item) => item,
            PackingItemView::WithRelations(full) => &full.item,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPackingItem {
    pub name: String,
    pub amount: Option<i64>,
    pub trip_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct PackingItemUpdate {
    pub name: Option<String>,
    pub amount: Option<i64>,
    pub trip_id: Option<Uuid>,
}
