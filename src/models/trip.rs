use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{string_list::StringListInput, DestinationLink, PackingItem};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    /// Serialized JSON list of participant names.
    pub participants: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripWithRelations {
    #[serde(flatten)]
    pub trip: Trip,
    pub trip_to_destinations: Vec<DestinationLink>,
    pub packing_items: Vec<PackingItem>,
}

/// A trip as returned to callers, with or without its relations loaded.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TripView {
    Bare(Trip),
    WithRelations(TripWithRelations),
}

impl TripView {
    pub fn trip(&self) -> &Trip {
        match self {
            TripView::Bare(trip) => trip,
            TripView::WithRelations(full) => &full.trip,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTrip {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub participants: Option<StringListInput>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct TripUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub participants: Option<StringListInput>,
}

/// Filters for trip search. All present conditions must hold.
#[derive(Debug, Clone, Default)]
pub struct TripSearch {
    /// Case-sensitive substring of the trip name; empty matches everything.
    pub query: Option<String>,
    /// Trips starting on or after this date.
    pub start_date: Option<NaiveDate>,
    /// Trips ending on or before this date.
    pub end_date: Option<NaiveDate>,
}
