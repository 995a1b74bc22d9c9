use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Destination, Trip};

/// Association row: one trip staying at one destination for its own window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TripDestination {
    pub trip_id: String,
    pub destination_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Association seen from the trip side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationLink {
    #[serde(flatten)]
    pub link: TripDestination,
    pub destination: Destination,
}

/// Association seen from the destination side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripLink {
    #[serde(flatten)]
    pub link: TripDestination,
    pub trip: Trip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkDates {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
