use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{string_list::StringListInput, TripLink};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Serialized JSON list of activity labels.
    pub activities: Option<String>,
    /// Serialized JSON list of photo URLs.
    pub photos: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Destination {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationWithTrips {
    #[serde(flatten)]
    pub destination: Destination,
    pub trip_to_destinations: Vec<TripLink>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DestinationView {
    Bare(Destination),
    WithRelations(DestinationWithTrips),
}

impl DestinationView {
    pub fn destination(&self) -> &Destination {
        match self {
            DestinationView::Bare(destination) => destination,
            DestinationView::WithRelations(full) => &full.destination,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewDestination {
    pub name: String,
    pub description: Option<String>,
    pub activities: Option<StringListInput>,
    pub photos: Option<StringListInput>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct DestinationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub activities: Option<StringListInput>,
    pub photos: Option<StringListInput>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
