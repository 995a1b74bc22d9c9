use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{DbPool, StoreResult},
    models::{Destination, LinkDates, Trip, TripDestination},
};

pub(crate) const LINK_COLUMNS: &str =
    "trip_id, destination_id, start_date, end_date, created_at, updated_at";
pub(crate) const SELECT_LINKS: &str = "SELECT trip_id, destination_id, start_date, end_date, \
     created_at, updated_at FROM trip_to_destination";

/// Manages the trip ↔ destination association rows.
#[derive(Clone)]
pub struct TripDestinationRepository {
    pool: DbPool,
}

impl TripDestinationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Links a trip to a destination.
    ///
    /// Fails with [`StoreError::Conflict`](crate::db::StoreError::Conflict)
    /// when the pair is already linked and with
    /// [`StoreError::MissingReference`](crate::db::StoreError::MissingReference)
    /// when either side does not exist.
    pub async fn add(
        &self,
        trip_id: &Uuid,
        destination_id: &Uuid,
        dates: LinkDates,
    ) -> StoreResult<TripDestination> {
        let link = sqlx::query_as::<_, TripDestination>(&format!(
            "INSERT INTO trip_to_destination ({LINK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             RETURNING {LINK_COLUMNS}"
        ))
        .bind(trip_id.to_string())
        .bind(destination_id.to_string())
        .bind(dates.start_date)
        .bind(dates.end_date)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(link)
    }

    /// Sets only the dates that are present. Returns `None` when the pair is
    /// not linked.
    pub async fn update(
        &self,
        trip_id: &Uuid,
        destination_id: &Uuid,
        dates: LinkDates,
    ) -> StoreResult<Option<TripDestination>> {
        let link = sqlx::query_as::<_, TripDestination>(&format!(
            "UPDATE trip_to_destination SET \
                start_date = COALESCE(?1, start_date), \
                end_date = COALESCE(?2, end_date), \
                updated_at = ?3 \
             WHERE trip_id = ?4 AND destination_id = ?5 RETURNING {LINK_COLUMNS}"
        ))
        .bind(dates.start_date)
        .bind(dates.end_date)
        .bind(Utc::now())
        .bind(trip_id.to_string())
        .bind(destination_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    pub async fn find(
        &self,
        trip_id: &Uuid,
        destination_id: &Uuid,
    ) -> StoreResult<Option<TripDestination>> {
        let link = sqlx::query_as::<_, TripDestination>(&format!(
            "{SELECT_LINKS} WHERE trip_id = ?1 AND destination_id = ?2"
        ))
        .bind(trip_id.to_string())
        .bind(destination_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    pub async fn remove(&self, trip_id: &Uuid, destination_id: &Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM trip_to_destination WHERE trip_id = ?1 AND destination_id = ?2",
        )
        .bind(trip_id.to_string())
        .bind(destination_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_trips_for_destination(
        &self,
        destination_id: &Uuid,
    ) -> StoreResult<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            "SELECT t.id, t.name, t.description, t.start_date, t.end_date, t.image_url, \
                    t.participants, t.created_at, t.updated_at \
             FROM trips t \
             INNER JOIN trip_to_destination ttd ON ttd.trip_id = t.id \
             WHERE ttd.destination_id = ?1 \
             ORDER BY ttd.start_date, t.created_at",
        )
        .bind(destination_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(trips)
    }

    pub async fn list_destinations_for_trip(
        &self,
        trip_id: &Uuid,
    ) -> StoreResult<Vec<Destination>> {
        let destinations = sqlx::query_as::<_, Destination>(
            "SELECT d.id, d.name, d.description, d.activities, d.photos, d.latitude, \
                    d.longitude, d.created_at, d.updated_at \
             FROM destinations d \
             INNER JOIN trip_to_destination ttd ON ttd.destination_id = d.id \
             WHERE ttd.trip_id = ?1 \
             ORDER BY ttd.start_date, d.created_at",
        )
        .bind(trip_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(destinations)
    }
}
