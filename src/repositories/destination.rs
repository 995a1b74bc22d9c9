use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{
    fetch_where_in, group_by, trip::SELECT_TRIPS, trip_destination::SELECT_LINKS, unique_ids,
};
use crate::{
    db::{DbPool, StoreResult},
    models::{
        string_list, Destination, DestinationUpdate, DestinationView, DestinationWithTrips,
        NewDestination, Trip, TripDestination, TripLink,
    },
};

pub(crate) const DESTINATION_COLUMNS: &str =
    "id, name, description, activities, photos, latitude, longitude, created_at, updated_at";
pub(crate) const SELECT_DESTINATIONS: &str = "SELECT id, name, description, activities, photos, \
     latitude, longitude, created_at, updated_at FROM destinations";

#[derive(Clone)]
pub struct DestinationRepository {
    pool: DbPool,
}

impl DestinationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self, with_relations: bool) -> StoreResult<Vec<DestinationView>> {
        let destinations = sqlx::query_as::<_, Destination>(&format!(
            "{SELECT_DESTINATIONS} ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.load_relations(destinations, with_relations).await
    }

    pub async fn get_by_id(
        &self,
        id: &Uuid,
        with_relations: bool,
    ) -> StoreResult<Option<DestinationView>> {
        let Some(destination) = self.find(id).await? else {
            return Ok(None);
        };
        let mut views = self.load_relations(vec![destination], with_relations).await?;
        Ok(views.pop())
    }

    pub async fn find(&self, id: &Uuid) -> StoreResult<Option<Destination>> {
        let destination =
            sqlx::query_as::<_, Destination>(&format!("{SELECT_DESTINATIONS} WHERE id = ?1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(destination)
    }

    pub async fn exists(&self, id: &Uuid) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM destinations WHERE id = ?1)")
                .bind(id.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Stored coordinates as `(latitude, longitude)`. The outer `Option` is the
    /// destination itself, the inner one its coordinates.
    pub async fn coordinates(&self, id: &Uuid) -> StoreResult<Option<Option<(f64, f64)>>> {
        let row: Option<(Option<f64>, Option<f64>)> =
            sqlx::query_as("SELECT latitude, longitude FROM destinations WHERE id = ?1")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(latitude, longitude)| latitude.zip(longitude)))
    }

    pub async fn create(&self, data: &NewDestination) -> StoreResult<Destination> {
        let now = Utc::now();
        let destination = sqlx::query_as::<_, Destination>(&format!(
            "INSERT INTO destinations ({DESTINATION_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8) RETURNING {DESTINATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&data.name)
        .bind(&data.description)
        .bind(string_list::normalize(data.activities.as_ref()))
        .bind(string_list::normalize(data.photos.as_ref()))
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(destination)
    }

    pub async fn update(
        &self,
        id: &Uuid,
        changes: &DestinationUpdate,
    ) -> StoreResult<Option<Destination>> {
        let destination = sqlx::query_as::<_, Destination>(&format!(
            "UPDATE destinations SET \
                name = COALESCE(?1, name), \
                description = COALESCE(?2, description), \
                activities = COALESCE(?3, activities), \
                photos = COALESCE(?4, photos), \
                latitude = COALESCE(?5, latitude), \
                longitude = COALESCE(?6, longitude), \
                updated_at = ?7 \
             WHERE id = ?8 RETURNING {DESTINATION_COLUMNS}"
        ))
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(string_list::normalize(changes.activities.as_ref()))
        .bind(string_list::normalize(changes.photos.as_ref()))
        .bind(changes.latitude)
        .bind(changes.longitude)
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(destination)
    }

    pub async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM destinations WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_relations(
        &self,
        destinations: Vec<Destination>,
        with_relations: bool,
    ) -> StoreResult<Vec<DestinationView>> {
        if !with_relations {
            return Ok(destinations.into_iter().map(DestinationView::Bare).collect());
        }

        let destination_ids: Vec<String> =
            destinations.iter().map(|destination| destination.id.clone()).collect();
        let links: Vec<TripDestination> = fetch_where_in(
            &self.pool,
            SELECT_LINKS,
            "destination_id",
            &destination_ids,
            "ORDER BY start_date, created_at",
        )
        .await?;
        let trip_ids = unique_ids(links.iter().map(|link| link.trip_id.as_str()));
        let trips: HashMap<String, Trip> =
            fetch_where_in::<Trip>(&self.pool, SELECT_TRIPS, "id", &trip_ids, "")
                .await?
                .into_iter()
                .map(|trip| (trip.id.clone(), trip))
                .collect();

        let mut links_by_destination = group_by(links, |link| link.destination_id.as_str());

        Ok(destinations
            .into_iter()
            .map(|destination| {
                let trip_to_destinations = links_by_destination
                    .remove(&destination.id)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|link| {
                        let trip = trips.get(&link.trip_id)?.clone();
                        Some(TripLink { link, trip })
                    })
                    .collect();
                DestinationView::WithRelations(DestinationWithTrips {
                    destination,
                    trip_to_destinations,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinkDates, NewTrip, StringListInput};
    use crate::repositories::{test_support::pool, TripDestinationRepository, TripRepository};

    fn parse(id: &str) -> Uuid {
        Uuid::parse_str(id).unwrap()
    }

    fn lisbon() -> NewDestination {
        NewDestination {
            name: "Lisbon".into(),
            description: Some("Hills and trams".into()),
            activities: Some(StringListInput::List(vec!["surfing".into(), "fado".into()])),
            photos: Some(StringListInput::Encoded(r#"["https://img.example/1.jpg"]"#.into())),
            latitude: Some(38.7223),
            longitude: Some(-9.1393),
        }
    }

    #[tokio::test]
    async fn create_normalizes_both_list_fields() {
        let repo = DestinationRepository::new(pool().await);
        let created = repo.create(&lisbon()).await.unwrap();

        assert_eq!(created.activities.as_deref(), Some(r#"["surfing","fado"]"#));
        assert_eq!(created.photos.as_deref(), Some(r#"["https://img.example/1.jpg"]"#));
        assert_eq!(created.coordinates(), Some((38.7223, -9.1393)));
    }

    #[tokio::test]
    async fn invalid_list_string_is_stored_verbatim() {
        let repo = DestinationRepository::new(pool().await);
        let created = repo
            .create(&NewDestination {
                activities: Some(StringListInput::Encoded("surfing, fado".into())),
                ..lisbon()
            })
            .await
            .unwrap();
        assert_eq!(created.activities.as_deref(), Some("surfing, fado"));
    }

    #[tokio::test]
    async fn update_keeps_unspecified_fields() {
        let repo = DestinationRepository::new(pool().await);
        let created = repo.create(&lisbon()).await.unwrap();
        let id = parse(&created.id);

        let updated = repo
            .update(
                &id,
                &DestinationUpdate {
                    photos: Some(StringListInput::List(vec![])),
                    ..DestinationUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.photos.as_deref(), Some("[]"));
        assert_eq!(updated.activities, created.activities);
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.coordinates(), created.coordinates());
    }

    #[tokio::test]
    async fn coordinates_distinguish_missing_destination_from_missing_coords() {
        let repo = DestinationRepository::new(pool().await);
        let located = repo.create(&lisbon()).await.unwrap();
        let unlocated = repo
            .create(&NewDestination {
                name: "Somewhere".into(),
                ..NewDestination::default()
            })
            .await
            .unwrap();

        assert_eq!(
            repo.coordinates(&parse(&located.id)).await.unwrap(),
            Some(Some((38.7223, -9.1393)))
        );
        assert_eq!(repo.coordinates(&parse(&unlocated.id)).await.unwrap(), Some(None));
        assert_eq!(repo.coordinates(&Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_links_but_not_trips() {
        let pool = pool().await;
        let destinations = DestinationRepository::new(pool.clone());
        let trips = TripRepository::new(pool.clone());
        let links = TripDestinationRepository::new(pool.clone());

        let destination = destinations.create(&lisbon()).await.unwrap();
        let destination_id = parse(&destination.id);
        let trip = trips
            .create(&NewTrip {
                name: "Portugal".into(),
                ..NewTrip::default()
            })
            .await
            .unwrap();
        let trip_id = parse(&trip.id);
        links.add(&trip_id, &destination_id, LinkDates::default()).await.unwrap();

        assert!(destinations.delete(&destination_id).await.unwrap());
        assert!(!destinations.delete(&destination_id).await.unwrap());
        assert!(links.list_destinations_for_trip(&trip_id).await.unwrap().is_empty());
        assert!(trips.exists(&trip_id).await.unwrap());
    }

    #[tokio::test]
    async fn with_relations_nests_trips() {
        let pool = pool().await;
        let destinations = DestinationRepository::new(pool.clone());
        let trips = TripRepository::new(pool.clone());
        let links = TripDestinationRepository::new(pool.clone());

        let destination = destinations.create(&lisbon()).await.unwrap();
        let destination_id = parse(&destination.id);
        let trip = trips
            .create(&NewTrip {
                name: "Portugal".into(),
                ..NewTrip::default()
            })
            .await
            .unwrap();
        links
            .add(&parse(&trip.id), &destination_id, LinkDates::default())
            .await
            .unwrap();

        let view = destinations.get_by_id(&destination_id, true).await.unwrap().unwrap();
        let DestinationView::WithRelations(full) = view else {
            panic!("expected relations");
        };
        assert_eq!(full.trip_to_destinations.len(), 1);
        assert_eq!(full.trip_to_destinations[0].trip.name, "Portugal");
    }
}
