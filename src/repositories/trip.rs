use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use super::{
    destination::SELECT_DESTINATIONS, fetch_where_in, group_by,
    packing_item::SELECT_PACKING_ITEMS, trip_destination::SELECT_LINKS, unique_ids,
};
use crate::{
    db::{DbPool, StoreResult},
    models::{
        string_list, Destination, DestinationLink, NewTrip, PackingItem, Trip, TripDestination,
        TripSearch, TripUpdate, TripView, TripWithRelations,
    },
};

pub(crate) const TRIP_COLUMNS: &str =
    "id, name, description, start_date, end_date, image_url, participants, created_at, updated_at";
pub(crate) const SELECT_TRIPS: &str = "SELECT id, name, description, start_date, end_date, \
     image_url, participants, created_at, updated_at FROM trips";

#[derive(Clone)]
pub struct TripRepository {
    pool: DbPool,
}

impl TripRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self, with_relations: bool) -> StoreResult<Vec<TripView>> {
        let trips = sqlx::query_as::<_, Trip>(&format!("{SELECT_TRIPS} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await?;
        self.load_relations(trips, with_relations).await
    }

    pub async fn get_by_id(
        &self,
        id: &Uuid,
        with_relations: bool,
    ) -> StoreResult<Option<TripView>> {
        let Some(trip) = self.find(id).await? else {
            return Ok(None);
        };
        let mut views = self.load_relations(vec![trip], with_relations).await?;
        Ok(views.pop())
    }

    pub async fn find(&self, id: &Uuid) -> StoreResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>(&format!("{SELECT_TRIPS} WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(trip)
    }

    pub async fn exists(&self, id: &Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM trips WHERE id = ?1)")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn create(&self, data: &NewTrip) -> StoreResult<Trip> {
        let now = Utc::now();
        let trip = sqlx::query_as::<_, Trip>(&format!(
            "INSERT INTO trips ({TRIP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8) \
             RETURNING {TRIP_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(&data.image_url)
        .bind(string_list::normalize(data.participants.as_ref()))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(trip)
    }

    /// Applies only the supplied fields. Returns `None` when the trip does not
    /// exist.
    pub async fn update(&self, id: &Uuid, changes: &TripUpdate) -> StoreResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>(&format!(
            "UPDATE trips SET \
                name = COALESCE(?1, name), \
                description = COALESCE(?2, description), \
                start_date = COALESCE(?3, start_date), \
                end_date = COALESCE(?4, end_date), \
                image_url = COALESCE(?5, image_url), \
                participants = COALESCE(?6, participants), \
                updated_at = ?7 \
             WHERE id = ?8 RETURNING {TRIP_COLUMNS}"
        ))
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(&changes.image_url)
        .bind(string_list::normalize(changes.participants.as_ref()))
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(trip)
    }

    /// Removes the trip together with its packing items and destination
    /// links. Returns whether a row was deleted; a missing id is not an error.
    pub async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM trips WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn search(
        &self,
        filter: &TripSearch,
        with_relations: bool,
    ) -> StoreResult<Vec<TripView>> {
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_TRIPS);
        builder.push(" WHERE 1 = 1");
        if let Some(query) = filter.query.as_deref().filter(|query| !query.is_empty()) {
            builder
                .push(" AND instr(name, ")
                .push_bind(query.to_string())
                .push(") > 0");
        }
        if let Some(start) = filter.start_date {
            builder.push(" AND start_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            builder.push(" AND end_date <= ").push_bind(end);
        }
        builder.push(" ORDER BY start_date, created_at, id");

        let trips = builder.build_query_as::<Trip>().fetch_all(&self.pool).await?;
        self.load_relations(trips, with_relations).await
    }

    /// Trips linked to the destination. The link rows only filter; they are
    /// returned as relations only when `with_relations` is set.
    pub async fn list_by_destination(
        &self,
        destination_id: &Uuid,
        with_relations: bool,
    ) -> StoreResult<Vec<TripView>> {
        let trips = sqlx::query_as::<_, Trip>(
            "SELECT t.id, t.name, t.description, t.start_date, t.end_date, t.image_url, \
                    t.participants, t.created_at, t.updated_at \
             FROM trips t \
             INNER JOIN trip_to_destination ttd ON ttd.trip_id = t.id \
             WHERE ttd.destination_id = ?1 \
             ORDER BY t.start_date, t.created_at, t.id",
        )
        .bind(destination_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        self.load_relations(trips, with_relations).await
    }

    /// Loads destination links (with their destination) and packing items for
    /// the whole batch, one query per relation.
    async fn load_relations(
        &self,
        trips: Vec<Trip>,
        with_relations: bool,
    ) -> StoreResult<Vec<TripView>> {
        if !with_relations {
            return Ok(trips.into_iter().map(TripView::Bare).collect());
        }

        let trip_ids: Vec<String> = trips.iter().map(|trip| trip.id.clone()).collect();
        let links: Vec<TripDestination> = fetch_where_in(
            &self.pool,
            SELECT_LINKS,
            "trip_id",
            &trip_ids,
            "ORDER BY start_date, created_at",
        )
        .await?;
        let destination_ids = unique_ids(links.iter().map(|link| link.destination_id.as_str()));
        let destinations: HashMap<String, Destination> = fetch_where_in::<Destination>(
            &self.pool,
            SELECT_DESTINATIONS,
            "id",
            &destination_ids,
            "",
        )
        .await?
        .into_iter()
        .map(|destination| (destination.id.clone(), destination))
        .collect();
        let items: Vec<PackingItem> = fetch_where_in(
            &self.pool,
            SELECT_PACKING_ITEMS,
            "trip_id",
            &trip_ids,
            "ORDER BY created_at, id",
        )
        .await?;

        let mut links_by_trip = group_by(links, |link| link.trip_id.as_str());
        let mut items_by_trip = group_by(items, |item| item.trip_id.as_str());

        Ok(trips
            .into_iter()
            .map(|trip| {
                let trip_to_destinations = links_by_trip
                    .remove(&trip.id)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|link| {
                        let destination = destinations.get(&link.destination_id)?.clone();
                        Some(DestinationLink { link, destination })
                    })
                    .collect();
                let packing_items = items_by_trip.remove(&trip.id).unwrap_or_default();
                TripView::WithRelations(TripWithRelations {
                    trip,
                    trip_to_destinations,
                    packing_items,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        string_list, LinkDates, NewDestination, NewPackingItem, StringListInput,
    };
    use crate::repositories::{
        test_support::{date, pool},
        DestinationRepository, PackingItemRepository, TripDestinationRepository,
    };

    fn new_trip(name: &str) -> NewTrip {
        NewTrip {
            name: name.to_string(),
            ..NewTrip::default()
        }
    }

    fn dated_trip(name: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> NewTrip {
        NewTrip {
            name: name.to_string(),
            start_date: Some(date(start.0, start.1, start.2)),
            end_date: Some(date(end.0, end.1, end.2)),
            ..NewTrip::default()
        }
    }

    fn parse(id: &str) -> Uuid {
        Uuid::parse_str(id).unwrap()
    }

    fn names(views: &[TripView]) -> Vec<String> {
        views.iter().map(|view| view.trip().name.clone()).collect()
    }

    #[tokio::test]
    async fn create_then_get_returns_same_fields() {
        let repo = TripRepository::new(pool().await);
        let created = repo
            .create(&NewTrip {
                name: "Beach Vacation".into(),
                description: Some("Sun and sand".into()),
                ..NewTrip::default()
            })
            .await
            .unwrap();
        assert!(Uuid::parse_str(&created.id).is_ok());

        let fetched = repo.find(&parse(&created.id)).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Beach Vacation");
        assert_eq!(fetched.description.as_deref(), Some("Sun and sand"));
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let repo = TripRepository::new(pool().await);
        let created = repo
            .create(&NewTrip {
                name: "Alps".into(),
                description: Some("Hiking".into()),
                participants: Some(StringListInput::List(vec!["Ann".into()])),
                ..dated_trip("Alps", (2024, 7, 1), (2024, 7, 10))
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                &parse(&created.id),
                &TripUpdate {
                    description: Some("Climbing".into()),
                    ..TripUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.description.as_deref(), Some("Climbing"));
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.start_date, created.start_date);
        assert_eq!(updated.end_date, created.end_date);
        assert_eq!(updated.participants, created.participants);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_of_missing_trip_returns_none() {
        let repo = TripRepository::new(pool().await);
        let outcome = repo
            .update(&Uuid::new_v4(), &TripUpdate::default())
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = TripRepository::new(pool().await);
        let created = repo.create(&new_trip("Gone")).await.unwrap();
        let id = parse(&created.id);

        assert!(repo.delete(&id).await.unwrap());
        assert!(repo.get_by_id(&id, false).await.unwrap().is_none());
        assert!(!repo.delete(&id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_cascades_to_items_and_links() {
        let pool = pool().await;
        let trips = TripRepository::new(pool.clone());
        let destinations = DestinationRepository::new(pool.clone());
        let links = TripDestinationRepository::new(pool.clone());
        let items = PackingItemRepository::new(pool.clone());

        let trip = trips.create(&new_trip("Cascade")).await.unwrap();
        let trip_id = parse(&trip.id);
        let destination = destinations
            .create(&NewDestination {
                name: "Lisbon".into(),
                ..NewDestination::default()
            })
            .await
            .unwrap();
        let destination_id = parse(&destination.id);
        links
            .add(&trip_id, &destination_id, LinkDates::default())
            .await
            .unwrap();
        items
            .create(&NewPackingItem {
                name: "Towel".into(),
                amount: None,
                trip_id,
            })
            .await
            .unwrap();

        trips.delete(&trip_id).await.unwrap();

        assert!(items.list_by_trip(&trip_id, false).await.unwrap().is_empty());
        assert!(links.list_destinations_for_trip(&trip_id).await.unwrap().is_empty());
        assert!(destinations.find(&destination_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn search_by_name_is_case_sensitive_substring() {
        let repo = TripRepository::new(pool().await);
        for name in ["Beach Vacation", "Summer Beach", "beach cleanup", "Ski Trip"] {
            repo.create(&new_trip(name)).await.unwrap();
        }

        let found = repo
            .search(
                &TripSearch {
                    query: Some("Beach".into()),
                    ..TripSearch::default()
                },
                false,
            )
            .await
            .unwrap();

        let mut found = names(&found);
        found.sort();
        assert_eq!(found, vec!["Beach Vacation", "Summer Beach"]);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let repo = TripRepository::new(pool().await);
        repo.create(&new_trip("100% fun")).await.unwrap();
        repo.create(&new_trip("1000 fun")).await.unwrap();

        let found = repo
            .search(
                &TripSearch {
                    query: Some("0%".into()),
                    ..TripSearch::default()
                },
                false,
            )
            .await
            .unwrap();
        assert_eq!(names(&found), vec!["100% fun"]);
    }

    #[tokio::test]
    async fn search_by_window_returns_contained_trips() {
        let repo = TripRepository::new(pool().await);
        repo.create(&dated_trip("inside", (2023, 6, 15), (2023, 6, 25))).await.unwrap();
        repo.create(&dated_trip("edges", (2023, 6, 1), (2023, 6, 30))).await.unwrap();
        repo.create(&dated_trip("overlaps", (2023, 5, 20), (2023, 6, 10))).await.unwrap();
        repo.create(&dated_trip("later", (2023, 7, 2), (2023, 7, 9))).await.unwrap();
        repo.create(&new_trip("undated")).await.unwrap();

        let window = TripSearch {
            query: Some(String::new()),
            start_date: Some(date(2023, 6, 1)),
            end_date: Some(date(2023, 6, 30)),
        };
        assert_eq!(names(&repo.search(&window, false).await.unwrap()), vec!["edges", "inside"]);

        let from_june = TripSearch {
            start_date: Some(date(2023, 6, 1)),
            ..TripSearch::default()
        };
        assert_eq!(
            names(&repo.search(&from_june, false).await.unwrap()),
            vec!["edges", "inside", "later"]
        );

        let until_june = TripSearch {
            end_date: Some(date(2023, 6, 30)),
            ..TripSearch::default()
        };
        assert_eq!(
            names(&repo.search(&until_june, false).await.unwrap()),
            vec!["overlaps", "edges", "inside"]
        );

        assert_eq!(repo.search(&TripSearch::default(), false).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn participants_round_trip_from_either_shape() {
        let repo = TripRepository::new(pool().await);
        let expected = vec!["John".to_string(), "Jane".to_string()];

        let from_list = repo
            .create(&NewTrip {
                participants: Some(StringListInput::List(expected.clone())),
                ..new_trip("list")
            })
            .await
            .unwrap();
        let from_string = repo
            .create(&NewTrip {
                participants: Some(StringListInput::Encoded(r#"["John","Jane"]"#.into())),
                ..new_trip("string")
            })
            .await
            .unwrap();

        for trip in [from_list, from_string] {
            let stored = repo.find(&parse(&trip.id)).await.unwrap().unwrap();
            let decoded = stored.participants.as_deref().and_then(string_list::decode);
            assert_eq!(decoded, Some(expected.clone()));
        }
    }

    #[tokio::test]
    async fn with_relations_nests_links_and_items() {
        let pool = pool().await;
        let trips = TripRepository::new(pool.clone());
        let destinations = DestinationRepository::new(pool.clone());
        let links = TripDestinationRepository::new(pool.clone());
        let items = PackingItemRepository::new(pool.clone());

        let trip = trips.create(&new_trip("Loaded")).await.unwrap();
        let other = trips.create(&new_trip("Empty")).await.unwrap();
        let trip_id = parse(&trip.id);
        let destination = destinations
            .create(&NewDestination {
                name: "Porto".into(),
                ..NewDestination::default()
            })
            .await
            .unwrap();
        links
            .add(
                &trip_id,
                &parse(&destination.id),
                LinkDates {
                    start_date: Some(date(2023, 6, 16)),
                    end_date: Some(date(2023, 6, 20)),
                },
            )
            .await
            .unwrap();
        items
            .create(&NewPackingItem {
                name: "Sunscreen".into(),
                amount: Some(2),
                trip_id,
            })
            .await
            .unwrap();

        let Some(TripView::WithRelations(full)) = trips.get_by_id(&trip_id, true).await.unwrap()
        else {
            panic!("expected relations to be loaded");
        };
        assert_eq!(full.trip_to_destinations.len(), 1);
        assert_eq!(full.trip_to_destinations[0].destination.name, "Porto");
        assert_eq!(full.trip_to_destinations[0].link.start_date, Some(date(2023, 6, 16)));
        assert_eq!(full.packing_items.len(), 1);
        assert_eq!(full.packing_items[0].amount, 2);

        let all = trips.list_all(true).await.unwrap();
        let empty = all
            .iter()
            .find(|view| view.trip().id == other.id)
            .unwrap();
        match empty {
            TripView::WithRelations(full) => {
                assert!(full.trip_to_destinations.is_empty());
                assert!(full.packing_items.is_empty());
            }
            TripView::Bare(_) => panic!("expected relations"),
        }

        assert!(matches!(
            trips.get_by_id(&trip_id, false).await.unwrap(),
            Some(TripView::Bare(_))
        ));
    }

    #[tokio::test]
    async fn list_by_destination_filters_on_links() {
        let pool = pool().await;
        let trips = TripRepository::new(pool.clone());
        let destinations = DestinationRepository::new(pool.clone());
        let links = TripDestinationRepository::new(pool.clone());

        let linked = trips.create(&new_trip("Linked")).await.unwrap();
        trips.create(&new_trip("Unlinked")).await.unwrap();
        let destination = destinations
            .create(&NewDestination {
                name: "Rome".into(),
                ..NewDestination::default()
            })
            .await
            .unwrap();
        let destination_id = parse(&destination.id);
        links
            .add(&parse(&linked.id), &destination_id, LinkDates::default())
            .await
            .unwrap();

        let bare = trips.list_by_destination(&destination_id, false).await.unwrap();
        assert_eq!(names(&bare), vec!["Linked"]);
        assert!(matches!(bare[0], TripView::Bare(_)));

        let full = trips.list_by_destination(&destination_id, true).await.unwrap();
        assert!(matches!(
            &full[0],
            TripView::WithRelations(t) if t.trip_to_destinations.len() == 1
        ));
    }
}
