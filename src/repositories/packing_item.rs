use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{fetch_where_in, trip::SELECT_TRIPS, unique_ids};
use crate::{
    db::{DbPool, StoreResult},
    models::{
        packing_item::DEFAULT_AMOUNT, NewPackingItem, PackingItem, PackingItemUpdate,
        PackingItemView, PackingItemWithTrip, Trip,
    },
};

pub(crate) const PACKING_ITEM_COLUMNS: &str = "id, name, amount, trip_id, created_at, updated_at";
pub(crate) const SELECT_PACKING_ITEMS: &str =
    "SELECT id, name, amount, trip_id, created_at, updated_at FROM packing_items";

#[derive(Clone)]
pub struct PackingItemRepository {
    pool: DbPool,
}

impl PackingItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self, with_relations: bool) -> StoreResult<Vec<PackingItemView>> {
        let items = sqlx::query_as::<_, PackingItem>(&format!(
            "{SELECT_PACKING_ITEMS} ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.load_relations(items, with_relations).await
    }

    pub async fn get_by_id(
        &self,
        id: &Uuid,
        with_relations: bool,
    ) -> StoreResult<Option<PackingItemView>> {
        let item =
            sqlx::query_as::<_, PackingItem>(&format!("{SELECT_PACKING_ITEMS} WHERE id = ?1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        let Some(item) = item else {
            return Ok(None);
        };
        let mut views = self.load_relations(vec![item], with_relations).await?;
        Ok(views.pop())
    }

    pub async fn list_by_trip(
        &self,
        trip_id: &Uuid,
        with_relations: bool,
    ) -> StoreResult<Vec<PackingItemView>> {
        let items = sqlx::query_as::<_, PackingItem>(&format!(
            "{SELECT_PACKING_ITEMS} WHERE trip_id = ?1 ORDER BY created_at, id"
        ))
        .bind(trip_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        self.load_relations(items, with_relations).await
    }

    /// Fails with `MissingReference` when the trip does not exist.
    pub async fn create(&self, data: &NewPackingItem) -> StoreResult<PackingItem> {
        let item = sqlx::query_as::<_, PackingItem>(&format!(
            "INSERT INTO packing_items ({PACKING_ITEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             RETURNING {PACKING_ITEM_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&data.name)
        .bind(data.amount.unwrap_or(DEFAULT_AMOUNT))
        .bind(data.trip_id.to_string())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn update(
        &self,
        id: &Uuid,
        changes: &PackingItemUpdate,
    ) -> StoreResult<Option<PackingItem>> {
        let item = sqlx::query_as::<_, PackingItem>(&format!(
            "UPDATE packing_items SET \
                name = COALESCE(?1, name), \
                amount = COALESCE(?2, amount), \
                trip_id = COALESCE(?3, trip_id), \
                updated_at = ?4 \
             WHERE id = ?5 RETURNING {PACKING_ITEM_COLUMNS}"
        ))
        .bind(&changes.name)
        .bind(changes.amount)
        .bind(changes.trip_id.map(|trip_id| trip_id.to_string()))
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM packing_items WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns the number of removed items.
    pub async fn delete_all_for_trip(&self, trip_id: &Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM packing_items WHERE trip_id = ?1")
            .bind(trip_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn load_relations(
        &self,
        items: Vec<PackingItem>,
        with_relations: bool,
    ) -> StoreResult<Vec<PackingItemView>> {
        if !with_relations {
            return Ok(items.into_iter().map(PackingItemView::Bare).collect());
        }

        let trip_ids = unique_ids(items.iter().map(|item| item.trip_id.as_str()));
        let trips: HashMap<String, Trip> =
            fetch_where_in::<Trip>(&self.pool, SELECT_TRIPS, "id", &trip_ids, "")
                .await?
                .into_iter()
                .map(|trip| (trip.id.clone(), trip))
                .collect();

        // The foreign key guarantees every item has its trip.
        Ok(items
            .into_iter()
            .filter_map(|item| {
                let trip = trips.get(&item.trip_id)?.clone();
                Some(PackingItemView::WithRelations(PackingItemWithTrip { item, trip }))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;
    use crate::models::NewTrip;
    use crate::repositories::{test_support::pool, TripRepository};

    async fn setup() -> (PackingItemRepository, TripRepository, Uuid) {
        let pool = pool().await;
        let trips = TripRepository::new(pool.clone());
        let trip = trips
            .create(&NewTrip {
                name: "Camping".into(),
                ..NewTrip::default()
            })
            .await
            .unwrap();
        (
            PackingItemRepository::new(pool),
            trips,
            Uuid::parse_str(&trip.id).unwrap(),
        )
    }

    fn item(name: &str, trip_id: Uuid) -> NewPackingItem {
        NewPackingItem {
            name: name.into(),
            amount: None,
            trip_id,
        }
    }

    #[tokio::test]
    async fn amount_defaults_to_one() {
        let (items, _, trip_id) = setup().await;
        let created = items.create(&item("Tent", trip_id)).await.unwrap();
        assert_eq!(created.amount, 1);
        assert_eq!(created.trip_id, trip_id.to_string());
    }

    #[tokio::test]
    async fn create_for_unknown_trip_is_a_missing_reference() {
        let (items, _, _) = setup().await;
        let err = items.create(&item("Tent", Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference));
    }

    #[tokio::test]
    async fn update_changes_only_amount() {
        let (items, _, trip_id) = setup().await;
        let created = items.create(&item("Socks", trip_id)).await.unwrap();
        let id = Uuid::parse_str(&created.id).unwrap();

        let updated = items
            .update(
                &id,
                &PackingItemUpdate {
                    amount: Some(5),
                    ..PackingItemUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.amount, 5);
        assert_eq!(updated.name, "Socks");
        assert_eq!(updated.trip_id, created.trip_id);
    }

    #[tokio::test]
    async fn list_by_trip_with_relations_nests_trip() {
        let (items, trips, trip_id) = setup().await;
        let other_trip = trips
            .create(&NewTrip {
                name: "Other".into(),
                ..NewTrip::default()
            })
            .await
            .unwrap();
        items.create(&item("Tent", trip_id)).await.unwrap();
        items.create(&item("Stove", trip_id)).await.unwrap();
        items
            .create(&item("Skis", Uuid::parse_str(&other_trip.id).unwrap()))
            .await
            .unwrap();

        let listed = items.list_by_trip(&trip_id, true).await.unwrap();
        assert_eq!(listed.len(), 2);
        for view in &listed {
            match view {
                PackingItemView::WithRelations(full) => assert_eq!(full.trip.name, "Camping"),
                PackingItemView::Bare(_) => panic!("expected nested trip"),
            }
        }
        assert_eq!(items.list_all(false).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delete_all_for_trip_only_touches_that_trip() {
        let (items, trips, trip_id) = setup().await;
        let other_trip = trips
            .create(&NewTrip {
                name: "Other".into(),
                ..NewTrip::default()
            })
            .await
            .unwrap();
        let other_id = Uuid::parse_str(&other_trip.id).unwrap();
        items.create(&item("Tent", trip_id)).await.unwrap();
        items.create(&item("Stove", trip_id)).await.unwrap();
        items.create(&item("Skis", other_id)).await.unwrap();

        assert_eq!(items.delete_all_for_trip(&trip_id).await.unwrap(), 2);
        assert!(items.list_by_trip(&trip_id, false).await.unwrap().is_empty());
        assert_eq!(items.list_by_trip(&other_id, false).await.unwrap().len(), 1);
        assert_eq!(items.delete_all_for_trip(&trip_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_then_get_is_absent() {
        let (items, _, trip_id) = setup().await;
        let created = items.create(&item("Map", trip_id)).await.unwrap();
        let id = Uuid::parse_str(&created.id).unwrap();
        assert!(items.delete(&id).await.unwrap());
        assert!(items.get_by_id(&id, false).await.unwrap().is_none());
        assert!(!items.delete(&id).await.unwrap());
    }
}
