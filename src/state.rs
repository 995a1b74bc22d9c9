use std::sync::Arc;

use crate::{
    db::DbPool,
    repositories::{
        DestinationRepository, DiaryEntryRepository, PackingItemRepository, TagRepository,
        TripDestinationRepository, TripRepository,
    },
    services::fuel_stations::PlacesProvider,
};

/// Shared handler state. Everything inside is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub trips: TripRepository,
    pub destinations: DestinationRepository,
    pub trip_destinations: TripDestinationRepository,
    pub packing_items: PackingItemRepository,
    pub tags: TagRepository,
    pub diary_entries: DiaryEntryRepository,
    pub places: Arc<dyn PlacesProvider>,
}

impl AppState {
    pub fn new(db: DbPool, places: Arc<dyn PlacesProvider>) -> Self {
        Self {
            trips: TripRepository::new(db.clone()),
            destinations: DestinationRepository::new(db.clone()),
            trip_destinations: TripDestinationRepository::new(db.clone()),
            packing_items: PackingItemRepository::new(db.clone()),
            tags: TagRepository::new(db.clone()),
            diary_entries: DiaryEntryRepository::new(db),
            places,
        }
    }
}
