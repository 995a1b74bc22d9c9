pub mod date;
pub mod destination;
pub mod diary_entry;
pub mod packing_item;
pub mod string_list;
pub mod tag;
pub mod trip;
pub mod trip_destination;

pub use destination::{
    Destination, DestinationUpdate, DestinationView, DestinationWithTrips, NewDestination,
};
pub use diary_entry::{
    DiaryEntry, DiaryEntryUpdate, DiaryEntryView, DiaryEntryWithTags, NewDiaryEntry,
};
pub use packing_item::{
    NewPackingItem, PackingItem, PackingItemUpdate, PackingItemView, PackingItemWithTrip,
};
pub use string_list::StringListInput;
pub use tag::{NewTag, Tag};
pub use trip::{NewTrip, Trip, TripSearch, TripUpdate, TripView, TripWithRelations};
pub use trip_destination::{DestinationLink, LinkDates, TripDestination, TripLink};
