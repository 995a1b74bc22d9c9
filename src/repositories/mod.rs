//! Data access, one repository per table. Every method is a short sequence of
//! independent statements; nothing here opens a transaction that spans
//! repositories.

pub mod destination;
pub mod diary_entry;
pub mod packing_item;
pub mod tag;
pub mod trip;
pub mod trip_destination;

use std::collections::{HashMap, HashSet};

use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Sqlite};

use crate::db::{DbPool, StoreResult};

pub use destination::DestinationRepository;
pub use diary_entry::DiaryEntryRepository;
pub use packing_item::PackingItemRepository;
pub use tag::TagRepository;
pub use trip::TripRepository;
pub use trip_destination::TripDestinationRepository;

/// Runs `select` restricted to `column IN (ids)`, followed by `tail`
/// (ordering). Returns nothing without touching the database when `ids` is
/// empty.
pub(crate) async fn fetch_where_in<T>(
    pool: &DbPool,
    select: &str,
    column: &str,
    ids: &[String],
    tail: &str,
) -> StoreResult<Vec<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(select);
    builder.push(" WHERE ").push(column).push(" IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");
    builder.push(" ").push(tail);

    Ok(builder.build_query_as::<T>().fetch_all(pool).await?)
}

/// Buckets rows by a key, keeping their original order within each bucket.
pub(crate) fn group_by<T, F>(rows: Vec<T>, key: F) -> HashMap<String, Vec<T>>
where
    F: Fn(&T) -> &str,
{
    let mut grouped: HashMap<String, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(key(&row).to_string()).or_default().push(row);
    }
    grouped
}

pub(crate) fn unique_ids<'a, I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}
