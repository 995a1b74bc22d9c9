use std::{str::FromStr, time::Duration};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

use crate::error::AppError;

pub type DbPool = SqlitePool;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn init_pool(database_url: &str) -> Result<DbPool, AppError> {
    let options = connect_options(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Single-connection in-memory pool with the schema applied. Every test gets
/// its own database.
pub async fn init_memory_pool() -> Result<DbPool, AppError> {
    let options = connect_options("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|err| AppError::Other(err.into()))
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?.foreign_keys(true);
    Ok(options)
}

/// Storage failures, classified by the database's own constraint codes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Conflict,
    #[error("referenced row does not exist")]
    MissingReference,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                debug!(code = ?db_err.code(), "unique violation");
                return StoreError::Conflict;
            }
            if db_err.is_foreign_key_violation() {
                debug!(code = ?db_err.code(), "foreign key violation");
                return StoreError::MissingReference;
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
