use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use travel::config::AppConfig;
use travel::db::{init_pool, run_migrations};
use travel::error::AppError;
use travel::routes::create_router;
use travel::services::geoapify::GeoapifyPlaces;
use travel::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let db = init_pool(&config.database_url).await?;

    if let Err(err) = run_migrations(&db).await {
        error!("migration failed: {err:?}");
        return Err(err);
    }

    let places = GeoapifyPlaces::new(
        config.places_api_url.clone(),
        config.places_api_key.clone(),
        config.places_timeout,
    )
    .map_err(|err| AppError::Other(err.into()))?;

    let state = AppState::new(db, Arc::new(places));
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,travel=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
