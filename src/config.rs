use std::{env, net::SocketAddr, time::Duration};

use url::Url;

use crate::error::AppError;

pub const DEFAULT_PLACES_API_URL: &str = "https://api.geoapify.com/v2/places";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub places_api_key: String,
    pub places_api_url: Url,
    pub places_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as
    /// absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = get("DATABASE_URL").unwrap_or_else(|| "sqlite://travel.db".to_string());
        if !database_url.starts_with("sqlite:") {
            return Err(AppError::Config(
                "DATABASE_URL must be a sqlite: connection string".into(),
            ));
        }

        let listen_addr = match (get("APP_LISTEN_ADDR"), get("PORT")) {
            (Some(addr), _) => addr
                .parse::<SocketAddr>()
                .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?,
            (None, Some(port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|err| AppError::Config(format!("invalid PORT: {err}")))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };

        let places_api_key = get("PLACES_API_KEY")
            .ok_or_else(|| AppError::Config("PLACES_API_KEY is required".into()))?;

        let places_api_url = get("PLACES_API_URL")
            .as_deref()
            .unwrap_or(DEFAULT_PLACES_API_URL)
            .parse::<Url>()
            .map_err(|err| AppError::Config(format!("invalid PLACES_API_URL: {err}")))?;

        let places_timeout = match get("PLACES_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|err| {
                AppError::Config(format!("invalid PLACES_TIMEOUT_SECS: {err}"))
            })?),
            None => Duration::from_secs(10),
        };

        Ok(Self {
            database_url,
            listen_addr,
            places_api_key,
            places_api_url,
            places_timeout,
        })
    }
}
