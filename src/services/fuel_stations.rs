//! Fuel stations around a destination.
//!
//! The provider adapter owns transport; this module owns the request shape and
//! how a provider's per-place properties are reduced to a fixed set of fuel
//! labels.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use thiserror::Error;

pub const DEFAULT_RADIUS_METERS: u32 = 5_000;
pub const MIN_RADIUS_METERS: u32 = 1;
pub const MAX_RADIUS_METERS: u32 = 20_000;
pub const MAX_RESULTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelStationQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Diesel,
    E10,
    E5,
    E98,
    Lpg,
    Cng,
    Electric,
}

impl FuelType {
    pub const ALL: [FuelType; 7] = [
        FuelType::Diesel,
        FuelType::E10,
        FuelType::E5,
        FuelType::E98,
        FuelType::Lpg,
        FuelType::Cng,
        FuelType::Electric,
    ];

    /// Provider keys that indicate this fuel.
    fn provider_keys(self) -> &'static [&'static str] {
        match self {
            FuelType::Diesel => &["diesel"],
            FuelType::E10 => &["e10", "octane_95_e10"],
            FuelType::E5 => &["e5", "octane_95"],
            FuelType::E98 => &["e98", "octane_98"],
            FuelType::Lpg => &["lpg"],
            FuelType::Cng => &["cng"],
            FuelType::Electric => &["electric", "electricity"],
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelStation {
    pub id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters from the search centre, as reported by the provider.
    pub distance: Option<f64>,
    pub brand: Option<String>,
    pub opening_hours: Option<String>,
    pub fuel_types: Vec<FuelType>,
}

#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("places request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("places provider answered with status {status}")]
    Status { status: u16 },
    #[error("places response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Fuel stations inside the query circle, nearest first, at most
    /// [`MAX_RESULTS`].
    async fn fuel_stations(
        &self,
        query: &FuelStationQuery,
    ) -> Result<Vec<FuelStation>, PlacesError>;
}

/// Fuel labels for one place, in [`FuelType::ALL`] order.
///
/// A structured `fuel_options` object wins when present. Otherwise flat
/// `fuel:<key>` properties are consulted, first on the place itself, then on
/// the raw source record.
pub fn fuel_types(properties: &Map<String, Value>) -> Vec<FuelType> {
    if let Some(Value::Object(options)) = properties.get("fuel_options") {
        return FuelType::ALL
            .into_iter()
            .filter(|fuel| fuel.provider_keys().iter().any(|key| is_truthy(options.get(*key))))
            .collect();
    }

    let raw = properties
        .get("datasource")
        .and_then(|source| source.get("raw"))
        .and_then(Value::as_object);

    FuelType::ALL
        .into_iter()
        .filter(|fuel| {
            fuel.provider_keys().iter().any(|key| {
                let flat = format!("fuel:{key}");
                is_truthy(properties.get(&flat)) || is_truthy(raw.and_then(|raw| raw.get(&flat)))
            })
        })
        .collect()
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => matches!(text.as_str(), "yes" | "true" | "1"),
        Some(Value::Number(number)) => number.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn structured_options_take_precedence() {
        let properties = props(json!({
            "fuel_options": { "diesel": true, "octane_98": true, "lpg": false },
            "fuel:cng": "yes"
        }));
        assert_eq!(fuel_types(&properties), vec![FuelType::Diesel, FuelType::E98]);
    }

    #[test]
    fn flat_properties_are_the_fallback() {
        let properties = props(json!({
            "fuel:octane_95": "yes",
            "fuel:e10": true,
            "fuel:diesel": "no",
            "datasource": { "raw": { "fuel:cng": "yes", "fuel:electricity": "yes" } }
        }));
        assert_eq!(
            fuel_types(&properties),
            vec![FuelType::E10, FuelType::E5, FuelType::Cng, FuelType::Electric]
        );
    }

    #[test]
    fn nothing_known_yields_no_labels() {
        assert!(fuel_types(&props(json!({ "name": "Shell" }))).is_empty());
    }

    #[test]
    fn labels_serialize_lowercase() {
        let encoded = serde_json::to_value(FuelType::ALL).unwrap();
        assert_eq!(
            encoded,
            json!(["diesel", "e10", "e5", "e98", "lpg", "cng", "electric"])
        );
    }
}
