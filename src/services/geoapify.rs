//! Reqwest-backed Geoapify Places adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::fuel_stations::{
    fuel_types, FuelStation, FuelStationQuery, PlacesError, PlacesProvider, MAX_RESULTS,
};

const FUEL_CATEGORY: &str = "service.vehicle.fuel";

pub struct GeoapifyPlaces {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GeoapifyPlaces {
    pub fn new(endpoint: Url, api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl PlacesProvider for GeoapifyPlaces {
    async fn fuel_stations(
        &self,
        query: &FuelStationQuery,
    ) -> Result<Vec<FuelStation>, PlacesError> {
        let FuelStationQuery {
            latitude,
            longitude,
            radius_meters,
        } = *query;
        debug!(latitude, longitude, radius_meters, "querying fuel stations");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("categories", FUEL_CATEGORY.to_string()),
                ("filter", format!("circle:{longitude},{latitude},{radius_meters}")),
                ("bias", format!("proximity:{longitude},{latitude}")),
                ("limit", MAX_RESULTS.to_string()),
                ("apiKey", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlacesError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        parse_stations(&body)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Map<String, Value>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Value,
}

impl Geometry {
    /// `(longitude, latitude)` of a point geometry.
    fn point(&self) -> Option<(f64, f64)> {
        match self.coordinates.as_array()?.as_slice() {
            [lon, lat] => Some((lon.as_f64()?, lat.as_f64()?)),
            _ => None,
        }
    }
}

/// Decodes a GeoJSON feature collection. Places without a position are
/// dropped.
pub fn parse_stations(body: &[u8]) -> Result<Vec<FuelStation>, PlacesError> {
    let collection: FeatureCollection = serde_json::from_slice(body)
        .map_err(|err| PlacesError::Decode(format!("invalid places payload: {err}")))?;

    Ok(collection
        .features
        .into_iter()
        .filter_map(into_station)
        .take(MAX_RESULTS)
        .collect())
}

fn into_station(feature: Feature) -> Option<FuelStation> {
    let properties = &feature.properties;
    let from_geometry = feature.geometry.as_ref().and_then(Geometry::point);
    let latitude = number(properties, "lat").or(from_geometry.map(|(_, lat)| lat))?;
    let longitude = number(properties, "lon").or(from_geometry.map(|(lon, _)| lon))?;

    let address = text(properties, "formatted").or_else(|| {
        let lines: Vec<String> = ["address_line1", "address_line2"]
            .iter()
            .filter_map(|key| text(properties, key))
            .collect();
        (!lines.is_empty()).then(|| lines.join(", "))
    });

    Some(FuelStation {
        id: text(properties, "place_id"),
        name: text(properties, "name"),
        address,
        latitude,
        longitude,
        distance: number(properties, "distance"),
        brand: text(properties, "brand"),
        opening_hours: text(properties, "opening_hours"),
        fuel_types: fuel_types(properties),
    })
}

fn text(properties: &Map<String, Value>, key: &str) -> Option<String> {
    properties
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn number(properties: &Map<String, Value>, key: &str) -> Option<f64> {
    properties.get(key).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::fuel_stations::FuelType;

    #[test]
    fn features_become_stations() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {
                        "place_id": "abc",
                        "name": "Aral",
                        "brand": "Aral",
                        "formatted": "Hauptstraße 1, 10115 Berlin",
                        "lat": 52.53,
                        "lon": 13.38,
                        "distance": 120,
                        "opening_hours": "24/7",
                        "fuel_options": { "diesel": true, "octane_95": true }
                    },
                    "geometry": { "type": "Point", "coordinates": [13.38, 52.53] }
                },
                {
                    "type": "Feature",
                    "properties": {
                        "address_line1": "Tankstelle",
                        "address_line2": "Ring 5, Berlin",
                        "datasource": { "raw": { "fuel:lpg": "yes" } }
                    },
                    "geometry": { "type": "Point", "coordinates": [13.4, 52.5] }
                },
                { "type": "Feature", "properties": { "name": "nowhere" } }
            ]
        });

        let stations = parse_stations(body.to_string().as_bytes()).unwrap();
        assert_eq!(stations.len(), 2);

        let aral = &stations[0];
        assert_eq!(aral.id.as_deref(), Some("abc"));
        assert_eq!(aral.address.as_deref(), Some("Hauptstraße 1, 10115 Berlin"));
        assert_eq!(aral.distance, Some(120.0));
        assert_eq!(aral.fuel_types, vec![FuelType::Diesel, FuelType::E5]);

        let unnamed = &stations[1];
        assert_eq!(unnamed.name, None);
        assert_eq!(unnamed.address.as_deref(), Some("Tankstelle, Ring 5, Berlin"));
        assert_eq!((unnamed.latitude, unnamed.longitude), (52.5, 13.4));
        assert_eq!(unnamed.fuel_types, vec![FuelType::Lpg]);
    }

    #[test]
    fn results_are_capped() {
        let features: Vec<Value> = (0..30)
            .map(|i| json!({ "properties": { "lat": 1.0, "lon": f64::from(i) } }))
            .collect();
        let body = json!({ "features": features });
        assert_eq!(parse_stations(body.to_string().as_bytes()).unwrap().len(), MAX_RESULTS);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(parse_stations(b"<html>"), Err(PlacesError::Decode(_))));
    }
}
