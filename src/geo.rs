//! Geocoding and great-circle distances.
//!
//! The [`Geocoder`] port resolves a free-text address to coordinates; the
//! Nominatim adapter owns transport details only: query parameters, identity
//! header, timeout and JSON decoding.

use std::{cmp::Ordering, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::GeocoderSettings;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub display_name: Option<String>,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            display_name: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("geocoder responded with status {0}")]
    Status(u16),
    #[error("geocoder returned malformed coordinates")]
    Malformed,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `query` to its best match, or `None` when nothing matched.
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}

/// Nominatim search adapter.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: Url,
    country_codes: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(settings: &GeocoderSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(settings.user_agent.clone())
            .build()?;
        let endpoint = Url::parse(&settings.url)?;
        Ok(Self {
            client,
            endpoint,
            country_codes: settings.country_codes.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let mut params = vec![
            ("format", "jsonv2"),
            ("q", query),
            ("limit", "1"),
            ("addressdetails", "0"),
            ("polygon_geojson", "0"),
        ];
        if let Some(codes) = self.country_codes.as_deref() {
            params.push(("countrycodes", codes));
        }

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&params)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        let Some(first) = places.into_iter().next() else {
            return Ok(None);
        };
        let lat = first.lat.parse::<f64>().map_err(|_| GeocodeError::Malformed)?;
        let lon = first.lon.parse::<f64>().map_err(|_| GeocodeError::Malformed)?;
        Ok(Some(GeoPoint {
            lat,
            lon,
            display_name: first.display_name,
        }))
    }
}

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let la1 = a.lat.to_radians();
    let la2 = b.lat.to_radians();
    let sin_d_lat = (d_lat / 2.0).sin();
    let sin_d_lon = (d_lon / 2.0).sin();
    let h = sin_d_lat * sin_d_lat + la1.cos() * la2.cos() * sin_d_lon * sin_d_lon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Nearest first; unknown distances sort last; ties go to the higher rating.
pub fn compare_by_distance(
    a_distance: Option<f64>,
    a_rating: f64,
    b_distance: Option<f64>,
    b_rating: f64,
) -> Ordering {
    let a_distance = a_distance.unwrap_or(f64::INFINITY);
    let b_distance = b_distance.unwrap_or(f64::INFINITY);
    a_distance
        .total_cmp(&b_distance)
        .then_with(|| b_rating.total_cmp(&a_rating))
}
