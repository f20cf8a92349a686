use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Garage, Photo};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateGarageRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub hourly_rate: Option<i64>,
    pub daily_rate: Option<i64>,
    #[schema(value_type = Option<Object>)]
    pub amenities: Option<Value>,
    /// Admins may create a garage on behalf of another owner.
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateGarageRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub hourly_rate: Option<i64>,
    pub daily_rate: Option<i64>,
    #[schema(value_type = Option<Object>)]
    pub amenities: Option<Value>,
    /// Admin only.
    pub status: Option<String>,
    /// Admin only.
    pub is_verified: Option<bool>,
}

/// Search result row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GarageSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub country: Option<String>,
    pub image: String,
    pub rating: f64,
    pub reviews: i64,
    pub location: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GarageSearchResult {
    pub items: Vec<GarageSummary>,
    pub total: i64,
    /// Set when the listing is degraded: store unavailable or placeholder rows.
    pub warning: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GarageDetail {
    #[serde(flatten)]
    pub garage: Garage,
    pub photos: Vec<Photo>,
    pub image: String,
    pub rating: f64,
    pub reviews: i64,
}
