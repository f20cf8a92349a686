use serde::Serialize;
use utoipa::ToSchema;

use crate::geo::GeoPoint;

#[derive(Debug, Serialize, ToSchema)]
pub struct GeocodeResult {
    pub result: Option<GeoPoint>,
}
