use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::geocode::GeocodeResult,
    error::{AppError, AppResult},
    extractors::AppQuery,
    response::ApiResponse,
    routes::params::{GeocodeQuery, non_empty},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(geocode))
}

#[utoipa::path(
    get,
    path = "/api/geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Best match or null", body = ApiResponse<GeocodeResult>),
        (status = 400, description = "Missing q"),
        (status = 502, description = "Geocoding provider failed")
    ),
    tag = "Geocode"
)]
pub async fn geocode(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<GeocodeQuery>,
) -> AppResult<Json<ApiResponse<GeocodeResult>>> {
    let q = non_empty(query.q.as_deref())
        .ok_or_else(|| AppError::BadRequest("q is required".into()))?;

    let result = state.geocoder.geocode(q).await.map_err(|err| {
        tracing::warn!(error = %err, "geocode lookup failed");
        AppError::BadGateway("geocoding failed".into())
    })?;

    Ok(Json(ApiResponse::success(
        "Geocode",
        GeocodeResult { result },
        None,
    )))
}
