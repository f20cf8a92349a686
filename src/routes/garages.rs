use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::garages::{CreateGarageRequest, GarageDetail, GarageSearchResult, UpdateGarageRequest},
    error::AppResult,
    extractors::{AppJson, AppQuery, AppPath},
    middleware::auth::AuthUser,
    models::Garage,
    response::ApiResponse,
    routes::params::GarageSearchQuery,
    services::garage_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_garages).post(create_garage))
        .route(
            "/{id}",
            get(get_garage).patch(update_garage).delete(delete_garage),
        )
}

#[utoipa::path(
    get,
    path = "/api/garages",
    params(GarageSearchQuery),
    responses(
        (status = 200, description = "Search garages; `warning` is set when results are degraded", body = ApiResponse<GarageSearchResult>)
    ),
    tag = "Garages"
)]
pub async fn search_garages(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<GarageSearchQuery>,
) -> Json<ApiResponse<GarageSearchResult>> {
    Json(garage_service::search_garages(&state, query).await)
}

#[utoipa::path(
    get,
    path = "/api/garages/{id}",
    params(("id" = Uuid, Path, description = "Garage ID")),
    responses(
        (status = 200, description = "Garage with photos and rating", body = ApiResponse<GarageDetail>),
        (status = 404, description = "Not Found")
    ),
    tag = "Garages"
)]
pub async fn get_garage(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<GarageDetail>>> {
    let resp = garage_service::get_garage(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/garages",
    request_body = CreateGarageRequest,
    responses(
        (status = 201, description = "Garage created", body = ApiResponse<Garage>),
        (status = 400, description = "Missing name"),
        (status = 403, description = "Garage owners and admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Garages"
)]
pub async fn create_garage(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateGarageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Garage>>)> {
    let resp = garage_service::create_garage(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/garages/{id}",
    params(("id" = Uuid, Path, description = "Garage ID")),
    request_body = UpdateGarageRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<Garage>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Garages"
)]
pub async fn update_garage(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateGarageRequest>,
) -> AppResult<Json<ApiResponse<Garage>>> {
    let resp = garage_service::update_garage(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/garages/{id}",
    params(("id" = Uuid, Path, description = "Garage ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Garages"
)]
pub async fn delete_garage(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = garage_service::delete_garage(&state, &user, id).await?;
    Ok(Json(resp))
}
