use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::favorites::{FavoriteList, FavoriteToggle, ToggleFavoriteRequest, ToggleOutcome},
    error::AppResult,
    extractors::AppJson,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::favorite_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_favorites).post(toggle_favorite))
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    responses(
        (status = 200, description = "List favorites", body = ApiResponse<FavoriteList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<FavoriteList>>> {
    let resp = favorite_service::list_favorites(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/favorites",
    request_body = ToggleFavoriteRequest,
    responses(
        (status = 201, description = "Added to favorites", body = ApiResponse<FavoriteToggle>),
        (status = 200, description = "Removed from favorites", body = ApiResponse<FavoriteToggle>),
        (status = 400, description = "Missing garage_id"),
        (status = 404, description = "Garage not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ToggleFavoriteRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<FavoriteToggle>>)> {
    let resp = favorite_service::toggle_favorite(&state, &user, payload).await?;
    let status = match resp.data.as_ref().map(|d| d.toggled) {
        Some(ToggleOutcome::Added) => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(resp)))
}
