use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::AppState;

pub mod auth;
pub mod bookings;
pub mod doc;
pub mod favorites;
pub mod garages;
pub mod geocode;
pub mod health;
pub mod messages;
pub mod params;
pub mod photos;
pub mod reviews;
pub mod users;

/// Body limit for every JSON route.
pub const JSON_BODY_LIMIT: usize = 1024 * 1024;

// Build the API router without binding state; it will be provided at the top level.
// Photos are nested after the 1 MiB layer and carry their own limit.
pub fn create_api_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/garages", garages::router())
        .nest("/bookings", bookings::router())
        .nest("/favorites", favorites::router())
        .nest("/reviews", reviews::router())
        .nest("/messages", messages::router())
        .nest("/geocode", geocode::router())
        .layer(RequestBodyLimitLayer::new(JSON_BODY_LIMIT))
        .nest("/photos", photos::router(max_upload_bytes))
}
