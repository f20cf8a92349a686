use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::limit::RequestBodyLimitLayer;
use uuid::Uuid;

use crate::{
    dto::photos::{PhotoContent, PhotoCreated, PhotoUpload},
    error::{AppError, AppResult},
    extractors::AppPath,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::photo_service,
    state::AppState,
};

const CACHE_FOREVER: &str = "public, max-age=31536000, immutable";
/// Room for multipart boundaries and the text fields around the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(upload_photo)
                .layer::<_, std::convert::Infallible>(DefaultBodyLimit::max(max_upload_bytes))
                .layer(RequestBodyLimitLayer::new(max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .route("/{id}", get(get_photo).delete(delete_photo))
}

fn multipart_error(err: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("Multipart error: {err}"))
}

async fn read_upload(mut multipart: Multipart) -> AppResult<PhotoUpload> {
    let mut garage_id = None;
    let mut is_primary = false;
    let mut bytes = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("garage_id") => {
                let text = field.text().await.map_err(multipart_error)?;
                let id = Uuid::parse_str(text.trim())
                    .map_err(|_| AppError::BadRequest("garage_id must be a UUID".into()))?;
                garage_id = Some(id);
            }
            Some("is_primary") => {
                let text = field.text().await.map_err(multipart_error)?;
                is_primary = text.trim().eq_ignore_ascii_case("true");
            }
            Some("file") => {
                let data = field.bytes().await.map_err(multipart_error)?;
                if !data.is_empty() {
                    bytes = Some(data.to_vec());
                }
            }
            _ => {}
        }
    }

    match (garage_id, bytes) {
        (Some(garage_id), Some(bytes)) => Ok(PhotoUpload {
            garage_id,
            is_primary,
            bytes,
        }),
        _ => Err(AppError::BadRequest("garage_id and file are required".into())),
    }
}

#[utoipa::path(
    post,
    path = "/api/photos",
    request_body(content_type = "multipart/form-data", description = "Fields `garage_id`, `file` and optional `is_primary`"),
    responses(
        (status = 201, description = "Photo stored as JPEG", body = ApiResponse<PhotoCreated>),
        (status = 400, description = "Missing garage_id or file"),
        (status = 403, description = "Not the garage owner"),
        (status = 404, description = "Garage not found"),
        (status = 413, description = "Upload too large"),
        (status = 500, description = "Image could not be decoded")
    ),
    security(("bearer_auth" = [])),
    tag = "Photos"
)]
pub async fn upload_photo(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<PhotoCreated>>)> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let upload = read_upload(multipart).await?;
    let resp = photo_service::upload_photo(&state, &user, upload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/photos/{id}",
    params(("id" = Uuid, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Image bytes with the stored content type"),
        (status = 302, description = "Redirect to the external image url"),
        (status = 404, description = "Not Found")
    ),
    tag = "Photos"
)]
pub async fn get_photo(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Response> {
    let response = match photo_service::get_photo(&state, id).await? {
        PhotoContent::Embedded { bytes, mime_type } => (
            [
                (header::CONTENT_TYPE, mime_type),
                (header::CACHE_CONTROL, CACHE_FOREVER.to_string()),
            ],
            bytes,
        )
            .into_response(),
        PhotoContent::Redirect(url) => (StatusCode::FOUND, [(header::LOCATION, url)]).into_response(),
    };
    Ok(response)
}

#[utoipa::path(
    delete,
    path = "/api/photos/{id}",
    params(("id" = Uuid, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Photos"
)]
pub async fn delete_photo(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = photo_service::delete_photo(&state, &user, id).await?;
    Ok(Json(resp))
}
