use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::photos::{PhotoContent, PhotoCreated, PhotoLink, PhotoUpload},
    entity::garage_photos::{ActiveModel as PhotoActive, Column as PhotoCol, Entity as GaragePhotos},
    error::{AppError, AppResult},
    imaging::{OUTPUT_MIME_TYPE, normalize_image},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::non_empty,
    services::garage_service::find_managed_garage,
    state::AppState,
};

pub fn photo_path(id: Uuid) -> String {
    format!("/api/photos/{id}")
}

pub async fn upload_photo(
    state: &AppState,
    user: &AuthUser,
    upload: PhotoUpload,
) -> AppResult<ApiResponse<PhotoCreated>> {
    let garage = find_managed_garage(&state.orm, user, upload.garage_id).await?;

    let (max_width, quality) = (state.photos.max_width, state.photos.quality);
    let bytes = upload.bytes;
    let original_size = bytes.len();
    let image = tokio::task::spawn_blocking(move || normalize_image(&bytes, max_width, quality))
        .await
        .map_err(anyhow::Error::from)??;

    let photo_id = Uuid::new_v4();
    let size = image.bytes.len() as i32;
    let (width, height) = (image.width as i32, image.height as i32);

    let txn = state.orm.begin().await?;
    if upload.is_primary {
        GaragePhotos::update_many()
            .col_expr(PhotoCol::IsPrimary, Expr::value(false))
            .filter(PhotoCol::GarageId.eq(garage.id))
            .exec(&txn)
            .await?;
    }
    PhotoActive {
        id: Set(photo_id),
        garage_id: Set(garage.id),
        data: Set(Some(image.bytes)),
        mime_type: Set(Some(OUTPUT_MIME_TYPE.to_string())),
        width: Set(Some(width)),
        height: Set(Some(height)),
        size: Set(Some(size)),
        url: Set(None),
        is_primary: Set(upload.is_primary),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(
        photo_id = %photo_id,
        garage_id = %garage.id,
        original_size,
        size,
        width,
        height,
        "photo stored"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        "photo_upload",
        "garage_photos",
        serde_json::json!({ "photo_id": photo_id, "garage_id": garage.id, "is_primary": upload.is_primary }),
    )
    .await;

    Ok(ApiResponse::success(
        "Photo uploaded",
        PhotoCreated {
            photo: PhotoLink {
                id: photo_id,
                url: photo_path(photo_id),
            },
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_photo(state: &AppState, id: Uuid) -> AppResult<PhotoContent> {
    let photo = GaragePhotos::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    match (photo.data, non_empty(photo.url.as_deref())) {
        (Some(bytes), _) => Ok(PhotoContent::Embedded {
            bytes,
            mime_type: photo
                .mime_type
                .unwrap_or_else(|| OUTPUT_MIME_TYPE.to_string()),
        }),
        (None, Some(url)) => Ok(PhotoContent::Redirect(url.to_string())),
        (None, None) => Err(AppError::NotFound),
    }
}

pub async fn delete_photo(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let garage_id: Uuid = GaragePhotos::find_by_id(id)
        .select_only()
        .column(PhotoCol::GarageId)
        .into_tuple()
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    find_managed_garage(&state.orm, user, garage_id).await?;

    GaragePhotos::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "photo_delete",
        "garage_photos",
        serde_json::json!({ "photo_id": id, "garage_id": garage_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "ok": true }),
        Some(Meta::empty()),
    ))
}
