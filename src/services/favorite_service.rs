use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::favorites::{
        FavoriteEntry, FavoriteGarageCard, FavoriteList, FavoriteToggle, ToggleFavoriteRequest,
        ToggleOutcome,
    },
    entity::{
        favorites::{ActiveModel as FavoriteActive, Column as FavoriteCol, Entity as Favorites},
        garages::Entity as Garages,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Favorite,
    response::{ApiResponse, Meta},
    services::garage_service::{photo_refs, representative_image},
    state::AppState,
};

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<FavoriteList>> {
    let rows = Favorites::find()
        .filter(FavoriteCol::UserId.eq(user.user_id))
        .order_by_desc(FavoriteCol::CreatedAt)
        .find_also_related(Garages)
        .all(&state.orm)
        .await?;

    let garage_ids: Vec<Uuid> = rows.iter().map(|(f, _)| f.garage_id).collect();
    let photos = photo_refs(&state.orm, &garage_ids).await?;

    let items: Vec<FavoriteEntry> = rows
        .into_iter()
        .filter_map(|(favorite, garage)| {
            let garage = garage?;
            Some(FavoriteEntry {
                id: favorite.id,
                created_at: favorite.created_at.with_timezone(&Utc),
                garage: FavoriteGarageCard {
                    image: photos
                        .get(&garage.id)
                        .map(|p| representative_image(p))
                        .unwrap_or_default(),
                    id: garage.id,
                    name: garage.name,
                    city: garage.city,
                    postal_code: garage.postal_code,
                },
            })
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Favorites",
        FavoriteList { items },
        Some(Meta::total(total)),
    ))
}

/// Flip the (user, garage) favorite. The delete is conditional and the insert
/// ignores a concurrent duplicate, so racing toggles never fail on the unique key.
pub async fn toggle_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: ToggleFavoriteRequest,
) -> AppResult<ApiResponse<FavoriteToggle>> {
    let garage_id = payload
        .garage_id
        .ok_or_else(|| AppError::BadRequest("garage_id is required".into()))?;
    Garages::find_by_id(garage_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let removed = Favorites::delete_many()
        .filter(FavoriteCol::UserId.eq(user.user_id))
        .filter(FavoriteCol::GarageId.eq(garage_id))
        .exec(&state.orm)
        .await?;

    if removed.rows_affected > 0 {
        audit::record(
            &state.pool,
            Some(user.user_id),
            "favorite_remove",
            "favorites",
            serde_json::json!({ "garage_id": garage_id }),
        )
        .await;
        return Ok(ApiResponse::success(
            "Removed from favorites",
            FavoriteToggle {
                toggled: ToggleOutcome::Removed,
                favorite: None,
            },
            Some(Meta::empty()),
        ));
    }

    let active = FavoriteActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        garage_id: Set(garage_id),
        created_at: NotSet,
    };
    Favorites::insert(active)
        .on_conflict(
            OnConflict::columns([FavoriteCol::UserId, FavoriteCol::GarageId])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(&state.orm)
        .await?;

    let favorite = Favorites::find()
        .filter(FavoriteCol::UserId.eq(user.user_id))
        .filter(FavoriteCol::GarageId.eq(garage_id))
        .one(&state.orm)
        .await?
        .map(Favorite::from);

    audit::record(
        &state.pool,
        Some(user.user_id),
        "favorite_add",
        "favorites",
        serde_json::json!({ "garage_id": garage_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to favorites",
        FavoriteToggle {
            toggled: ToggleOutcome::Added,
            favorite,
        },
        Some(Meta::empty()),
    ))
}
