use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::reviews::{CreateReviewRequest, ReviewEntry, ReviewList, Reviewer},
    entity::{
        garages::Entity as Garages,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::{ReviewQuery, non_empty},
    state::AppState,
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub fn validate_rating(rating: Option<i32>) -> AppResult<i32> {
    match rating {
        Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => Ok(r),
        Some(_) => Err(AppError::BadRequest(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        ))),
        None => Err(AppError::BadRequest("rating is required".into())),
    }
}

pub async fn list_reviews(state: &AppState, query: ReviewQuery) -> AppResult<ApiResponse<ReviewList>> {
    let garage_id = query
        .garage_id
        .ok_or_else(|| AppError::BadRequest("garage_id is required".into()))?;

    let items: Vec<ReviewEntry> = Reviews::find()
        .filter(ReviewCol::GarageId.eq(garage_id))
        .order_by_desc(ReviewCol::CreatedAt)
        .find_also_related(Users)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(review, author)| ReviewEntry {
            id: review.id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at.with_timezone(&Utc),
            user: Reviewer {
                id: review.user_id,
                name: author.map(|u| u.name),
            },
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::total(total)),
    ))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let garage_id = payload
        .garage_id
        .ok_or_else(|| AppError::BadRequest("garage_id is required".into()))?;
    let rating = validate_rating(payload.rating)?;

    Garages::find_by_id(garage_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        garage_id: Set(garage_id),
        user_id: Set(user.user_id),
        rating: Set(rating),
        comment: Set(non_empty(payload.comment.as_deref()).map(str::to_string)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "garage_id": garage_id, "rating": rating }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review created",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        assert_eq!(validate_rating(Some(1)).ok(), Some(1));
        assert_eq!(validate_rating(Some(5)).ok(), Some(5));
        assert!(matches!(validate_rating(Some(0)), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_rating(Some(6)), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_rating(None), Err(AppError::BadRequest(_))));
    }
}
