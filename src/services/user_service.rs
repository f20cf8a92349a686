use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    db::is_unique_violation,
    dto::users::{UpdateUserRequest, UserList},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{User, UserRole},
    response::{ApiResponse, Meta},
    routes::params::{UserQuery, contains_pattern, non_empty},
    services::auth_service::{hash_password, normalize_email},
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(search) = non_empty(query.q.as_deref()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(UserCol::Email).ilike(pattern.clone()))
                .add(Expr::col(UserCol::Name).ilike(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_user(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<User>> {
    if !user.can_act_for(id) {
        return Err(AppError::Forbidden);
    }
    let found = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("User", User::from(found), None))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    if !user.can_act_for(id) {
        return Err(AppError::Forbidden);
    }
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    if let Some(email) = non_empty(payload.email.as_deref()) {
        active.email = Set(normalize_email(email));
    }
    if let Some(name) = non_empty(payload.name.as_deref()) {
        active.name = Set(name.to_string());
    }
    if let Some(phone) = payload.phone.as_deref() {
        active.phone = Set(non_empty(Some(phone)).map(str::to_string));
    }
    if let Some(password) = payload.password.as_deref().filter(|p| !p.is_empty()) {
        active.password_hash = Set(hash_password(password)?);
    }
    if let Some(raw) = non_empty(payload.role.as_deref()) {
        ensure_admin(user)?;
        let role = UserRole::parse(raw)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown role {raw}")))?;
        active.role = Set(role.as_str().to_string());
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.orm).await.map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("Email already in use".into())
        } else {
            AppError::OrmError(err)
        }
    })?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_update",
        "users",
        serde_json::json!({ "user_id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %id, admin_id = %user.user_id, "user deleted");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "ok": true }),
        Some(Meta::empty()),
    ))
}
