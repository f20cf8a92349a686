use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    db::is_unique_violation,
    dto::auth::{AuthResponse, Claims, LoginRequest, RegisterRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::jwt_secret,
    models::{User, UserRole},
    response::{ApiResponse, Meta},
    routes::params::non_empty,
    state::AppState,
};

/// Stored instead of a hash for users created implicitly by guest bookings.
/// It is not a PHC string, so such accounts can never log in.
pub const GUEST_PASSWORD_MARKER: &str = "!guest-no-login";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    if stored_hash == GUEST_PASSWORD_MARKER {
        return false;
    }
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn issue_token(user: &UserModel) -> AppResult<String> {
    let secret = jwt_secret()?;
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(format!("Bearer {}", token))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let email = non_empty(payload.email.as_deref()).map(normalize_email);
    let name = non_empty(payload.name.as_deref()).map(str::to_string);
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password), Some(name)) = (email, password, name) else {
        return Err(AppError::BadRequest(
            "Email, password and name are required".into(),
        ));
    };

    let role = match non_empty(payload.role.as_deref()) {
        None => UserRole::Client,
        Some(raw) => match UserRole::parse(raw) {
            Some(UserRole::Admin) => return Err(AppError::Forbidden),
            Some(role) => role,
            None => return Err(AppError::BadRequest(format!("Unknown role {raw}"))),
        },
    };

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Email already in use".into()));
    }

    let active = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&password)?),
        name: Set(name),
        role: Set(role.as_str().to_string()),
        phone: Set(non_empty(payload.phone.as_deref()).map(str::to_string)),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let user = active.insert(&state.orm).await.map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("Email already in use".into())
        } else {
            AppError::OrmError(err)
        }
    })?;

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let token = issue_token(&user)?;
    Ok(ApiResponse::success(
        "User created",
        AuthResponse {
            user: User::from(user),
            token,
        },
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let email = non_empty(payload.email.as_deref()).map(normalize_email);
    let (Some(email), Some(password)) = (email, payload.password.filter(|p| !p.is_empty()))
    else {
        return Err(AppError::BadRequest("Email and password are required".into()));
    };

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) if verify_password(&u.password_hash, &password) => u,
        _ => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    let token = issue_token(&user)?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        AuthResponse {
            user: User::from(user),
            token,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_passwords_verify() {
        let hash = hash_password("hunter2").expect("hash");
        assert_ne!(hash, "hunter2");
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
    }

    #[test]
    fn guest_placeholder_never_verifies() {
        assert!(!verify_password(GUEST_PASSWORD_MARKER, GUEST_PASSWORD_MARKER));
        assert!(!verify_password(GUEST_PASSWORD_MARKER, ""));
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Owner@GarageMatch.com "), "owner@garagematch.com");
    }
}
