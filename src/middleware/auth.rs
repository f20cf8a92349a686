use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, models::UserRole};

/// Identity carried by a validated bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin.as_str()
    }

    /// True when the caller is `user_id` or an admin.
    pub fn can_act_for(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.is_admin()
    }
}

/// Extracts an identity when an `Authorization` header is present; guests get `None`.
/// A header that is present but invalid is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

pub fn ensure_role(user: &AuthUser, role: UserRole) -> Result<(), AppError> {
    if user.role != role.as_str() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, UserRole::Admin)
}

/// Garage owners and admins may manage garages.
pub fn ensure_garage_manager(user: &AuthUser) -> Result<(), AppError> {
    if user.is_admin() || user.role == UserRole::GarageOwner.as_str() {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

pub fn jwt_secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))
}

fn decode_bearer(auth_str: &str) -> Result<AuthUser, AppError> {
    if !auth_str.starts_with("Bearer ") {
        return Err(AppError::Unauthorized("Invalid Authorization scheme".into()));
    }
    let token = auth_str.trim_start_matches("Bearer ").trim();
    let secret = jwt_secret()?;

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

fn authorization_header(parts: &Parts) -> Result<Option<&str>, AppError> {
    match parts.headers.get(header::AUTHORIZATION) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into())),
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_str = authorization_header(parts)?
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;
        decode_bearer(auth_str)
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match authorization_header(parts)? {
            None => Ok(MaybeAuthUser(None)),
            Some(auth_str) => decode_bearer(auth_str).map(|user| MaybeAuthUser(Some(user))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: role.as_str().into(),
        }
    }

    #[test]
    fn only_owners_and_admins_manage_garages() {
        assert!(ensure_garage_manager(&user(UserRole::GarageOwner)).is_ok());
        assert!(ensure_garage_manager(&user(UserRole::Admin)).is_ok());
        assert!(matches!(
            ensure_garage_manager(&user(UserRole::Client)),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn admins_act_for_anyone() {
        let admin = user(UserRole::Admin);
        let client = user(UserRole::Client);
        assert!(admin.can_act_for(client.user_id));
        assert!(client.can_act_for(client.user_id));
        assert!(!client.can_act_for(admin.user_id));
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        assert!(matches!(
            decode_bearer("Basic abc"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
