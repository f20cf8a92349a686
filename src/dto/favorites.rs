use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Favorite;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ToggleFavoriteRequest {
    pub garage_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteToggle {
    pub toggled: ToggleOutcome,
    pub favorite: Option<Favorite>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteGarageCard {
    pub id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub image: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub garage: FavoriteGarageCard,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteList {
    pub items: Vec<FavoriteEntry>,
}
