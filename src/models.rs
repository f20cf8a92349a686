use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{bookings, favorites, garage_photos, garages, messages, reviews, users};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Client,
    GarageOwner,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::GarageOwner => "garage_owner",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" => Some(UserRole::Client),
            "garage_owner" => Some(UserRole::GarageOwner),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GarageStatus {
    Pending,
    Active,
    Inactive,
}

impl GarageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GarageStatus::Pending => "pending",
            GarageStatus::Active => "active",
            GarageStatus::Inactive => "inactive",
        }
    }
}

/// Public user profile. The password hash never leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            phone: model.phone,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Garage {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub hourly_rate: Option<i64>,
    pub daily_rate: Option<i64>,
    #[schema(value_type = Option<Object>)]
    pub amenities: Option<Value>,
    pub status: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<garages::Model> for Garage {
    fn from(model: garages::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            description: model.description,
            address_line1: model.address_line1,
            address_line2: model.address_line2,
            city: model.city,
            state: model.state,
            postal_code: model.postal_code,
            country: model.country,
            hourly_rate: model.hourly_rate,
            daily_rate: model.daily_rate,
            amenities: model.amenities,
            status: model.status,
            is_verified: model.is_verified,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Photo metadata; the bytes are served by `GET /api/photos/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Photo {
    pub id: Uuid,
    pub garage_id: Uuid,
    pub url: String,
    pub mime_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub size: Option<i32>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&garage_photos::Model> for Photo {
    fn from(model: &garage_photos::Model) -> Self {
        Self {
            id: model.id,
            garage_id: model.garage_id,
            url: photo_url(model),
            mime_type: model.mime_type.clone(),
            width: model.width,
            height: model.height,
            size: model.size,
            is_primary: model.is_primary,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Public address of a photo: embedded bytes are served by the API, otherwise
/// the external url is used as-is.
pub fn photo_url(model: &garage_photos::Model) -> String {
    if model.data.is_some() {
        format!("/api/photos/{}", model.id)
    } else {
        model.url.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub garage_id: Uuid,
    pub user_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub total_price: Option<i64>,
    pub notes: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<bookings::Model> for Booking {
    fn from(model: bookings::Model) -> Self {
        Self {
            id: model.id,
            garage_id: model.garage_id,
            user_id: model.user_id,
            start_time: model.start_time.with_timezone(&Utc),
            end_time: model.end_time.with_timezone(&Utc),
            status: model.status,
            total_price: model.total_price,
            notes: model.notes,
            contact_email: model.contact_email,
            contact_phone: model.contact_phone,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub garage_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<favorites::Model> for Favorite {
    fn from(model: favorites::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            garage_id: model.garage_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub garage_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            garage_id: model.garage_id,
            user_id: model.user_id,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Chat message. `created_at` is epoch milliseconds, the unit pollers send back as `since`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: String,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub body: String,
    pub created_at: i64,
}

impl From<messages::Model> for Message {
    fn from(model: messages::Model) -> Self {
        Self {
            id: model.id,
            conversation_id: model.conversation_id,
            from_user_id: model.from_user_id,
            to_user_id: model.to_user_id,
            body: model.body,
            created_at: model.created_at.timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(UserRole::parse(" Garage_Owner "), Some(UserRole::GarageOwner));
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("mechanic"), None);
    }

    #[test]
    fn booking_status_round_trips_through_its_column_value() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("archived"), None);
    }

    #[test]
    fn embedded_photos_are_served_by_the_api() {
        let id = Uuid::new_v4();
        let now = Utc::now().fixed_offset();
        let mut photo = garage_photos::Model {
            id,
            garage_id: Uuid::new_v4(),
            data: Some(vec![1, 2, 3]),
            mime_type: Some("image/jpeg".into()),
            width: Some(1),
            height: Some(1),
            size: Some(3),
            url: Some("https://cdn.example.com/a.jpg".into()),
            is_primary: false,
            created_at: now,
        };
        assert_eq!(photo_url(&photo), format!("/api/photos/{id}"));

        photo.data = None;
        assert_eq!(photo_url(&photo), "https://cdn.example.com/a.jpg");

        photo.url = None;
        assert_eq!(photo_url(&photo), "");
    }
}
