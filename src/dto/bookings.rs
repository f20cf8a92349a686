use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Booking;

/// Booking request. With a bearer token the booking belongs to the caller;
/// without one the contact fields and `otp` identify a guest.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub garage_id: Option<String>,
    /// RFC 3339 timestamp.
    pub start_time: Option<String>,
    /// RFC 3339 timestamp.
    pub end_time: Option<String>,
    pub total_price: Option<i64>,
    pub notes: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingCreated {
    pub booking: Booking,
    /// User the booking is linked to; `None` when guest resolution failed.
    pub user_id: Option<Uuid>,
    pub garage_owner_id: Uuid,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBookingRequest {
    pub status: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub garage_name: Option<String>,
    pub user: Option<BookingUser>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<BookingDetails>,
}

/// Latest booking of a chat peer at one of the caller's garages.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingSnippet {
    pub id: Uuid,
    pub garage_name: Option<String>,
    /// Epoch milliseconds.
    pub start_time: i64,
}

impl BookingSnippet {
    pub fn new(id: Uuid, garage_name: Option<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            id,
            garage_name,
            start_time: start_time.timestamp_millis(),
        }
    }
}
