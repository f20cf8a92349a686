use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    db::OrmConn,
    dto::bookings::{
        BookingCreated, BookingDetails, BookingList, BookingUser, CreateBookingRequest,
        UpdateBookingRequest,
    },
    entity::{
        bookings::{ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings, Model as BookingModel},
        garages::{Column as GarageCol, Entity as Garages, Model as GarageModel},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Booking, BookingStatus, UserRole},
    response::{ApiResponse, Meta},
    routes::params::{BookingListQuery, non_empty},
    services::auth_service::{GUEST_PASSWORD_MARKER, normalize_email},
    state::AppState,
};

/// Fixed one-time code accepted for guest bookings.
pub const GUEST_OTP: &str = "1234";
const GUEST_EMAIL_DOMAIN: &str = "guest.garagematch.local";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestContact {
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Authenticated(Uuid),
    Guest(GuestContact),
}

/// A booking request that passed validation.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub garage_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_price: Option<i64>,
    pub notes: Option<String>,
    pub contact: GuestContact,
    pub requester: Requester,
}

pub fn parse_timestamp(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::BadRequest(format!("{field} must be an RFC 3339 timestamp")))
}

fn ensure_time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if start >= end {
        return Err(AppError::BadRequest("start_time must be before end_time".into()));
    }
    Ok(())
}

/// Classify and validate a booking request.
///
/// Order matters: missing or malformed fields fail with 400 before a guest's
/// code is checked, and a wrong code fails with 401.
pub fn validate_booking_request(
    identity: Option<&AuthUser>,
    payload: CreateBookingRequest,
) -> AppResult<BookingDraft> {
    let required = || AppError::BadRequest("garage_id, start_time, end_time required".into());

    let garage_id = non_empty(payload.garage_id.as_deref()).ok_or_else(required)?;
    let garage_id = Uuid::parse_str(garage_id)
        .map_err(|_| AppError::BadRequest("garage_id must be a UUID".into()))?;
    let start_time = parse_timestamp(
        "start_time",
        non_empty(payload.start_time.as_deref()).ok_or_else(required)?,
    )?;
    let end_time = parse_timestamp(
        "end_time",
        non_empty(payload.end_time.as_deref()).ok_or_else(required)?,
    )?;
    ensure_time_range(start_time, end_time)?;

    if payload.total_price.is_some_and(|price| price < 0) {
        return Err(AppError::BadRequest("total_price must not be negative".into()));
    }

    let contact = GuestContact {
        email: non_empty(payload.contact_email.as_deref()).map(normalize_email),
        phone: non_empty(payload.contact_phone.as_deref()).map(str::to_string),
    };
    if contact.email.as_deref().is_some_and(|email| !email.contains('@')) {
        return Err(AppError::BadRequest("contact_email is not an email address".into()));
    }

    let requester = match identity {
        Some(user) => Requester::Authenticated(user.user_id),
        None => {
            if contact.email.is_none() && contact.phone.is_none() {
                return Err(AppError::BadRequest(
                    "contact_email or contact_phone required".into(),
                ));
            }
            if payload.otp.as_deref().map(str::trim) != Some(GUEST_OTP) {
                return Err(AppError::Unauthorized("Invalid OTP".into()));
            }
            Requester::Guest(contact.clone())
        }
    };

    Ok(BookingDraft {
        garage_id,
        start_time,
        end_time,
        total_price: payload.total_price,
        notes: non_empty(payload.notes.as_deref()).map(str::to_string),
        contact,
        requester,
    })
}

/// Unique placeholder address for guests who only left a phone number.
pub fn synthesize_guest_email(now: DateTime<Utc>) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!(
        "guest-{}-{}@{}",
        now.timestamp_millis(),
        &nonce[..8],
        GUEST_EMAIL_DOMAIN
    )
}

fn guest_display_name(contact: &GuestContact) -> String {
    contact
        .email
        .as_deref()
        .and_then(|email| email.split('@').next())
        .filter(|local| !local.is_empty())
        .map(str::to_string)
        .or_else(|| contact.phone.as_ref().map(|phone| format!("Guest {phone}")))
        .unwrap_or_else(|| "Guest".to_string())
}

/// Find or create the placeholder user behind a guest booking.
///
/// Email guests go through a single upsert on the unique email, so repeated
/// bookings with one address resolve to one user even under concurrency.
pub async fn resolve_guest_user(orm: &OrmConn, contact: &GuestContact) -> Result<Uuid, DbErr> {
    let email = match &contact.email {
        Some(email) => email.clone(),
        None => synthesize_guest_email(Utc::now()),
    };

    let active = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(GUEST_PASSWORD_MARKER.to_string()),
        name: Set(guest_display_name(contact)),
        role: Set(UserRole::Client.as_str().to_string()),
        phone: Set(contact.phone.clone()),
        created_at: NotSet,
        updated_at: NotSet,
    };

    let user = Users::insert(active)
        .on_conflict(
            OnConflict::column(UserCol::Email)
                .update_column(UserCol::Email)
                .to_owned(),
        )
        .exec_with_returning(orm)
        .await?;
    Ok(user.id)
}

pub async fn create_booking(
    state: &AppState,
    identity: Option<&AuthUser>,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<BookingCreated>> {
    let draft = validate_booking_request(identity, payload)?;

    let garage = Garages::find_by_id(draft.garage_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let user_id = match &draft.requester {
        Requester::Authenticated(user_id) => Some(*user_id),
        Requester::Guest(contact) => match resolve_guest_user(&state.orm, contact).await {
            Ok(user_id) => {
                tracing::info!(user_id = %user_id, "guest user resolved");
                Some(user_id)
            }
            Err(err) => {
                tracing::warn!(error = %err, "guest user resolution failed, booking without user");
                None
            }
        },
    };

    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        garage_id: Set(garage.id),
        user_id: Set(user_id),
        start_time: Set(draft.start_time.into()),
        end_time: Set(draft.end_time.into()),
        status: Set(BookingStatus::Pending.as_str().to_string()),
        total_price: Set(draft.total_price),
        notes: Set(draft.notes),
        contact_email: Set(draft.contact.email),
        contact_phone: Set(draft.contact.phone),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(
        booking_id = %booking.id,
        garage_id = %garage.id,
        guest = matches!(draft.requester, Requester::Guest(_)),
        "booking created"
    );
    audit::record(
        &state.pool,
        user_id,
        "booking_create",
        "bookings",
        serde_json::json!({ "booking_id": booking.id, "garage_id": garage.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Booking created",
        BookingCreated {
            booking: Booking::from(booking),
            user_id,
            garage_owner_id: garage.owner_id,
        },
        Some(Meta::empty()),
    ))
}

async fn owned_garage_ids(state: &AppState, owner_id: Uuid) -> AppResult<Vec<Uuid>> {
    let ids = Garages::find()
        .filter(GarageCol::OwnerId.eq(owner_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|g| g.id)
        .collect();
    Ok(ids)
}

async fn list_condition(
    state: &AppState,
    user: &AuthUser,
    query: &BookingListQuery,
) -> AppResult<Condition> {
    let mut condition = Condition::all();
    if user.is_admin() {
        if let Some(user_id) = query.user_id {
            condition = condition.add(BookingCol::UserId.eq(user_id));
        }
        if let Some(garage_id) = query.garage_id {
            condition = condition.add(BookingCol::GarageId.eq(garage_id));
        }
        return Ok(condition);
    }

    if query.user_id.is_some_and(|id| id != user.user_id) && query.garage_id.is_none() {
        return Err(AppError::Forbidden);
    }

    let owned = owned_garage_ids(state, user.user_id).await?;
    match query.garage_id {
        Some(garage_id) if owned.contains(&garage_id) => {
            condition = condition.add(BookingCol::GarageId.eq(garage_id));
            if let Some(user_id) = query.user_id {
                condition = condition.add(BookingCol::UserId.eq(user_id));
            }
        }
        Some(garage_id) => {
            if query.user_id.is_some_and(|id| id != user.user_id) {
                return Err(AppError::Forbidden);
            }
            condition = condition
                .add(BookingCol::GarageId.eq(garage_id))
                .add(BookingCol::UserId.eq(user.user_id));
        }
        None if query.user_id.is_some() || owned.is_empty() => {
            condition = condition.add(BookingCol::UserId.eq(user.user_id));
        }
        None => {
            condition = condition.add(
                Condition::any()
                    .add(BookingCol::UserId.eq(user.user_id))
                    .add(BookingCol::GarageId.is_in(owned)),
            );
        }
    }
    Ok(condition)
}

async fn booking_users(state: &AppState, ids: Vec<Uuid>) -> AppResult<HashMap<Uuid, BookingUser>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = Users::find()
        .filter(UserCol::Id.is_in(ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| {
            (
                u.id,
                BookingUser {
                    id: u.id,
                    name: u.name,
                    email: u.email,
                    phone: u.phone,
                },
            )
        })
        .collect();
    Ok(users)
}

pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingListQuery,
) -> AppResult<ApiResponse<BookingList>> {
    let condition = list_condition(state, user, &query).await?;

    let rows = Bookings::find()
        .filter(condition)
        .order_by_desc(BookingCol::StartTime)
        .find_also_related(Garages)
        .all(&state.orm)
        .await?;

    let mut user_ids: Vec<Uuid> = rows.iter().filter_map(|(b, _)| b.user_id).collect();
    user_ids.sort();
    user_ids.dedup();
    let users = booking_users(state, user_ids).await?;

    let items: Vec<BookingDetails> = rows
        .into_iter()
        .map(|(booking, garage)| BookingDetails {
            user: booking.user_id.and_then(|id| users.get(&id).cloned()),
            garage_name: garage.map(|g| g.name),
            booking: Booking::from(booking),
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Bookings",
        BookingList { items },
        Some(Meta::total(total)),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BookingAccess {
    /// Garage owner or admin.
    Manager,
    Booker,
}

fn booking_access(user: &AuthUser, booking: &BookingModel, garage: &GarageModel) -> Option<BookingAccess> {
    if user.is_admin() || garage.owner_id == user.user_id {
        Some(BookingAccess::Manager)
    } else if booking.user_id == Some(user.user_id) {
        Some(BookingAccess::Booker)
    } else {
        None
    }
}

async fn find_with_garage(state: &AppState, id: Uuid) -> AppResult<(BookingModel, GarageModel)> {
    let (booking, garage) = Bookings::find_by_id(id)
        .find_also_related(Garages)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let garage = garage.ok_or(AppError::NotFound)?;
    Ok((booking, garage))
}

pub async fn get_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<BookingDetails>> {
    let (booking, garage) = find_with_garage(state, id).await?;
    if booking_access(user, &booking, &garage).is_none() {
        return Err(AppError::Forbidden);
    }
    let users = booking_users(state, booking.user_id.into_iter().collect()).await?;
    let details = BookingDetails {
        user: booking.user_id.and_then(|id| users.get(&id).cloned()),
        garage_name: Some(garage.name),
        booking: Booking::from(booking),
    };
    Ok(ApiResponse::success("Booking", details, None))
}

pub async fn update_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    let (booking, garage) = find_with_garage(state, id).await?;
    let access = booking_access(user, &booking, &garage).ok_or(AppError::Forbidden)?;

    let mut start_time = booking.start_time.with_timezone(&Utc);
    let mut end_time = booking.end_time.with_timezone(&Utc);
    let mut active: BookingActive = booking.into();

    if let Some(raw) = non_empty(payload.status.as_deref()) {
        let status = BookingStatus::parse(raw)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown booking status {raw}")))?;
        if access == BookingAccess::Booker && status != BookingStatus::Cancelled {
            return Err(AppError::Forbidden);
        }
        active.status = Set(status.as_str().to_string());
    }
    if let Some(raw) = non_empty(payload.start_time.as_deref()) {
        start_time = parse_timestamp("start_time", raw)?;
        active.start_time = Set(start_time.into());
    }
    if let Some(raw) = non_empty(payload.end_time.as_deref()) {
        end_time = parse_timestamp("end_time", raw)?;
        active.end_time = Set(end_time.into());
    }
    ensure_time_range(start_time, end_time)?;
    if let Some(notes) = payload.notes.as_deref() {
        active.notes = Set(non_empty(Some(notes)).map(str::to_string));
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.orm).await?;

    tracing::info!(booking_id = %updated.id, status = %updated.status, "booking updated");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "booking_update",
        "bookings",
        serde_json::json!({ "booking_id": updated.id, "status": updated.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Booking::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let (booking, garage) = find_with_garage(state, id).await?;
    if booking_access(user, &booking, &garage).is_none() {
        return Err(AppError::Forbidden);
    }

    Bookings::delete_by_id(booking.id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "booking_delete",
        "bookings",
        serde_json::json!({ "booking_id": booking.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "ok": true }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateBookingRequest {
        CreateBookingRequest {
            garage_id: Some(Uuid::new_v4().to_string()),
            start_time: Some("2025-03-01T09:00:00Z".into()),
            end_time: Some("2025-03-01T10:30:00+00:00".into()),
            ..Default::default()
        }
    }

    fn client() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: "client".into(),
        }
    }

    #[test]
    fn authenticated_request_uses_token_identity() {
        let user = client();
        let draft = validate_booking_request(Some(&user), request()).expect("valid");
        assert_eq!(draft.requester, Requester::Authenticated(user.user_id));
        assert_eq!(draft.end_time - draft.start_time, chrono::Duration::minutes(90));
    }

    #[test]
    fn guest_without_contact_is_a_validation_error() {
        let mut payload = request();
        payload.otp = Some(GUEST_OTP.into());
        assert!(matches!(
            validate_booking_request(None, payload),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn guest_with_wrong_otp_is_unauthorized() {
        let mut payload = request();
        payload.contact_email = Some("guest@example.com".into());
        payload.otp = Some("0000".into());
        assert!(matches!(
            validate_booking_request(None, payload),
            Err(AppError::Unauthorized(_))
        ));

        let mut payload = request();
        payload.contact_phone = Some("+31 6 1234 5678".into());
        assert!(matches!(
            validate_booking_request(None, payload),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn guest_with_valid_otp_normalizes_contact() {
        let mut payload = request();
        payload.contact_email = Some("  Guest@Example.COM ".into());
        payload.otp = Some(" 1234 ".into());
        let draft = validate_booking_request(None, payload).expect("valid");
        assert_eq!(
            draft.requester,
            Requester::Guest(GuestContact {
                email: Some("guest@example.com".into()),
                phone: None,
            })
        );
    }

    #[test]
    fn missing_or_malformed_fields_are_rejected() {
        let mut payload = request();
        payload.garage_id = None;
        assert!(matches!(
            validate_booking_request(Some(&client()), payload),
            Err(AppError::BadRequest(_))
        ));

        let mut payload = request();
        payload.start_time = Some("tomorrow morning".into());
        assert!(matches!(
            validate_booking_request(Some(&client()), payload),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn end_must_follow_start() {
        let mut payload = request();
        payload.end_time = payload.start_time.clone();
        assert!(matches!(
            validate_booking_request(Some(&client()), payload),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn synthesized_guest_emails_are_unique() {
        let now = Utc::now();
        let a = synthesize_guest_email(now);
        let b = synthesize_guest_email(now);
        assert_ne!(a, b);
        assert!(a.starts_with(&format!("guest-{}-", now.timestamp_millis())));
        assert!(a.ends_with("@guest.garagematch.local"));
    }

    #[test]
    fn guest_names_come_from_contact() {
        let by_email = GuestContact {
            email: Some("jan.devries@example.nl".into()),
            phone: Some("0612345678".into()),
        };
        assert_eq!(guest_display_name(&by_email), "jan.devries");

        let by_phone = GuestContact {
            email: None,
            phone: Some("0612345678".into()),
        };
        assert_eq!(guest_display_name(&by_phone), "Guest 0612345678");
    }
}
