mod common;

use chrono::{Duration, Utc};
use garagematch_api::{
    dto::{
        auth::LoginRequest,
        bookings::{CreateBookingRequest, UpdateBookingRequest},
        garages::CreateGarageRequest,
    },
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings},
        users::Entity as Users,
    },
    error::AppError,
    models::{BookingStatus, UserRole},
    routes::params::{BookingListQuery, GarageSearchQuery},
    services::{
        auth_service::{self, GUEST_PASSWORD_MARKER},
        booking_service, garage_service,
    },
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::{StaticGeocoder, create_user, setup_state, unique_tag};

fn booking_request(garage_id: uuid::Uuid) -> CreateBookingRequest {
    let start = Utc::now() + Duration::days(3);
    CreateBookingRequest {
        garage_id: Some(garage_id.to_string()),
        start_time: Some(start.to_rfc3339()),
        end_time: Some((start + Duration::hours(2)).to_rfc3339()),
        total_price: Some(4500),
        ..Default::default()
    }
}

// Owner lists a garage, a client finds it and books, the owner confirms.
#[tokio::test]
async fn client_books_and_owner_confirms() -> anyhow::Result<()> {
    let Some(state) = setup_state(StaticGeocoder::default()).await? else {
        return Ok(());
    };
    let tag = unique_tag();

    let owner = create_user(&state, UserRole::GarageOwner, "owner").await?;
    let client = create_user(&state, UserRole::Client, "client").await?;
    let stranger = create_user(&state, UserRole::Client, "stranger").await?;

    let garage = garage_service::create_garage(
        &state,
        &owner,
        CreateGarageRequest {
            name: Some("Flow Garage".into()),
            city: Some(format!("Utrecht-{tag}")),
            address_line1: Some("Oudegracht 1".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("garage");

    // Case-insensitive substring match on city.
    let found = garage_service::search_garages(
        &state,
        GarageSearchQuery {
            city: Some(format!("UTRECHT-{}", tag.to_uppercase())),
            ..Default::default()
        },
    )
    .await
    .data
    .expect("search result");
    assert!(found.warning.is_none());
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].id, garage.id);
    assert_eq!(found.items[0].location, format!("Oudegracht 1, Utrecht-{tag}"));
    assert_eq!(found.items[0].rating, 0.0);

    let created = booking_service::create_booking(&state, Some(&client), booking_request(garage.id))
        .await?
        .data
        .expect("booking");
    assert_eq!(created.user_id, Some(client.user_id));
    assert_eq!(created.garage_owner_id, owner.user_id);
    assert_eq!(created.booking.status, BookingStatus::Pending.as_str());
    let booking_id = created.booking.id;

    let owner_view = booking_service::list_bookings(&state, &owner, BookingListQuery::default())
        .await?
        .data
        .expect("bookings");
    let listed = owner_view
        .items
        .iter()
        .find(|b| b.booking.id == booking_id)
        .expect("owner sees booking at own garage");
    assert_eq!(listed.garage_name.as_deref(), Some("Flow Garage"));
    assert_eq!(listed.user.as_ref().map(|u| u.id), Some(client.user_id));

    // A booker may only cancel.
    let err = booking_service::update_booking(
        &state,
        &client,
        booking_id,
        UpdateBookingRequest {
            status: Some("confirmed".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    booking_service::update_booking(
        &state,
        &owner,
        booking_id,
        UpdateBookingRequest {
            status: Some("confirmed".into()),
            ..Default::default()
        },
    )
    .await?;

    let seen = booking_service::get_booking(&state, &client, booking_id)
        .await?
        .data
        .expect("booking");
    assert_eq!(seen.booking.status, BookingStatus::Confirmed.as_str());

    let err = booking_service::get_booking(&state, &stranger, booking_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let stranger_view = booking_service::list_bookings(&state, &stranger, BookingListQuery::default())
        .await?
        .data
        .expect("bookings");
    assert!(stranger_view.items.iter().all(|b| b.booking.id != booking_id));

    let err = booking_service::list_bookings(
        &state,
        &stranger,
        BookingListQuery {
            user_id: Some(client.user_id),
            garage_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

#[tokio::test]
async fn guest_bookings_require_the_code_and_reuse_the_guest_user() -> anyhow::Result<()> {
    let Some(state) = setup_state(StaticGeocoder::default()).await? else {
        return Ok(());
    };
    let tag = unique_tag();
    let owner = create_user(&state, UserRole::GarageOwner, "owner").await?;
    let garage = garage_service::create_garage(
        &state,
        &owner,
        CreateGarageRequest {
            name: Some(format!("Guest Garage {tag}")),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("garage");

    let guest_email = format!("guest-{tag}@example.com");

    let mut wrong_code = booking_request(garage.id);
    wrong_code.contact_email = Some(guest_email.clone());
    wrong_code.otp = Some("9999".into());
    let err = booking_service::create_booking(&state, None, wrong_code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let stored = Bookings::find()
        .filter(BookingCol::GarageId.eq(garage.id))
        .count(&state.orm)
        .await?;
    assert_eq!(stored, 0);

    let mut no_contact = booking_request(garage.id);
    no_contact.otp = Some("1234".into());
    let err = booking_service::create_booking(&state, None, no_contact)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let mut first = booking_request(garage.id);
    first.contact_email = Some(guest_email.to_uppercase());
    first.otp = Some("1234".into());
    let first = booking_service::create_booking(&state, None, first)
        .await?
        .data
        .expect("booking");

    let mut second = booking_request(garage.id);
    second.contact_email = Some(guest_email.clone());
    second.otp = Some("1234".into());
    let second = booking_service::create_booking(&state, None, second)
        .await?
        .data
        .expect("booking");

    let guest_id = first.user_id.expect("guest user resolved");
    assert_eq!(second.user_id, Some(guest_id));
    assert_eq!(first.booking.contact_email.as_deref(), Some(guest_email.as_str()));

    let guest = Users::find_by_id(guest_id)
        .one(&state.orm)
        .await?
        .expect("guest user");
    assert_eq!(guest.email, guest_email);
    assert_eq!(guest.role, UserRole::Client.as_str());
    assert_eq!(guest.password_hash, GUEST_PASSWORD_MARKER);

    // Placeholder accounts cannot log in.
    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email: Some(guest_email),
            password: Some(GUEST_PASSWORD_MARKER.into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    // Phone-only guests get a synthesized address.
    let mut by_phone = booking_request(garage.id);
    by_phone.contact_phone = Some("+31 6 0000 0000".into());
    by_phone.otp = Some("1234".into());
    let by_phone = booking_service::create_booking(&state, None, by_phone)
        .await?
        .data
        .expect("booking");
    let phone_guest = Users::find_by_id(by_phone.user_id.expect("guest user"))
        .one(&state.orm)
        .await?
        .expect("guest user");
    assert!(phone_guest.email.ends_with("@guest.garagematch.local"));
    assert_eq!(phone_guest.phone.as_deref(), Some("+31 6 0000 0000"));

    Ok(())
}

#[tokio::test]
async fn booking_an_unknown_garage_is_not_found() -> anyhow::Result<()> {
    let Some(state) = setup_state(StaticGeocoder::default()).await? else {
        return Ok(());
    };
    let client = create_user(&state, UserRole::Client, "client").await?;
    let err = booking_service::create_booking(&state, Some(&client), booking_request(uuid::Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}
