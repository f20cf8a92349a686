mod common;

use std::io::Cursor;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use garagematch_api::{
    dto::garages::CreateGarageRequest,
    entity::{
        garage_photos::ActiveModel as PhotoActive,
        users::Entity as Users,
    },
    middleware::auth::AuthUser,
    models::{Garage, UserRole},
    routes::create_api_router,
    routes::JSON_BODY_LIMIT,
    services::{auth_service::issue_token, garage_service, garage_service::SEARCH_UNAVAILABLE},
    state::AppState,
};
use image::{ImageFormat, Rgb, RgbImage};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, Set};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use common::{
    StaticGeocoder, create_user, ensure_jwt_secret, setup_state, unique_tag, unreachable_state,
};

const BOUNDARY: &str = "garagematch-upload-boundary";

fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", create_api_router(state.photos.max_upload_bytes))
        .with_state(state)
}

async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, headers, body))
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

fn get(uri: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder().uri(uri).body(Body::empty())?)
}

fn error_message(body: &Bytes) -> anyhow::Result<String> {
    let value: Value = serde_json::from_slice(body)?;
    Ok(value["data"]["error"]
        .as_str()
        .expect("error envelope")
        .to_string())
}

async fn bearer(state: &AppState, user: &AuthUser) -> anyhow::Result<String> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .expect("user row");
    Ok(issue_token(&model)?)
}

async fn garage_for(state: &AppState, owner: &AuthUser) -> anyhow::Result<Garage> {
    Ok(garage_service::create_garage(
        state,
        owner,
        CreateGarageRequest {
            name: Some(format!("Http Garage {}", unique_tag())),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("garage"))
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([20, 90, 160]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// PNG of pseudo-random pixels, so it stays large after compression.
fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let mut seed: u32 = 0x9e37_79b9;
    let image = RgbImage::from_fn(width, height, |_, _| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let [r, g, b, _] = seed.to_le_bytes();
        Rgb([r, g, b])
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

fn multipart_body(garage_id: Uuid, file: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"garage_id\"\r\n\r\n{garage_id}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"is_primary\"\r\n\r\ntrue\r\n")
            .as_bytes(),
    );
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"bay.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(token: &str, body: Vec<u8>) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri("/api/photos")
        .header(header::AUTHORIZATION, token)
        .header(header::CONTENT_LENGTH, body.len())
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))?)
}

#[tokio::test]
async fn malformed_input_gets_the_error_envelope() -> anyhow::Result<()> {
    ensure_jwt_secret();
    let app = app(unreachable_state()?);

    let request = json_request(Method::POST, "/api/bookings", None, json!({ "otp": 1234 }))?;
    let (status, _, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body)?.contains("otp"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/bookings")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, _, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    error_message(&body)?;

    let (status, _, body) = send(&app, get("/api/garages?take=abc")?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body)?.contains("take"));

    let (status, _, body) = send(&app, get("/api/garages/not-a-uuid")?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    error_message(&body)?;

    Ok(())
}

#[tokio::test]
async fn json_bodies_are_capped_at_one_mebibyte() -> anyhow::Result<()> {
    ensure_jwt_secret();
    let app = app(unreachable_state()?);

    let body = format!("{{\"notes\":\"{}\"}}", "x".repeat(JSON_BODY_LIMIT));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/bookings")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))?;
    let (status, _, _) = send(&app, request).await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    Ok(())
}

#[tokio::test]
async fn invalid_token_on_booking_is_not_treated_as_guest() -> anyhow::Result<()> {
    ensure_jwt_secret();
    let app = app(unreachable_state()?);

    let request = json_request(
        Method::POST,
        "/api/bookings",
        Some("Bearer not-a-real-token"),
        json!({
            "garage_id": Uuid::new_v4(),
            "start_time": "2030-01-01T10:00:00Z",
            "end_time": "2030-01-01T12:00:00Z",
            "contact_email": "guest@example.com",
            "otp": "1234"
        }),
    )?;
    let (status, _, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    error_message(&body)?;
    Ok(())
}

#[tokio::test]
async fn search_degrades_to_a_warning_when_the_store_fails() -> anyhow::Result<()> {
    ensure_jwt_secret();
    let app = app(unreachable_state()?);

    let (status, _, body) = send(&app, get("/api/garages?city=Utrecht")?).await?;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body)?;
    assert_eq!(value["data"]["warning"], SEARCH_UNAVAILABLE);
    assert_eq!(value["data"]["items"], json!([]));
    Ok(())
}

#[tokio::test]
async fn favorite_toggle_answers_created_then_ok() -> anyhow::Result<()> {
    ensure_jwt_secret();
    let Some(state) = setup_state(StaticGeocoder::default()).await? else {
        return Ok(());
    };
    let owner = create_user(&state, UserRole::GarageOwner, "owner").await?;
    let client = create_user(&state, UserRole::Client, "client").await?;
    let garage = garage_for(&state, &owner).await?;
    let token = bearer(&state, &client).await?;
    let app = app(state);

    let toggle = || {
        json_request(
            Method::POST,
            "/api/favorites",
            Some(token.as_str()),
            json!({ "garage_id": garage.id }),
        )
    };

    let (status, _, body) = send(&app, toggle()?).await?;
    assert_eq!(status, StatusCode::CREATED);
    let value: Value = serde_json::from_slice(&body)?;
    assert_eq!(value["data"]["toggled"], "added");

    let (status, _, body) = send(&app, toggle()?).await?;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body)?;
    assert_eq!(value["data"]["toggled"], "removed");

    let (status, _, _) = send(
        &app,
        json_request(Method::POST, "/api/favorites", None, json!({ "garage_id": garage.id }))?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn photos_upload_over_multipart_and_serve_with_cache_headers() -> anyhow::Result<()> {
    ensure_jwt_secret();
    let Some(state) = setup_state(StaticGeocoder::default()).await? else {
        return Ok(());
    };
    let owner = create_user(&state, UserRole::GarageOwner, "owner").await?;
    let garage = garage_for(&state, &owner).await?;
    let token = bearer(&state, &owner).await?;
    let app = app(state);

    let (status, _, body) = send(&app, upload_request(&token, multipart_body(garage.id, None))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body)?.contains("file"));

    let not_multipart = json_request(
        Method::POST,
        "/api/photos",
        Some(token.as_str()),
        json!({ "garage_id": garage.id }),
    )?;
    let (status, _, body) = send(&app, not_multipart).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    error_message(&body)?;

    let image = png(640, 480);
    let (status, _, body) = send(
        &app,
        upload_request(&token, multipart_body(garage.id, Some(&image)))?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let value: Value = serde_json::from_slice(&body)?;
    let url = value["data"]["photo"]["url"]
        .as_str()
        .expect("photo url")
        .to_string();
    assert!(url.starts_with("/api/photos/"));

    let (status, headers, body) = send(&app, get(&url)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );
    assert_eq!(image::guess_format(&body)?, ImageFormat::Jpeg);
    Ok(())
}

#[tokio::test]
async fn url_only_photos_redirect_and_empty_ones_are_missing() -> anyhow::Result<()> {
    ensure_jwt_secret();
    let Some(state) = setup_state(StaticGeocoder::default()).await? else {
        return Ok(());
    };
    let owner = create_user(&state, UserRole::GarageOwner, "owner").await?;
    let garage = garage_for(&state, &owner).await?;

    let photo = |url: Option<&str>| PhotoActive {
        id: Set(Uuid::new_v4()),
        garage_id: Set(garage.id),
        data: Set(None),
        mime_type: Set(None),
        width: Set(None),
        height: Set(None),
        size: Set(None),
        url: Set(url.map(str::to_string)),
        is_primary: Set(false),
        created_at: NotSet,
    };
    let external = photo(Some("https://images.example.com/bay-1.jpg"))
        .insert(&state.orm)
        .await?;
    let empty = photo(None).insert(&state.orm).await?;
    let app = app(state);

    let (status, headers, _) = send(&app, get(&format!("/api/photos/{}", external.id))?).await?;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        headers[header::LOCATION],
        "https://images.example.com/bay-1.jpg"
    );

    let (status, _, body) = send(&app, get(&format!("/api/photos/{}", empty.id))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    error_message(&body)?;

    let (status, _, _) = send(&app, get(&format!("/api/photos/{}", Uuid::new_v4()))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn photo_uploads_may_exceed_the_json_limit() -> anyhow::Result<()> {
    ensure_jwt_secret();
    let Some(state) = setup_state(StaticGeocoder::default()).await? else {
        return Ok(());
    };
    let owner = create_user(&state, UserRole::GarageOwner, "owner").await?;
    let garage = garage_for(&state, &owner).await?;
    let token = bearer(&state, &owner).await?;
    let app = app(state);

    let image = noisy_png(1000, 800);
    assert!(image.len() > JSON_BODY_LIMIT);

    let (status, _, _) = send(
        &app,
        upload_request(&token, multipart_body(garage.id, Some(&image)))?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}
