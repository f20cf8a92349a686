use std::collections::HashMap;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    db::{DbPool, OrmConn},
    dto::garages::{
        CreateGarageRequest, GarageDetail, GarageSearchResult, GarageSummary, UpdateGarageRequest,
    },
    entity::{
        garage_photos::{Column as PhotoCol, Entity as GaragePhotos},
        garages::{ActiveModel as GarageActive, Column as GarageCol, Entity as Garages, Model as GarageModel},
    },
    error::{AppError, AppResult},
    geo::{GeoPoint, Geocoder, compare_by_distance, haversine_km},
    middleware::auth::{AuthUser, ensure_admin, ensure_garage_manager},
    models::{Garage, GarageStatus, Photo},
    response::{ApiResponse, Meta},
    routes::params::{GarageSearchQuery, contains_pattern, non_empty},
    state::AppState,
};

/// Garages per search that are geocoded for distance sorting.
pub const GEOCODE_LIMIT: usize = 15;
pub const SEARCH_UNAVAILABLE: &str = "search unavailable";
const DEMO_WARNING: &str = "no garages matched, showing demo listings";

/// Photo metadata without the embedded bytes.
#[derive(Debug, Clone, FromQueryResult)]
pub struct PhotoRef {
    pub id: Uuid,
    pub garage_id: Uuid,
    pub url: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub size: Option<i32>,
    pub is_primary: bool,
    pub has_data: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl PhotoRef {
    pub fn public_url(&self) -> String {
        if self.has_data {
            format!("/api/photos/{}", self.id)
        } else {
            self.url.clone().unwrap_or_default()
        }
    }

    pub fn into_photo(self) -> Photo {
        Photo {
            url: self.public_url(),
            id: self.id,
            garage_id: self.garage_id,
            mime_type: self.mime_type,
            width: self.width,
            height: self.height,
            size: self.size,
            is_primary: self.is_primary,
            created_at: self.created_at.with_timezone(&Utc),
        }
    }
}

/// Average rating and review count for one garage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReviewStats {
    pub rating: f64,
    pub reviews: i64,
}

#[derive(sqlx::FromRow)]
struct ReviewStatsRow {
    garage_id: Uuid,
    rating: f64,
    reviews: i64,
}

/// Photos of the given garages, oldest first, grouped per garage.
pub async fn photo_refs(orm: &OrmConn, garage_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<PhotoRef>>> {
    if garage_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let refs = GaragePhotos::find()
        .select_only()
        .columns([
            PhotoCol::Id,
            PhotoCol::GarageId,
            PhotoCol::Url,
            PhotoCol::MimeType,
            PhotoCol::Width,
            PhotoCol::Height,
            PhotoCol::Size,
            PhotoCol::IsPrimary,
            PhotoCol::CreatedAt,
        ])
        .column_as(Expr::col(PhotoCol::Data).is_not_null(), "has_data")
        .filter(PhotoCol::GarageId.is_in(garage_ids.iter().copied()))
        .order_by_asc(PhotoCol::CreatedAt)
        .into_model::<PhotoRef>()
        .all(orm)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<PhotoRef>> = HashMap::new();
    for photo in refs {
        grouped.entry(photo.garage_id).or_default().push(photo);
    }
    Ok(grouped)
}

/// Rating aggregates for a page of garages in one grouped query.
pub async fn review_stats(pool: &DbPool, garage_ids: &[Uuid]) -> AppResult<HashMap<Uuid, ReviewStats>> {
    if garage_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, ReviewStatsRow>(
        r#"
        SELECT garage_id, AVG(rating)::float8 AS rating, COUNT(*) AS reviews
        FROM reviews
        WHERE garage_id = ANY($1)
        GROUP BY garage_id
        "#,
    )
    .bind(garage_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            (
                row.garage_id,
                ReviewStats {
                    rating: row.rating,
                    reviews: row.reviews,
                },
            )
        })
        .collect())
}

/// Primary photo, else the first one, else an empty string.
pub fn representative_image(photos: &[PhotoRef]) -> String {
    photos
        .iter()
        .find(|p| p.is_primary)
        .or_else(|| photos.first())
        .map(PhotoRef::public_url)
        .unwrap_or_default()
}

pub fn location_label(address_line1: Option<&str>, city: Option<&str>) -> String {
    [address_line1, city]
        .into_iter()
        .filter_map(|part| non_empty(part))
        .collect::<Vec<_>>()
        .join(", ")
}

fn geocode_address(item: &GarageSummary) -> String {
    [&item.city, &item.postal_code, &item.country]
        .into_iter()
        .filter_map(|part| non_empty(part.as_deref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn summarize(garage: GarageModel, photos: &[PhotoRef], stats: ReviewStats) -> GarageSummary {
    GarageSummary {
        image: representative_image(photos),
        rating: stats.rating,
        reviews: stats.reviews,
        location: location_label(garage.address_line1.as_deref(), garage.city.as_deref()),
        id: garage.id,
        name: garage.name,
        description: garage.description,
        city: garage.city,
        postal_code: garage.postal_code,
        address_line1: garage.address_line1,
        address_line2: garage.address_line2,
        country: garage.country,
        lat: None,
        lon: None,
        distance_km: None,
    }
}

fn search_condition(query: &GarageSearchQuery) -> Condition {
    let mut condition = Condition::all();
    if let Some(q) = non_empty(query.q.as_deref()) {
        let pattern = contains_pattern(q);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(GarageCol::Name).ilike(pattern.clone()))
                .add(Expr::col(GarageCol::Description).ilike(pattern.clone()))
                .add(Expr::col(GarageCol::City).ilike(pattern.clone()))
                .add(Expr::col(GarageCol::AddressLine1).ilike(pattern)),
        );
    }
    if let Some(city) = non_empty(query.city.as_deref()) {
        condition = condition.add(Expr::col(GarageCol::City).ilike(contains_pattern(city)));
    }
    if let Some(postal_code) = non_empty(query.postal_code.as_deref()) {
        condition =
            condition.add(Expr::col(GarageCol::PostalCode).ilike(contains_pattern(postal_code)));
    }
    if let Some(owner_id) = query.owner_id {
        condition = condition.add(GarageCol::OwnerId.eq(owner_id));
    }
    condition
}

async fn fetch_page(
    state: &AppState,
    query: &GarageSearchQuery,
    take: i64,
    skip: i64,
) -> AppResult<(Vec<GarageSummary>, i64)> {
    let finder = Garages::find()
        .filter(search_condition(query))
        .order_by_desc(GarageCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let garages = finder
        .limit(take as u64)
        .offset(skip as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = garages.iter().map(|g| g.id).collect();
    let photos = photo_refs(&state.orm, &ids).await?;
    let stats = review_stats(&state.pool, &ids).await?;

    let items = garages
        .into_iter()
        .map(|garage| {
            let id = garage.id;
            summarize(
                garage,
                photos.get(&id).map(Vec::as_slice).unwrap_or_default(),
                stats.get(&id).copied().unwrap_or_default(),
            )
        })
        .collect();
    Ok((items, total))
}

/// Fixed listings served when a search matches nothing and the demo fallback is on.
pub fn placeholder_garages() -> Vec<GarageSummary> {
    let demo = |n: u128, name: &str, address: &str, city: &str, postal_code: &str, rating: f64| {
        GarageSummary {
            id: Uuid::from_u128(0x6a72_6167_6500_0000_0000_0000_0000_0000 | n),
            name: name.to_string(),
            description: Some("Demo listing".to_string()),
            city: Some(city.to_string()),
            postal_code: Some(postal_code.to_string()),
            address_line1: Some(address.to_string()),
            address_line2: None,
            country: Some("NL".to_string()),
            image: String::new(),
            rating,
            reviews: 0,
            location: location_label(Some(address), Some(city)),
            lat: None,
            lon: None,
            distance_km: None,
        }
    };
    vec![
        demo(1, "Autoservice Centrum", "Damrak 1", "Amsterdam", "1012 LG", 4.6),
        demo(2, "Garage De Haven", "Wilhelminakade 10", "Rotterdam", "3072 AP", 4.3),
        demo(3, "Domstad Auto", "Oudegracht 50", "Utrecht", "3511 AS", 4.1),
    ]
}

/// Caller position from explicit coordinates, else from geocoding `near`.
async fn resolve_origin(geocoder: &dyn Geocoder, query: &GarageSearchQuery) -> Option<GeoPoint> {
    if let (Some(lat), Some(lon)) = (query.lat, query.lon) {
        return Some(GeoPoint::new(lat, lon));
    }
    let near = non_empty(query.near.as_deref())?;
    match geocoder.geocode(near).await {
        Ok(point) => point,
        Err(err) => {
            tracing::warn!(error = %err, near, "origin geocoding failed");
            None
        }
    }
}

/// Geocode up to [`GEOCODE_LIMIT`] garages, one at a time, and fill in their distance.
pub async fn annotate_distances(
    geocoder: &dyn Geocoder,
    origin: &GeoPoint,
    items: &mut [GarageSummary],
) {
    for item in items.iter_mut().take(GEOCODE_LIMIT) {
        let address = geocode_address(item);
        if address.is_empty() {
            continue;
        }
        match geocoder.geocode(&address).await {
            Ok(Some(point)) => {
                item.distance_km = Some(haversine_km(origin, &point));
                item.lat = Some(point.lat);
                item.lon = Some(point.lon);
            }
            Ok(None) => {}
            Err(err) => tracing::debug!(error = %err, garage_id = %item.id, "garage geocoding failed"),
        }
    }
}

pub fn sort_by_distance(items: &mut [GarageSummary]) {
    items.sort_by(|a, b| compare_by_distance(a.distance_km, a.rating, b.distance_km, b.rating));
}

/// Public garage listing. Never fails: store errors degrade to an empty page
/// with a warning.
pub async fn search_garages(state: &AppState, query: GarageSearchQuery) -> ApiResponse<GarageSearchResult> {
    let (take, skip) = query.window();

    let result = match fetch_page(state, &query, take, skip).await {
        Ok((items, 0)) if items.is_empty() && state.search.demo_fallback => {
            let items = placeholder_garages();
            GarageSearchResult {
                total: items.len() as i64,
                items,
                warning: Some(DEMO_WARNING.to_string()),
            }
        }
        Ok((mut items, total)) => {
            if let Some(origin) = resolve_origin(state.geocoder.as_ref(), &query).await {
                annotate_distances(state.geocoder.as_ref(), &origin, &mut items).await;
                sort_by_distance(&mut items);
            }
            GarageSearchResult {
                items,
                total,
                warning: None,
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "garage search failed");
            GarageSearchResult {
                items: Vec::new(),
                total: 0,
                warning: Some(SEARCH_UNAVAILABLE.to_string()),
            }
        }
    };

    let meta = Meta::from_window(take, skip, result.total);
    ApiResponse::success("Garages", result, Some(meta))
}

pub async fn get_garage(state: &AppState, id: Uuid) -> AppResult<ApiResponse<GarageDetail>> {
    let garage = Garages::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let photos = photo_refs(&state.orm, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    let stats = review_stats(&state.pool, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();

    let detail = GarageDetail {
        image: representative_image(&photos),
        rating: stats.rating,
        reviews: stats.reviews,
        photos: photos.into_iter().map(PhotoRef::into_photo).collect(),
        garage: Garage::from(garage),
    };
    Ok(ApiResponse::success("Garage", detail, None))
}

fn ensure_non_negative(field: &str, value: Option<i64>) -> AppResult<()> {
    if value.is_some_and(|v| v < 0) {
        return Err(AppError::BadRequest(format!("{field} must not be negative")));
    }
    Ok(())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    non_empty(value).map(str::to_string)
}

pub async fn create_garage(
    state: &AppState,
    user: &AuthUser,
    payload: CreateGarageRequest,
) -> AppResult<ApiResponse<Garage>> {
    ensure_garage_manager(user)?;
    let name = non_empty(payload.name.as_deref())
        .ok_or_else(|| AppError::BadRequest("name is required".into()))?
        .to_string();
    ensure_non_negative("hourly_rate", payload.hourly_rate)?;
    ensure_non_negative("daily_rate", payload.daily_rate)?;

    let owner_id = match payload.owner_id {
        Some(owner_id) if owner_id != user.user_id => {
            ensure_admin(user)?;
            owner_id
        }
        _ => user.user_id,
    };

    let garage = GarageActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        name: Set(name),
        description: Set(optional_text(payload.description.as_deref())),
        address_line1: Set(optional_text(payload.address_line1.as_deref())),
        address_line2: Set(optional_text(payload.address_line2.as_deref())),
        city: Set(optional_text(payload.city.as_deref())),
        state: Set(optional_text(payload.state.as_deref())),
        postal_code: Set(optional_text(payload.postal_code.as_deref())),
        country: Set(optional_text(payload.country.as_deref())),
        hourly_rate: Set(payload.hourly_rate),
        daily_rate: Set(payload.daily_rate),
        amenities: Set(payload.amenities),
        status: Set(GarageStatus::Active.as_str().to_string()),
        is_verified: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(garage_id = %garage.id, owner_id = %garage.owner_id, "garage created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "garage_create",
        "garages",
        serde_json::json!({ "garage_id": garage.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Garage created",
        Garage::from(garage),
        Some(Meta::empty()),
    ))
}

/// Load a garage the caller may manage: its owner or an admin.
pub async fn find_managed_garage(orm: &OrmConn, user: &AuthUser, id: Uuid) -> AppResult<GarageModel> {
    let garage = Garages::find_by_id(id)
        .one(orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if !user.can_act_for(garage.owner_id) {
        return Err(AppError::Forbidden);
    }
    Ok(garage)
}

fn parse_garage_status(raw: &str) -> AppResult<GarageStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pending" => Ok(GarageStatus::Pending),
        "active" => Ok(GarageStatus::Active),
        "inactive" => Ok(GarageStatus::Inactive),
        _ => Err(AppError::BadRequest(format!("Unknown garage status {raw}"))),
    }
}

pub async fn update_garage(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateGarageRequest,
) -> AppResult<ApiResponse<Garage>> {
    let garage = find_managed_garage(&state.orm, user, id).await?;
    ensure_non_negative("hourly_rate", payload.hourly_rate)?;
    ensure_non_negative("daily_rate", payload.daily_rate)?;

    let mut active: GarageActive = garage.into();
    if let Some(name) = non_empty(payload.name.as_deref()) {
        active.name = Set(name.to_string());
    }

    macro_rules! set_text {
        ($($field:ident),*) => {
            $(
                if let Some(value) = payload.$field.as_deref() {
                    active.$field = Set(optional_text(Some(value)));
                }
            )*
        };
    }
    set_text!(description, address_line1, address_line2, city, state, postal_code, country);

    if payload.hourly_rate.is_some() {
        active.hourly_rate = Set(payload.hourly_rate);
    }
    if payload.daily_rate.is_some() {
        active.daily_rate = Set(payload.daily_rate);
    }
    if payload.amenities.is_some() {
        active.amenities = Set(payload.amenities);
    }
    if let Some(raw) = non_empty(payload.status.as_deref()) {
        ensure_admin(user)?;
        active.status = Set(parse_garage_status(raw)?.as_str().to_string());
    }
    if let Some(is_verified) = payload.is_verified {
        ensure_admin(user)?;
        active.is_verified = Set(is_verified);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "garage_update",
        "garages",
        serde_json::json!({ "garage_id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Garage::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_garage(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let garage = find_managed_garage(&state.orm, user, id).await?;
    Garages::delete_by_id(garage.id).exec(&state.orm).await?;

    tracing::info!(garage_id = %garage.id, "garage deleted");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "garage_delete",
        "garages",
        serde_json::json!({ "garage_id": garage.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "ok": true }),
        Some(Meta::empty()),
    ))
}
