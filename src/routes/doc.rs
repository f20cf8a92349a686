use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        bookings::{
            BookingCreated, BookingDetails, BookingList, BookingSnippet, BookingUser,
            CreateBookingRequest, UpdateBookingRequest,
        },
        favorites::{
            FavoriteEntry, FavoriteGarageCard, FavoriteList, FavoriteToggle, ToggleFavoriteRequest,
            ToggleOutcome,
        },
        garages::{
            CreateGarageRequest, GarageDetail, GarageSearchResult, GarageSummary,
            UpdateGarageRequest,
        },
        geocode::GeocodeResult,
        messages::{ConversationList, ConversationSummary, MessageList, PeerProfile, SendMessageRequest},
        photos::{PhotoCreated, PhotoLink},
        reviews::{CreateReviewRequest, ReviewEntry, ReviewList, Reviewer},
        users::{UpdateUserRequest, UserList},
    },
    geo::GeoPoint,
    models::{Booking, BookingStatus, Favorite, Garage, GarageStatus, Message, Photo, Review, User, UserRole},
    response::{ApiResponse, Meta},
    routes::{auth, bookings, favorites, garages, geocode, health, messages, photos, reviews, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::list_users,
        users::me,
        users::get_user,
        users::update_user,
        users::delete_user,
        garages::search_garages,
        garages::get_garage,
        garages::create_garage,
        garages::update_garage,
        garages::delete_garage,
        bookings::create_booking,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::update_booking,
        bookings::delete_booking,
        favorites::list_favorites,
        favorites::toggle_favorite,
        reviews::list_reviews,
        reviews::create_review,
        messages::send_message,
        messages::list_messages,
        messages::list_conversations,
        photos::upload_photo,
        photos::get_photo,
        photos::delete_photo,
        geocode::geocode
    ),
    components(
        schemas(
            User,
            UserRole,
            Garage,
            GarageStatus,
            Photo,
            Booking,
            BookingStatus,
            Favorite,
            Review,
            Message,
            GeoPoint,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UpdateUserRequest,
            UserList,
            CreateGarageRequest,
            UpdateGarageRequest,
            GarageSummary,
            GarageSearchResult,
            GarageDetail,
            CreateBookingRequest,
            UpdateBookingRequest,
            BookingCreated,
            BookingDetails,
            BookingUser,
            BookingList,
            BookingSnippet,
            ToggleFavoriteRequest,
            ToggleOutcome,
            FavoriteToggle,
            FavoriteGarageCard,
            FavoriteEntry,
            FavoriteList,
            CreateReviewRequest,
            Reviewer,
            ReviewEntry,
            ReviewList,
            SendMessageRequest,
            MessageList,
            PeerProfile,
            ConversationSummary,
            ConversationList,
            PhotoLink,
            PhotoCreated,
            GeocodeResult,
            Meta,
            ApiResponse<GarageSearchResult>,
            ApiResponse<BookingCreated>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "User accounts"),
        (name = "Garages", description = "Garage listings and search"),
        (name = "Bookings", description = "Appointments, including guest bookings"),
        (name = "Favorites", description = "Saved garages"),
        (name = "Reviews", description = "Garage ratings"),
        (name = "Messages", description = "Direct messages between clients and garages"),
        (name = "Photos", description = "Garage photo upload and delivery"),
        (name = "Geocode", description = "Address lookup"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/garages",
            "/api/bookings",
            "/api/favorites",
            "/api/messages/conversations",
            "/api/photos/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
