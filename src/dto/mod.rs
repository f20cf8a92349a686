pub mod auth;
pub mod bookings;
pub mod favorites;
pub mod garages;
pub mod geocode;
pub mod messages;
pub mod photos;
pub mod reviews;
pub mod users;
