pub mod auth_service;
pub mod booking_service;
pub mod favorite_service;
pub mod garage_service;
pub mod message_service;
pub mod photo_service;
pub mod review_service;
pub mod user_service;
