pub mod audit_logs;
pub mod bookings;
pub mod favorites;
pub mod garage_photos;
pub mod garages;
pub mod messages;
pub mod reviews;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use favorites::Entity as Favorites;
pub use garage_photos::Entity as GaragePhotos;
pub use garages::Entity as Garages;
pub use messages::Entity as Messages;
pub use reviews::Entity as Reviews;
pub use users::Entity as Users;
