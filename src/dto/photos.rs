use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Parsed multipart upload.
#[derive(Debug)]
pub struct PhotoUpload {
    pub garage_id: Uuid,
    pub is_primary: bool,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoLink {
    pub id: Uuid,
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoCreated {
    pub photo: PhotoLink,
}

/// What `GET /api/photos/{id}` serves.
#[derive(Debug)]
pub enum PhotoContent {
    Embedded { bytes: Vec<u8>, mime_type: String },
    Redirect(String),
}
