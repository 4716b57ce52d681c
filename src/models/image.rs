use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApartmentImage {
    pub id: Uuid,
    pub apartment_id: Uuid,
    pub storage_key: String,
    pub url: String,
    pub is_main: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageSummary {
    pub id: Uuid,
    pub image: String,
    pub is_main: bool,
}

impl From<ApartmentImage> for ImageSummary {
    fn from(image: ApartmentImage) -> Self {
        Self {
            id: image.id,
            image: image.url,
            is_main: image.is_main,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageDetailResponse {
    pub id: Uuid,
    pub image: String,
    pub is_main: bool,
    pub resolution: Resolution,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateImageRequest {
    pub is_main: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RejectedFile {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadImagesResponse {
    pub uploaded: Vec<ImageSummary>,
    pub rejected: Vec<RejectedFile>,
}
