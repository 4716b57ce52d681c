use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ApartmentImage, ImageSummary, RejectedFile, Resolution, UploadImagesResponse};
use crate::services::FileService;

pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Файл из multipart-запроса до проверки
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Формат определяется по содержимому; расширение имени файла должно ему соответствовать.
pub fn sniff_image(file_name: &str, data: &[u8]) -> AppResult<ImageFormat> {
    if data.is_empty() {
        return Err(AppError::InvalidFormat("No image provided".to_string()));
    }
    if data.len() > MAX_IMAGE_SIZE {
        return Err(AppError::InvalidFormat("Image is too large".to_string()));
    }

    let format = match image::guess_format(data) {
        Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => format,
        _ => {
            return Err(AppError::InvalidFormat(
                "Only JPEG and PNG images are allowed".to_string(),
            ))
        }
    };

    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let expected = match extension.as_str() {
        "jpg" | "jpeg" => ImageFormat::Jpeg,
        "png" => ImageFormat::Png,
        _ => return Err(AppError::InvalidFormat("Invalid image extension".to_string())),
    };

    if expected != format {
        return Err(AppError::InvalidFormat(
            "Image content does not match file extension".to_string(),
        ));
    }

    Ok(format)
}

pub fn image_resolution(data: &[u8]) -> AppResult<Resolution> {
    let (width, height) = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AppError::Internal(e.to_string()))?
        .into_dimensions()
        .map_err(|e| AppError::Internal(format!("Failed to decode stored image: {}", e)))?;

    Ok(Resolution { width, height })
}

fn storage_key(apartment_id: Uuid, format: ImageFormat) -> String {
    let extension = match format {
        ImageFormat::Png => "png",
        _ => "jpg",
    };
    format!("apartments/{}/{}.{}", apartment_id, Uuid::new_v4(), extension)
}

const STORAGE_FAILURE_REASON: &str = "Image storage is unavailable";

/// Файл, прошедший проверку, с уже назначенным ключом в хранилище
#[derive(Debug)]
pub struct AcceptedImage {
    pub file_name: String,
    pub key: String,
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

pub fn classify_uploads(
    apartment_id: Uuid,
    uploads: Vec<UploadedFile>,
) -> (Vec<AcceptedImage>, Vec<RejectedFile>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for upload in uploads {
        match sniff_image(&upload.file_name, &upload.data) {
            Ok(format) => accepted.push(AcceptedImage {
                key: storage_key(apartment_id, format),
                file_name: upload.file_name,
                format,
                data: upload.data,
            }),
            Err(e) => {
                let reason = match e {
                    AppError::InvalidFormat(reason) => reason,
                    other => other.to_string(),
                };
                tracing::info!(
                    apartment_id = %apartment_id,
                    file_name = %upload.file_name,
                    reason = %reason,
                    "Image rejected"
                );
                rejected.push(RejectedFile {
                    file_name: upload.file_name,
                    reason,
                });
            }
        }
    }

    (accepted, rejected)
}

/// Пустой результат считается ошибкой: сбой хранилища важнее отказа по формату
pub fn upload_outcome(
    uploaded: Vec<ImageSummary>,
    rejected: Vec<RejectedFile>,
    storage_error: Option<AppError>,
) -> AppResult<UploadImagesResponse> {
    if uploaded.is_empty() {
        if let Some(e) = storage_error {
            return Err(e);
        }
        if let Some(first) = rejected.first() {
            return Err(AppError::InvalidFormat(first.reason.clone()));
        }
    }

    Ok(UploadImagesResponse { uploaded, rejected })
}

pub struct ImageService;

impl ImageService {
    /// Только владелец квартиры управляет её изображениями
    pub async fn authorize_owner(pool: &PgPool, apartment_id: Uuid, owner_id: Uuid) -> AppResult<()> {
        let owner: Option<(Uuid,)> = sqlx::query_as("SELECT owner_id FROM apartments WHERE id = $1")
            .bind(apartment_id)
            .fetch_optional(pool)
            .await?;

        match owner {
            None => Err(AppError::NotFound("Advertisement not found".to_string())),
            Some((id,)) if id != owner_id => Err(AppError::Forbidden),
            Some(_) => Ok(()),
        }
    }

    pub async fn list(pool: &PgPool, apartment_id: Uuid) -> AppResult<Vec<ApartmentImage>> {
        let images = sqlx::query_as::<_, ApartmentImage>(
            "SELECT * FROM apartment_images WHERE apartment_id = $1 ORDER BY created_at, id",
        )
        .bind(apartment_id)
        .fetch_all(pool)
        .await?;

        Ok(images)
    }

    pub async fn summaries(pool: &PgPool, apartment_id: Uuid) -> AppResult<Vec<ImageSummary>> {
        let images = Self::list(pool, apartment_id).await?;
        Ok(images.into_iter().map(ImageSummary::from).collect())
    }

    pub async fn get_details(
        pool: &PgPool,
        apartment_id: Uuid,
        image_id: Uuid,
    ) -> AppResult<ApartmentImage> {
        sqlx::query_as::<_, ApartmentImage>(
            "SELECT * FROM apartment_images WHERE id = $1 AND apartment_id = $2",
        )
        .bind(image_id)
        .bind(apartment_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))
    }

    pub async fn resolution(files: &FileService, image: &ApartmentImage) -> AppResult<Resolution> {
        let data = files.download_file(&image.storage_key).await?;
        image_resolution(&data)
    }

    /// Каждый файл проверяется и сохраняется отдельно: отклонённый файл не отменяет остальные.
    pub async fn upload(
        pool: &PgPool,
        files: &FileService,
        apartment_id: Uuid,
        uploads: Vec<UploadedFile>,
    ) -> AppResult<UploadImagesResponse> {
        let (accepted, mut rejected) = classify_uploads(apartment_id, uploads);
        let mut uploaded = Vec::new();
        let mut storage_error = None;

        for file in accepted {
            let url = match files
                .upload_file(&file.key, file.format.to_mime_type(), file.data)
                .await
            {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(
                        apartment_id = %apartment_id,
                        file_name = %file.file_name,
                        error = %e,
                        "Image upload to storage failed"
                    );
                    rejected.push(RejectedFile {
                        file_name: file.file_name,
                        reason: STORAGE_FAILURE_REASON.to_string(),
                    });
                    storage_error = Some(e);
                    continue;
                }
            };

            let image = match Self::insert(pool, apartment_id, &file.key, &url).await {
                Ok(image) => image,
                Err(e) => {
                    files.delete_files_quietly(&[file.key]).await;
                    return Err(e);
                }
            };

            tracing::info!(apartment_id = %apartment_id, image_id = %image.id, "Image uploaded");
            uploaded.push(ImageSummary::from(image));
        }

        upload_outcome(uploaded, rejected, storage_error)
    }

    async fn insert(pool: &PgPool, apartment_id: Uuid, key: &str, url: &str) -> AppResult<ApartmentImage> {
        let image = sqlx::query_as::<_, ApartmentImage>(
            r#"
            INSERT INTO apartment_images (apartment_id, storage_key, url)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(apartment_id)
        .bind(key)
        .bind(url)
        .fetch_one(pool)
        .await?;

        Ok(image)
    }

    /// Снимает признак главного со всех изображений квартиры и ставит его целевому
    /// в одной транзакции. Строка квартиры блокируется, чтобы параллельные вызовы
    /// выполнялись по очереди.
    pub async fn set_main(pool: &PgPool, apartment_id: Uuid, image_id: Uuid) -> AppResult<ApartmentImage> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM apartments WHERE id = $1 FOR UPDATE")
            .bind(apartment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Advertisement not found".to_string()))?;

        sqlx::query(
            "UPDATE apartment_images SET is_main = FALSE WHERE apartment_id = $1 AND is_main AND id <> $2",
        )
        .bind(apartment_id)
        .bind(image_id)
        .execute(&mut *tx)
        .await?;

        let image = sqlx::query_as::<_, ApartmentImage>(
            r#"
            UPDATE apartment_images SET is_main = TRUE
            WHERE id = $1 AND apartment_id = $2
            RETURNING *
            "#,
        )
        .bind(image_id)
        .bind(apartment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

        tx.commit().await?;

        tracing::info!(apartment_id = %apartment_id, image_id = %image_id, "Main image changed");

        Ok(image)
    }

    /// Новое главное изображение не назначается автоматически
    pub async fn delete(pool: &PgPool, apartment_id: Uuid, image_id: Uuid) -> AppResult<ApartmentImage> {
        let image = sqlx::query_as::<_, ApartmentImage>(
            "DELETE FROM apartment_images WHERE id = $1 AND apartment_id = $2 RETURNING *",
        )
        .bind(image_id)
        .bind(apartment_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

        tracing::info!(apartment_id = %apartment_id, image_id = %image_id, "Image deleted");

        Ok(image)
    }
}
