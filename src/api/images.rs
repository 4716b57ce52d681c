use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppJson, AppState, AuthUser};
use crate::models::{ImageDetailResponse, ImageSummary, UpdateImageRequest, UploadImagesResponse};
use crate::services::image_service::UploadedFile;
use crate::services::{FileService, ImageService};

const IMAGES_FIELD: &str = "images";

pub fn routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/me/advertisements/:id/images",
            get(list_images).post(upload_images),
        )
        .route(
            "/me/advertisements/:id/images/:image_id",
            get(get_image)
                .put(update_image)
                .patch(update_image)
                .delete(delete_image),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_size))
}

/// Изображения объявления
#[utoipa::path(
    get,
    path = "/api/v1/me/advertisements/{id}/images",
    tag = "images",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Advertisement ID")
    ),
    responses(
        (status = 200, description = "Images", body = Vec<ImageSummary>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Advertisement not found")
    )
)]
pub async fn list_images(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<ImageSummary>>> {
    ImageService::authorize_owner(&state.pool, id, auth_user.user_id).await?;

    let images = ImageService::summaries(&state.pool, id).await?;
    Ok(Json(images))
}

/// Загрузка изображений объявления
#[utoipa::path(
    post,
    path = "/api/v1/me/advertisements/{id}/images",
    tag = "images",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Advertisement ID")
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Images uploaded", body = UploadImagesResponse),
        (status = 400, description = "No images in request"),
        (status = 403, description = "Not the owner"),
        (status = 422, description = "Invalid image format")
    )
)]
pub async fn upload_images(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadImagesResponse>)> {
    ImageService::authorize_owner(&state.pool, id, auth_user.user_id).await?;

    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        uploads.push(UploadedFile {
            file_name,
            data: data.to_vec(),
        });
    }

    if uploads.is_empty() {
        return Err(AppError::BadRequest("No images provided".to_string()));
    }

    let file_service = FileService::new(&state.config).await?;
    let response = ImageService::upload(&state.pool, &file_service, id, uploads).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Детали изображения с разрешением
#[utoipa::path(
    get,
    path = "/api/v1/me/advertisements/{id}/images/{image_id}",
    tag = "images",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Advertisement ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image details", body = ImageDetailResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn get_image(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ImageDetailResponse>> {
    ImageService::authorize_owner(&state.pool, id, auth_user.user_id).await?;

    let image = ImageService::get_details(&state.pool, id, image_id).await?;
    let file_service = FileService::new(&state.config).await?;
    let resolution = ImageService::resolution(&file_service, &image).await?;

    Ok(Json(ImageDetailResponse {
        id: image.id,
        image: image.url,
        is_main: image.is_main,
        resolution,
    }))
}

/// Назначение главного изображения
#[utoipa::path(
    patch,
    path = "/api/v1/me/advertisements/{id}/images/{image_id}",
    tag = "images",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Advertisement ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    request_body = UpdateImageRequest,
    responses(
        (status = 200, description = "Image updated", body = ImageSummary),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Image not found"),
        (status = 422, description = "is_main can only be set to true")
    )
)]
pub async fn update_image(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<UpdateImageRequest>,
) -> AppResult<Json<ImageSummary>> {
    ImageService::authorize_owner(&state.pool, id, auth_user.user_id).await?;

    if !payload.is_main {
        return Err(AppError::Validation(
            "is_main: mark another image as main instead of clearing it".to_string(),
        ));
    }

    let image = ImageService::set_main(&state.pool, id, image_id).await?;
    Ok(Json(ImageSummary::from(image)))
}

/// Удаление изображения
#[utoipa::path(
    delete,
    path = "/api/v1/me/advertisements/{id}/images/{image_id}",
    tag = "images",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Advertisement ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn delete_image(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    ImageService::authorize_owner(&state.pool, id, auth_user.user_id).await?;

    let image = ImageService::delete(&state.pool, id, image_id).await?;

    let file_service = FileService::new(&state.config).await?;
    file_service.delete_files_quietly(&[image.storage_key]).await;

    Ok(StatusCode::NO_CONTENT)
}
