use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{AppJson, AppState, AuthUser};
use crate::models::{
    ApartmentDetailResponse, ApartmentPatch, ApartmentWithAddress, CreateApartmentRequest,
};
use crate::services::{ApartmentService, FileService, ImageService};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/me/advertisements",
            get(list_advertisements).post(create_advertisement),
        )
        .route(
            "/me/advertisements/:id",
            get(get_advertisement)
                .put(replace_advertisement)
                .patch(update_advertisement)
                .delete(delete_advertisement),
        )
}

async fn build_detail(
    state: &AppState,
    record: ApartmentWithAddress,
) -> AppResult<ApartmentDetailResponse> {
    let images = ImageService::summaries(&state.pool, record.apartment.id).await?;
    Ok(ApartmentDetailResponse::new(record, images))
}

/// Объявления текущего владельца
#[utoipa::path(
    get,
    path = "/api/v1/me/advertisements",
    tag = "advertisements",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Owner advertisements", body = Vec<ApartmentDetailResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_advertisements(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<ApartmentDetailResponse>>> {
    let records = ApartmentService::list_owner_advertisements(&state.pool, auth_user.user_id).await?;

    let mut response = Vec::new();
    for record in records {
        response.push(build_detail(&state, record).await?);
    }

    Ok(Json(response))
}

/// Создание объявления вместе с адресом
#[utoipa::path(
    post,
    path = "/api/v1/me/advertisements",
    tag = "advertisements",
    security(("bearer_auth" = [])),
    request_body = CreateApartmentRequest,
    responses(
        (status = 201, description = "Advertisement created", body = ApartmentDetailResponse),
        (status = 401, description = "Not authenticated"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_advertisement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<CreateApartmentRequest>,
) -> AppResult<(StatusCode, Json<ApartmentDetailResponse>)> {
    let record = ApartmentService::create(&state.pool, auth_user.user_id, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApartmentDetailResponse::new(record, Vec::new())),
    ))
}

/// Объявление текущего владельца
#[utoipa::path(
    get,
    path = "/api/v1/me/advertisements/{id}",
    tag = "advertisements",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Advertisement ID")
    ),
    responses(
        (status = 200, description = "Advertisement", body = ApartmentDetailResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Advertisement not found")
    )
)]
pub async fn get_advertisement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApartmentDetailResponse>> {
    let record = ApartmentService::get_owner_advertisement(&state.pool, id, auth_user.user_id).await?;
    Ok(Json(build_detail(&state, record).await?))
}

/// Полное обновление объявления
#[utoipa::path(
    put,
    path = "/api/v1/me/advertisements/{id}",
    tag = "advertisements",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Advertisement ID")
    ),
    request_body = CreateApartmentRequest,
    responses(
        (status = 200, description = "Advertisement updated", body = ApartmentDetailResponse),
        (status = 404, description = "Advertisement not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn replace_advertisement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<CreateApartmentRequest>,
) -> AppResult<Json<ApartmentDetailResponse>> {
    let patch = ApartmentPatch::from(payload);
    let record = ApartmentService::update(&state.pool, id, auth_user.user_id, &patch).await?;
    Ok(Json(build_detail(&state, record).await?))
}

/// Частичное обновление объявления
#[utoipa::path(
    patch,
    path = "/api/v1/me/advertisements/{id}",
    tag = "advertisements",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Advertisement ID")
    ),
    request_body = ApartmentPatch,
    responses(
        (status = 200, description = "Advertisement updated", body = ApartmentDetailResponse),
        (status = 404, description = "Advertisement not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_advertisement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<ApartmentPatch>,
) -> AppResult<Json<ApartmentDetailResponse>> {
    let record = ApartmentService::update(&state.pool, id, auth_user.user_id, &payload).await?;
    Ok(Json(build_detail(&state, record).await?))
}

/// Удаление объявления с адресом, изображениями и визитами
#[utoipa::path(
    delete,
    path = "/api/v1/me/advertisements/{id}",
    tag = "advertisements",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Advertisement ID")
    ),
    responses(
        (status = 204, description = "Advertisement deleted"),
        (status = 404, description = "Advertisement not found")
    )
)]
pub async fn delete_advertisement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let keys = ApartmentService::delete(&state.pool, id, auth_user.user_id).await?;

    if !keys.is_empty() {
        let file_service = FileService::new(&state.config).await?;
        file_service.delete_files_quietly(&keys).await;
    }

    Ok(StatusCode::NO_CONTENT)
}
