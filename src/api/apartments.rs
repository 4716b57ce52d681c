use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{ApartmentDetailResponse, ApartmentResponse, ApartmentsQuery};
use crate::services::{ApartmentService, ImageService};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/apartments", get(list_apartments))
        .route("/apartments/:id", get(get_apartment))
}

// Анонимный доступ к каталогу зависит от настроек развёртывания
fn ensure_browsable(state: &AppState, auth_user: &Option<AuthUser>) -> AppResult<()> {
    if !state.config.public_listings && auth_user.is_none() {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Список доступных квартир
#[utoipa::path(
    get,
    path = "/api/v1/apartments",
    tag = "apartments",
    params(ApartmentsQuery),
    responses(
        (status = 200, description = "Available apartments", body = Vec<ApartmentResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_apartments(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Query(query): Query<ApartmentsQuery>,
) -> AppResult<Json<Vec<ApartmentResponse>>> {
    ensure_browsable(&state, &auth_user)?;

    let apartments = ApartmentService::list_available(&state.pool, &query).await?;
    Ok(Json(apartments))
}

/// Детали квартиры
#[utoipa::path(
    get,
    path = "/api/v1/apartments/{id}",
    tag = "apartments",
    params(
        ("id" = Uuid, Path, description = "Apartment ID")
    ),
    responses(
        (status = 200, description = "Apartment details", body = ApartmentDetailResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Apartment not found")
    )
)]
pub async fn get_apartment(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApartmentDetailResponse>> {
    ensure_browsable(&state, &auth_user)?;

    let record = ApartmentService::get_details(&state.pool, id).await?;
    let images = ImageService::summaries(&state.pool, id).await?;

    Ok(Json(ApartmentDetailResponse::new(record, images)))
}
