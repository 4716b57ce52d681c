use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{AppJson, AppState, AuthUser};
use crate::models::{CreateVisitRequest, VisitResponse, VisitsQuery};
use crate::services::VisitService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/apartments/:id/visit", post(create_visit))
        .route("/me/advertisements/visits", get(list_owner_visits))
        .route("/me/visits", get(list_tenant_visits))
}

/// Запись на просмотр квартиры
#[utoipa::path(
    post,
    path = "/api/v1/apartments/{id}/visit",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Apartment ID")
    ),
    request_body = CreateVisitRequest,
    responses(
        (status = 201, description = "Visit scheduled", body = VisitResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Owner cannot book own apartment"),
        (status = 404, description = "Apartment not found"),
        (status = 409, description = "Visit already exists"),
        (status = 422, description = "Visit date out of range")
    )
)]
pub async fn create_visit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<CreateVisitRequest>,
) -> AppResult<(StatusCode, Json<VisitResponse>)> {
    let visit = VisitService::schedule(&state.pool, id, auth_user.user_id, payload.date_time).await?;
    Ok((StatusCode::CREATED, Json(VisitResponse::from(visit))))
}

/// Визиты на квартиры текущего владельца
#[utoipa::path(
    get,
    path = "/api/v1/me/advertisements/visits",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(VisitsQuery),
    responses(
        (status = 200, description = "Visits to owner's apartments", body = Vec<VisitResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_owner_visits(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<VisitsQuery>,
) -> AppResult<Json<Vec<VisitResponse>>> {
    let visits = VisitService::list_for_owner(&state.pool, auth_user.user_id, &query).await?;
    Ok(Json(visits.into_iter().map(VisitResponse::from).collect()))
}

/// Визиты текущего арендатора
#[utoipa::path(
    get,
    path = "/api/v1/me/visits",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(VisitsQuery),
    responses(
        (status = 200, description = "Tenant visits", body = Vec<VisitResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_tenant_visits(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<VisitsQuery>,
) -> AppResult<Json<Vec<VisitResponse>>> {
    let visits = VisitService::list_for_tenant(&state.pool, auth_user.user_id, &query).await?;
    Ok(Json(visits.into_iter().map(VisitResponse::from).collect()))
}
