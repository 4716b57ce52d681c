use axum::{extract::State, routing::get, Json, Router};

use crate::error::AppResult;
use crate::middleware::{AppState, AuthUser};
use crate::models::UserPublic;
use crate::services::AuthService;

pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Профиль текущего пользователя
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserPublic),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<UserPublic>> {
    let user = AuthService::get_user_by_id(&state.pool, auth_user.user_id).await?;
    Ok(Json(UserPublic::from(user)))
}
