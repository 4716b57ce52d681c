use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::error::{AppError, AppResult};
use crate::middleware::{AppJson, AppState};
use crate::models::{RefreshTokenRequest, RegisterRequest, TokenRequest, TokenResponse, User, UserPublic};
use crate::services::auth_service::REFRESH_TOKEN;
use crate::services::AuthService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(obtain_token))
        .route("/refresh", post(refresh_token))
}

fn issue_tokens(state: &AppState, user: &User) -> AppResult<TokenResponse> {
    let auth_service = AuthService::new(state.config.clone());

    Ok(TokenResponse {
        access_token: auth_service.generate_access_token(user.id, &user.username)?,
        refresh_token: auth_service.generate_refresh_token(user.id, &user.username)?,
        token_type: "Bearer".to_string(),
        expires_in: auth_service.access_expiry(),
    })
}

/// Регистрация пользователя
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserPublic),
        (status = 409, description = "Username already taken"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserPublic>)> {
    let user = AuthService::create_user(&state.pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(UserPublic::from(user))))
}

/// Получение пары токенов по логину и паролю
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    tag = "auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = AuthService::authenticate(&state.pool, &payload.username, &payload.password).await?;

    tracing::debug!(user_id = %user.id, "Token issued");

    Ok(Json(issue_tokens(&state, &user)?))
}

/// Обновление пары токенов
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenResponse),
        (status = 401, description = "Invalid refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let auth_service = AuthService::new(state.config.clone());
    let claims = auth_service.verify_token(&payload.refresh_token)?;

    if claims.token_type != REFRESH_TOKEN {
        return Err(AppError::Unauthorized);
    }

    let user_id = uuid::Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    // Удалённый пользователь не получает новых токенов
    let user = AuthService::get_user_by_id(&state.pool, user_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::Unauthorized,
            other => other,
        })?;

    Ok(Json(issue_tokens(&state, &user)?))
}
