pub mod advertisements;
pub mod apartments;
pub mod auth;
pub mod images;
pub mod users;
pub mod visits;

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::middleware::{auth_middleware, AppState};
use crate::openapi::ApiDoc;

pub fn routes(config: &Config) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .merge(users::routes())
        .merge(apartments::routes())
        .merge(advertisements::routes())
        .merge(images::routes(config.max_upload_size))
        .merge(visits::routes())
}

/// Полное приложение: API, документация и общие слои
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", routes(&state.config))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Rentals API",
        "version": "1.0.0",
        "description": "Backend API for apartment rental advertisements and visits"
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
