pub mod auth;
pub mod json;

pub use auth::{auth_middleware, AppState, AuthUser};
pub use json::AppJson;
