use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{RegisterRequest, User};
use crate::utils::validators::sanitize_string;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub username: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String,
}

pub struct AuthService {
    config: Config,
}

impl AuthService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn access_expiry(&self) -> i64 {
        self.config.jwt_access_expiry
    }

    fn generate_token(&self, user_id: Uuid, username: &str, token_type: &str) -> AppResult<String> {
        let now = Utc::now();
        let ttl = if token_type == ACCESS_TOKEN {
            self.config.jwt_access_expiry
        } else {
            self.config.jwt_refresh_expiry
        };
        let exp = now + Duration::seconds(ttl);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(AppError::from)
    }

    pub fn generate_access_token(&self, user_id: Uuid, username: &str) -> AppResult<String> {
        self.generate_token(user_id, username, ACCESS_TOKEN)
    }

    pub fn generate_refresh_token(&self, user_id: Uuid, username: &str) -> AppResult<String> {
        self.generate_token(user_id, username, REFRESH_TOKEN)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_user_by_username(pool: &PgPool, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn create_user(pool: &PgPool, request: &RegisterRequest) -> AppResult<User> {
        let request = normalize_registration(request)?;
        let password_hash = Self::hash_password(&request.password)?;

        // Дубликат имени пользователя превращается в Conflict через unique violation
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&password_hash)
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    pub async fn authenticate(pool: &PgPool, username: &str, password: &str) -> AppResult<User> {
        let user = Self::get_user_by_username(pool, &sanitize_string(username))
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !Self::verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }
}

/// Имя пользователя обрезается до проверки длины, иначе "   " прошло бы как пустое имя
pub fn normalize_registration(request: &RegisterRequest) -> AppResult<RegisterRequest> {
    let normalized = RegisterRequest {
        username: sanitize_string(&request.username),
        ..request.clone()
    };
    normalized.validate()?;
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "postgres://localhost/rentals".to_string(),
            database_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            jwt_access_expiry: 900,
            jwt_refresh_expiry: 3600,
            public_listings: true,
            max_upload_size: 1024,
            minio_endpoint: "http://localhost:9000".to_string(),
            minio_access_key: "minioadmin".to_string(),
            minio_secret_key: "minioadmin".to_string(),
            minio_bucket: "rentals".to_string(),
            minio_public_url: None,
        }
    }

    #[test]
    fn test_access_token_claims() {
        let service = AuthService::new(config());
        let user_id = Uuid::new_v4();

        let token = service.generate_access_token(user_id, "anna").unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "anna");
        assert_eq!(claims.token_type, ACCESS_TOKEN);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let service = AuthService::new(config());
        let other = AuthService::new(Config {
            jwt_secret: "other-secret".to_string(),
            ..config()
        });

        let token = other.generate_refresh_token(Uuid::new_v4(), "anna").unwrap();
        assert!(matches!(service.verify_token(&token), Err(AppError::Jwt(_))));
    }

    #[test]
    fn test_password_hash() {
        let hash = AuthService::hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(AuthService::verify_password("correct horse", &hash).unwrap());
        assert!(!AuthService::verify_password("battery staple", &hash).unwrap());
    }

    fn registration(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: "long-enough-password".to_string(),
            email: None,
            first_name: None,
            last_name: None,
        }
    }

    #[test]
    fn test_registration_trims_username() {
        let normalized = normalize_registration(&registration("  anna  ")).unwrap();
        assert_eq!(normalized.username, "anna");
    }

    #[test]
    fn test_blank_username_is_rejected_after_trim() {
        assert!(matches!(
            normalize_registration(&registration("    ")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            normalize_registration(&registration(" ab ")),
            Err(AppError::Validation(_))
        ));
    }
}
