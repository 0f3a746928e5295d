//! Bearer-token authentication and user management.
//!
//! Tokens are HS256 JWTs carrying the user's role; the middleware validates
//! the token once per request and stores an [`AuthUser`] in request
//! extensions for handlers to consult through [`AuthUser::can`].

pub mod roles;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::entities::user::{self, Entity as UserEntity};
use crate::errors::ServiceError;

pub use roles::{Capability, Role};

const TOKEN_ISSUER: &str = "gatepass-api";
const TOKEN_AUDIENCE: &str = "gatepass-api";

/// JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated principal extracted from a validated token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    /// Capability gate used at the top of protected handlers.
    pub fn require(&self, capability: Capability) -> Result<(), ServiceError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "role '{}' lacks the required capability",
                self.role
            )))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication token")]
    MissingToken,
    #[error("invalid authentication token")]
    InvalidToken,
    #[error("token has expired")]
    ExpiredToken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is inactive")]
    InactiveAccount,
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InactiveAccount => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration: Duration,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub active: bool,
}

/// Token issuance, validation, and user management.
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Verify credentials and issue an access token.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let user = UserEntity::find()
            .filter(user::Column::Username.eq(request.username.as_str()))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.active {
            return Err(AuthError::InactiveAccount);
        }
        verify_password(&request.password, &user.password_hash)?;

        let role = Role::from_str(&user.role).map_err(|_| {
            AuthError::Internal(format!("user {} has unknown role '{}'", user.id, user.role))
        })?;

        let token = self.issue_token(&user, role)?;
        info!(user_id = %user.id, %role, "user logged in");
        Ok(LoginResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration.as_secs(),
            role,
        })
    }

    fn issue_token(&self, user: &user::Model, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::seconds(self.config.token_expiration.as_secs() as i64))
                .timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Validate a bearer token and extract the principal.
    pub fn validate_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })?;

        let user_id =
            Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            user_id,
            username: data.claims.username,
            role: data.claims.role,
        })
    }

    /// Create a user account (admin capability enforced by the handler).
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        request.validate()?;
        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(request.username),
            password_hash: Set(hash_password(&request.password)
                .map_err(|e| ServiceError::Internal(e.to_string()))?),
            role: Set(request.role.to_string()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(None),
        };
        let created = model.insert(&*self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) {
                ServiceError::Conflict("username is already taken".to_string())
            } else {
                ServiceError::Database(e)
            }
        })?;
        Ok(user_response(created))
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = UserEntity::find().all(&*self.db).await?;
        Ok(users.into_iter().map(user_response).collect())
    }

    /// First-run provisioning: create the configured admin account when no
    /// active admin exists yet.
    pub async fn ensure_bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), ServiceError> {
        let admins = UserEntity::find()
            .filter(user::Column::Role.eq(Role::Admin.to_string()))
            .filter(user::Column::Active.eq(true))
            .count(&*self.db)
            .await?;
        if admins > 0 {
            return Ok(());
        }
        warn!("no active admin account found, creating bootstrap admin");
        self.create_user(CreateUserRequest {
            username: username.to_string(),
            password: password.to_string(),
            role: Role::Admin,
        })
        .await?;
        Ok(())
    }
}

fn user_response(model: user::Model) -> UserResponse {
    UserResponse {
        id: model.id,
        username: model.username.clone(),
        role: Role::from_str(&model.role).unwrap_or(Role::Viewer),
        active: model.active,
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Internal(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Middleware guarding every route behind `/api/v1` except login and health.
/// On success the [`AuthUser`] is inserted into request extensions.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    let user = auth.validate_token(token)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
