//! Authentication and authorization.
//!
//! JWT bearer tokens (HS256) carry the account identity; passwords are hashed
//! with argon2. A context middleware resolves the token into an [`AuthUser`]
//! request extension; extractors and the admin gate build on that extension.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::user,
    errors::ServiceError,
    handlers::common::{created_response, parse_json, success_response, validate_input},
    AppState,
};

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated account data resolved from a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_expiration,
        }
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match &self {
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING_TOKEN",
                "No authentication token provided".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::TokenCreation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_TOKEN_CREATION_FAILED",
                msg.clone(),
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Insufficient permissions".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation(msg) => ServiceError::InternalError(msg),
            AuthError::InsufficientPermissions => {
                ServiceError::Forbidden("Insufficient permissions".into())
            }
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

/// Authentication service handling account registration, credential
/// verification, and token issuance/validation.
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

/// Bearer token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Register a new account with a hashed password.
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        let existing = user::Entity::find()
            .filter(
                user::Column::Email
                    .eq(input.email.clone())
                    .or(user::Column::Username.eq(input.username.clone())),
            )
            .one(&*self.db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "An account with that email or username already exists".into(),
            ));
        }

        let password_hash = hash_password(&input.password)?;

        let account = user::ActiveModel {
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(password_hash),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            is_admin: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let account = account.insert(&*self.db).await?;
        Ok(account)
    }

    /// Verify email/password credentials and return the matching account.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        let account = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(account)
    }

    /// Generate a bearer token for an account
    pub fn generate_token(&self, account: &user::Model) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let expires = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            email: account.email.clone(),
            is_admin: account.is_admin,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a bearer token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        Ok(claims)
    }

    fn auth_user_from_claims(&self, claims: Claims) -> Result<AuthUser, AuthError> {
        let id = claims.sub.parse::<i32>().map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            id,
            username: claims.username,
            email: claims.email,
            is_admin: claims.is_admin,
        })
    }
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Resolves a bearer token (when present and valid) into an `AuthUser`
/// request extension. Runs on every request; protected routes decide whether
/// a missing identity is fatal.
pub async fn auth_context_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match auth
            .validate_token(&token)
            .and_then(|claims| auth.auth_user_from_claims(claims))
        {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(e) => {
                debug!("Ignoring unusable bearer token: {}", e);
            }
        }
    }

    next.run(request).await
}

fn bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// Gate for the admin sub-router: 401 without an identity, 403 without the
/// admin flag.
pub async fn require_admin(request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthUser>() {
        None => AuthError::MissingToken.into_response(),
        Some(user) if !user.is_admin() => AuthError::InsufficientPermissions.into_response(),
        Some(_) => next.run(request).await,
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Extractor for routes that behave differently for signed-in customers but
/// stay open to guests.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, crate::errors::ApiError> {
    let input: RegisterInput = parse_json(body)?;
    validate_input(&input)?;

    let auth = state.services.auth.clone();
    let account = auth.register(input).await?;
    let token = auth.generate_token(&account).map_err(ServiceError::from)?;

    Ok(created_response(serde_json::json!({
        "user": account,
        "token": token,
    })))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, crate::errors::ApiError> {
    let input: LoginInput = parse_json(body)?;
    validate_input(&input)?;

    let auth = state.services.auth.clone();
    let account = auth.authenticate(&input.email, &input.password).await?;
    let token = auth.generate_token(&account).map_err(ServiceError::from)?;

    Ok(success_response(serde_json::json!({
        "user": account,
        "token": token,
    })))
}

async fn me(user: AuthUser) -> Result<Response, crate::errors::ApiError> {
    Ok(success_response(user))
}

/// Routes mounted at `/auth`
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig::new(
            "unit_test_secret_key_that_is_long_enough_to_pass_hs256_checks_123456".into(),
            "atelier-api".into(),
            "atelier-storefront".into(),
            Duration::from_secs(3600),
        )
    }

    fn test_account() -> user::Model {
        user::Model {
            id: 42,
            username: "maha".into(),
            email: "maha@example.com".into(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            is_admin: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let service = AuthService::new(
            test_config(),
            Arc::new(sea_orm::DatabaseConnection::default()),
        );
        let account = test_account();

        let token = service.generate_token(&account).unwrap();
        let claims = service.validate_token(&token.access_token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "maha@example.com");
        assert!(claims.is_admin);
    }

    #[test]
    fn token_from_other_issuer_is_rejected() {
        let service = AuthService::new(
            test_config(),
            Arc::new(sea_orm::DatabaseConnection::default()),
        );
        let mut other_config = test_config();
        other_config.jwt_issuer = "someone-else".into();
        let other = AuthService::new(
            other_config,
            Arc::new(sea_orm::DatabaseConnection::default()),
        );

        let token = other.generate_token(&test_account()).unwrap();
        assert!(matches!(
            service.validate_token(&token.access_token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = axum::http::HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi".to_string()));

        headers.insert(header::AUTHORIZATION, "Basic xyz".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
