//! Identity API Endpoints
//! Mission: Provide register, login, and token introspection endpoints

use crate::auth::models::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse,
};
use crate::auth::token::{TokenCodec, TokenError};
use crate::auth::user_store::{RegisterError, UserStore};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const SERVICE_NAME: &str = "identity";
const SERVICE_VERSION: &str = "1.0.0";

/// Shared identity state: the credential store plus the identity-domain
/// token codec. Stateless per request beyond these.
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub codec: Arc<TokenCodec>,
}

impl AuthState {
    pub fn new(user_store: Arc<UserStore>, codec: Arc<TokenCodec>) -> Self {
        Self { user_store, codec }
    }
}

/// Build the identity service router.
pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .layer(axum::middleware::from_fn(crate::middleware::request_logging))
        .with_state(state)
}

/// Service banner - GET /
async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to TST Identity Service",
        "version": SERVICE_VERSION,
        "endpoints": {
            "health": "/health",
            "register": "POST /auth/register",
            "login": "POST /auth/login",
            "me": "GET /auth/me",
        }
    }))
}

/// Health check - GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

/// Register endpoint - POST /auth/register
async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AuthApiError> {
    if payload.username.trim().is_empty() {
        return Err(AuthApiError::EmptyField("username"));
    }
    if payload.password.is_empty() {
        return Err(AuthApiError::EmptyField("password"));
    }
    if payload.role.trim().is_empty() {
        return Err(AuthApiError::EmptyField("role"));
    }

    let user = state
        .user_store
        .register(&payload.username, &payload.password, &payload.role)
        .map_err(|e| match e {
            RegisterError::DuplicateUser => AuthApiError::DuplicateUser,
            RegisterError::Hash(err) => {
                warn!("Password hashing failed: {}", err);
                AuthApiError::InternalError
            }
        })?;

    Ok(Json(RegisterResponse {
        message: "registered".to_string(),
        username: user.username,
        role: user.role,
    }))
}

/// Login endpoint - POST /auth/login
///
/// Unknown usernames and wrong passwords produce the same response, so a
/// caller cannot enumerate registered usernames.
async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let user = state.user_store.lookup(&payload.username);

    let valid = match &user {
        Some(u) => state
            .user_store
            .verify_password(&u.username, &payload.password)
            .map_err(|_| AuthApiError::InternalError)?,
        None => false,
    };

    let user = match (valid, user) {
        (true, Some(u)) => u,
        _ => {
            warn!(username = %payload.username, "Failed login attempt");
            return Err(AuthApiError::InvalidCredentials);
        }
    };

    let token = state
        .codec
        .issue(&user.username, Some(&user.role))
        .map_err(|_| AuthApiError::InternalError)?;

    info!(username = %user.username, role = %user.role, "Login successful");

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

/// Introspection endpoint - GET /auth/me
///
/// Requires a syntactically valid `Bearer <token>` header; the token is
/// cryptographically verified before any claim is trusted.
async fn me(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, AuthApiError> {
    let token = bearer_token(&headers).ok_or(AuthApiError::MissingAuth)?;

    let claims = state.codec.verify(token).map_err(|e| match e {
        TokenError::Expired => AuthApiError::ExpiredToken,
        TokenError::Invalid => AuthApiError::InvalidToken,
    })?;

    Ok(Json(MeResponse {
        username: claims.sub,
        role: claims.role,
    }))
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim)
}

/// Identity API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthApiError {
    EmptyField(&'static str),
    DuplicateUser,
    InvalidCredentials,
    MissingAuth,
    ExpiredToken,
    InvalidToken,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AuthApiError::EmptyField(field) => (
                StatusCode::BAD_REQUEST,
                format!("{} must be non-empty", field),
            ),
            AuthApiError::DuplicateUser => {
                (StatusCode::BAD_REQUEST, "username already exists".to_string())
            }
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
            }
            AuthApiError::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "Missing/invalid Authorization header".to_string(),
            ),
            AuthApiError::ExpiredToken => (StatusCode::UNAUTHORIZED, "Token expired".to_string()),
            AuthApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            AuthApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
