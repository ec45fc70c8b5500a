//! Authentication Models
//! Mission: Define user records, token claims, and wire shapes

use serde::{Deserialize, Serialize};

/// Registered user record. Immutable after creation; lives only for the
/// process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: String,
}

/// Signed token claims. `sub` is required; a token without it is invalid.
/// Bridge tokens carry no role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Register request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub username: String,
    pub role: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String, // always "bearer"
}

/// Introspection response for GET /auth/me
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub role: Option<String>,
}
