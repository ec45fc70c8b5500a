//! Portal API Endpoints
//! Mission: Front the identity and attendance services behind one public surface

use crate::auth::api::{bearer_token, AuthApiError};
use crate::auth::models::Claims;
use crate::auth::token::{TokenCodec, TokenError};
use crate::portal::attendance::{AttendanceClient, AttendanceError};
use crate::portal::proxy::{GatewayClient, ProxyError, UpstreamResponse};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const SERVICE_NAME: &str = "portal";

/// Shared portal state: the identity relay, the attendance bridge, and
/// the identity-domain codec used to re-verify inbound tokens before any
/// identity-dependent branching.
#[derive(Clone)]
pub struct PortalState {
    pub gateway: Arc<GatewayClient>,
    pub attendance: Arc<AttendanceClient>,
    pub identity_codec: Arc<TokenCodec>,
}

impl PortalState {
    pub fn new(
        gateway: Arc<GatewayClient>,
        attendance: Arc<AttendanceClient>,
        identity_codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            gateway,
            attendance,
            identity_codec,
        }
    }
}

/// Build the portal service router. The portal is browser-facing, so the
/// router carries a permissive CORS layer.
pub fn router(state: PortalState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(proxy_register))
        .route("/api/auth/login", post(proxy_login))
        .route("/api/auth/me", get(proxy_me))
        .route("/api/checkins", post(create_checkin).get(list_checkins))
        .route("/api/attendance/:event_id", get(get_attendance))
        .layer(axum::middleware::from_fn(crate::middleware::request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Portal-level errors: inbound auth failures, bridge failures, and
/// relay failures, each already carrying its status mapping.
#[derive(Debug)]
pub enum PortalError {
    Auth(AuthApiError),
    Attendance(AttendanceError),
    Proxy(ProxyError),
}

impl From<AuthApiError> for PortalError {
    fn from(e: AuthApiError) -> Self {
        PortalError::Auth(e)
    }
}

impl From<AttendanceError> for PortalError {
    fn from(e: AttendanceError) -> Self {
        PortalError::Attendance(e)
    }
}

impl From<ProxyError> for PortalError {
    fn from(e: ProxyError) -> Self {
        PortalError::Proxy(e)
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        match self {
            PortalError::Auth(e) => e.into_response(),
            PortalError::Attendance(e) => e.into_response(),
            PortalError::Proxy(e) => e.into_response(),
        }
    }
}

/// Health check - GET /health
async fn health(State(state): State<PortalState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "identity_base": state.gateway.base_url(),
        "attendance_base": state.attendance.base_url(),
    }))
}

/// Relay registration to the identity service - POST /api/auth/register
async fn proxy_register(
    State(state): State<PortalState>,
    Json(body): Json<Value>,
) -> Result<UpstreamResponse, PortalError> {
    Ok(state
        .gateway
        .relay(Method::POST, "/auth/register", None, Some(&body))
        .await?)
}

/// Relay login to the identity service - POST /api/auth/login
async fn proxy_login(
    State(state): State<PortalState>,
    Json(body): Json<Value>,
) -> Result<UpstreamResponse, PortalError> {
    Ok(state
        .gateway
        .relay(Method::POST, "/auth/login", None, Some(&body))
        .await?)
}

/// Relay introspection to the identity service - GET /api/auth/me
///
/// The Authorization header is forwarded verbatim and never inspected
/// here; the identity service is the verifier for this route.
async fn proxy_me(
    State(state): State<PortalState>,
    headers: HeaderMap,
) -> Result<UpstreamResponse, PortalError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    Ok(state
        .gateway
        .relay(Method::GET, "/auth/me", authorization, None)
        .await?)
}

#[derive(Debug, Deserialize)]
struct CheckinRequest {
    event_id: String,
    ticket_id: String,
}

/// Create a check-in on behalf of the verified caller - POST /api/checkins
async fn create_checkin(
    State(state): State<PortalState>,
    headers: HeaderMap,
    Json(payload): Json<CheckinRequest>,
) -> Result<Json<Value>, PortalError> {
    let claims = verified_claims(&state, &headers)?;

    let body = state
        .attendance
        .create_checkin(&payload.event_id, &payload.ticket_id, &claims.sub)
        .await?;

    Ok(Json(body))
}

/// Fetch attendance for an event - GET /api/attendance/:event_id
async fn get_attendance(
    State(state): State<PortalState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, PortalError> {
    let claims = verified_claims(&state, &headers)?;

    let body = state
        .attendance
        .get_attendance(&event_id, &claims.sub)
        .await?;

    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
struct CheckinsQuery {
    event_id: Option<String>,
}

/// List the caller's check-ins - GET /api/checkins?event_id=
async fn list_checkins(
    State(state): State<PortalState>,
    Query(query): Query<CheckinsQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, PortalError> {
    let claims = verified_claims(&state, &headers)?;

    let body = state
        .attendance
        .list_user_checkins(&claims.sub, query.event_id.as_deref())
        .await?;

    Ok(Json(body))
}

/// Re-verify the inbound access token against the identity trust domain.
///
/// Every route that derives an identity from the token for a downstream
/// trust decision goes through here; the embedded subject is never
/// trusted without a signature check.
fn verified_claims(state: &PortalState, headers: &HeaderMap) -> Result<Claims, AuthApiError> {
    let token = bearer_token(headers).ok_or(AuthApiError::MissingAuth)?;

    state.identity_codec.verify(token).map_err(|e| match e {
        TokenError::Expired => AuthApiError::ExpiredToken,
        TokenError::Invalid => AuthApiError::InvalidToken,
    })
}
