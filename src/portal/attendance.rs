//! Attendance Bridge Client
//! Mission: Authenticate outbound attendance calls with freshly minted bridge tokens

use crate::auth::token::TokenCodec;
use crate::config::{TrustDomain, BRIDGE_TOKEN_TTL_MINUTES};
use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Attendance bridge failure modes, mapped onto stable status codes.
#[derive(Debug)]
pub enum AttendanceError {
    /// Upstream rejected the bridge token (401).
    Unauthorized,
    /// Upstream 404, with a detail naming what was missing.
    NotFound(String),
    /// Upstream 400; carries the upstream's own detail verbatim.
    BadRequest(String),
    /// Any other upstream 4xx, passed through with its detail.
    Rejected(u16, String),
    /// Upstream 5xx.
    UpstreamFault,
    /// The bounded timeout elapsed.
    Timeout,
    /// Connection-level failure, with cause.
    Unreachable(String),
    /// Upstream replied 2xx but the body was not valid JSON.
    InvalidResponse(String),
    /// Local failure minting the bridge token.
    Internal(String),
}

impl IntoResponse for AttendanceError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AttendanceError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication failed - token invalid or expired".to_string(),
            ),
            AttendanceError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            AttendanceError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            AttendanceError::Rejected(code, detail) => (
                StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY),
                detail,
            ),
            AttendanceError::UpstreamFault => (
                StatusCode::BAD_GATEWAY,
                "Attendance service temporarily unavailable".to_string(),
            ),
            AttendanceError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "Attendance service request timeout".to_string(),
            ),
            AttendanceError::Unreachable(cause) => (
                StatusCode::BAD_GATEWAY,
                format!("Failed to reach attendance service: {}", cause),
            ),
            AttendanceError::InvalidResponse(cause) => (
                StatusCode::BAD_GATEWAY,
                format!("Attendance service returned an invalid response: {}", cause),
            ),
            AttendanceError::Internal(cause) => {
                warn!("Bridge token minting failed: {}", cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Typed client for the external attendance service. Lives in its own
/// trust domain: every call mints a fresh one-hour bridge token for the
/// resolved user identity. The HTTP client is reused across calls, the
/// credentials never are.
pub struct AttendanceClient {
    http: Client,
    base_url: String,
    codec: TokenCodec,
}

impl AttendanceClient {
    pub fn new(base_url: &str, trust: &TrustDomain, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build attendance HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            codec: TokenCodec::new(trust, BRIDGE_TOKEN_TTL_MINUTES),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn mint_token(&self, user_id: &str) -> Result<String, AttendanceError> {
        self.codec
            .issue(user_id, None)
            .map_err(|e| AttendanceError::Internal(e.to_string()))
    }

    /// Get the attendance summary for an event.
    pub async fn get_attendance(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Value, AttendanceError> {
        let token = self.mint_token(user_id)?;
        debug!(event_id, user_id, "GET attendance");

        let response = self
            .http
            .get(self.url(&format!("/api/attendance/{}", event_id)))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status().as_u16() {
            401 => Err(AttendanceError::Unauthorized),
            404 => Err(AttendanceError::NotFound(format!(
                "Event '{}' not found",
                event_id
            ))),
            code if code >= 500 => Err(AttendanceError::UpstreamFault),
            code if (200..300).contains(&code) => parse_json(response).await,
            code => Err(AttendanceError::Rejected(
                code,
                upstream_detail(response)
                    .await
                    .unwrap_or_else(|| "Attendance request rejected".to_string()),
            )),
        }
    }

    /// Create a check-in record. Upstream 400 details are forwarded
    /// verbatim so validation messages reach the caller.
    pub async fn create_checkin(
        &self,
        event_id: &str,
        ticket_id: &str,
        user_id: &str,
    ) -> Result<Value, AttendanceError> {
        let token = self.mint_token(user_id)?;
        debug!(event_id, ticket_id, user_id, "POST checkin");

        let response = self
            .http
            .post(self.url("/api/checkins"))
            .bearer_auth(&token)
            .json(&json!({ "event_id": event_id, "ticket_id": ticket_id }))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status().as_u16() {
            401 => Err(AttendanceError::Unauthorized),
            400 => Err(AttendanceError::BadRequest(
                upstream_detail(response)
                    .await
                    .unwrap_or_else(|| "Invalid check-in request".to_string()),
            )),
            404 => Err(AttendanceError::NotFound(
                "Event or ticket not found".to_string(),
            )),
            code if code >= 500 => Err(AttendanceError::UpstreamFault),
            code if (200..300).contains(&code) => parse_json(response).await,
            code => Err(AttendanceError::Rejected(
                code,
                upstream_detail(response)
                    .await
                    .unwrap_or_else(|| "Check-in rejected".to_string()),
            )),
        }
    }

    /// List a user's check-ins, optionally filtered by event.
    ///
    /// The upstream API does not implement this everywhere yet; 405/501
    /// answers become a placeholder body instead of an error.
    pub async fn list_user_checkins(
        &self,
        user_id: &str,
        event_id: Option<&str>,
    ) -> Result<Value, AttendanceError> {
        let token = self.mint_token(user_id)?;
        debug!(user_id, ?event_id, "GET user checkins");

        let mut request = self
            .http
            .get(self.url("/api/checkins"))
            .bearer_auth(&token);
        if let Some(event_id) = event_id {
            request = request.query(&[("event_id", event_id)]);
        }

        let response = request.send().await.map_err(transport_error)?;

        match response.status().as_u16() {
            401 => Err(AttendanceError::Unauthorized),
            // Compatibility shim for an evolving upstream API.
            405 | 501 => Ok(json!({
                "message": "not yet supported",
                "user_id": user_id,
            })),
            code if code >= 500 => Err(AttendanceError::UpstreamFault),
            code if (200..300).contains(&code) => parse_json(response).await,
            code => Err(AttendanceError::Rejected(
                code,
                upstream_detail(response)
                    .await
                    .unwrap_or_else(|| "Check-in listing rejected".to_string()),
            )),
        }
    }

    /// Check upstream health. No bridge token; any transport error maps
    /// to Bad Gateway.
    pub async fn health_check(&self) -> Result<Value, AttendanceError> {
        let response = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| AttendanceError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AttendanceError::UpstreamFault);
        }

        parse_json(response).await
    }
}

fn transport_error(e: reqwest::Error) -> AttendanceError {
    if e.is_timeout() {
        AttendanceError::Timeout
    } else {
        AttendanceError::Unreachable(e.to_string())
    }
}

async fn parse_json(response: reqwest::Response) -> Result<Value, AttendanceError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| AttendanceError::InvalidResponse(e.to_string()))
}

/// Pull the upstream's own `detail` field out of an error body, falling
/// back to the raw text when it is not JSON.
async fn upstream_detail(response: reqwest::Response) -> Option<String> {
    let text = response.text().await.ok()?;
    match serde_json::from_str::<Value>(&text) {
        Ok(body) => body
            .get("detail")
            .and_then(|d| d.as_str())
            .map(str::to_string)
            .or(Some(text)),
        Err(_) if !text.is_empty() => Some(text),
        Err(_) => None,
    }
}
