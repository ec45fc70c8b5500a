//! Forwarding Gateway
//! Mission: Relay inbound requests to an upstream and return its response verbatim

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

/// Relay failure modes, discriminated so timeouts and connection
/// failures surface as distinct status codes.
#[derive(Debug)]
pub enum ProxyError {
    /// Upstream did not answer within the bounded timeout.
    Timeout,
    /// Connection or DNS failure before any response.
    Connect(String),
    /// Any other transport-level failure (e.g. aborted mid-body).
    Transport(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ProxyError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "Upstream request timeout".to_string(),
            ),
            ProxyError::Connect(cause) => (
                StatusCode::BAD_GATEWAY,
                format!("Failed to reach upstream: {}", cause),
            ),
            ProxyError::Transport(cause) => (
                StatusCode::BAD_GATEWAY,
                format!("Upstream request failed: {}", cause),
            ),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// What came back from the upstream: status, content type, and raw body,
/// passed through unchanged.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);

        let mut builder = Response::builder().status(status);
        if let Some(content_type) = &self.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }

        builder
            .body(Body::from(self.body))
            .unwrap_or_else(|e| {
                warn!("Failed to rebuild upstream response: {}", e);
                StatusCode::BAD_GATEWAY.into_response()
            })
    }
}

/// Pure relay client for one upstream base URL. Forwards the
/// Authorization header verbatim when present and never inspects it; no
/// identity-dependent branching happens here.
pub struct GatewayClient {
    http: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build gateway HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward one request and hand back the upstream status, body, and
    /// content type unchanged. Upstream 4xx/5xx are not errors here; only
    /// transport failures are. No retries.
    pub async fn relay(
        &self,
        method: Method,
        path: &str,
        authorization: Option<&str>,
        body: Option<&Value>,
    ) -> Result<UpstreamResponse, ProxyError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.http.request(method, &url);
        if let Some(auth) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        if let Some(json_body) = body {
            request = request.json(json_body);
        }

        let response = request.send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(classify)?.to_vec();

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

fn classify(e: reqwest::Error) -> ProxyError {
    if e.is_timeout() {
        ProxyError::Timeout
    } else if e.is_connect() {
        ProxyError::Connect(e.to_string())
    } else {
        ProxyError::Transport(e.to_string())
    }
}
