//! TST Identity Portal
//! Mission: Validate inbound tokens and forward requests to identity and attendance

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tst_gateway::auth::TokenCodec;
use tst_gateway::config::{PortalConfig, DEFAULT_TOKEN_EXPIRE_MINUTES, UPSTREAM_TIMEOUT};
use tst_gateway::portal::{api, AttendanceClient, GatewayClient, PortalState};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    // Fail fast: missing upstream base URLs or secrets refuse to start.
    let config = PortalConfig::from_env().context("Portal configuration error")?;

    let gateway = Arc::new(
        GatewayClient::new(&config.identity_base_url, UPSTREAM_TIMEOUT)
            .context("Failed to build identity gateway")?,
    );
    let attendance = Arc::new(
        AttendanceClient::new(
            &config.attendance_base_url,
            &config.attendance_trust,
            UPSTREAM_TIMEOUT,
        )
        .context("Failed to build attendance bridge")?,
    );
    let identity_codec = Arc::new(TokenCodec::new(
        &config.identity_trust,
        DEFAULT_TOKEN_EXPIRE_MINUTES,
    ));

    let app = api::router(PortalState::new(gateway, attendance, identity_codec));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        identity_base = %config.identity_base_url,
        attendance_base = %config.attendance_base_url,
        "Portal service listening on {}", addr
    );

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tst_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
