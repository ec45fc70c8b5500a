//! TST Identity Service
//! Mission: Issue signed bearer tokens over the registered-user store

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tst_gateway::auth::{api, AuthState, TokenCodec, UserStore};
use tst_gateway::config::IdentityConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    // Fail fast: missing secret/algorithm configuration refuses to start.
    let config = IdentityConfig::from_env().context("Identity configuration error")?;

    let user_store = Arc::new(UserStore::new());
    let codec = Arc::new(TokenCodec::new(&config.trust, config.token_expire_minutes));
    let app = api::router(AuthState::new(user_store, codec));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        token_expire_minutes = config.token_expire_minutes,
        "Identity service listening on {}", addr
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
