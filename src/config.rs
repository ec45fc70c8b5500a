//! Service Configuration
//! Mission: Load and validate environment configuration at startup

use anyhow::{bail, Context, Result};
use jsonwebtoken::Algorithm;
use std::env;
use std::time::Duration;

/// Default access-token lifetime when TOKEN_EXPIRE_MINUTES is unset.
pub const DEFAULT_TOKEN_EXPIRE_MINUTES: i64 = 60;

/// Bridge tokens are always short-lived, fixed at one hour.
pub const BRIDGE_TOKEN_TTL_MINUTES: i64 = 60;

/// Bounded timeout for all outbound calls (gateway relays and bridge calls).
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(20);

/// A (secret, algorithm) pair. Tokens must only ever be verified against
/// the trust domain that minted them.
#[derive(Clone)]
pub struct TrustDomain {
    pub secret: String,
    pub algorithm: Algorithm,
}

impl TrustDomain {
    pub fn new(secret: String, algorithm: Algorithm) -> Self {
        Self { secret, algorithm }
    }
}

/// Configuration for the identity service.
pub struct IdentityConfig {
    pub trust: TrustDomain,
    pub token_expire_minutes: i64,
    pub host: String,
    pub port: u16,
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self> {
        let trust = identity_trust_from_env()?;
        let token_expire_minutes = env_or_default("TOKEN_EXPIRE_MINUTES", "60")
            .parse::<i64>()
            .context("TOKEN_EXPIRE_MINUTES must be an integer")?;
        if token_expire_minutes <= 0 {
            bail!("TOKEN_EXPIRE_MINUTES must be positive");
        }

        Ok(Self {
            trust,
            token_expire_minutes,
            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8001")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
        })
    }
}

/// Configuration for the portal service.
pub struct PortalConfig {
    /// Trust domain shared with the identity service; used to verify
    /// inbound access tokens before any identity-dependent branching.
    pub identity_trust: TrustDomain,
    /// Trust domain shared with the external attendance service; used to
    /// mint bridge tokens. May reuse the identity secret.
    pub attendance_trust: TrustDomain,
    pub identity_base_url: String,
    pub attendance_base_url: String,
    pub host: String,
    pub port: u16,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self> {
        let identity_trust = identity_trust_from_env()?;

        // The attendance secret defaults to the identity secret when not
        // set separately; the domains remain distinct codecs either way.
        let attendance_secret = env::var("ATTENDANCE_JWT_SECRET")
            .unwrap_or_else(|_| identity_trust.secret.clone());
        let attendance_alg = parse_algorithm(&env_or_default("ATTENDANCE_JWT_ALG", "HS256"))?;

        Ok(Self {
            identity_trust,
            attendance_trust: TrustDomain::new(attendance_secret, attendance_alg),
            identity_base_url: base_url(env_required("IDENTITY_BASE_URL")?),
            attendance_base_url: base_url(env_required("ATTENDANCE_BASE_URL")?),
            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
        })
    }
}

fn identity_trust_from_env() -> Result<TrustDomain> {
    let secret = env_required("JWT_SECRET")?;
    let algorithm = parse_algorithm(&env_required("JWT_ALG")?)?;
    Ok(TrustDomain::new(secret, algorithm))
}

/// Parse a JWT algorithm name. Only the shared-secret HMAC variants are
/// supported; anything else refuses to start.
pub fn parse_algorithm(name: &str) -> Result<Algorithm> {
    match name.trim() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => bail!("Unsupported JWT algorithm: {}", other),
    }
}

fn env_required(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("Missing environment variable: {}", name))?;
    if value.trim().is_empty() {
        bail!("Environment variable {} is set but empty", name);
    }
    Ok(value)
}

fn env_or_default(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
