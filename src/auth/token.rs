//! Token Codec
//! Mission: Mint and verify signed, time-bound claims for one trust domain

use crate::auth::models::Claims;
use crate::config::TrustDomain;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Why a token failed verification. Expiry is only reported for tokens
/// whose signature and structure already check out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature verified but `exp` has passed.
    Expired,
    /// Bad signature, malformed structure, or missing required claims.
    Invalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Invalid => write!(f, "invalid token"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Mints and verifies tokens for exactly one trust domain. A codec built
/// for the identity domain can never validate attendance-domain tokens,
/// and vice versa.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenCodec {
    pub fn new(trust: &TrustDomain, default_ttl_minutes: i64) -> Self {
        let mut validation = Validation::new(trust.algorithm);
        // Expiry is a hard boundary at verification instant; no skew
        // compensation.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(trust.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(trust.secret.as_bytes()),
            header: Header::new(trust.algorithm),
            validation,
            default_ttl: Duration::minutes(default_ttl_minutes),
        }
    }

    /// Issue a token for `subject` with the codec's default TTL.
    pub fn issue(&self, subject: &str, role: Option<&str>) -> Result<String> {
        self.issue_with_ttl(subject, role, self.default_ttl)
    }

    /// Issue a token with an explicit TTL. Claims are fixed at issuance
    /// and immutable thereafter.
    pub fn issue_with_ttl(&self, subject: &str, role: Option<&str>, ttl: Duration) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role: role.map(|r| r.to_string()),
            iat: now,
            exp: now + ttl.num_seconds(),
        };

        debug!(subject, ttl_secs = ttl.num_seconds(), "Issuing token");

        encode(&self.header, &claims, &self.encoding_key).context("Failed to sign token")
    }

    /// Verify a token against this codec's trust domain and return its
    /// claims. Fails closed: missing `sub`, bad signature, or malformed
    /// structure all report `Invalid`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }
}
