//! Stateless session tokens.
//!
//! A successful authentication is turned into a signed, self-contained
//! bearer token (HS256 JWT) carrying a small claim set. Verification needs
//! only the signing secret: signature and expiry are checked offline, with
//! no server-side session store.
//!
//! Every verification failure (missing header, malformed token, bad
//! signature, expiry passed) collapses into the same opaque unauthorized
//! outcome. The distinction between "expired" and "forged" is deliberately
//! not surfaced to the caller; the cause is logged for operators only.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Session lifetime: 24 hours from issuance.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claim set embedded in a session token.
///
/// Not persisted anywhere; its only storage is the client-held token. It is
/// trustworthy only after [`verify`] succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account identity.
    pub email: String,
    /// Display name at issuance time.
    pub name: String,
    /// Issuance time (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds); exactly 24 hours after `iat`.
    pub exp: i64,
}

/// Sign a claim set for the given identity into a bearer token.
pub fn issue(email: &str, name: &str, secret: &str) -> Result<String, AppError> {
    let iat = Utc::now().timestamp();
    let claims = Claims {
        email: email.to_string(),
        name: name.to_string(),
        iat,
        exp: iat + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::unexpected(format!("token signing failed: {}", e)))
}

/// Decode a token, checking signature and expiry against the signing secret.
pub fn verify(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(reason = %e, "token verification failed");
        AppError::unauthorized()
    })
}

/// Strip a literal `"Bearer "` prefix from an authorization header value.
pub fn bearer_token(header: &str) -> &str {
    header.strip_prefix("Bearer ").unwrap_or(header)
}

/// Extract and verify the bearer token from a request's headers.
pub fn authorize(headers: &HeaderMap, secret: &str) -> Result<Claims, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(AppError::unauthorized)?;

    verify(bearer_token(header), secret)
}
