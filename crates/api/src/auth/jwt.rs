//! Session token decoding
//!
//! Tokens are issued by the data backend. With a shared `JWT_SECRET` the
//! signature is checked locally; without one the payload is read as-is and
//! the backend stays the authority on every forwarded call.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::middleware::AuthError;

/// Claims carried by a backend-issued token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Expiration as a Unix timestamp in seconds
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Claims {
    pub fn expires_at(&self) -> Result<OffsetDateTime, AuthError> {
        OffsetDateTime::from_unix_timestamp(self.exp).map_err(|_| AuthError::InvalidToken)
    }
}

fn validation(verify_signature: bool) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked against the caller's clock below
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp", "sub"]);
    if !verify_signature {
        validation.insecure_disable_signature_validation();
    }
    validation
}

/// Decode and check a token at `now`
pub fn decode_claims(
    token: &str,
    secret: Option<&str>,
    now: OffsetDateTime,
) -> Result<Claims, AuthError> {
    let result = match secret {
        Some(secret) => decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation(true),
        ),
        None => decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation(false)),
    };

    let claims = result
        .map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?
        .claims;

    if claims.expires_at()? <= now {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}
