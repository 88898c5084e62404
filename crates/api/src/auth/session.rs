//! Authenticated session carried through request extensions

use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;

use super::jwt::decode_claims;
use super::middleware::AuthError;

const ADMIN_ROLE: &str = "admin";
const DEFAULT_ROLE: &str = "user";

/// The signed-in user behind a request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub role: String,
    /// Raw bearer token, forwarded to the backend
    #[serde(skip)]
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Build a session from a bearer token checked at `now`
    pub fn from_token(
        token: &str,
        secret: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Self, AuthError> {
        let claims = decode_claims(token, secret, now)?;
        let expires_at = claims.expires_at()?;

        Ok(Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
            role: claims
                .role
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            token: token.to_string(),
            expires_at,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Remaining lifetime, `None` once expired
    pub fn time_until_expiry(&self, now: OffsetDateTime) -> Option<Duration> {
        let millis = (self.expires_at - now).whole_milliseconds();
        if millis <= 0 {
            return None;
        }
        u64::try_from(millis).ok().map(Duration::from_millis)
    }
}
