//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use super::session::Session;
use crate::error::ApiError;

/// Cookie set by the dashboard after sign-in
pub const SESSION_COOKIE: &str = "whatsub_token";

/// State needed for authentication
#[derive(Clone, Default)]
pub struct AuthState {
    pub jwt_secret: Option<String>,
}

/// Extract bearer token from the session cookie
fn extract_token_from_cookie(request: &Request) -> Option<String> {
    request
        .headers()
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .filter_map(|cookie| {
                    cookie
                        .trim()
                        .strip_prefix(SESSION_COOKIE)
                        .and_then(|rest| rest.strip_prefix('='))
                })
                .find(|token| !token.is_empty())
                .map(String::from)
        })
}

/// Extract bearer token from Authorization header or session cookie
/// Prefers the Authorization header
pub(crate) fn extract_bearer_token(request: &Request) -> Option<String> {
    if let Some(header) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        if let Some(token) = header.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    extract_token_from_cookie(request)
}

/// Middleware that requires a valid, unexpired session token
pub async fn require_auth(
    State(auth_state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let Some(token) = extract_bearer_token(&request) else {
        tracing::debug!(path = %path, "require_auth: no token in header or cookie");
        return AuthError::MissingAuth.into_response();
    };

    match Session::from_token(
        &token,
        auth_state.jwt_secret.as_deref(),
        OffsetDateTime::now_utc(),
    ) {
        Ok(session) => {
            tracing::debug!(
                path = %path,
                user_id = %session.user_id,
                role = %session.role,
                "require_auth: authentication successful"
            );
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "require_auth: authentication failed");
            err.into_response()
        }
    }
}

/// Middleware that requires the admin role
/// Must run after `require_auth`
pub async fn require_admin(request: Request, next: Next) -> Response {
    match request.extensions().get::<Session>() {
        Some(session) if session.is_admin() => next.run(request).await,
        Some(session) => {
            tracing::warn!(
                user_id = %session.user_id,
                role = %session.role,
                path = %request.uri().path(),
                "require_admin: insufficient permissions"
            );
            AuthError::InsufficientPermissions.into_response()
        }
        None => AuthError::MissingAuth.into_response(),
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => ApiError::unauthorized("Authentication required"),
            AuthError::InvalidToken => ApiError::unauthorized("Invalid session token"),
            AuthError::TokenExpired => ApiError::token_expired(),
            AuthError::InsufficientPermissions => ApiError::forbidden("Admin access required"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(header: Option<&str>, cookie: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/dashboard");
        if let Some(h) = header {
            builder = builder.header(AUTHORIZATION, h);
        }
        if let Some(c) = cookie {
            builder = builder.header(COOKIE, c);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_from_header() {
        let req = request_with(Some("Bearer abc.def.ghi"), None);
        assert_eq!(extract_bearer_token(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_header_preferred_over_cookie() {
        let req = request_with(Some("Bearer from-header"), Some("whatsub_token=from-cookie"));
        assert_eq!(extract_bearer_token(&req).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_bearer_from_cookie() {
        let req = request_with(None, Some("theme=dark; whatsub_token=tok123; other=1"));
        assert_eq!(extract_bearer_token(&req).as_deref(), Some("tok123"));
    }

    #[test]
    fn test_non_bearer_scheme_falls_back_to_cookie() {
        let req = request_with(Some("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token(&req), None);

        let req = request_with(Some("Bearer "), Some("whatsub_token="));
        assert_eq!(extract_bearer_token(&req), None);
    }

    #[test]
    fn test_auth_error_status_codes() {
        use axum::http::StatusCode;
        assert_eq!(
            AuthError::MissingAuth.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::TokenExpired.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InsufficientPermissions.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
