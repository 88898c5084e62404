//! Sign-in and session routes

use axum::{
    extract::{Extension, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use serde::Deserialize;
use whatsub_shared::SignInResponse;

use crate::{
    auth::{Session, SESSION_COOKIE},
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct GoogleSignInRequest {
    #[serde(alias = "idToken")]
    pub id_token: String,
}

/// Exchange a Google ID token for a session.
///
/// The backend issues the session token; it is returned in the body and as
/// an HttpOnly cookie so browser clients need not store it themselves.
pub async fn google_sign_in(
    State(state): State<AppState>,
    Json(request): Json<GoogleSignInRequest>,
) -> ApiResult<(HeaderMap, Json<SignInResponse>)> {
    if request.id_token.trim().is_empty() {
        return Err(ApiError::bad_request("id_token is required"));
    }

    let response = state
        .backend
        .sign_in_with_google(request.id_token.trim())
        .await?;

    tracing::info!(email = ?response.email, "User signed in with Google");

    let mut headers = HeaderMap::new();
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, response.token
    );
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.insert(SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "Session token not usable as a cookie value"),
    }

    Ok((headers, Json(response)))
}

/// The session behind the current token
pub async fn current_session(Extension(session): Extension<Session>) -> Json<Session> {
    Json(session)
}

/// End the session: expire the cookie and stop the user's notification poller
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> (StatusCode, HeaderMap) {
    state.notifications.stop(&session.user_id).await;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_static("whatsub_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );

    tracing::info!(user_id = %session.user_id, "User signed out");
    (StatusCode::NO_CONTENT, headers)
}
