//! Notification routes

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    auth::Session, error::ApiResult, notifications::NotificationSnapshot, state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub marked: usize,
}

/// Latest notifications for the user.
///
/// Served from the user's poller; the first request after sign-in fetches
/// directly since the poller has not completed a refresh yet.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<NotificationSnapshot>> {
    let snapshot = state.notifications.snapshot_for(&session).await;
    if snapshot.refreshed_at.is_some() {
        return Ok(Json(snapshot));
    }

    let notifications = state.backend.notifications(&session, false).await?;
    let unread_count = state.backend.unread_count(&session).await?;

    Ok(Json(NotificationSnapshot {
        notifications,
        unread_count,
        refreshed_at: Some(OffsetDateTime::now_utc()),
        last_error: None,
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MarkReadResponse>> {
    state.backend.mark_notification_read(&session, id).await?;
    state.notifications.request_refresh(&session.user_id).await;

    Ok(Json(MarkReadResponse { marked: 1 }))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<MarkReadResponse>> {
    let unread = state.backend.notifications(&session, true).await?;

    let mut marked = 0;
    for notification in unread.iter().filter(|n| n.is_unread()) {
        state
            .backend
            .mark_notification_read(&session, notification.id)
            .await?;
        marked += 1;
    }

    state.notifications.request_refresh(&session.user_id).await;
    tracing::info!(user_id = %session.user_id, marked = marked, "Marked notifications read");

    Ok(Json(MarkReadResponse { marked }))
}
