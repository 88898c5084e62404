//! Subscription CRUD routes

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use whatsub_shared::{Subscription, SubscriptionDraft};
use whatsub_stats::parse_billing_day;

use super::ListQuery;
use crate::{
    auth::Session,
    backend::BatchDeleteResult,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Most ids accepted by one batch delete
const MAX_BATCH_DELETE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchDeleteResponse {
    pub deleted: usize,
    pub failed: usize,
    pub results: Vec<BatchDeleteResult>,
}

fn validate_draft(draft: &SubscriptionDraft) -> ApiResult<()> {
    if draft.service_name.trim().is_empty() {
        return Err(ApiError::bad_request("serviceName is required"));
    }
    if !draft.price.is_finite() || draft.price < 0.0 {
        return Err(ApiError::bad_request("price must be a non-negative number"));
    }
    if !draft.billing_cycle.is_known() {
        return Err(ApiError::bad_request(format!(
            "Unsupported billing cycle '{}'",
            draft.billing_cycle
        )));
    }
    if parse_billing_day(&draft.next_billing_date).is_none() {
        return Err(ApiError::bad_request(
            "nextBillingDate must be an ISO-8601 date",
        ));
    }
    Ok(())
}

fn validate_id(id: &str) -> ApiResult<()> {
    if id.trim().is_empty() || id.contains('/') {
        return Err(ApiError::bad_request("Invalid subscription id"));
    }
    Ok(())
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Subscription>>> {
    let all = state.backend.list_user_subscriptions(&session).await?;
    Ok(Json(query.apply(&all)?))
}

pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(draft): Json<SubscriptionDraft>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    validate_draft(&draft)?;

    let created = state.backend.create_subscription(&session, &draft).await?;
    tracing::info!(
        user_id = %session.user_id,
        subscription_id = %created.id,
        service = %created.service_name,
        "Subscription created"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_subscription(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(draft): Json<SubscriptionDraft>,
) -> ApiResult<Json<Subscription>> {
    validate_id(&id)?;
    validate_draft(&draft)?;

    let updated = state
        .backend
        .update_subscription(&session, &id, &draft)
        .await?;
    tracing::info!(user_id = %session.user_id, subscription_id = %id, "Subscription updated");

    Ok(Json(updated))
}

pub async fn delete_subscription(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    validate_id(&id)?;

    state.backend.delete_subscription(&session, &id).await?;
    tracing::info!(user_id = %session.user_id, subscription_id = %id, "Subscription deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn batch_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<BatchDeleteRequest>,
) -> ApiResult<Json<BatchDeleteResponse>> {
    if request.ids.is_empty() {
        return Err(ApiError::bad_request("ids must not be empty"));
    }
    if request.ids.len() > MAX_BATCH_DELETE {
        return Err(ApiError::bad_request(format!(
            "At most {MAX_BATCH_DELETE} ids can be deleted at once"
        )));
    }
    for id in &request.ids {
        validate_id(id)?;
    }

    let results = state.backend.batch_delete(&session, &request.ids).await;
    let deleted = results.iter().filter(|r| r.success).count();
    let failed = results.len() - deleted;

    tracing::info!(
        user_id = %session.user_id,
        deleted = deleted,
        failed = failed,
        "Batch delete finished"
    );

    Ok(Json(BatchDeleteResponse {
        deleted,
        failed,
        results,
    }))
}
