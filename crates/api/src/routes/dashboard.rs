//! Dashboard route

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde::Serialize;
use time::OffsetDateTime;
use whatsub_shared::{Subscription, SubscriptionStats};
use whatsub_stats::{
    compute_stats, group_by_billing_cycle, group_by_category, upcoming_subscriptions,
    BillingCycleGroup, CategoryGroup, SnapshotCheckSummary, SnapshotChecker,
};

use super::ListQuery;
use crate::{auth::Session, error::ApiResult, state::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// Computed over the full snapshot, not the filtered list
    pub stats: SubscriptionStats,
    pub subscriptions: Vec<Subscription>,
    /// Due within the next seven days, soonest first
    pub upcoming: Vec<Subscription>,
    pub by_category: Vec<CategoryGroup>,
    pub by_billing_cycle: Vec<BillingCycleGroup>,
    pub checks: SnapshotCheckSummary,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<DashboardResponse>> {
    let all = state.backend.list_user_subscriptions(&session).await?;
    let subscriptions = query.apply(&all)?;
    let now = OffsetDateTime::now_utc();

    let stats = compute_stats(&all, now);
    let checks = SnapshotChecker::new(&all).run_all_checks(now);

    tracing::debug!(
        user_id = %session.user_id,
        total = stats.total_subscriptions,
        shown = subscriptions.len(),
        upcoming = stats.upcoming_payments,
        "Dashboard computed"
    );

    Ok(Json(DashboardResponse {
        stats,
        upcoming: upcoming_subscriptions(&all, now)
            .into_iter()
            .cloned()
            .collect(),
        by_category: group_by_category(&all),
        by_billing_cycle: group_by_billing_cycle(&all),
        checks,
        subscriptions,
    }))
}
