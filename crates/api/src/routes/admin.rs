//! Admin routes
//!
//! Protected by `require_admin`. Figures are computed over every user's
//! subscriptions as returned by the backend's admin listing.

use std::collections::BTreeMap;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use whatsub_shared::{AdminStats, AdminUser, Category, Subscription, SubscriptionStats};
use whatsub_stats::{
    compute_stats, group_by_billing_cycle, group_by_category, round_cents,
    user_subscription_distribution, BillingCycleGroup, CategoryGroup, SnapshotCheckSummary,
    SnapshotChecker, SubscriptionFilter, UserCountBucket,
};

use super::ListQuery;
use crate::{
    auth::Session,
    backend::BackendError,
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRevenue {
    pub category: Category,
    /// Monthly-equivalent revenue, rounded to cents
    pub monthly_revenue: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub stats: Option<AdminStats>,
    pub category_distribution: Vec<CategoryGroup>,
    pub revenue_by_category: Vec<CategoryRevenue>,
    pub billing_type_distribution: Vec<BillingCycleGroup>,
    pub user_distribution: Vec<UserCountBucket>,
    pub checks: Option<SnapshotCheckSummary>,
    /// Sections that failed to load, keyed by section name
    pub errors: BTreeMap<&'static str, String>,
}

/// One user with their subscriptions, for the admin detail view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserDetail {
    pub user: AdminUser,
    pub subscriptions: Vec<Subscription>,
    pub stats: SubscriptionStats,
    /// Monthly-equivalent spend, rounded to cents
    pub monthly_total: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub role: Option<String>,
}

// =============================================================================
// Helper Functions
// =============================================================================

/// A rejected session fails the whole request; anything else is reported
/// against its section
fn section_error(section: &'static str, err: BackendError) -> ApiResult<String> {
    match err {
        BackendError::Unauthorized => Err(ApiError::from(err)),
        other => {
            tracing::warn!(section = section, error = %other, "Admin overview section failed");
            Ok(other.to_string())
        }
    }
}

fn revenue_by_category(groups: &[CategoryGroup]) -> Vec<CategoryRevenue> {
    groups
        .iter()
        .map(|group| CategoryRevenue {
            category: group.category,
            monthly_revenue: round_cents(group.monthly_equivalent_total),
        })
        .collect()
}

fn matches_user(user: &AdminUser, query: &ListUsersQuery) -> bool {
    if let Some(needle) = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
    {
        let in_email = user.email.to_lowercase().contains(&needle);
        let in_name = user
            .full_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&needle));
        if !in_email && !in_name {
            return false;
        }
    }

    match query.role.as_deref().map(str::trim) {
        None | Some("") | Some("all") => true,
        Some(role) => user.role.eq_ignore_ascii_case(role),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Platform figures and chart data
pub async fn overview(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<AdminOverview>> {
    let (stats, subscriptions) = tokio::join!(
        state.backend.admin_stats(&session),
        state.backend.admin_subscriptions(&session),
    );

    let mut errors = BTreeMap::new();

    let stats = match stats {
        Ok(stats) => Some(stats),
        Err(e) => {
            errors.insert("stats", section_error("stats", e)?);
            None
        }
    };

    let subscriptions: Vec<Subscription> = match subscriptions {
        Ok(subs) => subs,
        Err(e) => {
            errors.insert("subscriptions", section_error("subscriptions", e)?);
            Vec::new()
        }
    };

    let category_distribution = group_by_category(&subscriptions);
    let checks = (!errors.contains_key("subscriptions"))
        .then(|| SnapshotChecker::new(&subscriptions).run_all_checks(OffsetDateTime::now_utc()));

    tracing::info!(
        admin_id = %session.user_id,
        subscriptions = subscriptions.len(),
        failed_sections = errors.len(),
        "Admin overview computed"
    );

    Ok(Json(AdminOverview {
        stats,
        revenue_by_category: revenue_by_category(&category_distribution),
        category_distribution,
        billing_type_distribution: group_by_billing_cycle(&subscriptions),
        user_distribution: user_subscription_distribution(&subscriptions),
        checks,
        errors,
    }))
}

/// List users, optionally filtered by search text and role
pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Vec<AdminUser>>> {
    let users = state.backend.admin_users(&session).await?;
    let total = users.len();

    let users: Vec<AdminUser> = users
        .into_iter()
        .filter(|user| matches_user(user, &query))
        .collect();

    tracing::debug!(total = total, shown = users.len(), "Admin user list");
    Ok(Json(users))
}

/// A single user and the figures for their subscriptions
pub async fn user_detail(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<AdminUserDetail>> {
    let (users, subscriptions) = tokio::join!(
        state.backend.admin_users(&session),
        state.backend.admin_subscriptions(&session),
    );

    let user = users?
        .into_iter()
        .find(|user| user.id_string().as_deref() == Some(user_id.as_str()))
        .ok_or_else(|| ApiError::not_found(format!("User '{user_id}' not found")))?;

    let owned = SubscriptionFilter {
        user_id: Some(user_id),
        ..Default::default()
    };
    let subscriptions: Vec<Subscription> =
        owned.apply(&subscriptions?).into_iter().cloned().collect();
    let stats = compute_stats(&subscriptions, OffsetDateTime::now_utc());

    Ok(Json(AdminUserDetail {
        user,
        monthly_total: round_cents(stats.monthly_total),
        stats,
        subscriptions,
    }))
}

/// All users' subscriptions with the dashboard filters applied
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Subscription>>> {
    let all = state.backend.admin_subscriptions(&session).await?;
    Ok(Json(query.apply(&all)?))
}
