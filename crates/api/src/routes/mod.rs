//! HTTP routes

pub mod admin;
pub mod auth;
pub mod calendar;
pub mod dashboard;
pub mod notifications;
pub mod subscriptions;

use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use whatsub_shared::{Category, Subscription, SubscriptionStatus};
use whatsub_stats::{sort_subscriptions, SortKey, SortOrder, SubscriptionFilter};

use crate::{
    auth::{require_admin, require_auth},
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();

    // Admin routes: require_auth runs first, then require_admin
    let admin_routes = Router::new()
        .route("/api/admin/overview", get(admin::overview))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{id}", get(admin::user_detail))
        .route("/api/admin/subscriptions", get(admin::list_subscriptions))
        .route_layer(middleware::from_fn(require_admin));

    let protected_routes = Router::new()
        .route("/api/auth/session", get(auth::current_session))
        .route("/api/auth/logout", post(auth::sign_out))
        .route("/api/dashboard", get(dashboard::dashboard))
        .route(
            "/api/subscriptions",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route(
            "/api/subscriptions/batch-delete",
            post(subscriptions::batch_delete),
        )
        .route(
            "/api/subscriptions/{id}",
            put(subscriptions::update_subscription).delete(subscriptions::delete_subscription),
        )
        .route("/api/calendar", get(calendar::calendar))
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/api/notifications/{id}/read",
            post(notifications::mark_read),
        )
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/google", post(auth::google_sign_in))
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// Shared list query
// =============================================================================

/// Filter and sort parameters shared by list endpoints.
///
/// Values arrive as raw strings so that an empty value or `all` means
/// "no filter". Anything else must be a known token or the request is
/// rejected with 400.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub user_id: Option<String>,
}

fn selected(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn parse_price(name: &str, value: &Option<String>) -> ApiResult<Option<f64>> {
    match selected(value) {
        None => Ok(None),
        Some(raw) => match raw.parse::<f64>() {
            Ok(price) if price.is_finite() => Ok(Some(price)),
            _ => Err(ApiError::bad_request(format!(
                "{name} must be a number, got '{raw}'"
            ))),
        },
    }
}

fn parse_choice<T: serde::de::DeserializeOwned>(name: &str, value: &Option<String>) -> ApiResult<Option<T>> {
    match selected(value) {
        None => Ok(None),
        Some(raw) => serde_json::from_value(serde_json::Value::String(raw.to_string()))
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Unsupported {name} '{raw}'"))),
    }
}

fn parse_token<T>(
    name: &str,
    value: &Option<String>,
    parse: impl Fn(&str) -> Option<T>,
) -> ApiResult<Option<T>> {
    match selected(value) {
        None => Ok(None),
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Unsupported {name} '{raw}'"))),
    }
}

impl ListQuery {
    pub fn filter(&self) -> ApiResult<SubscriptionFilter> {
        Ok(SubscriptionFilter {
            search: selected(&self.search).map(String::from),
            category: parse_token("category", &self.category, Category::parse)?,
            status: parse_token("status", &self.status, SubscriptionStatus::parse)?,
            price_min: parse_price("priceMin", &self.price_min)?,
            price_max: parse_price("priceMax", &self.price_max)?,
            user_id: selected(&self.user_id).map(String::from),
        })
    }

    pub fn sorting(&self) -> ApiResult<(SortKey, SortOrder)> {
        Ok((
            parse_choice("sort", &self.sort)?.unwrap_or_default(),
            parse_choice("order", &self.order)?.unwrap_or_default(),
        ))
    }

    /// Filtered and sorted copy of `subscriptions`
    pub fn apply(&self, subscriptions: &[Subscription]) -> ApiResult<Vec<Subscription>> {
        let filter = self.filter()?;
        let (key, order) = self.sorting()?;

        let mut matching = filter.apply(subscriptions);
        sort_subscriptions(&mut matching, key, order);
        Ok(matching.into_iter().cloned().collect())
    }
}
