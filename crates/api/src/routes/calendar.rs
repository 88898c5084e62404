//! Payment calendar route

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde::Deserialize;
use time::{Month, OffsetDateTime};
use whatsub_stats::{calendar_month, CalendarMonth};

use crate::{
    auth::Session,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u8>,
}

/// Billing dates for one month; defaults to the current UTC month
pub async fn calendar(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CalendarMonth>> {
    let today = OffsetDateTime::now_utc().date();
    let year = query.year.unwrap_or(today.year());
    let month = match query.month {
        Some(m) => Month::try_from(m)
            .map_err(|_| ApiError::bad_request(format!("month must be 1-12, got {m}")))?,
        None => today.month(),
    };

    let subscriptions = state.backend.list_user_subscriptions(&session).await?;

    calendar_month(&subscriptions, year, month)
        .map(Json)
        .ok_or_else(|| ApiError::bad_request(format!("Unsupported year {year}")))
}
