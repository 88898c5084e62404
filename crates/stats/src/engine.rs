//! Dashboard statistics
//!
//! `compute_stats` is a pure function of the snapshot and an injected `now`;
//! it never reads the clock and never fails.

use time::{Date, Duration, OffsetDateTime};
use whatsub_shared::{Subscription, SubscriptionStats};

use crate::dates::{parse_billing_day, utc_day};
use crate::normalize::{monthly_equivalent, yearly_equivalent};

/// Days after today still counted as upcoming (inclusive)
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Inclusive `[today, today + UPCOMING_WINDOW_DAYS]` window in UTC days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpcomingWindow {
    pub start: Date,
    pub end: Date,
}

impl UpcomingWindow {
    pub fn starting_at(now: OffsetDateTime) -> Self {
        let start = utc_day(now);
        let end = start
            .checked_add(Duration::days(UPCOMING_WINDOW_DAYS))
            .unwrap_or(Date::MAX);
        Self { start, end }
    }

    pub fn contains(&self, day: Date) -> bool {
        self.start <= day && day <= self.end
    }

    /// Whether a raw billing date falls in the window; malformed dates never do
    pub fn includes_billing_date(&self, raw: &str) -> bool {
        parse_billing_day(raw).is_some_and(|day| self.contains(day))
    }
}

/// Derive the dashboard counters and totals for a snapshot
pub fn compute_stats(subscriptions: &[Subscription], now: OffsetDateTime) -> SubscriptionStats {
    let window = UpcomingWindow::starting_at(now);

    subscriptions.iter().fold(
        SubscriptionStats {
            total_subscriptions: subscriptions.len(),
            ..SubscriptionStats::default()
        },
        |mut stats, sub| {
            if sub.is_active() {
                stats.active_subscriptions += 1;
            }
            stats.monthly_total += monthly_equivalent(sub);
            stats.yearly_total += yearly_equivalent(sub);
            if window.includes_billing_date(&sub.next_billing_date) {
                stats.upcoming_payments += 1;
            }
            stats
        },
    )
}

/// Subscriptions due inside the upcoming window, soonest first
pub fn upcoming_subscriptions(
    subscriptions: &[Subscription],
    now: OffsetDateTime,
) -> Vec<&Subscription> {
    let window = UpcomingWindow::starting_at(now);
    let mut due: Vec<(Date, &Subscription)> = subscriptions
        .iter()
        .filter_map(|sub| {
            parse_billing_day(&sub.next_billing_date)
                .filter(|day| window.contains(*day))
                .map(|day| (day, sub))
        })
        .collect();
    due.sort_by_key(|(day, _)| *day);
    due.into_iter().map(|(_, sub)| sub).collect()
}
