// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! WhatSub Stats Engine
//!
//! Pure functions that turn a snapshot of subscriptions into dashboard
//! figures. Nothing in this crate performs I/O, reads the clock or holds
//! state; `now` is always passed in.
//!
//! ## Features
//!
//! - **Normalization**: Monthly/yearly equivalents across billing cycles
//! - **Dashboard Stats**: Totals, active count, payments due this week
//! - **Distributions**: Category and billing-cycle groupings for charts
//! - **Filtering**: Search, category, status and price-range filters with sorting
//! - **Calendar**: Per-day billing layout and month totals
//! - **Snapshot Checks**: Data-quality checks over a snapshot

pub mod calendar;
pub mod dates;
pub mod engine;
pub mod filter;
pub mod grouping;
pub mod invariants;
pub mod normalize;

#[cfg(test)]
mod test_support;

// Calendar
pub use calendar::{calendar_month, month_total, payments_on, CalendarDay, CalendarMonth};

// Dates
pub use dates::parse_billing_day;

// Engine
pub use engine::{compute_stats, upcoming_subscriptions, UpcomingWindow, UPCOMING_WINDOW_DAYS};

// Filtering
pub use filter::{sort_subscriptions, SortKey, SortOrder, SubscriptionFilter};

// Grouping
pub use grouping::{
    group_by_billing_cycle, group_by_category, user_subscription_distribution, BillingCycleGroup,
    CategoryGroup, UserCountBucket,
};

// Invariants
pub use invariants::{SnapshotCheckSummary, SnapshotChecker, SnapshotViolation, ViolationSeverity};

// Normalization
pub use normalize::{monthly_equivalent, round_cents, yearly_equivalent};
