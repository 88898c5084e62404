// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! WhatSub shared types
//!
//! Domain model and backend payload adapter shared by the stats engine and the
//! API server.

pub mod error;
pub mod types;
pub mod wire;

pub use error::PayloadError;
pub use types::{BillingCycle, Category, Subscription, SubscriptionStats, SubscriptionStatus};
pub use wire::{
    adapt_all, AdminStats, AdminUser, Notification, Page, SignInResponse, SubscriptionDraft,
    SubscriptionPayload, UnreadCount,
};
