// API crate clippy configuration
#![allow(clippy::needless_borrows_for_generic_args)] // Sometimes needed for clarity
#![allow(clippy::format_in_format_args)] // Intentional in logging macros
// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! WhatSub API Library
//!
//! This crate contains the dashboard API server: session handling, the
//! backend client, notification polling and the HTTP routes that feed the
//! stats engine.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod notifications;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
