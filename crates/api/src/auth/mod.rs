//! Authentication module for WhatSub

pub mod jwt;
pub mod middleware;
pub mod session;

pub use jwt::{decode_claims, Claims};
pub use middleware::{require_admin, require_auth, AuthError, AuthState, SESSION_COOKIE};
pub use session::Session;

#[cfg(test)]
mod edge_case_tests;
