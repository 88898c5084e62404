//! Edge Case Tests for Authentication
//!
//! Tests boundary conditions in:
//! - Token extraction from headers and cookies
//! - Expiry at exact second boundaries
//! - Role handling for admin checks

#[cfg(test)]
mod extraction_tests {
    use super::super::middleware::extract_bearer_token;
    use axum::{
        body::Body,
        extract::Request,
        http::header::{AUTHORIZATION, COOKIE},
    };

    fn with_cookie(cookie: &str) -> Request {
        axum::http::Request::builder()
            .header(COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    // =========================================================================
    // Cookie with a similar name is not the session cookie
    // =========================================================================
    #[test]
    fn test_similar_cookie_name_ignored() {
        let req = with_cookie("whatsub_token_old=stale; whatsub_token=fresh");
        assert_eq!(extract_bearer_token(&req).as_deref(), Some("fresh"));

        let req = with_cookie("whatsub_token_old=stale");
        assert_eq!(extract_bearer_token(&req), None);
    }

    // =========================================================================
    // Lowercase scheme is not accepted
    // =========================================================================
    #[test]
    fn test_scheme_is_case_sensitive() {
        let req = axum::http::Request::builder()
            .header(AUTHORIZATION, "bearer abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&req), None);
    }

    // =========================================================================
    // Surrounding whitespace is trimmed from the header token
    // =========================================================================
    #[test]
    fn test_header_token_trimmed() {
        let req = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer   abc  ")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&req).as_deref(), Some("abc"));
    }
}

#[cfg(test)]
mod expiry_tests {
    use super::super::jwt::test_tokens::{claims, token, SECRET};
    use super::super::middleware::AuthError;
    use super::super::session::Session;
    use time::macros::datetime;
    use time::OffsetDateTime;

    const NOW: OffsetDateTime = datetime!(2025-03-10 12:00:00 UTC);

    // =========================================================================
    // One second left is still valid
    // =========================================================================
    #[test]
    fn test_one_second_remaining_valid() {
        let tok = token(&claims("u", "user", NOW.unix_timestamp() + 1), SECRET);
        let session = Session::from_token(&tok, Some(SECRET), NOW).unwrap();
        assert_eq!(
            session.time_until_expiry(NOW),
            Some(std::time::Duration::from_secs(1))
        );
    }

    // =========================================================================
    // Expiring exactly now is expired
    // =========================================================================
    #[test]
    fn test_expiring_now_rejected() {
        let tok = token(&claims("u", "user", NOW.unix_timestamp()), SECRET);
        assert_eq!(
            Session::from_token(&tok, Some(SECRET), NOW).unwrap_err(),
            AuthError::TokenExpired
        );
    }

    // =========================================================================
    // Out-of-range exp is invalid rather than a panic
    // =========================================================================
    #[test]
    fn test_out_of_range_exp_invalid() {
        let tok = token(&claims("u", "user", i64::MAX), SECRET);
        assert_eq!(
            Session::from_token(&tok, Some(SECRET), NOW).unwrap_err(),
            AuthError::InvalidToken
        );
    }
}

#[cfg(test)]
mod role_tests {
    use super::super::jwt::test_tokens::{claims, token, SECRET};
    use super::super::session::Session;
    use time::macros::datetime;
    use time::OffsetDateTime;

    const NOW: OffsetDateTime = datetime!(2025-03-10 12:00:00 UTC);

    fn session_with_role(role: &str) -> Session {
        let tok = token(&claims("u", role, NOW.unix_timestamp() + 60), SECRET);
        Session::from_token(&tok, None, NOW).unwrap()
    }

    // =========================================================================
    // Only the exact "admin" role passes the admin check
    // =========================================================================
    #[test]
    fn test_admin_role_is_exact() {
        assert!(session_with_role("admin").is_admin());
        assert!(!session_with_role("Admin").is_admin());
        assert!(!session_with_role("superadmin").is_admin());
        assert!(!session_with_role("user").is_admin());
    }

    // =========================================================================
    // Blank role falls back to user
    // =========================================================================
    #[test]
    fn test_blank_role_defaults_to_user() {
        assert_eq!(session_with_role("   ").role, "user");
    }
}
