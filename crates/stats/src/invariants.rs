//! Snapshot Invariants Module
//!
//! Runnable data-quality checks over a fetched subscription snapshot.
//! The stats engine tolerates every problem found here (it skips bad dates and
//! zeroes unknown cycles); these checks make that silent tolerance visible so
//! the dashboard and admin views can report it.
//!
//! ## Design Principles
//!
//! 1. **Read-only**: Checks never modify the snapshot
//! 2. **Explanatory**: Violations carry the offending ids and values
//! 3. **Deterministic**: `now` is injected, never read from the clock

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use whatsub_shared::Subscription;

use crate::dates::{parse_billing_day, utc_day};

/// Result of a single failed check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotViolation {
    /// Which check was violated
    pub check: String,
    /// Subscriptions affected
    pub subscription_ids: Vec<String>,
    /// Human-readable description of the violation
    pub description: String,
    /// Offending values for debugging
    pub context: serde_json::Value,
    pub severity: ViolationSeverity,
}

/// Severity of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    /// Totals are understated
    High,
    /// Counts such as upcoming payments are off
    Medium,
    /// Cosmetic
    Low,
}

impl std::fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationSeverity::High => write!(f, "HIGH"),
            ViolationSeverity::Medium => write!(f, "MEDIUM"),
            ViolationSeverity::Low => write!(f, "LOW"),
        }
    }
}

/// Summary of all checks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCheckSummary {
    #[serde(with = "time::serde::rfc3339")]
    pub checked_at: OffsetDateTime,
    pub checks_run: usize,
    pub checks_passed: usize,
    pub checks_failed: usize,
    pub violations: Vec<SnapshotViolation>,
    pub healthy: bool,
}

/// Runs data-quality checks against one snapshot
pub struct SnapshotChecker<'a> {
    subscriptions: &'a [Subscription],
}

const CHECKS: [&str; 5] = [
    "known_billing_cycle",
    "parseable_billing_date",
    "non_negative_price",
    "service_name_present",
    "active_not_overdue",
];

impl<'a> SnapshotChecker<'a> {
    pub fn new(subscriptions: &'a [Subscription]) -> Self {
        Self { subscriptions }
    }

    /// Run all checks and return a summary
    pub fn run_all_checks(&self, now: OffsetDateTime) -> SnapshotCheckSummary {
        let violations: Vec<SnapshotViolation> = CHECKS
            .iter()
            .flat_map(|name| self.run_check(name, now))
            .collect();

        let checks_run = CHECKS.len();
        let checks_failed = violations
            .iter()
            .map(|v| &v.check)
            .collect::<std::collections::HashSet<_>>()
            .len();

        if !violations.is_empty() {
            tracing::debug!(
                violations = violations.len(),
                checks_failed = checks_failed,
                "Snapshot checks found problems"
            );
        }

        SnapshotCheckSummary {
            checked_at: now,
            checks_run,
            checks_passed: checks_run - checks_failed,
            checks_failed,
            healthy: violations.is_empty(),
            violations,
        }
    }

    /// Run a single check by name; unknown names yield nothing
    pub fn run_check(&self, name: &str, now: OffsetDateTime) -> Vec<SnapshotViolation> {
        match name {
            "known_billing_cycle" => self.check_known_billing_cycle(),
            "parseable_billing_date" => self.check_parseable_billing_date(),
            "non_negative_price" => self.check_non_negative_price(),
            "service_name_present" => self.check_service_name_present(),
            "active_not_overdue" => self.check_active_not_overdue(now),
            _ => vec![],
        }
    }

    pub fn available_checks() -> Vec<&'static str> {
        CHECKS.to_vec()
    }

    /// Unknown cycles contribute nothing to monthly and yearly totals
    fn check_known_billing_cycle(&self) -> Vec<SnapshotViolation> {
        self.subscriptions
            .iter()
            .filter(|sub| !sub.billing_cycle.is_known())
            .map(|sub| SnapshotViolation {
                check: "known_billing_cycle".to_string(),
                subscription_ids: vec![sub.id.clone()],
                description: format!(
                    "Subscription '{}' has unknown billing cycle '{}' and is excluded from totals",
                    sub.service_name, sub.billing_cycle
                ),
                context: serde_json::json!({
                    "billing_cycle": sub.billing_cycle.as_str(),
                    "price": sub.price,
                }),
                severity: ViolationSeverity::High,
            })
            .collect()
    }

    /// Unparseable dates never count as upcoming
    fn check_parseable_billing_date(&self) -> Vec<SnapshotViolation> {
        self.subscriptions
            .iter()
            .filter(|sub| parse_billing_day(&sub.next_billing_date).is_none())
            .map(|sub| SnapshotViolation {
                check: "parseable_billing_date".to_string(),
                subscription_ids: vec![sub.id.clone()],
                description: format!(
                    "Subscription '{}' has an unreadable next billing date",
                    sub.service_name
                ),
                context: serde_json::json!({
                    "next_billing_date": sub.next_billing_date,
                }),
                severity: ViolationSeverity::Medium,
            })
            .collect()
    }

    fn check_non_negative_price(&self) -> Vec<SnapshotViolation> {
        self.subscriptions
            .iter()
            .filter(|sub| sub.price < 0.0)
            .map(|sub| SnapshotViolation {
                check: "non_negative_price".to_string(),
                subscription_ids: vec![sub.id.clone()],
                description: format!(
                    "Subscription '{}' has negative price ${:.2}",
                    sub.service_name, sub.price
                ),
                context: serde_json::json!({ "price": sub.price }),
                severity: ViolationSeverity::High,
            })
            .collect()
    }

    /// Grouped into one violation since it only affects labels
    fn check_service_name_present(&self) -> Vec<SnapshotViolation> {
        let ids: Vec<String> = self
            .subscriptions
            .iter()
            .filter(|sub| sub.service_name.trim().is_empty())
            .map(|sub| sub.id.clone())
            .collect();

        if ids.is_empty() {
            return vec![];
        }

        vec![SnapshotViolation {
            check: "service_name_present".to_string(),
            description: format!("{} subscription(s) have no service name", ids.len()),
            context: serde_json::json!({ "count": ids.len() }),
            subscription_ids: ids,
            severity: ViolationSeverity::Low,
        }]
    }

    /// Active subscriptions whose next charge date has already passed
    fn check_active_not_overdue(&self, now: OffsetDateTime) -> Vec<SnapshotViolation> {
        let today = utc_day(now);

        self.subscriptions
            .iter()
            .filter(|sub| sub.is_active())
            .filter_map(|sub| {
                parse_billing_day(&sub.next_billing_date)
                    .filter(|day| *day < today)
                    .map(|day| (sub, day))
            })
            .map(|(sub, day)| SnapshotViolation {
                check: "active_not_overdue".to_string(),
                subscription_ids: vec![sub.id.clone()],
                description: format!(
                    "Active subscription '{}' has a next billing date {} days in the past",
                    sub.service_name,
                    (today - day).whole_days()
                ),
                context: serde_json::json!({
                    "next_billing_date": sub.next_billing_date,
                    "today": today.to_string(),
                }),
                severity: ViolationSeverity::Medium,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::subscription_due;
    use time::macros::datetime;
    use whatsub_shared::{BillingCycle, SubscriptionStatus};

    const NOW: OffsetDateTime = datetime!(2025-03-10 09:00:00 UTC);

    #[test]
    fn test_violation_severity_display() {
        assert_eq!(ViolationSeverity::High.to_string(), "HIGH");
        assert_eq!(ViolationSeverity::Medium.to_string(), "MEDIUM");
        assert_eq!(ViolationSeverity::Low.to_string(), "LOW");
    }

    #[test]
    fn test_available_checks() {
        let checks = SnapshotChecker::available_checks();
        assert_eq!(checks.len(), 5);
        assert!(checks.contains(&"known_billing_cycle"));
        assert!(checks.contains(&"active_not_overdue"));
    }

    #[test]
    fn test_clean_snapshot_is_healthy() {
        let subs = vec![subscription_due("1", 9.99, BillingCycle::Monthly, "2025-03-15")];
        let summary = SnapshotChecker::new(&subs).run_all_checks(NOW);
        assert!(summary.healthy);
        assert_eq!(summary.checks_run, 5);
        assert_eq!(summary.checks_passed, 5);
        assert_eq!(summary.checks_failed, 0);
    }

    #[test]
    fn test_problems_are_reported() {
        let mut nameless = subscription_due("4", 1.0, BillingCycle::Monthly, "2025-03-15");
        nameless.service_name = "  ".to_string();
        let mut paused_past = subscription_due("5", 1.0, BillingCycle::Monthly, "2025-01-01");
        paused_past.status = SubscriptionStatus::Paused;

        let subs = vec![
            subscription_due("1", 5.0, BillingCycle::Unknown("weekly".into()), "2025-03-15"),
            subscription_due("2", 5.0, BillingCycle::Monthly, "someday"),
            subscription_due("3", -2.0, BillingCycle::Monthly, "2025-03-08"),
            nameless,
            paused_past,
        ];

        let summary = SnapshotChecker::new(&subs).run_all_checks(NOW);
        assert!(!summary.healthy);
        assert_eq!(summary.checks_failed, 5);
        assert_eq!(summary.checks_passed, 0);

        let overdue = SnapshotChecker::new(&subs).run_check("active_not_overdue", NOW);
        // The paused one is past due too but isn't active
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].subscription_ids, vec!["3".to_string()]);
        assert!(overdue[0].description.contains("2 days"));
    }

    #[test]
    fn test_unknown_check_name() {
        let subs = vec![subscription_due("1", 5.0, BillingCycle::Monthly, "x")];
        assert!(SnapshotChecker::new(&subs).run_check("nope", NOW).is_empty());
    }
}
