//! Billing-cycle normalization
//!
//! Converts a native price into monthly or yearly equivalents. Unknown cycles
//! contribute zero so a single odd record can never turn a total into NaN.

use whatsub_shared::Subscription;

/// Price normalized to a per-month figure
pub fn monthly_equivalent(sub: &Subscription) -> f64 {
    sub.billing_cycle
        .monthly_divisor()
        .map(|divisor| sub.price / divisor)
        .unwrap_or(0.0)
}

/// Price normalized to a per-year figure
pub fn yearly_equivalent(sub: &Subscription) -> f64 {
    sub.billing_cycle
        .yearly_multiplier()
        .map(|multiplier| sub.price * multiplier)
        .unwrap_or(0.0)
}

/// Round to cents for display
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
