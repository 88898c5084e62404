//! Fixtures shared by the unit tests

use whatsub_shared::{BillingCycle, Category, Subscription, SubscriptionStatus};

pub(crate) fn subscription(id: &str, price: f64, billing_cycle: BillingCycle) -> Subscription {
    subscription_due(id, price, billing_cycle, "2025-01-01T00:00:00Z")
}

pub(crate) fn subscription_due(
    id: &str,
    price: f64,
    billing_cycle: BillingCycle,
    next_billing_date: &str,
) -> Subscription {
    Subscription {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        service_name: format!("Service {id}"),
        category: Category::Other,
        price,
        currency: "USD".to_string(),
        billing_cycle,
        next_billing_date: next_billing_date.to_string(),
        status: SubscriptionStatus::Active,
        auto_renew: true,
        start_date: None,
        description: None,
        url: None,
        account: None,
    }
}

pub(crate) fn subscription_for(id: &str, user_id: &str) -> Subscription {
    let mut sub = subscription(id, 1.0, BillingCycle::Monthly);
    sub.user_id = user_id.to_string();
    sub
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
