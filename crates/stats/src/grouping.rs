//! Distribution groupings for charts

use std::collections::HashMap;

use serde::Serialize;
use whatsub_shared::{BillingCycle, Category, Subscription};

use crate::normalize::monthly_equivalent;

/// Monthly spend and record count for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category: Category,
    pub monthly_equivalent_total: f64,
    pub count: usize,
}

/// Record count for one billing cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingCycleGroup {
    pub billing_cycle: BillingCycle,
    pub count: usize,
}

/// Number of users holding a given range of subscriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCountBucket {
    pub range: &'static str,
    pub users: usize,
}

/// Bucket labels with their inclusive bounds, in display order
const USER_COUNT_RANGES: [(&str, usize, usize); 5] = [
    ("1", 1, 1),
    ("2-3", 2, 3),
    ("4-5", 4, 5),
    ("6-10", 6, 10),
    ("11+", 11, usize::MAX),
];

/// Group by category, sorted by descending monthly spend.
///
/// Ties keep the order in which categories were first seen.
pub fn group_by_category(subscriptions: &[Subscription]) -> Vec<CategoryGroup> {
    let mut index: HashMap<Category, usize> = HashMap::new();
    let mut groups: Vec<CategoryGroup> = Vec::new();

    for sub in subscriptions {
        let slot = *index.entry(sub.category).or_insert_with(|| {
            groups.push(CategoryGroup {
                category: sub.category,
                monthly_equivalent_total: 0.0,
                count: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.monthly_equivalent_total += monthly_equivalent(sub);
        group.count += 1;
    }

    // sort_by is stable, which is what keeps ties in first-seen order
    groups.sort_by(|a, b| b.monthly_equivalent_total.total_cmp(&a.monthly_equivalent_total));
    groups
}

/// Count records per billing cycle in first-seen order
pub fn group_by_billing_cycle(subscriptions: &[Subscription]) -> Vec<BillingCycleGroup> {
    let mut groups: Vec<BillingCycleGroup> = Vec::new();

    for sub in subscriptions {
        match groups
            .iter_mut()
            .find(|g| g.billing_cycle == sub.billing_cycle)
        {
            Some(group) => group.count += 1,
            None => groups.push(BillingCycleGroup {
                billing_cycle: sub.billing_cycle.clone(),
                count: 1,
            }),
        }
    }

    groups
}

/// How many users hold 1, 2-3, 4-5, 6-10 or 11+ subscriptions.
///
/// Empty buckets are left out.
pub fn user_subscription_distribution(subscriptions: &[Subscription]) -> Vec<UserCountBucket> {
    let mut per_user: HashMap<&str, usize> = HashMap::new();
    for sub in subscriptions {
        *per_user.entry(sub.user_id.as_str()).or_default() += 1;
    }

    USER_COUNT_RANGES
        .iter()
        .map(|(label, low, high)| UserCountBucket {
            range: *label,
            users: per_user
                .values()
                .filter(|count| (*low..=*high).contains(*count))
                .count(),
        })
        .filter(|bucket| bucket.users > 0)
        .collect()
}
