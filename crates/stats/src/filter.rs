//! List filtering and sorting for the dashboard and admin tables

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use whatsub_shared::{Category, Subscription, SubscriptionStatus};

use crate::dates::parse_billing_day;
use crate::normalize::monthly_equivalent;

/// Criteria applied to an already-fetched list. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFilter {
    /// Case-insensitive substring of the service name
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    /// Inclusive lower bound on the native price
    #[serde(default)]
    pub price_min: Option<f64>,
    /// Inclusive upper bound on the native price
    #[serde(default)]
    pub price_max: Option<f64>,
    /// Owner id, matched exactly
    #[serde(default)]
    pub user_id: Option<String>,
}

impl SubscriptionFilter {
    pub fn is_empty(&self) -> bool {
        self == &SubscriptionFilter::default()
    }

    pub fn matches(&self, sub: &Subscription) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::trim) {
            if !needle.is_empty()
                && !sub
                    .service_name
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            {
                return false;
            }
        }

        if self.category.is_some_and(|c| c != sub.category) {
            return false;
        }

        if self.status.is_some_and(|s| s != sub.status) {
            return false;
        }

        if self.price_min.is_some_and(|min| sub.price < min) {
            return false;
        }

        if self.price_max.is_some_and(|max| sub.price > max) {
            return false;
        }

        if self
            .user_id
            .as_deref()
            .is_some_and(|owner| owner != sub.user_id)
        {
            return false;
        }

        true
    }

    /// Matching records, in input order
    pub fn apply<'a>(&self, subscriptions: &'a [Subscription]) -> Vec<&'a Subscription> {
        subscriptions.iter().filter(|sub| self.matches(sub)).collect()
    }
}

/// Column a list can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    NextBillingDate,
    ServiceName,
    Price,
    MonthlyEquivalent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

fn compare(key: SortKey, a: &Subscription, b: &Subscription) -> Ordering {
    match key {
        SortKey::ServiceName => a
            .service_name
            .to_lowercase()
            .cmp(&b.service_name.to_lowercase()),
        SortKey::Price => a.price.total_cmp(&b.price),
        SortKey::MonthlyEquivalent => monthly_equivalent(a).total_cmp(&monthly_equivalent(b)),
        // Handled by the caller so malformed dates stay last in both orders
        SortKey::NextBillingDate => Ordering::Equal,
    }
}

/// Stable sort in place.
///
/// When sorting by billing date, records whose date can't be parsed always go
/// after the ones that can, whatever the order.
pub fn sort_subscriptions(subscriptions: &mut [&Subscription], key: SortKey, order: SortOrder) {
    let directed = |ordering: Ordering| match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    match key {
        SortKey::NextBillingDate => {
            subscriptions.sort_by_cached_key(|sub| {
                let day = parse_billing_day(&sub.next_billing_date);
                (day.is_none(), day)
            });
            if order == SortOrder::Desc {
                let parsed = subscriptions
                    .iter()
                    .take_while(|sub| parse_billing_day(&sub.next_billing_date).is_some())
                    .count();
                // Reverse only the dated prefix; equal days must keep input order
                subscriptions[..parsed].sort_by(|a, b| {
                    directed(
                        parse_billing_day(&a.next_billing_date)
                            .cmp(&parse_billing_day(&b.next_billing_date)),
                    )
                });
            }
        }
        _ => subscriptions.sort_by(|a, b| directed(compare(key, a, b))),
    }
}
