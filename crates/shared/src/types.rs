//! Subscription domain types
//!
//! These are the typed records every other crate works with. Backend payloads
//! are converted into them by [`crate::wire`] before any aggregation happens.

use serde::{Deserialize, Serialize};

/// Fixed category vocabulary used for distribution charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Category {
    Streaming,
    Music,
    Software,
    Gaming,
    Cloud,
    News,
    Fitness,
    Education,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Streaming,
        Category::Music,
        Category::Software,
        Category::Gaming,
        Category::Cloud,
        Category::News,
        Category::Fitness,
        Category::Education,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Streaming => "streaming",
            Category::Music => "music",
            Category::Software => "software",
            Category::Gaming => "gaming",
            Category::Cloud => "cloud",
            Category::News => "news",
            Category::Fitness => "fitness",
            Category::Education => "education",
            Category::Other => "other",
        }
    }

    /// Normalize a free-form backend value. Absent, empty and unrecognized
    /// values all land in `Other`.
    pub fn from_wire(value: Option<&str>) -> Self {
        value.and_then(Category::parse).unwrap_or(Category::Other)
    }

    /// Exact vocabulary match, ignoring case and surrounding whitespace
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        Category::ALL.into_iter().find(|c| c.as_str() == lowered)
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::from_wire(Some(&value))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurrence period of a subscription charge
///
/// Unrecognized tokens are kept verbatim so they can still be counted in the
/// billing-type distribution; they never contribute to monetary totals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    Unknown(String),
}

impl BillingCycle {
    pub fn as_str(&self) -> &str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
            BillingCycle::Unknown(raw) => raw,
        }
    }

    /// Parse a backend `billing_type`. The backend says `annually` where the
    /// dashboard says `yearly`; missing values default to monthly.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => BillingCycle::Monthly,
            Some("monthly") => BillingCycle::Monthly,
            Some("quarterly") => BillingCycle::Quarterly,
            Some("annually") | Some("yearly") => BillingCycle::Yearly,
            Some(other) => BillingCycle::Unknown(other.to_string()),
        }
    }

    /// Token the backend expects when writing
    pub fn to_wire(&self) -> &str {
        match self {
            BillingCycle::Yearly => "annually",
            other => other.as_str(),
        }
    }

    /// Divisor converting a native price into a monthly figure
    pub fn monthly_divisor(&self) -> Option<f64> {
        match self {
            BillingCycle::Monthly => Some(1.0),
            BillingCycle::Quarterly => Some(3.0),
            BillingCycle::Yearly => Some(12.0),
            BillingCycle::Unknown(_) => None,
        }
    }

    /// Multiplier converting a native price into a yearly figure
    pub fn yearly_multiplier(&self) -> Option<f64> {
        match self {
            BillingCycle::Monthly => Some(12.0),
            BillingCycle::Quarterly => Some(4.0),
            BillingCycle::Yearly => Some(1.0),
            BillingCycle::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, BillingCycle::Unknown(_))
    }
}

impl From<String> for BillingCycle {
    fn from(value: String) -> Self {
        BillingCycle::from_wire(Some(&value))
    }
}

impl From<BillingCycle> for String {
    fn from(value: BillingCycle) -> Self {
        match value {
            BillingCycle::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Cancelled,
    Paused,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Paused => "paused",
        }
    }

    /// Missing status means active. Anything unrecognized is treated as
    /// paused so it never inflates the active count.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => SubscriptionStatus::Active,
            Some(raw) => SubscriptionStatus::parse(raw).unwrap_or_else(|| {
                tracing::debug!(status = %raw, "Unrecognized subscription status, treating as paused");
                SubscriptionStatus::Paused
            }),
        }
    }

    /// Known status tokens only. `canceled` is accepted as a spelling of
    /// `cancelled`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(SubscriptionStatus::Active),
            "cancelled" | "canceled" => Some(SubscriptionStatus::Cancelled),
            "paused" => Some(SubscriptionStatus::Paused),
            _ => None,
        }
    }
}

impl From<String> for SubscriptionStatus {
    fn from(value: String) -> Self {
        SubscriptionStatus::from_wire(Some(&value))
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

/// A recurring-payment subscription as the dashboard sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub service_name: String,
    #[serde(default)]
    pub category: Category,
    /// Amount charged per native billing cycle (not normalized)
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    /// Raw ISO-8601 string; may be in the past or malformed
    pub next_billing_date: String,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default = "default_true")]
    pub auto_renew: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

/// Aggregate dashboard metrics, recomputed on every refresh
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStats {
    pub total_subscriptions: usize,
    pub active_subscriptions: usize,
    pub monthly_total: f64,
    pub yearly_total: f64,
    pub upcoming_payments: usize,
}
