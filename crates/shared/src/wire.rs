//! Backend wire payloads and the parse step that turns them into domain types
//!
//! The backend speaks snake_case JSON with loosely typed fields (ids and prices
//! arrive as numbers or strings, billing cycles use `annually`). Everything is
//! normalized here so the stats engine only ever sees [`Subscription`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PayloadError;
use crate::types::{BillingCycle, Category, Subscription, SubscriptionStatus};

/// Paginated list envelope returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Subscription record exactly as the backend returns it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionPayload {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub user_id: Value,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub billing_type: Option<String>,
    #[serde(default)]
    pub billing_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub auto_renew: Option<bool>,
}

/// Render a loosely typed scalar as a string; null and containers yield None
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_price(id: &str, value: &Value) -> Result<f64, PayloadError> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match price {
        Some(p) if p.is_finite() => Ok(p),
        Some(_) => Err(PayloadError::NonFinitePrice { id: id.to_string() }),
        None => Err(PayloadError::InvalidPrice {
            id: id.to_string(),
            raw: value.to_string(),
        }),
    }
}

impl TryFrom<SubscriptionPayload> for Subscription {
    type Error = PayloadError;

    fn try_from(payload: SubscriptionPayload) -> Result<Self, Self::Error> {
        let id = scalar_to_string(&payload.id).ok_or(PayloadError::MissingId)?;
        let price = parse_price(&id, &payload.price)?;

        Ok(Subscription {
            user_id: scalar_to_string(&payload.user_id).unwrap_or_default(),
            service_name: payload.plan.unwrap_or_default(),
            category: Category::from_wire(payload.category.as_deref()),
            price,
            currency: payload
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "USD".to_string()),
            billing_cycle: BillingCycle::from_wire(payload.billing_type.as_deref()),
            next_billing_date: payload.billing_date.unwrap_or_default(),
            status: SubscriptionStatus::from_wire(payload.status.as_deref()),
            auto_renew: payload.auto_renew.unwrap_or(true),
            start_date: payload.created_at,
            description: payload.account.clone(),
            url: payload.url,
            account: payload.account,
            id,
        })
    }
}

/// Adapt a page of backend records, dropping the ones that fail validation
pub fn adapt_all(payloads: Vec<SubscriptionPayload>) -> Vec<Subscription> {
    let received = payloads.len();
    let subscriptions: Vec<Subscription> = payloads
        .into_iter()
        .filter_map(|payload| match Subscription::try_from(payload) {
            Ok(sub) => Some(sub),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping invalid subscription payload");
                None
            }
        })
        .collect();

    if subscriptions.len() != received {
        tracing::warn!(
            received = received,
            kept = subscriptions.len(),
            "Some subscription payloads were rejected"
        );
    }

    subscriptions
}

/// Create/update input coming from the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDraft {
    pub service_name: String,
    pub price: f64,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    pub next_billing_date: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl SubscriptionDraft {
    /// Backend JSON body for this draft, owned by `user_id`
    pub fn to_payload(&self, user_id: &str) -> Value {
        let mut body = serde_json::json!({
            "user_id": user_id,
            "plan": self.service_name,
            "price": self.price,
            "billing_type": self.billing_cycle.to_wire(),
            "billing_date": self.next_billing_date,
            "category": self.category.as_str(),
            "status": self.status.as_str(),
        });

        if let Value::Object(map) = &mut body {
            if let Some(account) = &self.account {
                map.insert("account".to_string(), Value::String(account.clone()));
            }
            if let Some(url) = &self.url {
                map.insert("url".to_string(), Value::String(url.clone()));
            }
            if let Some(currency) = &self.currency {
                map.insert("currency".to_string(), Value::String(currency.clone()));
            }
        }

        body
    }
}

/// In-app notification about an upcoming or failed payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(default)]
    pub user_id: Value,
    #[serde(default)]
    pub subscription_id: Option<Value>,
    #[serde(default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub read_at: Option<String>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

/// Unread counter envelope
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(alias = "unread_count")]
    pub count: u64,
}

/// User row from the admin listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(default)]
    pub id: Value,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl AdminUser {
    /// Id in the same string form subscriptions use for `user_id`
    pub fn id_string(&self) -> Option<String> {
        scalar_to_string(&self.id)
    }
}

/// Platform-wide counters computed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_subscriptions: u64,
    #[serde(default)]
    pub active_subscriptions: u64,
    #[serde(default)]
    pub total_monthly_revenue: f64,
}

/// Response of the Google ID token exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}
