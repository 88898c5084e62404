//! HTTP client for the WhatSub data backend

use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use whatsub_shared::{
    adapt_all, AdminStats, AdminUser, Notification, Page, SignInResponse, Subscription,
    SubscriptionDraft, SubscriptionPayload, UnreadCount,
};

use super::signature::{canonical_json, sign_bytes, SIGNATURE_HEADER};
use crate::auth::Session;
use crate::config::Config;

/// Page size requested from list endpoints
const PAGE_SIZE: usize = 100;

/// Upper bound on pages followed for one listing
const MAX_PAGES: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend rejected the credentials")]
    Unauthorized,
    #[error("Backend resource not found")]
    NotFound,
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Backend response could not be decoded: {0}")]
    Decode(String),
}

/// List endpoints answer either with a page envelope or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Page(Page<T>),
    Items(Vec<T>),
}

impl<T> ListResponse<T> {
    fn into_parts(self) -> (Vec<T>, Option<u64>) {
        match self {
            ListResponse::Page(page) => (page.items, page.total),
            ListResponse::Items(items) => (items, None),
        }
    }
}

/// Outcome of one id in a batch delete
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteResult {
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    signature_secret: Option<String>,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(config.backend_timeout).build()?;

        Ok(Self {
            http,
            base_url: config.backend_api_url.trim_end_matches('/').to_string(),
            signature_secret: config.payload_signature_secret.clone(),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Attach a JSON body, signed when a secret is configured
    fn with_body(&self, builder: RequestBuilder, body: &Value) -> RequestBuilder {
        let canonical = canonical_json(body);
        let builder = match &self.signature_secret {
            Some(secret) => builder.header(SIGNATURE_HEADER, sign_bytes(canonical.as_bytes(), secret)),
            None => builder,
        };
        builder.header(CONTENT_TYPE, "application/json").body(canonical)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<String, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match status.as_u16() {
            401 | 403 => Err(BackendError::Unauthorized),
            404 => Err(BackendError::NotFound),
            code if !status.is_success() => Err(BackendError::Status { status: code, body }),
            _ => Ok(body),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let body = self
            .execute(self.request(Method::GET, path, Some(token)).query(query))
            .await?;
        parse(&body)
    }

    /// Follow `page`/`limit` pagination until a short page or `total` is reached
    async fn fetch_all_pages<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
    ) -> Result<Vec<T>, BackendError> {
        let mut items: Vec<T> = Vec::new();

        for page in 1..=MAX_PAGES {
            let response: ListResponse<T> = self
                .get_json(
                    token,
                    path,
                    &[("page", page.to_string()), ("limit", PAGE_SIZE.to_string())],
                )
                .await?;
            let (batch, total) = response.into_parts();
            let received = batch.len();
            items.extend(batch);

            let reached_total = total.is_some_and(|t| items.len() as u64 >= t);
            if received < PAGE_SIZE || reached_total {
                break;
            }
            if page == MAX_PAGES {
                tracing::warn!(path = %path, pages = MAX_PAGES, "Stopped following pagination");
            }
        }

        Ok(items)
    }

    pub async fn list_user_subscriptions(
        &self,
        session: &Session,
    ) -> Result<Vec<Subscription>, BackendError> {
        let path = format!("/users/{}/subscriptions", session.user_id);
        let payloads: Vec<SubscriptionPayload> =
            self.fetch_all_pages(&session.token, &path).await?;

        tracing::debug!(
            user_id = %session.user_id,
            count = payloads.len(),
            "Fetched subscriptions"
        );
        Ok(adapt_all(payloads))
    }

    pub async fn create_subscription(
        &self,
        session: &Session,
        draft: &SubscriptionDraft,
    ) -> Result<Subscription, BackendError> {
        let builder = self.request(Method::POST, "/subscriptions", Some(&session.token));
        let body = self
            .execute(self.with_body(builder, &draft.to_payload(&session.user_id)))
            .await?;
        adapt_one(&body)
    }

    pub async fn update_subscription(
        &self,
        session: &Session,
        id: &str,
        draft: &SubscriptionDraft,
    ) -> Result<Subscription, BackendError> {
        let path = format!("/subscriptions/{id}");
        let builder = self.request(Method::PUT, &path, Some(&session.token));
        let body = self
            .execute(self.with_body(builder, &draft.to_payload(&session.user_id)))
            .await?;
        adapt_one(&body)
    }

    pub async fn delete_subscription(&self, session: &Session, id: &str) -> Result<(), BackendError> {
        let path = format!("/subscriptions/{id}");
        self.execute(self.request(Method::DELETE, &path, Some(&session.token)))
            .await?;
        Ok(())
    }

    /// Delete each id in turn; one failure does not stop the rest
    pub async fn batch_delete(&self, session: &Session, ids: &[String]) -> Vec<BatchDeleteResult> {
        let mut results = Vec::with_capacity(ids.len());

        for id in ids {
            let result = match self.delete_subscription(session, id).await {
                Ok(()) => BatchDeleteResult {
                    id: id.clone(),
                    success: true,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "Batch delete item failed");
                    BatchDeleteResult {
                        id: id.clone(),
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(result);
        }

        results
    }

    pub async fn admin_users(&self, session: &Session) -> Result<Vec<AdminUser>, BackendError> {
        let response: ListResponse<AdminUser> =
            self.get_json(&session.token, "/admin/users", &[]).await?;
        Ok(response.into_parts().0)
    }

    pub async fn admin_subscriptions(
        &self,
        session: &Session,
    ) -> Result<Vec<Subscription>, BackendError> {
        let payloads: Vec<SubscriptionPayload> = self
            .fetch_all_pages(&session.token, "/admin/subscriptions")
            .await?;
        Ok(adapt_all(payloads))
    }

    pub async fn admin_stats(&self, session: &Session) -> Result<AdminStats, BackendError> {
        self.get_json(&session.token, "/admin/stats", &[]).await
    }

    pub async fn notifications(
        &self,
        session: &Session,
        unread_only: bool,
    ) -> Result<Vec<Notification>, BackendError> {
        let path = format!("/users/{}/notifications", session.user_id);
        let response: ListResponse<Notification> = self
            .get_json(&session.token, &path, &[("unread_only", unread_only.to_string())])
            .await?;
        Ok(response.into_parts().0)
    }

    pub async fn unread_count(&self, session: &Session) -> Result<u64, BackendError> {
        let path = format!("/users/{}/notifications/unread-count", session.user_id);
        let count: UnreadCount = self.get_json(&session.token, &path, &[]).await?;
        Ok(count.count)
    }

    pub async fn mark_notification_read(
        &self,
        session: &Session,
        notification_id: i64,
    ) -> Result<(), BackendError> {
        let path = format!("/notifications/{notification_id}/read");
        self.execute(
            self.request(Method::PUT, &path, Some(&session.token))
                .query(&[("user_id", session.user_id.as_str())]),
        )
        .await?;
        Ok(())
    }

    /// Exchange a Google ID token for a backend session token
    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<SignInResponse, BackendError> {
        let builder = self.request(Method::POST, "/auth/google", None);
        let body = self
            .execute(self.with_body(builder, &serde_json::json!({ "id_token": id_token })))
            .await?;
        parse(&body)
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

fn adapt_one(body: &str) -> Result<Subscription, BackendError> {
    let payload: SubscriptionPayload = parse(body)?;
    Subscription::try_from(payload).map_err(|e| BackendError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use time::macros::datetime;
    use whatsub_shared::{BillingCycle, Category, SubscriptionStatus};

    fn session() -> Session {
        Session {
            user_id: "user-1".to_string(),
            email: Some("user-1@example.com".to_string()),
            name: None,
            picture: None,
            role: "user".to_string(),
            token: "tok".to_string(),
            expires_at: datetime!(2099-01-01 00:00:00 UTC),
        }
    }

    fn client(url: &str, secret: Option<&str>) -> BackendClient {
        let mut config = Config::for_backend(url);
        config.payload_signature_secret = secret.map(String::from);
        BackendClient::new(&config).unwrap()
    }

    fn payloads(range: std::ops::RangeInclusive<u32>) -> Vec<Value> {
        range
            .map(|i| json!({ "id": i, "plan": format!("Service {i}"), "price": 1.5, "billing_type": "monthly" }))
            .collect()
    }

    #[tokio::test]
    async fn test_list_follows_pagination() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/users/user-1/subscriptions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("limit".into(), "100".into()),
            ]))
            .match_header("authorization", "Bearer tok")
            .with_header("content-type", "application/json")
            .with_body(json!({ "items": payloads(1..=100), "total": 102 }).to_string())
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/users/user-1/subscriptions")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_header("content-type", "application/json")
            .with_body(json!({ "items": payloads(101..=102), "total": 102 }).to_string())
            .create_async()
            .await;

        let subs = client(&server.url(), None)
            .list_user_subscriptions(&session())
            .await
            .unwrap();

        assert_eq!(subs.len(), 102);
        assert_eq!(subs[101].id, "102");
        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_accepts_bare_array_and_drops_invalid() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/user-1/subscriptions")
            .match_query(Matcher::Any)
            .with_body(
                json!([
                    { "id": 1, "plan": "Netflix", "price": 15.99, "billing_type": "annually", "category": "streaming" },
                    { "id": 2, "plan": "Broken", "price": "free" }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let subs = client(&server.url(), None)
            .list_user_subscriptions(&session())
            .await
            .unwrap();

        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].billing_cycle, BillingCycle::Yearly);
        assert_eq!(subs[0].category, Category::Streaming);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/admin/stats")
            .with_status(401)
            .with_body("{\"detail\":\"expired\"}")
            .create_async()
            .await;

        let err = client(&server.url(), None)
            .admin_stats(&session())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized));
    }

    #[tokio::test]
    async fn test_server_error_keeps_status_and_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/admin/stats")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        match client(&server.url(), None).admin_stats(&session()).await {
            Err(BackendError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_signs_payload() {
        let draft = SubscriptionDraft {
            service_name: "iCloud".to_string(),
            price: 29.0,
            billing_cycle: BillingCycle::Yearly,
            next_billing_date: "2025-12-01".to_string(),
            category: Category::Cloud,
            status: SubscriptionStatus::Active,
            account: None,
            url: None,
            currency: None,
        };
        let expected_body = canonical_json(&draft.to_payload("user-1"));
        let expected_signature = sign_bytes(expected_body.as_bytes(), "shh");

        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/subscriptions")
            .match_header("x-payload-signature", expected_signature.as_str())
            .match_header("content-type", "application/json")
            .match_body(Matcher::Exact(expected_body))
            .with_status(201)
            .with_body(
                json!({ "id": 9, "user_id": "user-1", "plan": "iCloud", "price": 29.0, "billing_type": "annually" })
                    .to_string(),
            )
            .create_async()
            .await;

        let created = client(&server.url(), Some("shh"))
            .create_subscription(&session(), &draft)
            .await
            .unwrap();

        assert_eq!(created.id, "9");
        assert_eq!(created.billing_cycle, BillingCycle::Yearly);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unsigned_without_secret() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/google")
            .match_header("x-payload-signature", Matcher::Missing)
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({ "id_token": "google-token" })))
            .with_body(json!({ "access_token": "jwt", "email": "a@b.c" }).to_string())
            .create_async()
            .await;

        let resp = client(&server.url(), None)
            .sign_in_with_google("google-token")
            .await
            .unwrap();
        assert_eq!(resp.token, "jwt");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_batch_delete_collects_per_id_results() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/subscriptions/1")
            .with_status(204)
            .create_async()
            .await;
        server
            .mock("DELETE", "/subscriptions/2")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("DELETE", "/subscriptions/3")
            .with_status(200)
            .create_async()
            .await;

        let ids = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let results = client(&server.url(), None)
            .batch_delete(&session(), &ids)
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[1].error.is_some());
        assert!(results[2].success);
    }

    #[tokio::test]
    async fn test_notification_endpoints() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/user-1/notifications")
            .match_query(Matcher::UrlEncoded("unread_only".into(), "true".into()))
            .with_body(
                json!([{ "id": 5, "user_id": "user-1", "message": "Netflix renews tomorrow" }])
                    .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/users/user-1/notifications/unread-count")
            .with_body(json!({ "unread_count": 1 }).to_string())
            .create_async()
            .await;
        let mark = server
            .mock("PUT", "/notifications/5/read")
            .match_query(Matcher::UrlEncoded("user_id".into(), "user-1".into()))
            .with_body("{}")
            .create_async()
            .await;

        let client = client(&server.url(), None);
        let list = client.notifications(&session(), true).await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].is_unread());
        assert_eq!(client.unread_count(&session()).await.unwrap(), 1);
        client.mark_notification_read(&session(), 5).await.unwrap();
        mark.assert_async().await;
    }

    #[tokio::test]
    async fn test_undecodable_response() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/admin/users")
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let err = client(&server.url(), None)
            .admin_users(&session())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }
}
