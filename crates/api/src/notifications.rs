//! Per-user notification polling
//!
//! Each signed-in user gets one background task that refreshes their
//! notification list and unread count on a fixed interval. Failures back off
//! exponentially (1s doubling, capped at 5 minutes) and reset after the next
//! success; the last good snapshot stays visible meanwhile. A poller stops
//! when cancelled, when its session token expires, or when the backend
//! rejects the token.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_retry::strategy::ExponentialBackoff;
use whatsub_shared::Notification;

use crate::auth::Session;
use crate::backend::{BackendClient, BackendError};

/// Longest wait between attempts while the backend keeps failing
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Latest notification state for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub refreshed_at: Option<OffsetDateTime>,
    /// Set while the most recent refresh failed
    pub last_error: Option<String>,
}

/// Where pollers read notifications from
pub trait NotificationSource: Send + Sync + 'static {
    fn fetch(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<(Vec<Notification>, u64), BackendError>> + Send;
}

impl NotificationSource for BackendClient {
    async fn fetch(&self, session: &Session) -> Result<(Vec<Notification>, u64), BackendError> {
        let notifications = self.notifications(session, false).await?;
        let unread = self.unread_count(session).await?;
        Ok((notifications, unread))
    }
}

/// Failure delays: 1s, 2s, 4s, ... capped at [`MAX_BACKOFF`]
pub(crate) struct FailureBackoff {
    strategy: ExponentialBackoff,
}

impl FailureBackoff {
    pub(crate) fn new() -> Self {
        Self {
            strategy: Self::fresh(),
        }
    }

    fn fresh() -> ExponentialBackoff {
        ExponentialBackoff::from_millis(2)
            .factor(500)
            .max_delay(MAX_BACKOFF)
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        self.strategy.next().unwrap_or(MAX_BACKOFF)
    }

    pub(crate) fn reset(&mut self) {
        self.strategy = Self::fresh();
    }
}

/// Handle to a running poller; dropping it cancels the task
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    snapshot: watch::Receiver<NotificationSnapshot>,
    refresh: Arc<Notify>,
    token: String,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn snapshot(&self) -> NotificationSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Skip the rest of the current wait and poll now
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    pub fn cancel(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct NotificationPoller<S> {
    source: Arc<S>,
    session: Session,
    interval: Duration,
}

impl<S: NotificationSource> NotificationPoller<S> {
    pub fn new(source: Arc<S>, session: Session, interval: Duration) -> Self {
        Self {
            source,
            session,
            interval,
        }
    }

    pub fn spawn(self) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (snapshot_tx, snapshot_rx) = watch::channel(NotificationSnapshot::default());
        let refresh = Arc::new(Notify::new());
        let token = self.session.token.clone();

        let task = tokio::spawn(self.run(shutdown_rx, snapshot_tx, refresh.clone()));

        PollerHandle {
            shutdown: shutdown_tx,
            snapshot: snapshot_rx,
            refresh,
            token,
            task,
        }
    }

    async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
        snapshot_tx: watch::Sender<NotificationSnapshot>,
        refresh: Arc<Notify>,
    ) {
        let user_id = self.session.user_id.clone();

        let Some(lifetime) = self.session.time_until_expiry(OffsetDateTime::now_utc()) else {
            tracing::debug!(user_id = %user_id, "Session already expired, poller not started");
            return;
        };
        let expiry = tokio::time::sleep(lifetime);
        tokio::pin!(expiry);

        let mut backoff = FailureBackoff::new();
        tracing::debug!(user_id = %user_id, interval_secs = self.interval.as_secs(), "Notification poller started");

        loop {
            let delay = match self.source.fetch(&self.session).await {
                Ok((notifications, unread_count)) => {
                    backoff.reset();
                    snapshot_tx.send_replace(NotificationSnapshot {
                        notifications,
                        unread_count,
                        refreshed_at: Some(OffsetDateTime::now_utc()),
                        last_error: None,
                    });
                    self.interval
                }
                Err(BackendError::Unauthorized) => {
                    tracing::info!(user_id = %user_id, "Backend rejected session, stopping notification poller");
                    break;
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        user_id = %user_id,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Notification refresh failed"
                    );
                    snapshot_tx.send_modify(|snapshot| snapshot.last_error = Some(e.to_string()));
                    delay
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = refresh.notified() => {}
                _ = &mut expiry => {
                    tracing::info!(user_id = %user_id, "Session expired, stopping notification poller");
                    break;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!(user_id = %user_id, "Notification poller cancelled");
                        break;
                    }
                }
            }
        }
    }
}

/// One poller per signed-in user
pub struct NotificationHub<S = BackendClient> {
    source: Arc<S>,
    interval: Duration,
    pollers: Arc<Mutex<HashMap<String, PollerHandle>>>,
}

impl<S> Clone for NotificationHub<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            interval: self.interval,
            pollers: self.pollers.clone(),
        }
    }
}

impl<S: NotificationSource> NotificationHub<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            pollers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current snapshot for the session's user, starting a poller if none is
    /// running or the user signed in again with a new token
    pub async fn snapshot_for(&self, session: &Session) -> NotificationSnapshot {
        let mut pollers = self.pollers.lock().await;
        // Pollers end on their own when a session expires or is rejected
        pollers.retain(|_, handle| !handle.is_finished());

        let stale = pollers
            .get(&session.user_id)
            .map_or(true, |handle| handle.is_finished() || handle.token != session.token);

        if stale {
            let handle =
                NotificationPoller::new(self.source.clone(), session.clone(), self.interval).spawn();
            // Replacing drops and cancels the previous handle
            pollers.insert(session.user_id.clone(), handle);
        }

        pollers
            .get(&session.user_id)
            .map(PollerHandle::snapshot)
            .unwrap_or_default()
    }

    pub async fn request_refresh(&self, user_id: &str) {
        if let Some(handle) = self.pollers.lock().await.get(user_id) {
            handle.refresh_now();
        }
    }

    pub async fn stop(&self, user_id: &str) {
        if let Some(handle) = self.pollers.lock().await.remove(user_id) {
            handle.cancel();
        }
    }

    pub async fn active_pollers(&self) -> usize {
        self.pollers
            .lock()
            .await
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub async fn shutdown(&self) {
        let mut pollers = self.pollers.lock().await;
        for handle in pollers.values() {
            handle.cancel();
        }
        tracing::info!(count = pollers.len(), "Notification pollers stopped");
        pollers.clear();
    }
}
