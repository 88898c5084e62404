//! Application state

use std::sync::Arc;

use crate::{
    auth::AuthState,
    backend::{BackendClient, BackendError},
    config::Config,
    notifications::NotificationHub,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: Arc<BackendClient>,
    /// One notification poller per signed-in user
    pub notifications: NotificationHub,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, BackendError> {
        let backend = Arc::new(BackendClient::new(&config)?);
        tracing::info!(backend_url = %config.backend_api_url, "Backend client initialized");

        if config.jwt_secret.is_some() {
            tracing::info!("Session token signatures verified locally");
        } else {
            tracing::warn!("JWT_SECRET not set - session tokens are decoded without signature verification");
        }

        if config.payload_signature_secret.is_some() {
            tracing::info!("Payload signing enabled for backend writes");
        }

        let notifications = NotificationHub::new(backend.clone(), config.notification_poll_interval);
        tracing::info!(
            interval_secs = config.notification_poll_interval.as_secs(),
            "Notification hub initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            backend,
            notifications,
        })
    }

    /// Get auth state for middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            jwt_secret: self.config.jwt_secret.clone(),
        }
    }
}
