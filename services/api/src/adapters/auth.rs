//! services/api/src/adapters/auth.rs
//!
//! An in-process auth session store implementing the `AuthService` port.
//! Sessions live for the configured TTL and are lost on restart.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use selah_core::{
    domain::AuthSession,
    ports::{AuthService, PortError, PortResult},
};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

pub struct InMemoryAuthAdapter {
    sessions: Mutex<HashMap<String, AuthSession>>,
    ttl: Duration,
}

impl InMemoryAuthAdapter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl AuthService for InMemoryAuthAdapter {
    async fn is_authenticated(&self, session_id: &str) -> PortResult<bool> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(session_id) {
            Some(session) if session.is_expired(Utc::now()) => {
                debug!(user_id = %session.user_id, "Auth session expired");
                sessions.remove(session_id);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn sign_in(&self) -> PortResult<AuthSession> {
        let session = AuthSession {
            id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4(),
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions
            .lock()
            .await
            .insert(session.id.clone(), session.clone());
        info!(user_id = %session.user_id, "User signed in");
        Ok(session)
    }

    async fn sign_out(&self, session_id: &str) -> PortResult<()> {
        match self.sessions.lock().await.remove(session_id) {
            Some(session) => {
                info!(user_id = %session.user_id, "User signed out");
                Ok(())
            }
            None => Err(PortError::NotFound(format!("auth session {}", session_id))),
        }
    }
}
