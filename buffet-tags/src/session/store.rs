//! Per-user session table
//!
//! Sessions are keyed by [`UserKey`] and expire after a period without
//! activity. A step takes its session out of the table with
//! [`SessionStore::checkout`] and puts it back with [`SessionStore::checkin`];
//! while a step is in flight the user has no visible session.

use super::Session;
use buffet_common::{Error, Result};
use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Identity that owns a session (chat user id, CLI user, web caller)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserKey(String);

impl UserKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Fresh key for a caller with no identity of its own
    pub fn anonymous() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<UserKey, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, session: &Session) -> bool {
        let idle = Utc::now().signed_duration_since(session.touched_at);
        idle.to_std().map(|idle| idle > self.ttl).unwrap_or(false)
    }

    /// Store a new session, replacing any previous one for the same user
    pub async fn insert(&self, session: Session) {
        let mut sessions = self.inner.lock().await;
        if sessions.insert(session.user.clone(), session).is_some() {
            debug!("Replaced existing session");
        }
    }

    /// Take the user's session out of the table for the duration of a step
    pub async fn checkout(&self, user: &UserKey) -> Result<Session> {
        let mut sessions = self.inner.lock().await;
        let session = sessions
            .remove(user)
            .ok_or_else(|| Error::NotFound(format!("No active session for {}", user)))?;

        if self.is_expired(&session) {
            info!(user = %user, "Session expired");
            return Err(Error::NotFound(format!("Session for {} has expired", user)));
        }

        Ok(session)
    }

    /// Return a session after a step, refreshing its activity time
    ///
    /// If the user started a new session while the step was in flight, the
    /// new one is kept and the returned session is dropped.
    pub async fn checkin(&self, mut session: Session) {
        session.touched_at = Utc::now();
        match self.inner.lock().await.entry(session.user.clone()) {
            Entry::Occupied(_) => {
                debug!(user = %session.user, "Newer session present; dropping stepped session");
            }
            Entry::Vacant(slot) => {
                slot.insert(session);
            }
        }
    }

    /// Drop the user's session; `true` if one existed
    pub async fn remove(&self, user: &UserKey) -> bool {
        self.inner.lock().await.remove(user).is_some()
    }

    /// Drop every expired session, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.inner.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session));
        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, "Purged expired sessions");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
