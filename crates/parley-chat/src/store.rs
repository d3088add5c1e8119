//! In-memory session registry.
//!
//! Sessions idle for longer than the configured TTL are evicted by
//! [`SessionStore::evict_idle`], which the server runs periodically and on
//! every create. The map is also capped: at the limit, the least recently
//! active idle session makes room for the new one. Sessions locked by an
//! in-flight request are never evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_core::config::SessionConfig;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ChatError;
use crate::session::{ChatMode, ChatSession, SessionView};

/// Shared handle to one session. The lock is held for the whole turn.
pub type SessionHandle = Arc<AsyncMutex<ChatSession>>;

type SessionMap = HashMap<Uuid, SessionHandle>;

/// All live sessions, keyed by id. Sessions never share state.
pub struct SessionStore {
    sessions: Mutex<SessionMap>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::with_limits(config.idle_ttl(), config.max_sessions)
    }

    fn map(&self) -> MutexGuard<'_, SessionMap> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a fresh session and return its initial view.
    pub fn create(&self, mode: ChatMode, model: impl Into<String>) -> SessionView {
        let session = ChatSession::new(mode, model);
        let view = session.view();

        let mut map = self.map();
        self.evict_expired(&mut map, view.created_at);
        if map.len() >= self.max_sessions {
            if let Some(oldest) = least_recent_idle(&map) {
                map.remove(&oldest);
                info!(
                    session_id = %oldest,
                    limit = self.max_sessions,
                    "Session limit reached, evicted oldest idle session"
                );
            }
        }
        map.insert(session.id, Arc::new(AsyncMutex::new(session)));
        drop(map);

        info!(session_id = %view.session_id, mode = %view.mode, "Chat session created");
        view
    }

    pub fn get(&self, id: Uuid) -> Result<SessionHandle, ChatError> {
        self.map()
            .get(&id)
            .cloned()
            .ok_or(ChatError::SessionNotFound(id))
    }

    /// Lock a session for mutation without waiting.
    ///
    /// Fails with [`ChatError::Busy`] while another request holds it, which
    /// is the case for the whole duration of a backend call.
    pub fn acquire(&self, id: Uuid) -> Result<OwnedMutexGuard<ChatSession>, ChatError> {
        let handle = self.get(id)?;
        handle.try_lock_owned().map_err(|_| {
            debug!(session_id = %id, "Session busy");
            ChatError::Busy(id)
        })
    }

    pub fn remove(&self, id: Uuid) -> Result<(), ChatError> {
        match self.map().remove(&id) {
            Some(_) => {
                info!(session_id = %id, "Chat session removed");
                Ok(())
            }
            None => Err(ChatError::SessionNotFound(id)),
        }
    }

    /// Drop every session idle for longer than the TTL. Returns how many
    /// were removed.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Utc::now())
    }

    /// [`evict_idle`](Self::evict_idle) measured against `now`.
    pub fn evict_idle_at(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.map();
        self.evict_expired(&mut map, now)
    }

    fn evict_expired(&self, map: &mut SessionMap, now: DateTime<Utc>) -> usize {
        let before = map.len();
        map.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !self.is_expired(&session, now),
            Err(_) => true,
        });
        let evicted = before - map.len();
        if evicted > 0 {
            info!(evicted, remaining = map.len(), "Evicted idle chat sessions");
        }
        evicted
    }

    fn is_expired(&self, session: &ChatSession, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(session.last_activity())
            .to_std()
            .map(|idle| idle > self.idle_ttl)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}

fn least_recent_idle(map: &SessionMap) -> Option<Uuid> {
    map.iter()
        .filter_map(|(id, handle)| {
            let session = handle.try_lock().ok()?;
            Some((*id, session.last_activity()))
        })
        .min_by_key(|(_, at)| *at)
        .map(|(id, _)| id)
}
