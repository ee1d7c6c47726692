//! Dialogue session management
//!
//! Sessions live in memory for their active lifetime; recorded attempts go
//! to the progress store. Dialogue state sits behind an async mutex so
//! concurrent submissions against one session serialize into a single-writer
//! order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};

use lingua_tutor_config::RateLimitConfig;
use lingua_tutor_core::Message;
use lingua_tutor_dialogue::DialogueState;

use crate::rate_limit::RateLimiter;
use crate::ServerError;

/// One active dialogue session
#[derive(Debug)]
pub struct DialogueSession {
    /// Session ID
    pub id: String,
    /// Learner who owns the session
    pub learner_id: String,
    /// Scenario the dialogue was started from
    pub scenario_id: String,
    /// Dialogue state; the mutex serializes turn submissions
    pub state: Mutex<DialogueState>,
    /// Free-form conversation history for off-script replies
    pub history: Mutex<Vec<Message>>,
    /// Per-session rate limiter
    pub limiter: parking_lot::Mutex<RateLimiter>,
    /// Creation time
    pub created_at: Instant,
    /// Last activity
    last_activity: RwLock<Instant>,
    /// Is active
    active: RwLock<bool>,
}

impl DialogueSession {
    /// Create a new session around a freshly started dialogue
    pub fn new(
        id: impl Into<String>,
        learner_id: impl Into<String>,
        state: DialogueState,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            id: id.into(),
            learner_id: learner_id.into(),
            scenario_id: state.scenario_id.clone(),
            state: Mutex::new(state),
            history: Mutex::new(Vec::new()),
            limiter: parking_lot::Mutex::new(RateLimiter::new(rate_limit)),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
            active: RwLock::new(true),
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if the session is expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    /// Close the session
    pub fn close(&self) {
        *self.active.write() = false;
    }

    /// Is the session active
    pub fn is_active(&self) -> bool {
        *self.active.read()
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<DialogueSession>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
    rate_limit: RateLimitConfig,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(max_sessions: usize, session_timeout: Duration, rate_limit: RateLimitConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval: Duration::from_secs(300),
            rate_limit,
        }
    }

    /// Start a background task that periodically cleans up expired sessions
    ///
    /// Returns a shutdown sender that stops the task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let before = manager.count();
                        manager.cleanup_expired();
                        let after = manager.count();
                        if before != after {
                            tracing::info!(
                                "Session cleanup: removed {} expired sessions ({} remaining)",
                                before - after,
                                after
                            );
                        }
                        crate::metrics::record_active_sessions(after);
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Create a new session
    pub fn create(
        &self,
        learner_id: &str,
        state: DialogueState,
    ) -> Result<Arc<DialogueSession>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                return Err(ServerError::Session("Max sessions reached".to_string()));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(DialogueSession::new(
            &id,
            learner_id,
            state,
            self.rate_limit.clone(),
        ));
        sessions.insert(id.clone(), session.clone());

        tracing::info!(session_id = %id, %learner_id, "Created session");
        crate::metrics::record_session_created();

        Ok(session)
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<DialogueSession>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session
    pub fn remove(&self, id: &str) {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.remove(id) {
            session.close();
            tracing::info!(session_id = %id, "Removed session");
        }
    }

    /// Active session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Cleanup expired sessions
    pub fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions);
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<DialogueSession>>) {
        let timeout = self.session_timeout;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout))
            .map(|(id, _)| id.clone())
            .collect();

        for id in expired {
            if let Some(session) = sessions.remove(&id) {
                session.close();
                tracing::info!(session_id = %id, "Expired session");
            }
        }
    }

    /// List all session IDs
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}
