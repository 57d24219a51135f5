//! In-memory session registry.
//!
//! Sessions are independent: each engine sits behind its own mutex, so turns
//! for one session are serialized while different sessions proceed in
//! parallel. The map lock is only held to look an engine up.
//!
//! Sessions do not live forever: a background sweep drops ended sessions
//! after a short grace period and abandoned ones after an idle timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::conversation::engine::{
    AnswerRow, Collaborators, ConversationEngine, SessionState, TurnResponse,
};
use crate::intake::profile::CandidateProfile;

type SharedEngine = Arc<Mutex<ConversationEngine>>;

/// When sessions are evicted and how often the sweep runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub idle_ttl: Duration,
    pub ended_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            ended_ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl ExpiryPolicy {
    fn is_expired(&self, engine: &ConversationEngine, now: Instant) -> bool {
        let ttl = if engine.state().phase.is_ended() {
            self.ended_ttl
        } else {
            self.idle_ttl
        };
        now.saturating_duration_since(engine.last_activity()) >= ttl
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SharedEngine>>>,
    deps: Collaborators,
}

impl SessionRegistry {
    pub fn new(deps: Collaborators) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            deps,
        }
    }

    pub fn backend_kind(&self) -> &'static str {
        self.deps.backend.kind()
    }

    /// Creates a session and returns its id with the opening message.
    pub async fn start_session(&self, consent: bool) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let mut engine = ConversationEngine::new(id, consent, self.deps.clone());
        let greeting = engine.start();

        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(engine)));
        info!(session_id = %id, backend = self.backend_kind(), "Session started");

        (id, greeting)
    }

    async fn engine(&self, id: Uuid) -> Option<SharedEngine> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn handle_turn(&self, id: Uuid, text: &str) -> Option<TurnResponse> {
        let engine = self.engine(id).await?;
        let mut engine = engine.lock().await;
        Some(engine.handle_turn(text).await)
    }

    pub async fn snapshot(&self, id: Uuid) -> Option<SessionState> {
        let engine = self.engine(id).await?;
        let engine = engine.lock().await;
        Some(engine.snapshot())
    }

    pub async fn answers(&self, id: Uuid) -> Option<Vec<AnswerRow>> {
        let engine = self.engine(id).await?;
        let engine = engine.lock().await;
        Some(engine.answer_rows())
    }

    pub async fn profile(&self, id: Uuid) -> Option<CandidateProfile> {
        let engine = self.engine(id).await?;
        let engine = engine.lock().await;
        Some(engine.state().profile.clone())
    }

    /// Returns false when the session does not exist.
    pub async fn set_consent(&self, id: Uuid, consent: bool) -> bool {
        let Some(engine) = self.engine(id).await else {
            return false;
        };
        engine.lock().await.set_consent(consent);
        true
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Session discarded");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops expired sessions and returns how many were removed. Sessions
    /// in the middle of a turn are left for the next sweep.
    pub async fn sweep(&self, policy: &ExpiryPolicy) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, engine| {
            let Ok(engine) = engine.try_lock() else {
                return true;
            };
            if policy.is_expired(&engine, now) {
                info!(
                    session_id = %id,
                    ended = engine.state().phase.is_ended(),
                    "Session expired"
                );
                return false;
            }
            true
        });

        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, remaining = sessions.len(), "Session sweep finished");
        }
        removed
    }

    /// Runs `sweep` on a fixed interval for the lifetime of the process.
    pub fn spawn_sweeper(&self, policy: ExpiryPolicy) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(policy.sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                registry.sweep(&policy).await;
            }
        })
    }
}
