//! Per-conversation session state and the session manager.
//!
//! Sessions are independent: each one exclusively owns its gate and
//! triage state, keyed by session id. Turns are staged on a snapshot
//! and committed only after the turn fully succeeds, so a failed turn
//! never leaves partial writes behind.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::AuthState;
use crate::triage::TriageSession;

/// Inbound session event, consumed in arrival order per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Session opened (voice sessions greet on this).
    Start,
    /// A user utterance.
    Message { content: String },
    /// The user went quiet (voice only).
    Inactivity,
    /// Explicit completion request.
    RequestComplete,
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    /// Credentials not yet verified; messages feed the gate.
    Authenticating,
    /// Verified; messages feed the intent router.
    Routing,
    /// Closed; no further events are processed.
    Completed,
}

impl ConversationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl Default for ConversationPhase {
    fn default() -> Self {
        Self::Authenticating
    }
}

impl std::fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Authenticating => "authenticating",
            Self::Routing => "routing",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// All mutable state for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    pub phase: ConversationPhase,
    pub auth: AuthState,
    pub triage: TriageSession,
    pub started_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            phase: ConversationPhase::default(),
            auth: AuthState::default(),
            triage: TriageSession::default(),
            started_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

/// Owns every live session, keyed by session id.
#[derive(Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<String, ConversationSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the session for staging a turn; a fresh session if the
    /// id is unknown.
    pub async fn snapshot(&self, id: &str) -> ConversationSession {
        let sessions = self.sessions.lock().await;
        sessions
            .get(id)
            .cloned()
            .unwrap_or_else(|| ConversationSession::new(id))
    }

    /// Persist a staged session after its turn fully succeeded.
    pub async fn commit(&self, session: ConversationSession) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session.id.clone(), session);
    }

    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Drop sessions idle for longer than `idle_timeout`.
    pub async fn prune_stale(&self, idle_timeout: Duration) {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(idle_timeout).unwrap_or(chrono::Duration::hours(1));
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_active >= cutoff);
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "Pruned stale sessions");
        }
    }
}
