//! Session runtime
//!
//! The registry owns every live session's memory. Sessions run fully in
//! parallel; turns within one session are serialized by that session's lock.
//! Summaries are read from a snapshot published after each turn, so they
//! never wait behind a running turn.

mod controller;

#[cfg(test)]
pub mod testing;

pub use controller::{ControllerConfig, TurnController, TurnReply};

use crate::engine::ReasoningEngine;
use crate::memory::{SessionMemory, TraceStep};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::Instrument;

/// Engine shared by every session
pub type SharedEngine = Arc<dyn ReasoningEngine>;

/// Type alias for the production controller
pub type ProductionController = TurnController<SharedEngine>;

/// Errors reported by the session registry
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("No active session: {0}")]
    NoActiveSession(String),
    #[error("Turn text is empty")]
    EmptyTurn,
}

/// A live session: memory behind the turn lock plus its latest summary
struct Session {
    memory: Mutex<SessionMemory>,
    summary: watch::Sender<SessionSummary>,
}

impl Session {
    fn new(session_id: &str, memory: SessionMemory) -> Self {
        let summary = summarize(session_id, Utc::now(), &memory);
        Self {
            memory: Mutex::new(memory),
            summary: watch::Sender::new(summary),
        }
    }

    fn publish(&self, memory: &SessionMemory) {
        self.summary.send_modify(|summary| {
            let created_at = summary.created_at;
            *summary = summarize(&summary.session_id, created_at, memory);
        });
    }
}

fn summarize(
    session_id: &str,
    created_at: DateTime<Utc>,
    memory: &SessionMemory,
) -> SessionSummary {
    let state = memory.state();
    SessionSummary {
        session_id: session_id.to_string(),
        created_at,
        turns_completed: state.turns_completed,
        transcript_len: state.transcript.len(),
        last_fingerprint: state.last_fingerprint.as_ref().map(ToString::to_string),
        trace: memory.trace().to_vec(),
    }
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub turns_completed: u64,
    pub transcript_len: usize,
    pub last_fingerprint: Option<String>,
    pub trace: Vec<TraceStep>,
}

/// Registry of all live sessions
pub struct SessionRegistry {
    controller: ProductionController,
    system_prompt: String,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new(
        engine: SharedEngine,
        system_prompt: impl Into<String>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            controller: TurnController::new(engine, config),
            system_prompt: system_prompt.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session with empty memory
    pub async fn create_session(&self) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(&session_id, SessionMemory::new(self.system_prompt.clone()));
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::new(session));

        tracing::info!(session_id = %session_id, "Session created");
        session_id
    }

    /// End a session and discard its memory
    pub async fn end_session(&self, session_id: &str) -> Result<(), RouterError> {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(_) => {
                tracing::info!(session_id = %session_id, "Session ended");
                Ok(())
            }
            None => Err(RouterError::NoActiveSession(session_id.to_string())),
        }
    }

    /// Run one turn in a session.
    ///
    /// Engine failures come back inside the reply; only registry-level
    /// problems are errors here.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        user_text: &str,
    ) -> Result<TurnReply, RouterError> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(RouterError::EmptyTurn);
        }

        let session = self.session(session_id).await?;
        let span = tracing::info_span!("turn", session_id = %session_id);

        async {
            let mut memory = session.memory.lock().await;
            let reply = self.controller.handle_turn(&mut memory, user_text).await;
            session.publish(&memory);
            Ok(reply)
        }
        .instrument(span)
        .await
    }

    /// Summary of a session as of its last finished turn
    pub async fn session_info(&self, session_id: &str) -> Result<SessionSummary, RouterError> {
        let session = self.session(session_id).await?;
        let summary = session.summary.borrow().clone();
        Ok(summary)
    }

    /// End every session, returning how many were live
    pub async fn end_all(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        sessions.clear();
        count
    }

    async fn session(&self, session_id: &str) -> Result<Arc<Session>, RouterError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(Arc::clone)
            .ok_or_else(|| RouterError::NoActiveSession(session_id.to_string()))
    }
}
