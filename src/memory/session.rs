//! Per-session memory and the turn decision
//!
//! The decision itself is the pure function [`decide`]. `SessionMemory` only
//! applies its outcome once a turn has completed, so a failed turn never
//! touches the stored transcript, fingerprint or result.

use super::fingerprint::{Fingerprint, ToolInvocation};
use super::trace::TraceStep;
use crate::engine::Message;
use serde::Serialize;

/// How a turn relates to the session's stored context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// First tool invocation of the session
    Baseline,
    /// Tool invocation with a new fingerprint; prior context is dropped
    Reset,
    /// Same fingerprint as the stored one
    Continue,
    /// No tool invocation; the stored result answers the turn
    FollowUp,
    /// No tool invocation and nothing stored
    Direct,
}

impl TurnOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnOutcome::Baseline => "baseline",
            TurnOutcome::Reset => "reset",
            TurnOutcome::Continue => "continue",
            TurnOutcome::FollowUp => "follow_up",
            TurnOutcome::Direct => "direct",
        }
    }

    /// Whether this outcome truncates the transcript
    pub fn is_reset(self) -> bool {
        matches!(self, TurnOutcome::Baseline | TurnOutcome::Reset)
    }

    /// Whether this outcome stores the observed invocation
    pub fn stores_invocation(self) -> bool {
        matches!(
            self,
            TurnOutcome::Baseline | TurnOutcome::Reset | TurnOutcome::Continue
        )
    }
}

/// Decide the outcome of a turn.
///
/// Pure: depends only on the observed fingerprint, the stored one, whether a
/// result is stored and whether this is the session's first turn.
pub fn decide(
    observed: Option<&Fingerprint>,
    stored: Option<&Fingerprint>,
    has_stored_result: bool,
    first_turn: bool,
) -> TurnOutcome {
    match (observed, stored) {
        (Some(_), None) if first_turn => TurnOutcome::Baseline,
        (Some(current), Some(previous)) if current == previous => TurnOutcome::Continue,
        (Some(_), _) => TurnOutcome::Reset,
        (None, _) if has_stored_result => TurnOutcome::FollowUp,
        (None, _) => TurnOutcome::Direct,
    }
}

/// Snapshot of a session's memory
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub transcript: Vec<Message>,
    pub last_fingerprint: Option<Fingerprint>,
    pub last_result: Option<ToolInvocation>,
    pub trace: Vec<TraceStep>,
    pub turns_completed: u64,
}

/// Everything a successful turn leaves behind
#[derive(Debug, Clone)]
pub struct TurnCommit {
    pub user_text: String,
    pub outcome: TurnOutcome,
    /// Observed invocation, stored for outcomes that keep it
    pub invocation: Option<(ToolInvocation, Fingerprint)>,
    pub answer: String,
    pub step: TraceStep,
}

/// Mutable per-session memory
#[derive(Debug, Clone)]
pub struct SessionMemory {
    system: Message,
    state: SessionState,
}

impl SessionMemory {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system = Message::system(system_prompt);
        Self {
            state: SessionState {
                transcript: vec![system.clone()],
                last_fingerprint: None,
                last_result: None,
                trace: Vec::new(),
                turns_completed: 0,
            },
            system,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn transcript(&self) -> &[Message] {
        &self.state.transcript
    }

    pub fn trace(&self) -> &[TraceStep] {
        &self.state.trace
    }

    pub fn last_fingerprint(&self) -> Option<&Fingerprint> {
        self.state.last_fingerprint.as_ref()
    }

    pub fn last_result(&self) -> Option<&ToolInvocation> {
        self.state.last_result.as_ref()
    }

    pub fn is_first_turn(&self) -> bool {
        self.state.turns_completed == 0
    }

    pub fn system_message(&self) -> &Message {
        &self.system
    }

    /// Outcome for a turn that observed `observed`
    pub fn decide(&self, observed: Option<&Fingerprint>) -> TurnOutcome {
        decide(
            observed,
            self.last_fingerprint(),
            self.state.last_result.is_some(),
            self.is_first_turn(),
        )
    }

    /// Stored transcript followed by the new user turn
    pub fn working_transcript(&self, user_text: &str) -> Vec<Message> {
        let mut messages = self.state.transcript.clone();
        messages.push(Message::user(user_text));
        messages
    }

    /// System prompt and the new user turn only
    pub fn minimal_transcript(&self, user_text: &str) -> Vec<Message> {
        vec![self.system.clone(), Message::user(user_text)]
    }

    /// Messages a reset would drop
    pub fn accumulated_len(&self) -> usize {
        self.state.transcript.len().saturating_sub(1)
    }

    /// Apply a completed turn.
    pub fn commit_turn(&mut self, commit: TurnCommit) {
        let TurnCommit {
            user_text,
            outcome,
            invocation,
            answer,
            step,
        } = commit;

        if outcome.is_reset() {
            self.state.transcript.truncate(1);
        }
        self.state.transcript.push(Message::user(user_text));
        self.state.transcript.push(Message::assistant(answer));

        if outcome.stores_invocation() {
            if let Some((invocation, fingerprint)) = invocation {
                self.state.last_fingerprint = Some(fingerprint);
                self.state.last_result = Some(invocation);
            }
        }

        self.state.trace.push(step);
        self.state.turns_completed += 1;
    }

    /// Record a failed turn; only the trace changes
    pub fn record_failure(&mut self, step: TraceStep) {
        self.state.trace.push(step);
    }
}
