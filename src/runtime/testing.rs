//! Mock implementations for testing
//!
//! These mocks enable turn-level testing without a real engine.

use crate::engine::{EngineError, EngineOutput, Message, ReasoningEngine};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Mock Engine
// ============================================================================

/// Mock engine that returns queued outputs
pub struct MockEngine {
    outputs: Mutex<VecDeque<Result<EngineOutput, EngineError>>>,
    /// Record of every transcript sent
    pub transcripts: Mutex<Vec<Vec<Message>>>,
}

#[allow(dead_code)]
impl MockEngine {
    pub fn new() -> Self {
        Self {
            outputs: Mutex::new(VecDeque::new()),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful output
    pub fn queue_output(&self, messages: Vec<Message>) {
        self.outputs
            .lock()
            .unwrap()
            .push_back(Ok(EngineOutput::new(messages)));
    }

    /// Queue an error
    pub fn queue_error(&self, error: EngineError) {
        self.outputs.lock().unwrap().push_back(Err(error));
    }

    /// Drop outputs that were queued but never consumed
    pub fn clear_queue(&self) {
        self.outputs.lock().unwrap().clear();
    }

    /// Get recorded transcripts
    pub fn recorded_transcripts(&self) -> Vec<Vec<Message>> {
        self.transcripts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.transcripts.lock().unwrap().len()
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningEngine for MockEngine {
    async fn invoke(&self, transcript: &[Message]) -> Result<EngineOutput, EngineError> {
        self.transcripts.lock().unwrap().push(transcript.to_vec());
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::network("No mock output queued")))
    }

    fn engine_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Output builders
// ============================================================================

/// Engine output for a turn that called one tool and then answered
pub fn tool_turn(tool: &str, params: Value, payload: Value, answer: &str) -> Vec<Message> {
    vec![
        Message::assistant(""),
        Message::tool(tool, payload.to_string()).with_tool_input(params),
        Message::assistant(answer),
    ]
}

/// Engine output with only an answer
pub fn answer_only(answer: impl Into<String>) -> Vec<Message> {
    vec![Message::assistant(answer)]
}
