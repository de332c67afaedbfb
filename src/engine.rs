//! Reasoning engine abstraction
//!
//! The engine receives the outgoing transcript and returns every message it
//! produced for the turn, including the tool messages it echoes back after
//! running tools on its own.

mod error;
mod http;
mod types;

pub use error::{EngineError, EngineErrorKind};
pub use http::{EngineConfig, HttpEngine};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Common interface for reasoning engines
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Run the engine over a transcript
    async fn invoke(&self, transcript: &[Message]) -> Result<EngineOutput, EngineError>;

    /// Identifier used in logs
    fn engine_id(&self) -> &str;
}

#[async_trait]
impl<T: ReasoningEngine + ?Sized> ReasoningEngine for Arc<T> {
    async fn invoke(&self, transcript: &[Message]) -> Result<EngineOutput, EngineError> {
        (**self).invoke(transcript).await
    }

    fn engine_id(&self) -> &str {
        (**self).engine_id()
    }
}

/// Logging and timeout wrapper for engines
///
/// A hung engine call would otherwise block the session's turn forever, so
/// every invocation is bounded here and reported as a `Timeout` failure.
pub struct LoggingEngine {
    inner: Arc<dyn ReasoningEngine>,
    engine_id: String,
    timeout: Duration,
}

impl LoggingEngine {
    pub fn new(inner: Arc<dyn ReasoningEngine>, timeout: Duration) -> Self {
        let engine_id = inner.engine_id().to_string();
        Self {
            inner,
            engine_id,
            timeout,
        }
    }
}

#[async_trait]
impl ReasoningEngine for LoggingEngine {
    async fn invoke(&self, transcript: &[Message]) -> Result<EngineOutput, EngineError> {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.inner.invoke(transcript)).await
        {
            Ok(result) => result,
            Err(_) => Err(EngineError::timeout(format!(
                "Engine did not answer within {}ms",
                self.timeout.as_millis()
            ))),
        };
        let duration = start.elapsed();

        match &result {
            Ok(output) => {
                tracing::info!(
                    engine = %self.engine_id,
                    duration_ms = %duration.as_millis(),
                    sent = transcript.len(),
                    received = output.messages.len(),
                    tool_messages = output.tool_message_count(),
                    "Engine call completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    engine = %self.engine_id,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    transient = e.kind.is_transient(),
                    error = %e.message,
                    "Engine call failed"
                );
            }
        }

        result
    }

    fn engine_id(&self) -> &str {
        &self.engine_id
    }
}
