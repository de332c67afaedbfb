//! Reasoning trace entries

use super::session::TurnOutcome;
use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};

/// Kind of decision step recorded for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Baseline,
    Reset,
    Continue,
    FollowUp,
    Direct,
    Error,
}

impl From<TurnOutcome> for StepKind {
    fn from(outcome: TurnOutcome) -> Self {
        match outcome {
            TurnOutcome::Baseline => StepKind::Baseline,
            TurnOutcome::Reset => StepKind::Reset,
            TurnOutcome::Continue => StepKind::Continue,
            TurnOutcome::FollowUp => StepKind::FollowUp,
            TurnOutcome::Direct => StepKind::Direct,
        }
    }
}

/// One entry of the reasoning trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceStep {
    pub kind: StepKind,
    pub description: String,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl TraceStep {
    pub fn new(kind: StepKind, description: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            kind,
            description: description.into(),
            elapsed,
        }
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Measures time since the start of a turn
#[derive(Debug, Clone, Copy)]
pub struct TurnClock(Instant);

impl TurnClock {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Trace entry stamped with the time elapsed so far
    pub fn step(&self, kind: StepKind, description: impl Into<String>) -> TraceStep {
        TraceStep::new(kind, description, self.elapsed())
    }
}
