//! Session context memory
//!
//! Classifies tool output, fingerprints tool invocations and decides per turn
//! whether accumulated context is reset, continued or reused for a follow-up.
//! Everything here is pure apart from `SessionMemory`'s own state.

mod classify;
mod directive;
mod fingerprint;
mod session;
mod trace;

#[cfg(test)]
mod proptests;

pub use classify::{ClassifiedResult, Classifier, DEFAULT_RECORD_KEYS};
pub use directive::{build_directive, direct_directive, follow_up_directive};
pub use fingerprint::{fingerprint, Fingerprint, ToolInvocation};
pub use session::{SessionMemory, TurnCommit, TurnOutcome};
pub use trace::{StepKind, TraceStep, TurnClock};

/// Key under which tool servers place their payload
pub(crate) const RESULT_KEY: &str = "result";
