//! Turn orchestration
//!
//! One turn is at most two engine passes: the first over the stored
//! transcript plus the user's text, and an optional second one over a
//! working transcript carrying a directive. Session memory is only
//! committed once the final answer is in hand.

use crate::engine::{EngineError, EngineErrorKind, EngineOutput, Message, ReasoningEngine};
use crate::memory::{
    build_directive, direct_directive, fingerprint, follow_up_directive, ClassifiedResult,
    Classifier, Fingerprint, SessionMemory, StepKind, ToolInvocation, TraceStep, TurnClock,
    TurnCommit, TurnOutcome, DEFAULT_RECORD_KEYS,
};
use crate::presentation::{extract_reasoning, reference_links};
use serde::Serialize;
use std::collections::BTreeMap;

/// Behaviour switches for the turn controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Include the trace and the extracted reasoning in replies
    pub emit_trace: bool,
    /// Re-pass direct answers with a note that no tool data was used
    pub explain_direct_answers: bool,
    /// Keys that mark a tool payload as a tabular record
    pub record_keys: Vec<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            emit_trace: true,
            explain_direct_answers: false,
            record_keys: DEFAULT_RECORD_KEYS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Engine failure as reported to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnFailure {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl From<EngineError> for TurnFailure {
    fn from(error: EngineError) -> Self {
        Self {
            kind: error.kind,
            message: error.message,
        }
    }
}

/// Result of one turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TurnOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub table: Vec<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<TurnFailure>,
    pub engine_passes: u8,
}

/// Generic turn controller over any reasoning engine
pub struct TurnController<E: ReasoningEngine> {
    engine: E,
    classifier: Classifier,
    config: ControllerConfig,
}

impl<E: ReasoningEngine> TurnController<E> {
    pub fn new(engine: E, config: ControllerConfig) -> Self {
        Self {
            engine,
            classifier: Classifier::new(config.record_keys.iter().cloned()),
            config,
        }
    }

    /// Handle one turn against a session's memory.
    ///
    /// Engine failures do not escape: they produce a failure reply and one
    /// `error` trace entry, leaving transcript, fingerprint and stored result
    /// untouched.
    pub async fn handle_turn(&self, memory: &mut SessionMemory, user_text: &str) -> TurnReply {
        let clock = TurnClock::start();
        let mut passes = 0u8;

        match self.run_turn(memory, user_text, &clock, &mut passes).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(
                    kind = ?error.kind,
                    error = %error.message,
                    passes,
                    "Turn failed; session memory left unchanged"
                );
                let step = clock.step(
                    StepKind::Error,
                    format!("Engine call failed: {}", error.message),
                );
                memory.record_failure(step.clone());

                TurnReply {
                    answer: format!(
                        "Sorry, I couldn't complete that request ({}). Please try again.",
                        error.message
                    ),
                    outcome: None,
                    trace: self.trace_of(step),
                    reasoning: None,
                    sources: Vec::new(),
                    references: Vec::new(),
                    table: Vec::new(),
                    failure: Some(error.into()),
                    engine_passes: passes,
                }
            }
        }
    }

    async fn run_turn(
        &self,
        memory: &mut SessionMemory,
        user_text: &str,
        clock: &TurnClock,
        passes: &mut u8,
    ) -> Result<TurnReply, EngineError> {
        let first = self
            .invoke(&memory.working_transcript(user_text), passes)
            .await?;

        let observed = first
            .first_tool_message()
            .and_then(ToolInvocation::from_message)
            .map(|invocation| {
                let fp = fingerprint(&invocation);
                (invocation, fp)
            });
        let observed_fp = observed.as_ref().map(|(_, fp)| fp);
        let outcome = memory.decide(observed_fp);

        // Result the answer is grounded in, if any
        let context = match outcome {
            TurnOutcome::FollowUp => memory.last_result(),
            _ => observed.as_ref().map(|(invocation, _)| invocation),
        }
        .map(|invocation| self.classifier.classify(&invocation.result));

        let description = describe(
            outcome,
            observed_fp,
            memory,
            context.as_ref(),
            self.config.explain_direct_answers,
        );
        tracing::debug!(outcome = outcome.as_str(), "{description}");

        let final_output = match self.second_pass(outcome, memory, user_text, context.as_ref()) {
            Some(working) => self.invoke(&working, passes).await?,
            None => first,
        };

        let answer = final_output.final_answer().ok_or_else(|| {
            EngineError::malformed_output("Engine output contained no assistant answer")
        })?;

        let step = clock.step(outcome.into(), description);
        let sources = context.as_ref().map(ClassifiedResult::urls).unwrap_or_default();
        let table = context
            .as_ref()
            .map(ClassifiedResult::table_rows)
            .unwrap_or_default();

        tracing::info!(
            outcome = outcome.as_str(),
            fingerprint = observed_fp.map(Fingerprint::digest).as_deref().unwrap_or("-"),
            passes = *passes,
            duration_ms = %clock.elapsed().as_millis(),
            "Turn completed"
        );

        memory.commit_turn(TurnCommit {
            user_text: user_text.to_string(),
            outcome,
            invocation: observed,
            answer: answer.clone(),
            step: step.clone(),
        });

        Ok(TurnReply {
            reasoning: if self.config.emit_trace {
                extract_reasoning(&answer)
            } else {
                None
            },
            answer,
            outcome: Some(outcome),
            trace: self.trace_of(step),
            references: reference_links(&sources),
            sources,
            table,
            failure: None,
            engine_passes: *passes,
        })
    }

    /// Working transcript for the second pass, when the outcome calls for one
    fn second_pass(
        &self,
        outcome: TurnOutcome,
        memory: &SessionMemory,
        user_text: &str,
        context: Option<&ClassifiedResult>,
    ) -> Option<Vec<Message>> {
        match outcome {
            TurnOutcome::Baseline | TurnOutcome::Reset => {
                let directive = context.and_then(build_directive);
                if directive.is_none() && memory.accumulated_len() == 0 {
                    return None;
                }
                let mut working = memory.minimal_transcript(user_text);
                working.extend(directive);
                Some(working)
            }
            TurnOutcome::Continue => None,
            TurnOutcome::FollowUp => memory.last_result().map(|stored| {
                vec![
                    memory.system_message().clone(),
                    follow_up_directive(stored),
                    Message::user(user_text),
                ]
            }),
            TurnOutcome::Direct => self.config.explain_direct_answers.then(|| {
                let mut working = memory.working_transcript(user_text);
                working.push(direct_directive());
                working
            }),
        }
    }

    async fn invoke(
        &self,
        transcript: &[Message],
        passes: &mut u8,
    ) -> Result<EngineOutput, EngineError> {
        *passes += 1;
        self.engine.invoke(transcript).await
    }

    fn trace_of(&self, step: TraceStep) -> Vec<TraceStep> {
        if self.config.emit_trace {
            vec![step]
        } else {
            Vec::new()
        }
    }
}

fn describe(
    outcome: TurnOutcome,
    observed: Option<&Fingerprint>,
    memory: &SessionMemory,
    context: Option<&ClassifiedResult>,
    explain_direct: bool,
) -> String {
    let call = observed.map_or_else(String::new, |fp| format!("{fp} [{}]", fp.digest()));
    let shape = context.map_or("no", ClassifiedResult::kind);

    match outcome {
        TurnOutcome::Baseline => format!("First tool call {call}; {shape} result stored"),
        TurnOutcome::Reset => format!(
            "Tool call changed to {call}; dropped {} earlier messages, {shape} result stored",
            memory.accumulated_len()
        ),
        TurnOutcome::Continue => format!("Same tool call {call}; context kept"),
        TurnOutcome::FollowUp => format!(
            "No tool call; answered from stored {} result",
            memory
                .last_result()
                .map_or("tool", |stored| stored.tool_name.as_str())
        ),
        TurnOutcome::Direct if explain_direct => {
            "No tool call and no stored result; answered directly with a no-tool note".to_string()
        }
        TurnOutcome::Direct => {
            "No tool call and no stored result; answered directly without a no-tool note"
                .to_string()
        }
    }
}
