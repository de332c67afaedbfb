//! Property-based tests for context memory
//!
//! These tests verify the fingerprint, classifier and decision invariants
//! across generated inputs.

use super::classify::classify;
use super::session::decide;
use super::*;
use crate::engine::Content;
use proptest::prelude::*;
use serde_json::{Map, Value};
use std::time::Duration;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 /_-]{0,16}".prop_map(Value::String),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

fn arb_params() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::btree_map("[a-z_]{1,10}", arb_scalar(), 0..6)
        .prop_map(|map| map.into_iter().collect())
}

fn arb_tool_name() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z]{2,20}"
}

fn arb_fingerprint() -> impl Strategy<Value = Option<Fingerprint>> {
    prop::option::of(
        (arb_tool_name(), arb_params()).prop_map(|(tool, pairs)| invocation(&tool, &pairs, Value::Null).1),
    )
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Serialize pairs as a JSON object string in the given order
fn object_text(pairs: &[(String, Value)]) -> String {
    let body: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{}:{}", Value::String(key.clone()), value))
        .collect();
    format!("{{{}}}", body.join(","))
}

fn invocation(tool: &str, pairs: &[(String, Value)], result: Value) -> (ToolInvocation, Fingerprint) {
    let inv = ToolInvocation {
        tool_name: tool.to_string(),
        params: Value::Object(pairs.iter().cloned().collect::<Map<_, _>>()),
        result: Content::Structured(result),
    };
    let fp = fingerprint(&inv);
    (inv, fp)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_fingerprint_ignores_parameter_order(
        tool in arb_tool_name(),
        pairs in arb_params(),
    ) {
        let mut reversed = pairs.clone();
        reversed.reverse();

        let forward = ToolInvocation {
            tool_name: tool.clone(),
            params: Value::String(object_text(&pairs)),
            result: Content::Text(String::new()),
        };
        let backward = ToolInvocation {
            tool_name: tool,
            params: Value::String(object_text(&reversed)),
            result: Content::Text(String::new()),
        };

        prop_assert_eq!(fingerprint(&forward), fingerprint(&backward));
    }

    #[test]
    fn prop_fingerprint_excludes_result(
        tool in arb_tool_name(),
        pairs in arb_params(),
        a in arb_scalar(),
        b in arb_scalar(),
    ) {
        let (_, with_a) = invocation(&tool, &pairs, a.clone());
        let mut echoed = pairs.clone();
        echoed.push(("result".to_string(), b.clone()));
        let (_, with_b) = invocation(&tool, &echoed, b);

        prop_assert_eq!(&with_a, &with_b);
        prop_assert!(with_a.params().iter().all(|(key, _)| key != "result"));
    }

    #[test]
    fn prop_fingerprint_params_are_sorted(tool in arb_tool_name(), pairs in arb_params()) {
        let (_, fp) = invocation(&tool, &pairs, Value::Null);
        let keys: Vec<&String> = fp.params().iter().map(|(key, _)| key).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }

    #[test]
    fn prop_classify_never_panics(raw in ".{0,200}") {
        let classified = classify(&Content::Text(raw.clone()));
        if serde_json::from_str::<Value>(&raw).is_err() {
            prop_assert_eq!(classified, ClassifiedResult::Unrecognized);
        }
    }

    #[test]
    fn prop_record_key_means_tabular(
        id in "[0-9]{1,10}",
        pairs in arb_params(),
    ) {
        let mut record: Map<String, Value> = pairs.into_iter().collect();
        record.insert("transactionId".to_string(), Value::String(id));
        record.remove("hits");
        let payload = serde_json::json!({ "result": Value::Object(record.clone()) });

        prop_assert_eq!(
            classify(&Content::Structured(payload)),
            ClassifiedResult::TabularRecord(Value::Object(record))
        );
    }

    #[test]
    fn prop_directive_is_idempotent(
        titles in prop::collection::vec("[a-zA-Z ]{0,20}", 0..5),
        body in "[a-zA-Z .]{0,40}",
    ) {
        let hits: Vec<Value> = titles
            .iter()
            .map(|title| serde_json::json!({"record": {"title": title, "raw_context": body, "url": format!("https://docs.example/{}", title.len())}}))
            .collect();
        let classified = classify(&Content::Structured(serde_json::json!({"result": {"hits": hits}})));

        prop_assert_eq!(build_directive(&classified), build_directive(&classified));
    }

    #[test]
    fn prop_decide_follows_observation(
        observed in arb_fingerprint(),
        stored in arb_fingerprint(),
        has_result in any::<bool>(),
        first_turn in any::<bool>(),
    ) {
        let outcome = decide(observed.as_ref(), stored.as_ref(), has_result, first_turn);

        match &observed {
            Some(current) => {
                prop_assert!(outcome.stores_invocation());
                prop_assert_eq!(
                    outcome == TurnOutcome::Continue,
                    stored.as_ref() == Some(current)
                );
                if outcome == TurnOutcome::Baseline {
                    prop_assert!(first_turn && stored.is_none());
                }
            }
            None => {
                let expected = if has_result { TurnOutcome::FollowUp } else { TurnOutcome::Direct };
                prop_assert_eq!(outcome, expected);
            }
        }
    }

    #[test]
    fn prop_failure_leaves_memory_unchanged(
        turns in prop::collection::vec(prop::option::of(arb_params()), 0..6),
    ) {
        let mut memory = SessionMemory::new("system");
        for (i, params) in turns.iter().enumerate() {
            let observed = params
                .as_ref()
                .map(|pairs| invocation("Lookup", pairs, Value::from(i)));
            let outcome = memory.decide(observed.as_ref().map(|(_, fp)| fp));
            memory.commit_turn(TurnCommit {
                user_text: format!("turn {i}"),
                outcome,
                invocation: observed,
                answer: "ok".to_string(),
                step: TraceStep::new(outcome.into(), "turn", Duration::ZERO),
            });
        }

        let before = memory.state().clone();
        memory.record_failure(TraceStep::new(StepKind::Error, "failed", Duration::ZERO));

        prop_assert_eq!(memory.transcript(), before.transcript.as_slice());
        prop_assert_eq!(memory.last_fingerprint(), before.last_fingerprint.as_ref());
        prop_assert_eq!(memory.last_result(), before.last_result.as_ref());
        prop_assert_eq!(memory.trace().len(), before.trace.len() + 1);
    }
}
