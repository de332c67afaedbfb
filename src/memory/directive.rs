//! Directive construction
//!
//! A directive is a synthetic system message that steers the engine's next
//! pass with data a tool already returned. Templates are constant, so the
//! same input always yields byte-identical output.

use super::classify::{parse_payload, ClassifiedResult, DocumentHits};
use super::fingerprint::ToolInvocation;
use crate::engine::Message;
use serde_json::Value;

const DOCUMENT_TEMPLATE: &str = "Based on the tool search results, here is the relevant context \
your answer must be grounded in. Keep every relevant detail from the excerpts, do not summarize \
them away, and cite the listed sources where they support a statement.";

const TABLE_TEMPLATE: &str = "You have received record data from a tool call. Present it as a \
table in your answer, flattening nested fields into dotted column names. If there are more than \
10 rows, give a summarized table instead. Before the table, give brief insights based on the \
data and the user's question.";

const FOLLOW_UP_TEMPLATE: &str = "You are answering a follow-up question about data that was \
retrieved earlier. Use this data to answer; no new tool call is needed.";

const DIRECT_TEMPLATE: &str = "You are answering without using any tools. Rely on your own \
knowledge, and say so plainly if the question needs data you do not have.";

/// Appended to every template; the reply's reasoning is extracted from this section
const REASONING_REMINDER: &str = "After your answer, include a \"REASONING:\" section that \
explains how you arrived at it.";

/// Build the directive for a freshly classified tool result.
///
/// Only document hits with extractable text and tabular records get one;
/// untyped JSON offers no safe formatting instruction.
pub fn build_directive(classified: &ClassifiedResult) -> Option<Message> {
    match classified {
        ClassifiedResult::DocumentHits(hits) => document_directive(hits),
        ClassifiedResult::TabularRecord(records) => Some(table_directive(records)),
        ClassifiedResult::GenericJson(_) | ClassifiedResult::Unrecognized => None,
    }
}

fn document_directive(hits: &DocumentHits) -> Option<Message> {
    let excerpts = hits.excerpt_text()?;
    let urls = hits.urls();
    let sources = if urls.is_empty() {
        "No URLs available".to_string()
    } else {
        urls.join(", ")
    };

    Some(Message::system(format!(
        "{DOCUMENT_TEMPLATE} {REASONING_REMINDER}\n\nEXTRACTED CONTEXT:\n{excerpts}\n\nDOCUMENT SOURCES:\n{sources}\n"
    )))
}

fn table_directive(records: &Value) -> Message {
    Message::system(format!(
        "{TABLE_TEMPLATE} {REASONING_REMINDER}\n\nDATA (JSON):\n{}\n",
        pretty(records)
    ))
}

/// Directive that re-injects a stored tool result for a follow-up question
pub fn follow_up_directive(stored: &ToolInvocation) -> Message {
    let data = parse_payload(&stored.result)
        .map_or_else(|| stored.result.to_text(), |value| pretty(&value));

    Message::system(format!(
        "{FOLLOW_UP_TEMPLATE} {REASONING_REMINDER}\n\nSOURCE TOOL: {}\n\nPREVIOUS DATA:\n{data}\n",
        stored.tool_name
    ))
}

/// Note attached to answers given without any tool data
pub fn direct_directive() -> Message {
    Message::system(format!("{DIRECT_TEMPLATE} {REASONING_REMINDER}"))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
