//! Tool result classification
//!
//! The shape of a tool payload is inferred from its structure alone, in a
//! fixed priority order:
//!
//! 1. unparsable payload -> `Unrecognized`
//! 2. `hits` array of `record` mappings -> `DocumentHits`
//! 3. mapping(s) carrying a record-identifying key -> `TabularRecord`
//! 4. any other JSON value -> `GenericJson`
//!
//! Steps 2 and 3 look at the payload's `result` field first and then at the
//! payload itself.

use super::RESULT_KEY;
use crate::engine::Content;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Keys that identify a tabular record when no configuration overrides them
pub const DEFAULT_RECORD_KEYS: &[&str] = &["transactionId"];

const UNKNOWN_TITLE: &str = "Unknown Document";

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentHit {
    pub title: String,
    pub body: String,
    pub url: Option<String>,
}

/// Search hits in payload order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentHits {
    pub hits: Vec<DocumentHit>,
}

impl DocumentHits {
    /// Source URLs, deduplicated, in order of first appearance
    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for url in self.hits.iter().filter_map(|h| h.url.as_ref()) {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }
        urls
    }

    /// Concatenated excerpts; hits with an empty body are skipped
    pub fn excerpt_text(&self) -> Option<String> {
        let excerpts: Vec<String> = self
            .hits
            .iter()
            .filter(|h| !h.body.trim().is_empty())
            .map(|h| format!("[{}]\n{}", h.title, h.body))
            .collect();

        if excerpts.is_empty() {
            None
        } else {
            Some(excerpts.join("\n\n----\n\n"))
        }
    }
}

/// Shape of a tool result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ClassifiedResult {
    DocumentHits(DocumentHits),
    /// A single record or a list of records, unchanged
    TabularRecord(Value),
    GenericJson(Value),
    Unrecognized,
}

impl ClassifiedResult {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedResult::DocumentHits(_) => "document_hits",
            ClassifiedResult::TabularRecord(_) => "tabular_record",
            ClassifiedResult::GenericJson(_) => "generic_json",
            ClassifiedResult::Unrecognized => "unrecognized",
        }
    }

    /// Source URLs carried by the result, if it has any
    pub fn urls(&self) -> Vec<String> {
        match self {
            ClassifiedResult::DocumentHits(hits) => hits.urls(),
            _ => Vec::new(),
        }
    }

    /// Flattened table rows for tabular results
    pub fn table_rows(&self) -> Vec<BTreeMap<String, String>> {
        match self {
            ClassifiedResult::TabularRecord(records) => flatten_records(records),
            _ => Vec::new(),
        }
    }
}

/// Parse a raw payload. Text must be valid JSON; structured payloads are
/// taken as they are.
pub fn parse_payload(raw: &Content) -> Option<Value> {
    match raw {
        Content::Text(text) => serde_json::from_str(text).ok(),
        Content::Structured(value) => Some(value.clone()),
    }
}

/// Shape classifier with a configurable set of record-identifying keys
#[derive(Debug, Clone)]
pub struct Classifier {
    record_keys: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_KEYS.iter().copied())
    }
}

impl Classifier {
    pub fn new<I, S>(record_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            record_keys: record_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Classify a raw tool payload. Never fails; malformed input is
    /// `Unrecognized`.
    pub fn classify(&self, raw: &Content) -> ClassifiedResult {
        let Some(value) = parse_payload(raw) else {
            return ClassifiedResult::Unrecognized;
        };

        if let Some(hits) = candidates(&value).find_map(document_hits) {
            return ClassifiedResult::DocumentHits(hits);
        }

        if let Some(records) = candidates(&value).find(|c| self.is_record_shaped(c)) {
            return ClassifiedResult::TabularRecord(records.clone());
        }

        ClassifiedResult::GenericJson(value)
    }

    fn is_record_shaped(&self, candidate: &Value) -> bool {
        match candidate {
            Value::Object(map) => self.has_record_key(map),
            Value::Array(items) => {
                !items.is_empty()
                    && items
                        .iter()
                        .all(|item| item.as_object().is_some_and(|m| self.has_record_key(m)))
            }
            _ => false,
        }
    }

    fn has_record_key(&self, map: &Map<String, Value>) -> bool {
        self.record_keys.iter().any(|key| map.contains_key(key))
    }
}

/// Classify with the default record keys
#[cfg(test)]
pub fn classify(raw: &Content) -> ClassifiedResult {
    Classifier::default().classify(raw)
}

/// The payload's `result` field (when present) followed by the payload
fn candidates(value: &Value) -> impl Iterator<Item = &Value> {
    value.get(RESULT_KEY).into_iter().chain(std::iter::once(value))
}

fn document_hits(candidate: &Value) -> Option<DocumentHits> {
    let hits = candidate.as_object()?.get("hits")?.as_array()?;
    let hits = hits
        .iter()
        .map(|hit| hit.get("record").and_then(Value::as_object).map(document_hit))
        .collect::<Option<Vec<_>>>()?;
    Some(DocumentHits { hits })
}

fn document_hit(record: &Map<String, Value>) -> DocumentHit {
    DocumentHit {
        title: field_text(record, "title").unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        body: field_text(record, "raw_context").unwrap_or_default(),
        url: field_text(record, "url").filter(|u| !u.is_empty()),
    }
}

fn field_text(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Flatten one record or a list of records into table rows. Nested mappings
/// become dotted column names, arrays are indexed.
pub fn flatten_records(records: &Value) -> Vec<BTreeMap<String, String>> {
    let rows: Vec<&Value> = match records {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    rows.into_iter()
        .map(|row| {
            let mut flat = BTreeMap::new();
            flatten_into(&mut flat, String::new(), row);
            flat
        })
        .collect()
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: String, value: &Value) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(out, column(&prefix, key), child);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(out, column(&prefix, &i.to_string()), child);
            }
        }
        Value::String(s) => {
            out.insert(prefix, s.clone());
        }
        Value::Null => {
            out.insert(prefix, String::new());
        }
        other => {
            out.insert(prefix, other.to_string());
        }
    }
}

fn column(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> Content {
        Content::Text(s.to_string())
    }

    #[test]
    fn test_document_hits() {
        let raw = text(
            r#"{"result":{"hits":[{"record":{"title":"T","raw_context":"C","url":"U"}}]}}"#,
        );
        let ClassifiedResult::DocumentHits(hits) = classify(&raw) else {
            panic!("expected document hits");
        };
        assert_eq!(hits.hits[0].title, "T");
        assert!(hits.excerpt_text().unwrap().contains('C'));
        assert_eq!(hits.urls(), vec!["U".to_string()]);
    }

    #[test]
    fn test_document_hits_defaults_and_dedup() {
        let raw = Content::Structured(json!({"result": {"hits": [
            {"record": {"raw_context": "first", "url": "https://a.example/doc"}},
            {"record": {"title": "Empty", "raw_context": "", "url": "https://b.example"}},
            {"record": {"title": "Again", "raw_context": "third", "url": "https://a.example/doc"}}
        ]}}));
        let ClassifiedResult::DocumentHits(hits) = classify(&raw) else {
            panic!("expected document hits");
        };
        assert_eq!(hits.hits[0].title, UNKNOWN_TITLE);
        assert_eq!(
            hits.urls(),
            vec!["https://a.example/doc".to_string(), "https://b.example".to_string()]
        );
        let excerpts = hits.excerpt_text().unwrap();
        assert!(excerpts.contains("first"));
        assert!(excerpts.contains("third"));
        assert!(!excerpts.contains("[Empty]"));
    }

    #[test]
    fn test_hit_without_record_is_not_document_hits() {
        let raw = Content::Structured(json!({"result": {"hits": [{"record": {}}, {"doc": 1}]}}));
        assert!(matches!(classify(&raw), ClassifiedResult::GenericJson(_)));
    }

    #[test]
    fn test_hits_at_top_level() {
        let raw = Content::Structured(json!({"hits": [{"record": {"title": "T"}}]}));
        assert!(matches!(classify(&raw), ClassifiedResult::DocumentHits(_)));
    }

    #[test]
    fn test_tabular_record_preserves_fields() {
        let raw = text(
            r#"{"result":{"transactionId":"94806599","buyCurrency":"USD","amounts":{"buy":"100.50"}}}"#,
        );
        let classified = classify(&raw);
        assert_eq!(
            classified,
            ClassifiedResult::TabularRecord(json!({
                "transactionId": "94806599",
                "buyCurrency": "USD",
                "amounts": {"buy": "100.50"}
            }))
        );
        let rows = classified.table_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["amounts.buy"], "100.50");
        assert_eq!(rows[0]["transactionId"], "94806599");
    }

    #[test]
    fn test_tabular_record_list() {
        let raw = Content::Structured(json!({"result": [
            {"transactionId": "1", "status": "Approved"},
            {"transactionId": "2", "status": "Pending"}
        ]}));
        let classified = classify(&raw);
        assert!(matches!(classified, ClassifiedResult::TabularRecord(Value::Array(_))));
        assert_eq!(classified.table_rows().len(), 2);
    }

    #[test]
    fn test_mixed_list_is_generic() {
        let raw = Content::Structured(json!({"result": [
            {"transactionId": "1"},
            {"status": "Pending"}
        ]}));
        assert!(matches!(classify(&raw), ClassifiedResult::GenericJson(_)));
        let empty = Content::Structured(json!({"result": []}));
        assert!(matches!(classify(&empty), ClassifiedResult::GenericJson(_)));
    }

    #[test]
    fn test_custom_record_keys() {
        let classifier = Classifier::new(["orderId"]);
        let raw = Content::Structured(json!({"orderId": 7}));
        assert!(matches!(classifier.classify(&raw), ClassifiedResult::TabularRecord(_)));
        assert!(matches!(classify(&raw), ClassifiedResult::GenericJson(_)));
    }

    #[test]
    fn test_hits_win_over_record_keys() {
        let raw = Content::Structured(json!({
            "transactionId": "1",
            "result": {"hits": [{"record": {"title": "T"}}]}
        }));
        assert!(matches!(classify(&raw), ClassifiedResult::DocumentHits(_)));
    }

    #[test]
    fn test_unparsable_is_unrecognized() {
        assert_eq!(classify(&text("not json at all {")), ClassifiedResult::Unrecognized);
        assert_eq!(classify(&text("")), ClassifiedResult::Unrecognized);
    }

    #[test]
    fn test_scalar_json_is_generic() {
        assert_eq!(classify(&text("42")), ClassifiedResult::GenericJson(json!(42)));
        assert_eq!(classify(&text(r#""quoted""#)).kind(), "generic_json");
    }

    #[test]
    fn test_flatten_nested_arrays() {
        let rows = flatten_records(&json!({"a": {"b": [1, {"c": null}]}, "d": true}));
        assert_eq!(rows[0]["a.b.0"], "1");
        assert_eq!(rows[0]["a.b.1.c"], "");
        assert_eq!(rows[0]["d"], "true");
    }
}
