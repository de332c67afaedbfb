//! Helpers that shape a turn's answer for display

use reqwest::Url;

const REASONING_MARKERS: &[&str] = &["REASONING:", "Reasoning:"];

/// Reasoning section of an answer, without its marker
///
/// The system prompt asks the engine to close every answer with a
/// `REASONING:` section; everything after the first marker is returned.
pub fn extract_reasoning(answer: &str) -> Option<String> {
    REASONING_MARKERS.iter().find_map(|marker| {
        let start = answer.find(marker)? + marker.len();
        let reasoning = answer.get(start..)?.trim();
        (!reasoning.is_empty()).then(|| reasoning.to_string())
    })
}

/// Markdown reference links, one per source URL
///
/// Links are labelled with the URL's host; URLs that do not parse fall back
/// to a numbered label.
pub fn reference_links(urls: &[String]) -> Vec<String> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| {
            let host = Url::parse(url)
                .ok()
                .and_then(|parsed| parsed.host_str().map(str::to_string));
            match host {
                Some(host) => format!("[{host}]({url})"),
                None => format!("[Source {}]({url})", i + 1),
            }
        })
        .collect()
}
