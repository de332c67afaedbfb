//! JSON-over-HTTP engine adapter
//!
//! Posts the transcript to an agent endpoint that runs the model together
//! with its tools and answers with the full message sequence of the turn.

use super::{EngineError, EngineOutput, Message, ReasoningEngine};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bound on a single engine call
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the engine endpoint
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Agent endpoint (e.g., `http://localhost:9000/invoke`)
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Tool servers the engine should load tools from
    pub tool_servers: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout: DEFAULT_ENGINE_TIMEOUT,
            tool_servers: Vec::new(),
        }
    }
}

/// Engine reached over HTTP
pub struct HttpEngine {
    client: Client,
    url: Option<String>,
    api_key: Option<String>,
    tool_servers: Vec<String>,
}

impl HttpEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EngineError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            tool_servers: config.tool_servers.clone(),
        })
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> EngineError {
        match status.as_u16() {
            401 | 403 => EngineError::auth(format!("Authentication failed: {body}")),
            429 => EngineError::quota(format!("Rate limited: {body}")),
            408 | 504 => EngineError::timeout(format!("Engine timed out: {body}")),
            500..=599 => EngineError::server_error(format!("Server error: {body}")),
            _ => EngineError::unknown(format!("HTTP {status}: {body}")),
        }
    }

    fn parse_output(body: &str) -> Result<EngineOutput, EngineError> {
        let response: InvokeResponse = serde_json::from_str(body).map_err(|e| {
            EngineError::malformed_output(format!("Failed to parse engine response: {e}"))
        })?;
        Ok(EngineOutput::new(response.messages))
    }
}

#[async_trait]
impl ReasoningEngine for HttpEngine {
    async fn invoke(&self, transcript: &[Message]) -> Result<EngineOutput, EngineError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| EngineError::network("No engine endpoint configured"))?;

        let request = InvokeRequest {
            messages: transcript,
            tool_servers: &self.tool_servers,
        };

        let mut builder = self.client.post(url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                EngineError::timeout(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                EngineError::network(format!("Connection failed: {e}"))
            } else {
                EngineError::unknown(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        Self::parse_output(&body)
    }

    fn engine_id(&self) -> &str {
        self.url.as_deref().unwrap_or("unconfigured")
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    messages: &'a [Message],
    tool_servers: &'a [String],
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    messages: Vec<Message>,
}
