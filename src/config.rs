//! Service configuration from the environment

use crate::engine::EngineConfig;
use crate::memory::DEFAULT_RECORD_KEYS;
use crate::runtime::ControllerConfig;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;

/// System prompt used when `CONTEXTGATE_SYSTEM_PROMPT` is not set
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to tools for \
searching documentation and looking up transaction data.

Use a tool when the question needs current or specific data. Answer directly for general \
knowledge, explanations and simple calculations. If a tool fails, explain the limitation.

After your main answer, always include a \"REASONING:\" section that explains which tool you \
chose and why (or why none was needed), what information sources you relied on, and any \
assumptions or limitations.";

/// Invalid configuration value
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub port: u16,
    pub system_prompt: String,
    pub engine: EngineConfig,
    pub controller: ControllerConfig,
}

impl RouterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("CONTEXTGATE_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: "CONTEXTGATE_PORT",
                value: raw,
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let system_prompt = lookup("CONTEXTGATE_SYSTEM_PROMPT")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let record_keys = lookup("CONTEXTGATE_RECORD_KEYS")
            .map(|raw| split_list(&raw))
            .filter(|keys| !keys.is_empty())
            .unwrap_or_else(|| DEFAULT_RECORD_KEYS.iter().map(ToString::to_string).collect());

        let controller = ControllerConfig {
            emit_trace: flag(&lookup, "CONTEXTGATE_EMIT_TRACE", true)?,
            explain_direct_answers: flag(&lookup, "CONTEXTGATE_EXPLAIN_DIRECT", false)?,
            record_keys,
        };

        Ok(Self {
            port,
            system_prompt,
            engine: engine_config(&lookup)?,
            controller,
        })
    }
}

fn engine_config(lookup: &impl Fn(&str) -> Option<String>) -> Result<EngineConfig, ConfigError> {
    let mut config = EngineConfig {
        url: lookup("CONTEXTGATE_ENGINE_URL").filter(|u| !u.trim().is_empty()),
        api_key: lookup("CONTEXTGATE_ENGINE_API_KEY").filter(|k| !k.is_empty()),
        tool_servers: lookup("CONTEXTGATE_TOOL_SERVERS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default(),
        ..EngineConfig::default()
    };

    if let Some(raw) = lookup("CONTEXTGATE_ENGINE_TIMEOUT_SECS") {
        let secs: u64 = raw
            .trim()
            .parse()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::Invalid {
                var: "CONTEXTGATE_ENGINE_TIMEOUT_SECS",
                value: raw,
                reason: "expected a positive number of seconds",
            })?;
        config.timeout = Duration::from_secs(secs);
    }

    Ok(config)
}

fn flag(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected true or false",
        }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}
