//! Configuration system (layered: code > env > TOML file > defaults).
//!
//! A [`ScoutConfig`] is resolved once at process start and shared immutably
//! afterwards.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ScoutError;
use crate::types::GenerationSettings;

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_STREAM_IDLE_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 4;
pub const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Resolved service configuration.
#[derive(Clone, PartialEq)]
pub struct ScoutConfig {
    pub groq_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub system_prompt: Option<String>,
    pub max_iterations: usize,
    pub tool_timeout_ms: u64,
    /// `0` disables the idle timeout.
    pub stream_idle_timeout_ms: u64,
    pub search_max_results: usize,
    pub tavily_base_url: String,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
}

impl fmt::Debug for ScoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoutConfig")
            .field("groq_api_key", &self.groq_api_key.as_ref().map(|_| "***"))
            .field("tavily_api_key", &self.tavily_api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("system_prompt", &self.system_prompt)
            .field("max_iterations", &self.max_iterations)
            .field("tool_timeout_ms", &self.tool_timeout_ms)
            .field("stream_idle_timeout_ms", &self.stream_idle_timeout_ms)
            .field("search_max_results", &self.search_max_results)
            .field("tavily_base_url", &self.tavily_base_url)
            .field("bind_addr", &self.bind_addr)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            tavily_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
            stream_idle_timeout_ms: DEFAULT_STREAM_IDLE_TIMEOUT_MS,
            search_max_results: DEFAULT_SEARCH_MAX_RESULTS,
            tavily_base_url: DEFAULT_TAVILY_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
        }
    }
}

/// On-disk shape. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    groq_api_key: Option<String>,
    tavily_api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f64>,
    system_prompt: Option<String>,
    max_iterations: Option<usize>,
    tool_timeout_ms: Option<u64>,
    stream_idle_timeout_ms: Option<u64>,
    search_max_results: Option<usize>,
    tavily_base_url: Option<String>,
    bind_addr: Option<String>,
    cors_origins: Option<Vec<String>>,
}

impl ScoutConfig {
    /// Load from environment variables (after reading `.env` if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load an optional TOML file, then layer the environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ScoutError> {
        let _ = dotenvy::dotenv();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a TOML file on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ScoutError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScoutError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ScoutError> {
        let file: FileConfig = toml::from_str(raw)
            .map_err(|e| ScoutError::Configuration(format!("invalid config file: {e}")))?;
        let mut config = Self::default();
        if file.groq_api_key.is_some() {
            config.groq_api_key = file.groq_api_key;
        }
        if file.tavily_api_key.is_some() {
            config.tavily_api_key = file.tavily_api_key;
        }
        if let Some(model) = file.model {
            config.model = model;
        }
        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(temperature) = file.temperature {
            config.temperature = temperature;
        }
        if file.system_prompt.is_some() {
            config.system_prompt = file.system_prompt;
        }
        if let Some(value) = file.max_iterations.filter(|v| *v > 0) {
            config.max_iterations = value;
        }
        if let Some(value) = file.tool_timeout_ms.filter(|v| *v > 0) {
            config.tool_timeout_ms = value;
        }
        if let Some(value) = file.stream_idle_timeout_ms {
            config.stream_idle_timeout_ms = value;
        }
        if let Some(value) = file.search_max_results.filter(|v| *v > 0) {
            config.search_max_results = value;
        }
        if let Some(url) = file.tavily_base_url {
            config.tavily_base_url = url;
        }
        if let Some(bind_addr) = file.bind_addr {
            config.bind_addr = bind_addr;
        }
        if let Some(origins) = file.cors_origins {
            config.cors_origins = origins;
        }
        Ok(config)
    }

    /// Overlay values found through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GROQ_API_KEY") {
            self.groq_api_key = Some(key);
        }
        if let Some(key) = non_empty("TAVILY_API_KEY") {
            self.tavily_api_key = Some(key);
        }
        if let Some(model) = non_empty("SCOUT_MODEL") {
            self.model = model;
        }
        if let Some(url) = non_empty("SCOUT_BASE_URL") {
            self.base_url = url;
        }
        if let Some(value) = non_empty("SCOUT_TEMPERATURE").and_then(|v| v.trim().parse().ok()) {
            self.temperature = value;
        }
        if let Some(prompt) = non_empty("SCOUT_SYSTEM_PROMPT") {
            self.system_prompt = Some(prompt);
        }
        if let Some(value) = non_empty("SCOUT_MAX_ITERATIONS").and_then(|v| parse_positive(&v)) {
            self.max_iterations = value as usize;
        }
        if let Some(value) = non_empty("SCOUT_TOOL_TIMEOUT_MS").and_then(|v| parse_positive(&v)) {
            self.tool_timeout_ms = value;
        }
        if let Some(value) =
            non_empty("SCOUT_STREAM_IDLE_TIMEOUT_MS").and_then(|v| v.trim().parse().ok())
        {
            self.stream_idle_timeout_ms = value;
        }
        if let Some(value) =
            non_empty("SCOUT_SEARCH_MAX_RESULTS").and_then(|v| parse_positive(&v))
        {
            self.search_max_results = value as usize;
        }
        if let Some(url) = non_empty("SCOUT_TAVILY_BASE_URL") {
            self.tavily_base_url = url;
        }
        if let Some(addr) = non_empty("SCOUT_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(origins) = non_empty("SCOUT_CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Fail fast on settings the service cannot start without.
    pub fn validate(&self) -> Result<(), ScoutError> {
        if self.groq_api_key.is_none() {
            return Err(ScoutError::Configuration(
                "GROQ_API_KEY is missing".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ScoutError::Configuration("model must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }

    /// Generation settings sent with every model call.
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings::builder()
            .temperature(self.temperature)
            .stream_idle_timeout_ms(self.stream_idle_timeout_ms)
            .build()
    }
}

fn parse_positive(value: &str) -> Option<u64> {
    let parsed = value.trim().parse::<u64>().ok()?;
    (parsed > 0).then_some(parsed)
}
