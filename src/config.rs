//! Startup configuration.
//!
//! Both API keys are required; a missing key is a fatal startup error rather
//! than a per-request one. Everything else has a default in `constants` and
//! may be overridden with a `PLANNER_*` environment variable.

use std::fmt;
use std::time::Duration;

use crate::constants::{
    DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MAX_TOKENS, DEFAULT_LLM_MODEL, DEFAULT_LLM_TEMPERATURE,
    DEFAULT_MAX_HOTELS, DEFAULT_SEARCH_BASE_URL, DEFAULT_TIMEOUT_SECS, GROQ_API_KEY_VAR,
    MAX_TIMEOUT_SECS, SERP_API_KEY_VAR,
};
use crate::error::PlannerError;

/// An API credential. Never printed, not even through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub max_results: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
}

impl PlannerConfig {
    /// Read configuration from the process environment. Call
    /// `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, PlannerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PlannerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let groq_key = required_key(&lookup, GROQ_API_KEY_VAR)?;
        let serp_key = required_key(&lookup, SERP_API_KEY_VAR)?;

        let timeout_secs = parsed(&lookup, "PLANNER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let timeout = Duration::from_secs(timeout_secs);

        let config = Self {
            llm: LlmConfig {
                api_key: groq_key,
                base_url: lookup("PLANNER_LLM_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
                model: lookup("PLANNER_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                temperature: parsed(&lookup, "PLANNER_LLM_TEMPERATURE", DEFAULT_LLM_TEMPERATURE)?,
                max_tokens: parsed(&lookup, "PLANNER_LLM_MAX_TOKENS", DEFAULT_LLM_MAX_TOKENS)?,
                timeout,
            },
            search: SearchConfig {
                api_key: serp_key,
                base_url: lookup("PLANNER_SEARCH_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_SEARCH_BASE_URL.to_string()),
                max_results: parsed(&lookup, "PLANNER_MAX_HOTELS", DEFAULT_MAX_HOTELS)?,
                timeout,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        for (name, url) in [
            ("PLANNER_LLM_BASE_URL", &self.llm.base_url),
            ("PLANNER_SEARCH_BASE_URL", &self.search.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PlannerError::config(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }

        let timeout_secs = self.llm.timeout.as_secs();
        if timeout_secs == 0 || timeout_secs > MAX_TIMEOUT_SECS {
            return Err(PlannerError::config(format!(
                "PLANNER_TIMEOUT_SECS must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(PlannerError::config(
                "PLANNER_LLM_TEMPERATURE must be between 0.0 and 2.0",
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(PlannerError::config("PLANNER_LLM_MAX_TOKENS must be positive"));
        }

        if self.search.max_results == 0 {
            return Err(PlannerError::config("PLANNER_MAX_HOTELS must be positive"));
        }

        Ok(())
    }
}

fn required_key<F>(lookup: &F, name: &str) -> Result<ApiKey, PlannerError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(ApiKey::new(value.trim())),
        _ => Err(PlannerError::config(format!(
            "{name} is missing. Configure it in your environment or .env file."
        ))),
    }
}

fn parsed<F, T>(lookup: &F, name: &str, default: T) -> Result<T, PlannerError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PlannerError::config(format!("{name} has an invalid value '{raw}'"))),
    }
}
