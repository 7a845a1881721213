use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_api_url: String,
    /// Drafts fall back to process memory when unset.
    pub redis_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub enable_llm_generation: bool,
    /// 0 disables the autosave task, and with it idle eviction.
    pub autosave_interval_secs: u64,
    /// Wizard sessions untouched this long are closed on the autosave tick. 0 keeps them.
    pub session_idle_secs: u64,
    pub backend_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            backend_api_url: require_env("BACKEND_API_URL")?,
            redis_url: optional_env("REDIS_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            enable_llm_generation: parse_flag(
                "ENABLE_LLM_GENERATION",
                optional_env("ENABLE_LLM_GENERATION").as_deref(),
            )?,
            autosave_interval_secs: parse_or("AUTOSAVE_INTERVAL_SECS", 30)?,
            session_idle_secs: parse_or("SESSION_IDLE_SECS", 1800)?,
            backend_timeout_secs: parse_or("BACKEND_TIMEOUT_SECS", 30)?,
            port: parse_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn session_idle_timeout(&self) -> Option<Duration> {
        (self.session_idle_secs > 0).then(|| Duration::from_secs(self.session_idle_secs))
    }

    /// LLM generation needs both the flag and a key.
    pub fn llm_generation(&self) -> Option<&str> {
        if !self.enable_llm_generation {
            return None;
        }
        self.anthropic_api_key.as_deref()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

fn parse_flag(key: &str, raw: Option<&str>) -> Result<bool> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => anyhow::bail!("{key} must be true or false, got '{other}'"),
    }
}
