use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::analysis::gap_decision::GapPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub gap_threshold: u8,
    pub gap_adequacy_floor: u8,
    pub llm_max_attempts: u32,
    pub session_ttl_secs: i64,
    /// CORS origin for the web client. Permissive when unset.
    pub allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            gap_threshold: env_or("GAP_THRESHOLD", 75)?,
            gap_adequacy_floor: env_or("GAP_ADEQUACY_FLOOR", 65)?,
            llm_max_attempts: env_or("LLM_MAX_ATTEMPTS", 1)?,
            session_ttl_secs: session_ttl_secs(env_or("SESSION_TTL_SECS", 86_400)?)?,
            allowed_origin: std::env::var("ALLOWED_ORIGIN").ok(),
        })
    }

    /// Session lifetime. `session_ttl_secs` is range-checked at load.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs)
    }

    pub fn gap_policy(&self) -> GapPolicy {
        GapPolicy {
            threshold: self.gap_threshold,
            adequacy_floor: self.gap_adequacy_floor,
            ..GapPolicy::default()
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Longest accepted session lifetime: one year.
const MAX_SESSION_TTL_SECS: i64 = 365 * 86_400;

fn session_ttl_secs(secs: i64) -> Result<i64> {
    if !(1..=MAX_SESSION_TTL_SECS).contains(&secs) {
        bail!("SESSION_TTL_SECS must be between 1 and {MAX_SESSION_TTL_SECS}, got {secs}");
    }
    Ok(secs)
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
