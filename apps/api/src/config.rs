use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::conversation::registry::ExpiryPolicy;
use crate::llm_client::{ANTHROPIC_API_URL, DEFAULT_MAX_RETRIES, MAX_RETRIES_CAP};
use crate::questions::selector::{DEFAULT_MAX_QUESTIONS, MIN_QUESTIONS};

/// Upper clamp for `QUESTION_COUNT`.
const MAX_QUESTION_COUNT: usize = 8;

/// Lower bound for `LLM_MAX_RETRIES`; the upper bound keeps doubling backoff finite.
const MIN_LLM_RETRIES: u32 = 1;

/// Application configuration loaded from environment variables.
/// Nothing is required: without an API key sessions run rule-based.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_timeout: Duration,
    pub llm_max_retries: u32,
    pub sentiment_timeout: Duration,
    pub session_idle_ttl: Duration,
    pub session_ended_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub question_count: usize,
    pub data_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let question_count: usize = parse_or(&lookup, "QUESTION_COUNT", DEFAULT_MAX_QUESTIONS)?;
        let llm_max_retries: u32 = parse_or(&lookup, "LLM_MAX_RETRIES", DEFAULT_MAX_RETRIES)?;
        let expiry = ExpiryPolicy::default();

        Ok(Config {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()),
            llm_api_url: lookup("LLM_API_URL").unwrap_or_else(|| ANTHROPIC_API_URL.to_string()),
            llm_timeout: Duration::from_secs(parse_or(&lookup, "LLM_TIMEOUT_SECS", 20)?),
            llm_max_retries: llm_max_retries.clamp(MIN_LLM_RETRIES, MAX_RETRIES_CAP),
            sentiment_timeout: Duration::from_millis(parse_or(
                &lookup,
                "SENTIMENT_TIMEOUT_MS",
                250,
            )?),
            session_idle_ttl: Duration::from_secs(parse_or(
                &lookup,
                "SESSION_IDLE_TTL_SECS",
                expiry.idle_ttl.as_secs(),
            )?),
            session_ended_ttl: Duration::from_secs(parse_or(
                &lookup,
                "SESSION_ENDED_TTL_SECS",
                expiry.ended_ttl.as_secs(),
            )?),
            session_sweep_interval: Duration::from_secs(
                parse_or(
                    &lookup,
                    "SESSION_SWEEP_INTERVAL_SECS",
                    expiry.sweep_interval.as_secs(),
                )?
                .max(1),
            ),
            question_count: question_count.clamp(MIN_QUESTIONS, MAX_QUESTION_COUNT),
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            idle_ttl: self.session_idle_ttl,
            ended_ttl: self.session_ended_ttl,
            sweep_interval: self.session_sweep_interval,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.question_count, 5);
        assert_eq!(config.llm_timeout, Duration::from_secs(20));
        assert_eq!(config.llm_max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.sentiment_timeout, Duration::from_millis(250));
        assert_eq!(config.expiry_policy(), ExpiryPolicy::default());
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.llm_api_url, ANTHROPIC_API_URL);
        assert!(config.anthropic_api_key.is_none());
    }

    #[test]
    fn test_question_count_is_clamped() {
        assert_eq!(config(&[("QUESTION_COUNT", "1")]).unwrap().question_count, 3);
        assert_eq!(config(&[("QUESTION_COUNT", "20")]).unwrap().question_count, 8);
        assert_eq!(config(&[("QUESTION_COUNT", "6")]).unwrap().question_count, 6);
    }

    #[test]
    fn test_llm_retries_are_clamped() {
        assert_eq!(config(&[("LLM_MAX_RETRIES", "100")]).unwrap().llm_max_retries, 10);
        assert_eq!(config(&[("LLM_MAX_RETRIES", "0")]).unwrap().llm_max_retries, 1);
        assert_eq!(config(&[("LLM_MAX_RETRIES", "4")]).unwrap().llm_max_retries, 4);
    }

    #[test]
    fn test_session_expiry_settings() {
        let config = config(&[
            ("SESSION_IDLE_TTL_SECS", "120"),
            ("SESSION_ENDED_TTL_SECS", "10"),
            ("SESSION_SWEEP_INTERVAL_SECS", "0"),
        ])
        .unwrap();
        let policy = config.expiry_policy();
        assert_eq!(policy.idle_ttl, Duration::from_secs(120));
        assert_eq!(policy.ended_ttl, Duration::from_secs(10));
        assert_eq!(policy.sweep_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_blank_api_key_means_rule_based() {
        let config = config(&[("ANTHROPIC_API_KEY", "  ")]).unwrap();
        assert!(config.anthropic_api_key.is_none());
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(config(&[("SENTIMENT_TIMEOUT_MS", "-1")]).is_err());
    }
}
