//! Process configuration, read once from the environment at startup.
//!
//! A `.env` file in the working directory is honoured (loaded by `main` via
//! `dotenv`) but real environment variables always win. The resulting
//! [`AppConfig`] is handed explicitly to the components that need it.

use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_DATABASE_PATH: &str = "sales.sqlite";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the language-model client and the calls the worker makes.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    /// Attempts for transient failures. `1` means the call is never retried.
    pub max_attempts: u32,
    /// No timeout is applied when unset.
    pub timeout_seconds: Option<u64>,
    /// Optional outbound proxy, e.g. `socks5://127.0.0.1:1080`.
    pub proxy_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 500,
            max_attempts: 1,
            timeout_seconds: None,
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub queue_capacity: usize,
    pub worker_concurrency: usize,
    pub max_document_bytes: usize,
    /// Finished task statuses kept for the status endpoint.
    pub job_history_limit: usize,
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            host: "127.0.0.1".to_string(),
            port: 8080,
            queue_capacity: 100,
            worker_concurrency: 4,
            max_document_bytes: 10 * 1024 * 1024,
            job_history_limit: 10_000,
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let database_path = get("DATABASE_URL")
            .map(|url| PathBuf::from(strip_sqlite_scheme(&url)))
            .unwrap_or(defaults.database_path);

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let llm = LlmConfig {
            api_key,
            base_url: get("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.llm.base_url),
            model: get("LLM_MODEL").unwrap_or(defaults.llm.model),
            system_prompt: defaults.llm.system_prompt,
            max_tokens: parse_or("LLM_MAX_TOKENS", get("LLM_MAX_TOKENS"), defaults.llm.max_tokens)?,
            max_attempts: parse_or(
                "LLM_MAX_ATTEMPTS",
                get("LLM_MAX_ATTEMPTS"),
                defaults.llm.max_attempts,
            )?,
            timeout_seconds: get("LLM_TIMEOUT_SECONDS")
                .map(|v| parse_value("LLM_TIMEOUT_SECONDS", v))
                .transpose()?,
            proxy_url: get("SOCKS5_URL"),
        };

        let config = Self {
            database_path,
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            queue_capacity: parse_or(
                "ANALYSIS_QUEUE_CAPACITY",
                get("ANALYSIS_QUEUE_CAPACITY"),
                defaults.queue_capacity,
            )?,
            worker_concurrency: parse_or(
                "ANALYSIS_WORKERS",
                get("ANALYSIS_WORKERS"),
                defaults.worker_concurrency,
            )?,
            max_document_bytes: parse_or(
                "MAX_DOCUMENT_BYTES",
                get("MAX_DOCUMENT_BYTES"),
                defaults.max_document_bytes,
            )?,
            job_history_limit: parse_or(
                "JOB_HISTORY_LIMIT",
                get("JOB_HISTORY_LIMIT"),
                defaults.job_history_limit,
            )?,
            llm,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.is_empty() {
            return Err(ConfigError::Missing("OPENAI_API_KEY"));
        }
        if self.llm.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "LLM_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }
        // tokio's mpsc::channel panics on a zero capacity
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "ANALYSIS_QUEUE_CAPACITY",
                value: "0".to_string(),
            });
        }
        if self.worker_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "ANALYSIS_WORKERS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn strip_sqlite_scheme(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    value.map_or(Ok(default), |v| parse_value(key, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("sales.sqlite"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.llm.max_attempts, 1);
        assert_eq!(config.llm.timeout_seconds, None);
        assert_eq!(config.llm.proxy_url, None);
        assert_eq!(config.job_history_limit, 10_000);
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("DATABASE_URL", "sqlite:///var/lib/sales.db"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1/"),
            ("PORT", "9090"),
            ("LLM_TIMEOUT_SECONDS", "30"),
            ("SOCKS5_URL", "socks5://127.0.0.1:1080"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/sales.db"));
        assert_eq!(config.llm.base_url, "http://localhost:9000/v1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.llm.timeout_seconds, Some(30));
        assert_eq!(
            config.llm.proxy_url.as_deref(),
            Some("socks5://127.0.0.1:1080")
        );
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("ANALYSIS_WORKERS", "many"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "ANALYSIS_WORKERS",
                value: "many".to_string()
            }
        );
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("ANALYSIS_QUEUE_CAPACITY", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ANALYSIS_QUEUE_CAPACITY", .. }));
    }
}
