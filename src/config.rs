//! Configuration types.

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::pipeline::classifier::DEFAULT_LLM_TIMEOUT;
use crate::pipeline::rules::RulesConfig;
use crate::pipeline::summarizer::SummaryConfig;
use crate::pipeline::types::ClassificationMode;

/// Credentials shorter than this are treated as absent.
pub const MIN_CREDENTIAL_LEN: usize = 20;

/// Triage engine configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Whether the language-model classifier may be used at all.
    pub llm_enabled: bool,
    pub llm_credential: Option<SecretString>,
    pub llm_backend: LlmBackend,
    pub llm_model: String,
    /// Upper bound on a single classification call.
    pub llm_timeout: Duration,
    /// The user's own address, for the direct-recipient check.
    pub user_address: String,
    /// Messages beyond this are dropped from a pass.
    pub max_messages_per_batch: usize,
    /// Messages beyond this go straight to the rules engine.
    pub max_llm_calls_per_batch: usize,
    /// How far back to look for unread mail.
    pub fetch_window: Duration,
    pub rules: RulesConfig,
    pub summary: SummaryConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            llm_enabled: false,
            llm_credential: None,
            llm_backend: LlmBackend::OpenAi,
            llm_model: "gpt-4o-mini".to_string(),
            llm_timeout: DEFAULT_LLM_TIMEOUT,
            user_address: String::new(),
            max_messages_per_batch: 50,
            max_llm_calls_per_batch: 10,
            fetch_window: Duration::from_secs(24 * 3600), // 1 day
            rules: RulesConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

impl TriageConfig {
    /// Build config from environment variables, falling back to defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let llm_backend = match std::env::var("TRIAGE_LLM_BACKEND") {
            Ok(v) => LlmBackend::from_str(&v).map_err(|message| ConfigError::InvalidValue {
                key: "TRIAGE_LLM_BACKEND".into(),
                message,
            })?,
            Err(_) => defaults.llm_backend,
        };

        let provider_key_var = match llm_backend {
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
        };
        let llm_credential = std::env::var("TRIAGE_LLM_API_KEY")
            .or_else(|_| std::env::var(provider_key_var))
            .ok()
            .map(SecretString::from);

        let institutional_domains = std::env::var("TRIAGE_INSTITUTIONAL_DOMAINS")
            .ok()
            .map(|v| split_list(&v))
            .unwrap_or(defaults.rules.institutional_domains);

        Ok(Self {
            llm_enabled: env_flag("TRIAGE_LLM_ENABLED", llm_credential.is_some())?,
            llm_credential,
            llm_backend,
            llm_model: std::env::var("TRIAGE_LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_timeout: Duration::from_secs(env_parse(
                "TRIAGE_LLM_TIMEOUT_SECS",
                defaults.llm_timeout.as_secs(),
            )?),
            user_address: std::env::var("TRIAGE_USER_ADDRESS").unwrap_or_default(),
            max_messages_per_batch: env_parse(
                "TRIAGE_MAX_MESSAGES",
                defaults.max_messages_per_batch,
            )?,
            max_llm_calls_per_batch: env_parse(
                "TRIAGE_MAX_LLM_CALLS",
                defaults.max_llm_calls_per_batch,
            )?,
            fetch_window: hours_to_duration(
                "TRIAGE_FETCH_WINDOW_HOURS",
                env_parse("TRIAGE_FETCH_WINDOW_HOURS", defaults.fetch_window.as_secs() / 3600)?,
            )?,
            rules: RulesConfig {
                institutional_domains,
                ..defaults.rules
            },
            summary: SummaryConfig {
                max_chars: env_parse("TRIAGE_SUMMARY_MAX_CHARS", defaults.summary.max_chars)?,
                ..defaults.summary
            },
        })
    }

    /// Usable credential, if one is configured and long enough.
    pub fn valid_credential(&self) -> Option<&SecretString> {
        self.llm_credential
            .as_ref()
            .filter(|c| c.expose_secret().trim().len() >= MIN_CREDENTIAL_LEN)
    }

    /// Provider config when the LLM path is enabled and a valid credential
    /// exists; `None` selects the rules-only path.
    pub fn llm_config(&self) -> Option<LlmConfig> {
        if !self.llm_enabled {
            return None;
        }
        let credential = self.valid_credential()?;
        Some(LlmConfig {
            backend: self.llm_backend,
            api_key: SecretString::from(credential.expose_secret().trim().to_string()),
            model: self.llm_model.clone(),
        })
    }

    pub fn mode(&self) -> ClassificationMode {
        if self.llm_config().is_some() {
            ClassificationMode::LmEnabled
        } else {
            ClassificationMode::RulesOnly
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => parse_value(key, &v),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn hours_to_duration(key: &str, hours: u64) -> Result<Duration, ConfigError> {
    hours
        .checked_mul(3600)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{hours} hours is out of range"),
        })
}

fn env_flag(key: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Ok(v) => parse_flag(key, &v),
        Err(_) => Ok(default),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
