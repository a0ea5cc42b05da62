//! Error types for mail triage.

use std::time::Duration;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid keyword pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Language-model backend errors.
///
/// Every variant is recovered inside the classifier by falling back to the
/// rules engine; none of them reach the caller of a triage pass.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("No usable credential configured for provider {provider}")]
    MissingCredential { provider: String },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mailbox collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Draft creation failed: {0}")]
    DraftFailed(String),
}

/// Pipeline-related errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Message {id} not found")]
    MessageNotFound { id: String },

    #[error("Message {id} is {priority}, drafts are only created for high priority mail")]
    NotDraftable { id: String, priority: String },

    #[error("No reply address for message {id}")]
    NoReplyAddress { id: String },

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
