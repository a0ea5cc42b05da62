//! Message classifier: language model first, rules engine as fallback.
//!
//! Stages run in order until one produces a result:
//! 1. LLM classification (only in `LmEnabled` mode with a provider configured)
//! 2. Rules engine
//! 3. Fixed fallback (`medium` / `general`)
//!
//! `classify` never fails. Backend errors and panics in either stage are
//! logged and the next stage runs; no retries are attempted.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::rules::RulesEngine;
use crate::pipeline::types::{
    Category, Classification, ClassificationMode, ClassificationSource, Priority,
};

/// Characters of body text included in the classification prompt.
const BODY_EXCERPT_CHARS: usize = 400;

/// Max tokens for the classification call (runs on every message).
const CLASSIFY_MAX_TOKENS: u32 = 200;

/// Temperature for classification (deterministic-ish).
const CLASSIFY_TEMPERATURE: f32 = 0.1;

/// Default upper bound on a single LLM call.
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one stage in the classification chain.
#[derive(Debug)]
pub enum StageOutcome {
    Done(Classification),
    /// This stage could not decide; the reason is logged.
    TryNext(String),
}

impl From<Result<Classification, LlmError>> for StageOutcome {
    fn from(result: Result<Classification, LlmError>) -> Self {
        match result {
            Ok(c) => Self::Done(c),
            Err(e) => Self::TryNext(e.to_string()),
        }
    }
}

/// Assigns priority, category and reason to messages.
pub struct Classifier {
    rules: RulesEngine,
    llm: Option<Arc<dyn LlmProvider>>,
    llm_timeout: Duration,
}

impl Classifier {
    pub fn new(rules: RulesEngine, llm: Option<Arc<dyn LlmProvider>>, llm_timeout: Duration) -> Self {
        Self {
            rules,
            llm,
            llm_timeout,
        }
    }

    /// A classifier with no language model; every call uses the rules.
    pub fn rules_only(rules: RulesEngine) -> Self {
        Self::new(rules, None, DEFAULT_LLM_TIMEOUT)
    }

    pub fn llm_available(&self) -> bool {
        self.llm.is_some()
    }

    /// Classify one message. Total: every input yields a valid result.
    pub async fn classify(
        &self,
        subject: &str,
        body: &str,
        sender: &str,
        mode: ClassificationMode,
    ) -> Classification {
        if mode == ClassificationMode::LmEnabled {
            match self.llm_stage(subject, body, sender).await {
                StageOutcome::Done(c) => return c,
                StageOutcome::TryNext(reason) => {
                    warn!(sender, reason = %reason, "LLM classification unavailable, using rules");
                }
            }
        }

        match self.rules_stage(subject, body, sender) {
            StageOutcome::Done(c) => c,
            StageOutcome::TryNext(reason) => {
                error!(sender, reason = %reason, "Rules engine failed, using fallback classification");
                Classification::fallback()
            }
        }
    }

    async fn llm_stage(&self, subject: &str, body: &str, sender: &str) -> StageOutcome {
        let Some(llm) = self.llm.as_ref() else {
            return StageOutcome::TryNext("no language model configured".into());
        };
        match AssertUnwindSafe(self.classify_with_llm(llm.as_ref(), subject, body, sender))
            .catch_unwind()
            .await
        {
            Ok(result) => result.into(),
            Err(_) => StageOutcome::TryNext("language model stage panicked".into()),
        }
    }

    fn rules_stage(&self, subject: &str, body: &str, sender: &str) -> StageOutcome {
        match catch_unwind(AssertUnwindSafe(|| self.rules.evaluate(subject, body, sender))) {
            Ok(c) => StageOutcome::Done(c),
            Err(_) => StageOutcome::TryNext("rules engine panicked".into()),
        }
    }

    /// One bounded LLM call, parsed into a classification.
    async fn classify_with_llm(
        &self,
        llm: &dyn LlmProvider,
        subject: &str,
        body: &str,
        sender: &str,
    ) -> Result<Classification, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_classify_system_prompt()),
            ChatMessage::user(build_classify_user_prompt(subject, body, sender)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = tokio::time::timeout(self.llm_timeout, llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: llm.model_name().to_string(),
                timeout: self.llm_timeout,
            })??;

        let classification =
            parse_classification_response(&response.content).map_err(|reason| {
                LlmError::InvalidResponse {
                    provider: llm.model_name().to_string(),
                    reason,
                }
            })?;

        debug!(
            sender,
            priority = %classification.priority,
            category = %classification.category,
            "LLM classification"
        );
        Ok(classification)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the classification system prompt.
fn build_classify_system_prompt() -> String {
    "You are an email triage engine. Assign a priority and a category to the email.\n\n\
     Priorities (lowest to highest): \"low\", \"medium\", \"high\", \"critical\".\n\
     Categories: \"academic\", \"security\", \"promotional\", \"personal\", \"work\", \"general\".\n\n\
     Rules:\n\
     - Newsletters, marketing and automated no-reply mail are ALWAYS \"low\" / \"promotional\", \
       even if they mention deadlines, reminders or urgency.\n\
     - The one exception: automated security alerts (login attempts, password resets, \
       suspicious activity) are \"high\" / \"security\".\n\
     - \"critical\" is reserved for emergencies, life-safety issues and active security breaches.\n\
     - Real deadlines, interviews and meeting invitations are \"high\".\n\
     - Announcements, lectures, workshops and course updates are \"medium\".\n\
     - Give a one-sentence reason.\n\n\
     Respond with ONLY a JSON object:\n\
     {\"priority\": \"...\", \"category\": \"...\", \"reason\": \"...\"}"
        .to_string()
}

/// Build the user prompt: sender, subject and a truncated body excerpt.
fn build_classify_user_prompt(subject: &str, body: &str, sender: &str) -> String {
    let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
    format!("From: {sender}\nSubject: {subject}\n\nBody:\n{excerpt}")
}

// ── Response parsing ────────────────────────────────────────────────

/// LLM classification response structure.
#[derive(Debug, serde::Deserialize)]
struct ClassifyResponse {
    priority: String,
    category: String,
    #[serde(default)]
    reason: String,
}

/// Parse the LLM response. Values outside the known enums are rejected.
fn parse_classification_response(raw: &str) -> Result<Classification, String> {
    let json_str = extract_json_object(raw);
    let response: ClassifyResponse =
        serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))?;

    let priority: Priority = response.priority.parse()?;
    let category: Category = response.category.parse()?;
    let reason = if response.reason.trim().is_empty() {
        "classified by language model".to_string()
    } else {
        response.reason.trim().to_string()
    };

    Ok(Classification::new(
        priority,
        category,
        reason,
        ClassificationSource::LanguageModel,
    ))
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
