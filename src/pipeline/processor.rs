//! Batch processor: classifies, summarizes and aggregates a fetched batch.
//!
//! Flow per message:
//! 1. `Message::from_raw`: validation with defaults, never fails
//! 2. `Classifier::classify`: LLM while the per-batch budget lasts, rules after
//! 3. `Summarizer::summarize`: display text, independent of classification
//!
//! Messages are processed sequentially and independently; the batch output
//! always has one enriched record per input message.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TriageConfig;
use crate::error::ConfigError;
use crate::llm::provider::LlmProvider;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::rules::RulesEngine;
use crate::pipeline::stats::MailboxStats;
use crate::pipeline::summarizer::Summarizer;
use crate::pipeline::types::{ClassificationMode, EnrichedMessage, Message, RawMessage};

/// Output of one pass over a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageBatch {
    pub messages: Vec<EnrichedMessage>,
    pub stats: MailboxStats,
    /// How many messages went through the language model.
    pub llm_calls: usize,
}

/// Runs the classification and summarization engine over message batches.
pub struct TriageProcessor {
    classifier: Classifier,
    summarizer: Summarizer,
    mode: ClassificationMode,
    user_address: String,
    max_messages_per_batch: usize,
    max_llm_calls_per_batch: usize,
}

impl TriageProcessor {
    /// Build a processor. The LLM path is only used when the config enables
    /// it and a provider is supplied.
    pub fn new(
        config: &TriageConfig,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self, ConfigError> {
        let rules = RulesEngine::new(&config.rules)?;
        let llm = llm.filter(|_| config.mode() == ClassificationMode::LmEnabled);
        let mode = if llm.is_some() {
            ClassificationMode::LmEnabled
        } else {
            ClassificationMode::RulesOnly
        };

        Ok(Self {
            classifier: Classifier::new(rules, llm, config.llm_timeout),
            summarizer: Summarizer::new(&config.summary),
            mode,
            user_address: config.user_address.clone(),
            max_messages_per_batch: config.max_messages_per_batch,
            max_llm_calls_per_batch: config.max_llm_calls_per_batch,
        })
    }

    pub fn mode(&self) -> ClassificationMode {
        self.mode
    }

    pub fn llm_available(&self) -> bool {
        self.classifier.llm_available()
    }

    pub fn user_address(&self) -> &str {
        &self.user_address
    }

    /// Classify and summarize a single message.
    pub async fn enrich(&self, message: Message, mode: ClassificationMode) -> EnrichedMessage {
        let classification = self
            .classifier
            .classify(&message.subject, message.content(), &message.sender, mode)
            .await;
        let display_summary =
            self.summarizer
                .summarize(&message.subject, &message.snippet, &message.body);

        debug!(
            id = %message.id,
            priority = %classification.priority,
            category = %classification.category,
            source = ?classification.source,
            "Message classified"
        );

        EnrichedMessage {
            message,
            classification,
            display_summary,
        }
    }

    /// Process a batch: validate, enrich, aggregate.
    ///
    /// Once `max_llm_calls_per_batch` messages have gone through the LLM,
    /// the rest of the batch uses the rules engine directly.
    pub async fn process_batch(&self, raw: Vec<RawMessage>) -> TriageBatch {
        let received = raw.len();
        if received > self.max_messages_per_batch {
            info!(
                received,
                max = self.max_messages_per_batch,
                "Batch exceeds cap, dropping overflow"
            );
        }

        let mut llm_calls = 0;
        let mut messages = Vec::with_capacity(received.min(self.max_messages_per_batch));

        for raw_message in raw.into_iter().take(self.max_messages_per_batch) {
            let message = Message::from_raw(raw_message);

            let mode = if self.mode == ClassificationMode::LmEnabled
                && llm_calls < self.max_llm_calls_per_batch
            {
                llm_calls += 1;
                ClassificationMode::LmEnabled
            } else {
                ClassificationMode::RulesOnly
            };

            messages.push(self.enrich(message, mode).await);
        }

        let stats = MailboxStats::compute(&messages, &self.user_address);
        info!(
            total = stats.total,
            high = stats.high,
            medium = stats.medium,
            low = stats.low,
            llm_calls,
            "Batch triage complete"
        );

        TriageBatch {
            messages,
            stats,
            llm_calls,
        }
    }
}
