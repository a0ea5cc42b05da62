//! Triage assistant: mailbox fetch, triage pass, dashboard and drafts.
//!
//! Nothing is cached between calls: every snapshot and every draft request
//! fetches and triages the mailbox again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TriageConfig;
use crate::error::{ConfigError, PipelineError};
use crate::llm::provider::LlmProvider;
use crate::mailbox::{Mailbox, MailboxQuery};
use crate::pipeline::drafts::{BulkDraftResult, MAX_BULK_DRAFTS, build_draft};
use crate::pipeline::processor::{TriageBatch, TriageProcessor};
use crate::pipeline::stats::{MailboxStats, is_direct};
use crate::pipeline::types::EnrichedMessage;

/// Everything a presentation layer needs for one dashboard render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub all_messages: Vec<EnrichedMessage>,
    pub direct_messages: Vec<EnrichedMessage>,
    pub stats: MailboxStats,
    pub mailbox_connected: bool,
    pub llm_available: bool,
    pub last_updated: DateTime<Utc>,
}

/// Ties a mailbox to the triage engine.
pub struct TriageAssistant {
    mailbox: Arc<dyn Mailbox>,
    processor: TriageProcessor,
    query: MailboxQuery,
}

impl TriageAssistant {
    pub fn new(
        config: &TriageConfig,
        mailbox: Arc<dyn Mailbox>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self, ConfigError> {
        let processor = TriageProcessor::new(config, llm)?;
        info!(
            mailbox = mailbox.name(),
            connected = mailbox.is_connected(),
            llm = processor.llm_available(),
            "Triage assistant ready"
        );
        Ok(Self {
            mailbox,
            processor,
            query: MailboxQuery {
                window: config.fetch_window,
                max_results: config.max_messages_per_batch,
            },
        })
    }

    /// Fetch and triage the mailbox.
    pub async fn triage(&self) -> Result<TriageBatch, PipelineError> {
        let raw = self.mailbox.fetch_unread(&self.query).await?;
        Ok(self.processor.process_batch(raw).await)
    }

    /// Build the dashboard. Fetch failures yield an empty dashboard.
    pub async fn snapshot(&self) -> Dashboard {
        let (batch, mailbox_connected) = match self.triage().await {
            Ok(batch) => (batch, self.mailbox.is_connected()),
            Err(e) => {
                warn!(mailbox = self.mailbox.name(), error = %e, "Mailbox fetch failed");
                (
                    TriageBatch {
                        messages: Vec::new(),
                        stats: MailboxStats::default(),
                        llm_calls: 0,
                    },
                    false,
                )
            }
        };

        let user_address = self.processor.user_address();
        let direct_messages = batch
            .messages
            .iter()
            .filter(|m| is_direct(&m.message, user_address) == Some(true))
            .cloned()
            .collect();

        Dashboard {
            all_messages: batch.messages,
            direct_messages,
            stats: batch.stats,
            mailbox_connected,
            llm_available: self.processor.llm_available(),
            last_updated: Utc::now(),
        }
    }

    /// Create an acknowledgment draft for one high-priority message.
    pub async fn create_draft(&self, message_id: &str) -> Result<String, PipelineError> {
        let batch = self.triage().await?;
        let message = find(&batch, message_id)?;
        self.draft_for(message).await
    }

    /// Create drafts for up to `MAX_BULK_DRAFTS` messages. Per-message
    /// failures are collected, not propagated.
    pub async fn create_drafts_bulk(&self, message_ids: &[String]) -> BulkDraftResult {
        let mut result = BulkDraftResult {
            total_requested: message_ids.len(),
            ..Default::default()
        };

        let batch = match self.triage().await {
            Ok(batch) => batch,
            Err(e) => {
                result.errors.push(e.to_string());
                return result;
            }
        };

        for id in message_ids.iter().take(MAX_BULK_DRAFTS) {
            let outcome = match find(&batch, id) {
                Ok(message) => self.draft_for(message).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(_) => result.created_count += 1,
                Err(e) => result.errors.push(e.to_string()),
            }
        }

        info!(
            created = result.created_count,
            requested = result.total_requested,
            "Bulk draft creation complete"
        );
        result
    }

    /// Ids of every high or critical message currently in the mailbox.
    pub async fn draftable_ids(&self) -> Result<Vec<String>, PipelineError> {
        let batch = self.triage().await?;
        Ok(batch
            .messages
            .iter()
            .filter(|m| m.priority().is_draftable())
            .map(|m| m.message.id.clone())
            .collect())
    }

    async fn draft_for(&self, message: &EnrichedMessage) -> Result<String, PipelineError> {
        let draft = build_draft(message)?;
        let draft_id = self.mailbox.create_draft(&draft).await?;
        info!(id = %message.message.id, draft_id = %draft_id, "Created acknowledgment draft");
        Ok(draft_id)
    }
}

fn find<'a>(batch: &'a TriageBatch, id: &str) -> Result<&'a EnrichedMessage, PipelineError> {
    batch
        .messages
        .iter()
        .find(|m| m.message.id == id)
        .ok_or_else(|| PipelineError::MessageNotFound { id: id.to_string() })
}
