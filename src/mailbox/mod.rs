//! Mailbox collaborator: fetching unread mail and persisting drafts.
//!
//! The triage engine only talks to this trait. Real providers (Gmail API,
//! IMAP) live outside this crate; `DemoMailbox` is the in-process stand-in.

pub mod demo;

pub use demo::DemoMailbox;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MailboxError;
use crate::pipeline::types::RawMessage;

/// Which unread messages to fetch.
#[derive(Debug, Clone, Copy)]
pub struct MailboxQuery {
    /// Only messages received within this window.
    pub window: Duration,
    /// Result cap.
    pub max_results: usize,
}

/// A reply draft to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRequest {
    /// Id of the message being replied to.
    pub in_reply_to: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Trait for mailbox providers: pure I/O, no triage logic.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &str;

    /// Whether the provider is connected to a real account.
    fn is_connected(&self) -> bool;

    /// Fetch unread messages matching the query.
    async fn fetch_unread(&self, query: &MailboxQuery) -> Result<Vec<RawMessage>, MailboxError>;

    /// Persist a draft reply, returning the provider's draft id.
    async fn create_draft(&self, draft: &DraftRequest) -> Result<String, MailboxError>;
}
