//! In-process demo mailbox, used when no real provider is configured.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::MailboxError;
use crate::mailbox::{DraftRequest, Mailbox, MailboxQuery};
use crate::pipeline::types::RawMessage;

/// Mailbox backed by a fixed message list; drafts are kept in memory.
pub struct DemoMailbox {
    messages: Vec<RawMessage>,
    drafts: Mutex<Vec<(String, DraftRequest)>>,
}

impl DemoMailbox {
    pub fn new(messages: Vec<RawMessage>) -> Self {
        Self {
            messages,
            drafts: Mutex::new(Vec::new()),
        }
    }

    /// A mailbox seeded with representative demo messages addressed to
    /// `user_address`.
    pub fn seeded(user_address: &str) -> Self {
        Self::new(demo_messages(user_address))
    }

    /// Drafts created so far.
    pub async fn drafts(&self) -> Vec<DraftRequest> {
        self.drafts
            .lock()
            .await
            .iter()
            .map(|(_, d)| d.clone())
            .collect()
    }
}

#[async_trait]
impl Mailbox for DemoMailbox {
    fn name(&self) -> &str {
        "demo"
    }

    fn is_connected(&self) -> bool {
        false
    }

    async fn fetch_unread(&self, query: &MailboxQuery) -> Result<Vec<RawMessage>, MailboxError> {
        let window = ChronoDuration::from_std(query.window)
            .map_err(|e| MailboxError::FetchFailed(format!("invalid window: {e}")))?;
        let cutoff = Utc::now()
            .checked_sub_signed(window)
            .ok_or_else(|| MailboxError::FetchFailed("fetch window out of range".into()))?;

        let messages: Vec<RawMessage> = self
            .messages
            .iter()
            .filter(|m| m.timestamp.is_none_or(|ts| ts >= cutoff))
            .take(query.max_results)
            .cloned()
            .collect();

        debug!(count = messages.len(), "Demo mailbox fetch");
        Ok(messages)
    }

    async fn create_draft(&self, draft: &DraftRequest) -> Result<String, MailboxError> {
        let id = format!("draft-{}", Uuid::new_v4());
        self.drafts.lock().await.push((id.clone(), draft.clone()));
        info!(draft_id = %id, to = %draft.to, "Stored demo draft");
        Ok(id)
    }
}

fn demo_message(
    id: &str,
    subject: &str,
    sender: &str,
    to: &str,
    snippet: &str,
    body: &str,
    minutes_ago: i64,
) -> RawMessage {
    RawMessage {
        id: Some(id.to_string()),
        subject: Some(subject.to_string()),
        sender: Some(sender.to_string()),
        recipients: Some(to.to_string()),
        snippet: Some(snippet.to_string()),
        body: Some(body.to_string()),
        timestamp: Some(Utc::now() - ChronoDuration::minutes(minutes_ago)),
    }
}

/// Demo messages covering each triage outcome.
pub fn demo_messages(user_address: &str) -> Vec<RawMessage> {
    vec![
        demo_message(
            "demo_1",
            "July 2025 Exam Registration Deadline - Aug 22, 2025",
            "NPTEL <noreply@nptel.iitm.ac.in>",
            user_address,
            "Last 3 days to register for the exam",
            "This is a final reminder about the exam registration deadline.",
            15,
        ),
        demo_message(
            "demo_2",
            "Security Alert: New Login Detected",
            "Bank Alerts <noreply@bank.com>",
            user_address,
            "We noticed a new sign-in to your account from Chrome on Windows.",
            "",
            40,
        ),
        demo_message(
            "demo_3",
            "Course Materials Updated",
            "Academic Office <academic@university.edu>",
            user_address,
            "",
            "Slides for week 6 have been uploaded to the portal. Please review them before Thursday's lecture.\n\nThanks and Regards,\nAcademic Office",
            90,
        ),
        demo_message(
            "demo_4",
            "Newsletter: Urgent Deadline Reminder!",
            "Deals <newsletter@service.com>",
            "subscribers@service.com",
            "Only 24 hours left on our biggest sale. To unsubscribe click here.",
            "",
            180,
        ),
        demo_message(
            "demo_5",
            "Weekly Digest",
            "digest@example.com",
            user_address,
            "Top stories from your network this week.",
            "",
            300,
        ),
    ]
}
