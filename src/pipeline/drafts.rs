//! Acknowledgment drafts for high-priority mail.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::mailbox::DraftRequest;
use crate::pipeline::types::{EnrichedMessage, extract_address};

/// Most drafts created by one bulk request.
pub const MAX_BULK_DRAFTS: usize = 5;

/// Outcome of a bulk draft request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDraftResult {
    pub created_count: usize,
    pub total_requested: usize,
    pub errors: Vec<String>,
}

impl BulkDraftResult {
    pub fn success(&self) -> bool {
        self.created_count > 0
    }
}

/// `Re: <subject>`, without stacking prefixes.
pub fn reply_subject(subject: &str) -> String {
    let subject = subject.trim();
    if subject
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"))
    {
        subject.to_string()
    } else if subject.is_empty() {
        "Re: (no subject)".to_string()
    } else {
        format!("Re: {subject}")
    }
}

/// Greeting name: the display name when present, else the address local part.
fn greeting_name(sender: &str) -> Option<String> {
    let sender = sender.trim();
    if let Some(idx) = sender.find('<') {
        let name = sender[..idx].trim().trim_matches('"').trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    let address = extract_address(sender)?;
    let local = address.split('@').next()?;
    (!local.is_empty()).then(|| local.to_string())
}

/// Body of a short acknowledgment reply.
pub fn compose_acknowledgment(message: &EnrichedMessage) -> String {
    let greeting = match greeting_name(&message.message.sender) {
        Some(name) => format!("Hi {name},"),
        None => "Hello,".to_string(),
    };
    let topic = if message.message.subject.trim().is_empty() {
        "your message".to_string()
    } else {
        format!("\"{}\"", message.message.subject.trim())
    };

    format!(
        "{greeting}\n\n\
         Thank you for your email regarding {topic}. I have received it and \
         will review the details and get back to you as soon as possible.\n\n\
         Best regards"
    )
}

/// Build the draft for an enriched message.
///
/// Only high and critical messages with a resolvable sender address qualify.
pub fn build_draft(message: &EnrichedMessage) -> Result<DraftRequest, PipelineError> {
    let priority = message.priority();
    if !priority.is_draftable() {
        return Err(PipelineError::NotDraftable {
            id: message.message.id.clone(),
            priority: priority.to_string(),
        });
    }

    let to = extract_address(&message.message.sender).ok_or_else(|| {
        PipelineError::NoReplyAddress {
            id: message.message.id.clone(),
        }
    })?;

    Ok(DraftRequest {
        in_reply_to: message.message.id.clone(),
        to,
        subject: reply_subject(&message.message.subject),
        body: compose_acknowledgment(message),
    })
}
