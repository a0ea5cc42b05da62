//! Mailbox statistics, recomputed from the enriched list on every pass.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pipeline::types::{EnrichedMessage, Message, MessageField, Priority};

/// Counts shown on the dashboard header.
///
/// `high` includes critical messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxStats {
    pub total: usize,
    pub direct: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Messages that arrived with missing expected fields.
    pub malformed: usize,
}

impl MailboxStats {
    /// Aggregate a batch.
    ///
    /// A message missing a field is only left out of the count that needs
    /// that field; it never aborts the aggregation or shrinks `total`.
    pub fn compute(messages: &[EnrichedMessage], user_address: &str) -> Self {
        let mut stats = Self::default();

        for enriched in messages {
            stats.total += 1;

            if enriched.message.is_malformed() {
                stats.malformed += 1;
                debug!(
                    id = %enriched.message.id,
                    missing = ?enriched.message.missing_fields,
                    "Malformed message in aggregation"
                );
            }

            match is_direct(&enriched.message, user_address) {
                Some(true) => stats.direct += 1,
                Some(false) => {}
                None => debug!(
                    id = %enriched.message.id,
                    field = ?MessageField::Recipients,
                    "Skipping direct-recipient check"
                ),
            }

            match enriched.priority() {
                Priority::Critical | Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
            }
        }

        stats
    }
}

/// Whether the user's address appears in the raw recipient field.
///
/// Case-insensitive substring containment on the header text, not parsed
/// addresses. `None` when the message has no recipient field or no user
/// address is configured.
pub fn is_direct(message: &Message, user_address: &str) -> Option<bool> {
    let user_address = user_address.trim();
    if user_address.is_empty() {
        return None;
    }
    let recipients = message.recipients.as_deref()?;
    Some(
        recipients
            .to_lowercase()
            .contains(&user_address.to_lowercase()),
    )
}
