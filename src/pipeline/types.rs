//! Shared types for the triage pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Raw message ─────────────────────────────────────────────────────

/// A message as handed over by the mailbox collaborator.
///
/// Every field is optional: sources omit headers, demo fixtures are partial,
/// and JSON payloads are not trusted. `Message::from_raw` is the only way in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// Display name plus address, e.g. `NPTEL <noreply@nptel.iitm.ac.in>`.
    #[serde(default)]
    pub sender: Option<String>,
    /// Raw "To" header.
    #[serde(default)]
    pub recipients: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A field the ingestion boundary expects on every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageField {
    Id,
    Subject,
    Sender,
    Recipients,
}

// ── Validated message ───────────────────────────────────────────────

/// Sender placeholder when the source omits the From header.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// A message after validation at the ingestion boundary.
///
/// `subject` and `sender` are always present. `recipients` stays optional so
/// the direct-recipient check can skip messages that never had a To header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub subject: String,
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<String>,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Expected fields the source did not provide.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<MessageField>,
}

impl Message {
    /// Validate a raw message, filling defaults for anything absent.
    pub fn from_raw(raw: RawMessage) -> Self {
        let mut missing_fields = Vec::new();

        let id = non_blank(raw.id).unwrap_or_else(|| {
            missing_fields.push(MessageField::Id);
            format!("msg-{}", Uuid::new_v4())
        });
        let subject = raw.subject.unwrap_or_else(|| {
            missing_fields.push(MessageField::Subject);
            String::new()
        });
        let sender = non_blank(raw.sender).unwrap_or_else(|| {
            missing_fields.push(MessageField::Sender);
            UNKNOWN_SENDER.to_string()
        });
        let recipients = raw.recipients;
        if recipients.is_none() {
            missing_fields.push(MessageField::Recipients);
        }

        Self {
            id,
            subject,
            sender,
            recipients,
            snippet: raw.snippet.unwrap_or_default(),
            body: raw.body.unwrap_or_default(),
            timestamp: raw.timestamp,
            missing_fields,
        }
    }

    /// True if the source left out any expected field.
    pub fn is_malformed(&self) -> bool {
        !self.missing_fields.is_empty()
    }

    /// Text used for classification: the body, or the snippet when the
    /// body is empty.
    pub fn content(&self) -> &str {
        if self.body.trim().is_empty() {
            &self.snippet
        } else {
            &self.body
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Pull the bare address out of a header value like `Name <addr@host>`.
///
/// Falls back to the whole trimmed value when it looks like an address.
pub fn extract_address(field: &str) -> Option<String> {
    let field = field.trim();
    if let (Some(start), Some(end)) = (field.rfind('<'), field.rfind('>'))
        && end > start + 1
    {
        let inner = field[start + 1..end].trim();
        if inner.contains('@') {
            return Some(inner.to_string());
        }
    }
    if field.contains('@') && !field.contains(char::is_whitespace) {
        return Some(field.to_string());
    }
    None
}

// ── Priority & category ─────────────────────────────────────────────

/// Triage urgency, ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Whether acknowledgment drafts may be created for this tier.
    pub fn is_draftable(&self) -> bool {
        *self >= Self::High
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Topical classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Academic,
    Security,
    Promotional,
    Personal,
    Work,
    General,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Academic => write!(f, "academic"),
            Self::Security => write!(f, "security"),
            Self::Promotional => write!(f, "promotional"),
            Self::Personal => write!(f, "personal"),
            Self::Work => write!(f, "work"),
            Self::General => write!(f, "general"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "academic" => Ok(Self::Academic),
            "security" => Ok(Self::Security),
            "promotional" => Ok(Self::Promotional),
            "personal" => Ok(Self::Personal),
            "work" => Ok(Self::Work),
            "general" => Ok(Self::General),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

// ── Classification ──────────────────────────────────────────────────

/// Which stage produced a classification. Observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    LanguageModel,
    Rules,
    Fallback,
}

/// Whether the language-model stage may run for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationMode {
    LmEnabled,
    RulesOnly,
}

/// Priority, category and justification for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub priority: Priority,
    pub category: Category,
    /// Always non-empty.
    pub reason: String,
    pub source: ClassificationSource,
}

impl Classification {
    pub fn new(
        priority: Priority,
        category: Category,
        reason: impl Into<String>,
        source: ClassificationSource,
    ) -> Self {
        Self {
            priority,
            category,
            reason: reason.into(),
            source,
        }
    }

    /// Safety-net result used when every other stage gave up.
    pub fn fallback() -> Self {
        Self::new(
            Priority::Medium,
            Category::General,
            "fallback classification",
            ClassificationSource::Fallback,
        )
    }

    pub fn is_llm_derived(&self) -> bool {
        self.source == ClassificationSource::LanguageModel
    }
}

// ── Enriched message ────────────────────────────────────────────────

/// A message plus its classification and display summary, shaped for
/// direct JSON serialization to a presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedMessage {
    #[serde(flatten)]
    pub message: Message,
    #[serde(flatten)]
    pub classification: Classification,
    pub display_summary: String,
}

impl EnrichedMessage {
    pub fn priority(&self) -> Priority {
        self.classification.priority
    }
}
