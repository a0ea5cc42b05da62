//! End-to-end tests for a triage pass over the demo mailbox.
//!
//! Each test builds a `TriageAssistant` around a `DemoMailbox` and, where
//! needed, a stub LLM provider (no real API calls).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;

use mail_triage::config::TriageConfig;
use mail_triage::error::LlmError;
use mail_triage::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};
use mail_triage::mailbox::DemoMailbox;
use mail_triage::pipeline::rules::{REASON_AUTOMATED_SECURITY, REASON_PROMOTIONAL};
use mail_triage::pipeline::summarizer::NO_PREVIEW;
use mail_triage::pipeline::types::{
    Category, ClassificationSource, EnrichedMessage, Priority, RawMessage,
};
use mail_triage::{Dashboard, TriageAssistant};

const ME: &str = "student@campus.edu";
const VALID_KEY: &str = "sk-test-0123456789abcdefghij";

/// Stub provider answering with a fixed body.
struct StubLlm {
    reply: Result<&'static str, ()>,
    calls: AtomicUsize,
}

impl StubLlm {
    fn replying(reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Ok(content) => Ok(CompletionResponse {
                content: content.to_string(),
            }),
            Err(()) => Err(LlmError::RequestFailed {
                provider: "stub".to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

fn rules_only_config() -> TriageConfig {
    TriageConfig {
        user_address: ME.to_string(),
        ..Default::default()
    }
}

fn llm_config() -> TriageConfig {
    TriageConfig {
        llm_enabled: true,
        llm_credential: Some(SecretString::from(VALID_KEY)),
        llm_timeout: Duration::from_secs(2),
        ..rules_only_config()
    }
}

fn by_id<'a>(dashboard: &'a Dashboard, id: &str) -> &'a EnrichedMessage {
    dashboard
        .all_messages
        .iter()
        .find(|m| m.message.id == id)
        .unwrap_or_else(|| panic!("message {id} missing from dashboard"))
}

#[tokio::test]
async fn rules_only_pass_over_demo_mailbox() {
    let mailbox = Arc::new(DemoMailbox::seeded(ME));
    let assistant = TriageAssistant::new(&rules_only_config(), mailbox, None).unwrap();
    let dashboard = assistant.snapshot().await;

    let nptel = by_id(&dashboard, "demo_1");
    assert_eq!(nptel.priority(), Priority::High);
    assert_eq!(nptel.classification.category, Category::Academic);
    assert!(nptel.display_summary.starts_with("⏰ Deadline notice: "));

    let bank = by_id(&dashboard, "demo_2");
    assert_eq!(bank.priority(), Priority::High);
    assert_eq!(bank.classification.category, Category::Security);
    assert_eq!(bank.classification.reason, REASON_AUTOMATED_SECURITY);

    let course = by_id(&dashboard, "demo_3");
    assert_eq!(course.priority(), Priority::Medium);
    assert_eq!(course.classification.category, Category::Academic);
    assert!(!course.display_summary.contains("Regards"));

    let newsletter = by_id(&dashboard, "demo_4");
    assert_eq!(newsletter.priority(), Priority::Low);
    assert_eq!(newsletter.classification.reason, REASON_PROMOTIONAL);

    let digest = by_id(&dashboard, "demo_5");
    assert_eq!(digest.priority(), Priority::Low);
    assert_eq!(digest.classification.category, Category::General);

    assert!(
        dashboard
            .all_messages
            .iter()
            .all(|m| m.classification.source == ClassificationSource::Rules)
    );
    assert_eq!(dashboard.stats.total, 5);
    assert_eq!(dashboard.stats.high, 2);
    assert_eq!(dashboard.stats.medium, 1);
    assert_eq!(dashboard.stats.low, 2);
    assert_eq!(dashboard.stats.direct, 4);
    assert!(!dashboard.llm_available);
}

#[tokio::test]
async fn llm_classification_used_when_available() {
    let llm = StubLlm::replying(
        r#"Sure: {"priority": "critical", "category": "work", "reason": "needs a reply today"}"#,
    );
    let provider: Arc<dyn LlmProvider> = llm.clone();
    let mailbox = Arc::new(DemoMailbox::seeded(ME));
    let assistant = TriageAssistant::new(&llm_config(), mailbox, Some(provider)).unwrap();

    let dashboard = assistant.snapshot().await;
    assert!(dashboard.llm_available);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 5);
    assert!(dashboard.all_messages.iter().all(|m| {
        m.classification.source == ClassificationSource::LanguageModel
            && m.priority() == Priority::Critical
            && m.classification.category == Category::Work
    }));
    assert_eq!(dashboard.stats.high, 5);
}

#[tokio::test]
async fn failing_llm_falls_back_to_rules() {
    let llm = StubLlm::failing();
    let provider: Arc<dyn LlmProvider> = llm.clone();
    let mailbox = Arc::new(DemoMailbox::seeded(ME));
    let assistant = TriageAssistant::new(&llm_config(), mailbox, Some(provider)).unwrap();

    let dashboard = assistant.snapshot().await;
    assert_eq!(llm.calls.load(Ordering::SeqCst), 5);
    assert_eq!(dashboard.all_messages.len(), 5);
    assert!(
        dashboard
            .all_messages
            .iter()
            .all(|m| m.classification.source == ClassificationSource::Rules)
    );
    assert_eq!(by_id(&dashboard, "demo_1").priority(), Priority::High);
    assert_eq!(by_id(&dashboard, "demo_4").priority(), Priority::Low);
}

#[tokio::test]
async fn unparseable_llm_reply_falls_back_to_rules() {
    let llm = StubLlm::replying(r#"{"priority": "whenever", "category": "misc"}"#);
    let provider: Arc<dyn LlmProvider> = llm.clone();
    let mailbox = Arc::new(DemoMailbox::seeded(ME));
    let assistant = TriageAssistant::new(&llm_config(), mailbox, Some(provider)).unwrap();

    let dashboard = assistant.snapshot().await;
    assert!(
        dashboard
            .all_messages
            .iter()
            .all(|m| m.classification.source == ClassificationSource::Rules)
    );
}

#[tokio::test]
async fn short_credential_selects_rules_only() {
    let llm = StubLlm::replying(r#"{"priority": "critical", "category": "work", "reason": "x"}"#);
    let provider: Arc<dyn LlmProvider> = llm.clone();
    let config = TriageConfig {
        llm_credential: Some(SecretString::from("sk-short")),
        ..llm_config()
    };
    let mailbox = Arc::new(DemoMailbox::seeded(ME));
    let assistant = TriageAssistant::new(&config, mailbox, Some(provider)).unwrap();

    let dashboard = assistant.snapshot().await;
    assert!(!dashboard.llm_available);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn llm_budget_applies_across_the_batch() {
    let llm = StubLlm::replying(r#"{"priority": "low", "category": "general", "reason": "x"}"#);
    let provider: Arc<dyn LlmProvider> = llm.clone();
    let config = TriageConfig {
        max_llm_calls_per_batch: 2,
        ..llm_config()
    };
    let mailbox = Arc::new(DemoMailbox::seeded(ME));
    let assistant = TriageAssistant::new(&config, mailbox, Some(provider)).unwrap();

    let dashboard = assistant.snapshot().await;
    assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    let llm_derived = dashboard
        .all_messages
        .iter()
        .filter(|m| m.classification.is_llm_derived())
        .count();
    assert_eq!(llm_derived, 2);
}

#[tokio::test]
async fn malformed_messages_do_not_break_the_pass() {
    let messages = vec![
        RawMessage {
            id: Some("no-recipients".into()),
            subject: Some("Interview tomorrow".into()),
            sender: Some("hr@company.com".into()),
            snippet: Some("Please confirm your slot.".into()),
            ..Default::default()
        },
        RawMessage::default(),
        RawMessage {
            id: Some("complete".into()),
            subject: Some("Hello".into()),
            sender: Some("friend@example.com".into()),
            recipients: Some(ME.into()),
            ..Default::default()
        },
    ];
    let mailbox = Arc::new(DemoMailbox::new(messages));
    let assistant = TriageAssistant::new(&rules_only_config(), mailbox, None).unwrap();

    let dashboard = assistant.snapshot().await;
    assert_eq!(dashboard.stats.total, 3);
    assert_eq!(dashboard.stats.malformed, 2);
    assert_eq!(dashboard.stats.direct, 1);
    assert_eq!(dashboard.direct_messages.len(), 1);

    let interview = by_id(&dashboard, "no-recipients");
    assert_eq!(interview.priority(), Priority::High);

    let empty = dashboard
        .all_messages
        .iter()
        .find(|m| m.message.id.starts_with("msg-"))
        .unwrap();
    assert_eq!(empty.message.sender, "Unknown");
    assert_eq!(empty.display_summary, NO_PREVIEW);
}

#[tokio::test]
async fn drafts_only_for_high_priority() {
    let mailbox = Arc::new(DemoMailbox::seeded(ME));
    let assistant = TriageAssistant::new(&rules_only_config(), mailbox.clone(), None).unwrap();

    let ids = assistant.draftable_ids().await.unwrap();
    let result = assistant.create_drafts_bulk(&ids).await;
    assert_eq!(result.created_count, 2);
    assert!(result.errors.is_empty());

    let drafts = mailbox.drafts().await;
    let recipients: Vec<&str> = drafts.iter().map(|d| d.to.as_str()).collect();
    assert_eq!(recipients, vec!["noreply@nptel.iitm.ac.in", "noreply@bank.com"]);
    assert!(drafts.iter().all(|d| d.subject.starts_with("Re: ")));

    assert!(assistant.create_draft("demo_4").await.is_err());
    assert_eq!(mailbox.drafts().await.len(), 2);
}

#[tokio::test]
async fn dashboard_serializes_flat_message_records() {
    let mailbox = Arc::new(DemoMailbox::seeded(ME));
    let assistant = TriageAssistant::new(&rules_only_config(), mailbox, None).unwrap();
    let dashboard = assistant.snapshot().await;

    let json: Value = serde_json::to_value(&dashboard).unwrap();
    let first = &json["all_messages"][0];
    assert_eq!(first["id"], "demo_1");
    assert_eq!(first["priority"], "high");
    assert_eq!(first["category"], "academic");
    assert!(first["display_summary"].is_string());
    assert_eq!(json["stats"]["total"], 5);
    assert_eq!(json["mailbox_connected"], false);
}
