use std::sync::Arc;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use mail_triage::TriageAssistant;
use mail_triage::config::TriageConfig;
use mail_triage::llm::{LlmProvider, create_provider};
use mail_triage::mailbox::DemoMailbox;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing();

    let config = TriageConfig::from_env()?;

    eprintln!("📬 Mail Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Mode: {:?}", config.mode());
    eprintln!(
        "   Batch: {} messages, {} LLM calls",
        config.max_messages_per_batch, config.max_llm_calls_per_batch
    );

    // ── LLM (optional) ───────────────────────────────────────────────────
    let llm: Option<Arc<dyn LlmProvider>> = match config.llm_config() {
        Some(llm_config) => match create_provider(&llm_config) {
            Ok(provider) => {
                eprintln!("   Model: {}", provider.model_name());
                Some(provider)
            }
            Err(e) => {
                tracing::warn!(error = %e, "LLM provider unavailable, using rules only");
                None
            }
        },
        None => {
            if config.llm_enabled {
                tracing::warn!("LLM enabled but no usable credential, using rules only");
            }
            None
        }
    };

    // ── Mailbox ──────────────────────────────────────────────────────────
    let mailbox = Arc::new(DemoMailbox::seeded(&config.user_address));
    eprintln!("   Mailbox: demo\n");

    let assistant = TriageAssistant::new(&config, mailbox, llm)?;

    let dashboard = assistant.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    if std::env::var("TRIAGE_CREATE_DRAFTS").is_ok_and(|v| v == "1") {
        let ids = assistant.draftable_ids().await?;
        let result = assistant.create_drafts_bulk(&ids).await;
        eprintln!(
            "\n   Drafts: {} of {} created",
            result.created_count, result.total_requested
        );
        for error in &result.errors {
            eprintln!("   Draft error: {}", error);
        }
    }

    Ok(())
}

/// Console logging, plus a daily rolling file when `TRIAGE_LOG_DIR` is set.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match std::env::var("TRIAGE_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mail-triage.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}
