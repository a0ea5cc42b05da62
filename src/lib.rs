//! Mail Triage: email classification and summarization engine.

pub mod assistant;
pub mod config;
pub mod error;
pub mod llm;
pub mod mailbox;
pub mod pipeline;

pub use assistant::{Dashboard, TriageAssistant};
pub use config::TriageConfig;
pub use error::{Error, Result};
