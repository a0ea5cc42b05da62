//! Message triage pipeline.
//!
//! Every fetched message flows through:
//! 1. `Message::from_raw()`: field validation with safe defaults
//! 2. `Classifier::classify()`: LLM stage, then `RulesEngine::evaluate()`, then a fixed fallback
//! 3. `Summarizer::summarize()`: short display text
//! 4. `MailboxStats::compute()`: dashboard counts over the whole batch
//!
//! **No auto-send path exists.** Acknowledgments are only ever saved as drafts.

pub mod classifier;
pub mod drafts;
pub mod processor;
pub mod rules;
pub mod stats;
pub mod summarizer;
pub mod types;
