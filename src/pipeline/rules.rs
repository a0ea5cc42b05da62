//! Deterministic keyword rules engine.
//!
//! The authoritative classification path, always available. Evaluation order:
//! 1. Promotional/automated markers in sender or subject → LOW, promotional
//! 2. ...unless a security keyword is also present → HIGH, security
//! 3. Critical keywords (life-safety, active breach) → CRITICAL
//! 4. Deadline/time-pressure keywords, subject before content → HIGH
//! 5. Announcement keywords or institutional sender → MEDIUM
//! 6. Otherwise → LOW, "default classification"
//!
//! Category is decided separately once priority is fixed.
//!
//! Institutional senders whose subject carries a deadline keyword are not
//! demoted by step 1 (e.g. a `noreply@` exam-registration notice from a
//! university domain stays HIGH).

use regex::Regex;
use tracing::debug;

use crate::error::ConfigError;
use crate::pipeline::types::{
    Category, Classification, ClassificationSource, Priority, extract_address,
};

pub const REASON_PROMOTIONAL: &str = "promotional/automated email";
pub const REASON_AUTOMATED_SECURITY: &str = "security alert from automated system";
pub const REASON_DEFAULT: &str = "default classification";

/// Keyword lists driving the rules engine. All matching is case-insensitive
/// substring matching.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub promotional_markers: Vec<String>,
    pub security_keywords: Vec<String>,
    pub critical_keywords: Vec<String>,
    pub high_keywords: Vec<String>,
    pub medium_keywords: Vec<String>,
    /// Substrings of the sender's domain that mark an institution.
    pub institutional_domains: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            promotional_markers: strings(&[
                "noreply",
                "no-reply",
                "no_reply",
                "donotreply",
                "unsubscribe",
                "newsletter",
                "marketing",
                "automated",
                "promotion",
                "support@",
                "hello@",
            ]),
            security_keywords: strings(&[
                "security alert",
                "login attempt",
                "new login",
                "sign-in attempt",
                "password reset",
                "breach",
                "suspicious activity",
                "unauthorized access",
            ]),
            critical_keywords: strings(&[
                "emergency",
                "life threatening",
                "life-threatening",
                "security breach",
                "immediate danger",
            ]),
            high_keywords: strings(&[
                "deadline",
                "due today",
                "due tomorrow",
                "last day to",
                "interview",
                "meeting invitation",
                "urgent",
                "action required",
            ]),
            medium_keywords: strings(&[
                "announcement",
                "course update",
                "lecture",
                "workshop",
                "seminar",
                "reminder",
            ]),
            institutional_domains: strings(&[
                ".edu",
                ".ac.in",
                ".ac.uk",
                "university",
                "college",
                "nptel",
            ]),
        }
    }
}

/// A compiled, case-insensitive alternation over literal keywords.
#[derive(Debug, Clone)]
struct KeywordMatcher {
    regex: Option<Regex>,
}

impl KeywordMatcher {
    fn new(keywords: &[String]) -> Result<Self, regex::Error> {
        let escaped: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        if escaped.is_empty() {
            return Ok(Self { regex: None });
        }
        let regex = Regex::new(&format!("(?i)(?:{})", escaped.join("|")))?;
        Ok(Self { regex: Some(regex) })
    }

    /// First matching keyword, lowercased.
    fn find(&self, text: &str) -> Option<String> {
        self.regex
            .as_ref()
            .and_then(|r| r.find(text))
            .map(|m| m.as_str().to_lowercase())
    }

    fn find_any(&self, texts: &[&str]) -> Option<String> {
        texts.iter().find_map(|t| self.find(t))
    }
}

/// Rules-based classifier.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    promotional: KeywordMatcher,
    security: KeywordMatcher,
    critical: KeywordMatcher,
    high: KeywordMatcher,
    medium: KeywordMatcher,
    institutional_domains: Vec<String>,
}

/// Signals computed once per message and shared by the priority and
/// category decisions.
struct Signals {
    promotional: Option<String>,
    security: Option<String>,
    institutional: bool,
}

impl RulesEngine {
    pub fn new(config: &RulesConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            promotional: KeywordMatcher::new(&config.promotional_markers)?,
            security: KeywordMatcher::new(&config.security_keywords)?,
            critical: KeywordMatcher::new(&config.critical_keywords)?,
            high: KeywordMatcher::new(&config.high_keywords)?,
            medium: KeywordMatcher::new(&config.medium_keywords)?,
            institutional_domains: config
                .institutional_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        })
    }

    /// Classify a message. Pure: identical input always yields identical
    /// output.
    pub fn evaluate(&self, subject: &str, body: &str, sender: &str) -> Classification {
        let signals = Signals {
            promotional: self.promotional.find_any(&[sender, subject]),
            security: self.security.find_any(&[subject, body]),
            institutional: self.is_institutional(sender),
        };
        let high_in_subject = self.high.find(subject);

        if let Some(ref marker) = signals.promotional {
            if signals.security.is_some() {
                debug!(sender, marker = %marker, "Automated sender with security keyword");
                return Classification::new(
                    Priority::High,
                    Category::Security,
                    REASON_AUTOMATED_SECURITY,
                    ClassificationSource::Rules,
                );
            }
            if !(signals.institutional && high_in_subject.is_some()) {
                debug!(sender, marker = %marker, "Promotional marker matched");
                return Classification::new(
                    Priority::Low,
                    Category::Promotional,
                    REASON_PROMOTIONAL,
                    ClassificationSource::Rules,
                );
            }
            debug!(sender, "Institutional deadline notice exempt from promotional demotion");
        }

        let (priority, reason) = if let Some(kw) = self.critical.find_any(&[subject, body]) {
            (Priority::Critical, format!("critical keyword detected: {kw}"))
        } else if let Some(kw) = high_in_subject {
            (
                Priority::High,
                format!("deadline/important keyword in subject: {kw}"),
            )
        } else if let Some(kw) = self.high.find(body) {
            (
                Priority::High,
                format!("deadline/important keyword in content: {kw}"),
            )
        } else if let Some(kw) = self.medium.find_any(&[subject, body]) {
            (Priority::Medium, format!("announcement keyword: {kw}"))
        } else if signals.institutional {
            (
                Priority::Medium,
                "message from institutional domain".to_string(),
            )
        } else {
            (Priority::Low, REASON_DEFAULT.to_string())
        };

        Classification::new(
            priority,
            categorize(&signals),
            reason,
            ClassificationSource::Rules,
        )
    }

    /// Whether the sender's domain contains an institutional marker.
    pub fn is_institutional(&self, sender: &str) -> bool {
        let Some(address) = extract_address(sender) else {
            return false;
        };
        let Some((_, domain)) = address.rsplit_once('@') else {
            return false;
        };
        let domain = domain.to_lowercase();
        self.institutional_domains
            .iter()
            .any(|marker| domain.contains(marker.as_str()))
    }
}

/// Category for messages that passed the promotional check. Promotional
/// mail has already returned with `Category::Promotional`.
fn categorize(signals: &Signals) -> Category {
    if signals.institutional {
        Category::Academic
    } else if signals.security.is_some() {
        Category::Security
    } else {
        Category::General
    }
}
