//! Display summaries: short, context-tagged previews for the message list.
//!
//! Pure string processing, no LLM calls, never fails.

/// Shown when a message has neither snippet nor body text.
pub const NO_PREVIEW: &str = "No preview available";

const ELLIPSIS: &str = "...";

/// Footers and sign-offs; text from the first occurrence onward is dropped.
const BOILERPLATE_MARKERS: &[&str] = &[
    "thanks and regards",
    "thanks & regards",
    "best regards",
    "kind regards",
    "warm regards",
    "you received this message",
    "you are receiving this",
    "to unsubscribe",
    "sent from my iphone",
];

/// Subject vocabulary → label prefix. First match wins.
const LABELS: &[(&[&str], &str)] = &[
    (
        &["deadline", "due today", "due tomorrow", "last day", "last date"],
        "⏰ Deadline notice: ",
    ),
    (
        &["meeting", "invitation", "invite", "appointment", "calendar"],
        "📅 Meeting invitation: ",
    ),
    (
        &["security", "password", "login", "sign-in", "suspicious", "verify your account"],
        "🔒 Security notification: ",
    ),
    (
        &["job", "opportunity", "internship", "hiring", "career", "placement", "position"],
        "💼 Career opportunity: ",
    ),
];

/// Summarizer settings.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Maximum characters of preview text, not counting the label.
    pub max_chars: usize,
    /// A sentence boundary before this many characters is not used as a cut.
    pub min_sentence_chars: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_chars: 80,
            min_sentence_chars: 20,
        }
    }
}

/// Builds display summaries.
#[derive(Debug, Clone)]
pub struct Summarizer {
    max_chars: usize,
    min_sentence_chars: usize,
}

impl Summarizer {
    pub fn new(config: &SummaryConfig) -> Self {
        // Room for at least a few characters plus the ellipsis.
        let max_chars = config.max_chars.max(ELLIPSIS.len() + 7);
        Self {
            max_chars,
            min_sentence_chars: config.min_sentence_chars.min(max_chars),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Summarize a message for display.
    ///
    /// The snippet is preferred over the body, unless nothing is left of it
    /// once boilerplate is removed. Output is at most
    /// `max_chars` characters plus the label length, and never empty.
    pub fn summarize(&self, subject: &str, snippet: &str, body: &str) -> String {
        let text = match clean(snippet) {
            t if t.is_empty() => clean(body),
            t => t,
        };
        if text.is_empty() {
            return NO_PREVIEW.to_string();
        }

        match label_for(subject) {
            Some(label) => format!("{label}{}", truncate_hard(&text, self.max_chars)),
            None => truncate_at_sentence(&text, self.max_chars, self.min_sentence_chars),
        }
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new(&SummaryConfig::default())
    }
}

/// Label prefix for a subject, if its vocabulary matches one.
pub fn label_for(subject: &str) -> Option<&'static str> {
    let subject = subject.to_lowercase();
    LABELS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| subject.contains(k)))
        .map(|(_, label)| *label)
}

fn clean(source: &str) -> String {
    strip_boilerplate(&normalize_whitespace(source)).to_string()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut the text at the first boilerplate marker.
///
/// ASCII lowercasing keeps byte offsets aligned with the original text.
fn strip_boilerplate(text: &str) -> &str {
    let lower = text.to_ascii_lowercase();
    let cut = BOILERPLATE_MARKERS
        .iter()
        .filter_map(|m| lower.find(m))
        .min()
        .unwrap_or(text.len());
    text[..cut].trim_end_matches(|c: char| c.is_whitespace() || c == '-' || c == ',')
}

fn truncate_hard(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    format!("{}{ELLIPSIS}", kept.trim_end())
}

/// Prefer ending on a full sentence; fall back to a hard cut.
fn truncate_at_sentence(text: &str, max_chars: usize, min_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let boundary = (min_chars..max_chars).find(|&i| {
        chars[i] == '.' && chars.get(i + 1).is_none_or(|next| next.is_whitespace())
    });

    match boundary {
        Some(i) => chars[..=i].iter().collect(),
        None => truncate_hard(text, max_chars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarizer() -> Summarizer {
        Summarizer::default()
    }

    #[test]
    fn empty_inputs_yield_placeholder() {
        assert_eq!(summarizer().summarize("Hi", "", ""), NO_PREVIEW);
        assert_eq!(summarizer().summarize("", "   ", "\n\t"), NO_PREVIEW);
    }

    #[test]
    fn snippet_preferred_over_body() {
        let s = summarizer().summarize("Hello", "from snippet", "from body");
        assert_eq!(s, "from snippet");
    }

    #[test]
    fn body_used_when_snippet_empty() {
        let s = summarizer().summarize("Hello", "", "from body");
        assert_eq!(s, "from body");
    }

    #[test]
    fn footer_only_snippet_falls_through_to_body() {
        let s = summarizer().summarize("Notes", "To unsubscribe click here", "The real body text is here.");
        assert_eq!(s, "The real body text is here.");
    }

    #[test]
    fn whitespace_is_collapsed() {
        let s = summarizer().summarize("Hello", "line one\n\n  line\ttwo", "");
        assert_eq!(s, "line one line two");
    }

    #[test]
    fn boilerplate_is_stripped() {
        let s = summarizer().summarize(
            "Notes",
            "",
            "See the attached notes.\n\nBest regards,\nBob\nTo unsubscribe click here",
        );
        assert_eq!(s, "See the attached notes.");
    }

    #[test]
    fn only_boilerplate_yields_placeholder() {
        let s = summarizer().summarize("Hi", "To unsubscribe, click here", "");
        assert_eq!(s, NO_PREVIEW);
    }

    #[test]
    fn deadline_subject_gets_label() {
        let s = summarizer().summarize("Registration deadline", "Last 3 days to register", "");
        assert_eq!(s, "⏰ Deadline notice: Last 3 days to register");
    }

    #[test]
    fn labels_checked_in_order() {
        assert_eq!(label_for("Meeting invitation: sync"), Some("📅 Meeting invitation: "));
        assert_eq!(label_for("Password changed"), Some("🔒 Security notification: "));
        assert_eq!(label_for("Internship opportunity"), Some("💼 Career opportunity: "));
        assert_eq!(label_for("Deadline for the job application"), Some("⏰ Deadline notice: "));
        assert_eq!(label_for("Lunch?"), None);
    }

    #[test]
    fn labelled_text_is_hard_truncated() {
        let long = "word ".repeat(40);
        let s = summarizer().summarize("Meeting tomorrow", &long, "");
        let label = "📅 Meeting invitation: ";
        assert!(s.starts_with(label));
        assert!(s.ends_with(ELLIPSIS));
        assert!(s.chars().count() <= label.chars().count() + 80);
    }

    #[test]
    fn unlabelled_text_prefers_sentence_boundary() {
        let text = "The quarterly report is attached for review. Please send comments by Friday so we can finalize it.";
        let s = summarizer().summarize("Report", text, "");
        assert_eq!(s, "The quarterly report is attached for review.");
    }

    #[test]
    fn early_period_is_not_a_boundary() {
        let text = "Hi all. This message has no other sentence break within the first eighty characters of text";
        let s = summarizer().summarize("Update", text, "");
        assert!(s.ends_with(ELLIPSIS));
        assert_eq!(s.chars().count(), 80);
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(summarizer().summarize("Hey", "See you soon.", ""), "See you soon.");
    }

    #[test]
    fn multibyte_text_respects_char_bound() {
        let text = "é".repeat(200);
        let s = summarizer().summarize("Hola", &text, "");
        assert_eq!(s.chars().count(), 80);
    }

    #[test]
    fn tiny_max_is_raised() {
        let s = Summarizer::new(&SummaryConfig {
            max_chars: 1,
            min_sentence_chars: 0,
        });
        assert_eq!(s.max_chars(), 10);
        let out = s.summarize("x", "abcdefghijklmnop", "");
        assert_eq!(out, "abcdefg...");
    }
}
