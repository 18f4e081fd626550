// Hivetrap Engine — Local Detection Gate
//
// Deterministic keyword heuristics over incoming text. Two tiers:
//   quick_check      — cheap pre-filter run before any network call
//   classify_locally — fallback classifier used only when the remote
//                      classifier is unreachable
//
// The two-branch threshold: a single generic word like "urgent" never
// triggers on its own; it needs a second keyword, or a phone-number /
// URL indicator next to it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ── Keyword lists ──────────────────────────────────────────────────────

/// Gate keywords used by the pre-filter. Case-insensitive substring match.
pub const GATE_KEYWORDS: &[&str] = &[
    "kyc", "otp", "verify", "blocked", "suspended", "urgent", "immediately",
    "prize", "won", "lottery", "refund", "bank account", "upi", "pin",
    "password", "cvv", "credit card", "debit card", "link expire",
    "click here", "update now", "verify now", "account blocked", "expire today",
];

/// Extra financial/account/urgency terms the fallback classifier also
/// checks. The fallback list is always a superset of the gate list.
const FALLBACK_EXTRA_KEYWORDS: &[&str] = &[
    "loan", "emi", "aadhaar", "pan card", "income tax", "net banking",
    "customer care", "helpline",
];

/// Messages shorter than this are never flagged by the gate.
const MIN_GATE_CHARS: usize = 10;

/// Generic caution reply attached to local fallback verdicts.
pub const FALLBACK_REPLY: &str =
    "⚠️ This message appears suspicious. Do not share personal information.";

// ── Indicator patterns ─────────────────────────────────────────────────

/// 10-digit Indian mobile number, leading digit 6–9.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[6-9]\d{9}\b").expect("phone regex"));

/// Any HTTP(S) URL.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url regex"));

// ── Verdict ────────────────────────────────────────────────────────────

/// Result of the local fallback classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalVerdict {
    pub is_scam: bool,
    /// matched / 5. Intentionally uncapped above 1.0 — a best-effort
    /// proxy score used for diagnostics, not a probability, and never
    /// compared against a threshold.
    pub confidence: f32,
    pub matched_keywords: Vec<String>,
    pub reply: Option<String>,
}

// ── Matching helpers ───────────────────────────────────────────────────

fn matched_from<'a>(lower_text: &str, keywords: &[&'a str]) -> Vec<&'a str> {
    keywords
        .iter()
        .copied()
        .filter(|kw| lower_text.contains(kw))
        .collect()
}

fn has_indicator(text: &str) -> bool {
    URL_RE.is_match(text) || PHONE_RE.is_match(text)
}

/// The shared two-branch rule: ≥2 distinct keywords, or ≥1 keyword plus
/// a phone number / URL indicator.
fn scam_rule(matched: usize, text: &str) -> bool {
    matched >= 2 || (matched >= 1 && has_indicator(text))
}

// ── Public gate ────────────────────────────────────────────────────────

/// Cheap pre-filter: should this message go to the classifier at all?
pub fn quick_check(text: &str) -> bool {
    if text.chars().count() < MIN_GATE_CHARS {
        return false;
    }
    let lower = text.to_lowercase();
    let matched = matched_from(&lower, GATE_KEYWORDS).len();
    scam_rule(matched, text)
}

/// Fallback classifier for when the remote classifier is unreachable.
/// Applies the same rule over the larger fallback keyword list.
pub fn classify_locally(text: &str) -> LocalVerdict {
    let lower = text.to_lowercase();
    let mut matched = matched_from(&lower, GATE_KEYWORDS);
    matched.extend(matched_from(&lower, FALLBACK_EXTRA_KEYWORDS));

    let is_scam = scam_rule(matched.len(), text);

    LocalVerdict {
        is_scam,
        confidence: matched.len() as f32 / 5.0,
        matched_keywords: matched.iter().map(|s| s.to_string()).collect(),
        reply: is_scam.then(|| FALLBACK_REPLY.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_message_passes() {
        assert!(!quick_check("Hey, are we still on for lunch tomorrow?"));
    }

    #[test]
    fn two_keywords_flag() {
        let text = "Your KYC is pending, verify immediately";
        assert!(quick_check(text));
        assert!(classify_locally(text).is_scam);
    }

    #[test]
    fn one_keyword_plus_phone_flags() {
        let text = "Your account is blocked, call 9876543210";
        assert!(quick_check(text));
        assert!(classify_locally(text).is_scam);
    }

    #[test]
    fn one_keyword_plus_url_flags() {
        let text = "Claim your prize at https://win.example.com/now";
        assert!(quick_check(text));
        assert!(classify_locally(text).is_scam);
    }

    #[test]
    fn single_keyword_alone_is_clean() {
        let text = "that meeting felt urgent somehow";
        assert!(!quick_check(text));
        assert!(!classify_locally(text).is_scam);
    }

    #[test]
    fn short_text_never_flags() {
        // Both branches would otherwise fire on "otp upi"
        assert!(!quick_check("otp upi"));
    }

    #[test]
    fn landline_number_is_not_an_indicator() {
        // 10 digits but leading digit outside 6-9
        assert!(!quick_check("urgent: call 0124567890 today"));
    }

    #[test]
    fn confidence_is_uncapped() {
        let text = "urgent otp pin cvv password verify blocked lottery prize refund";
        let v = classify_locally(text);
        assert!(v.is_scam);
        assert!(v.confidence > 1.0);
    }

    #[test]
    fn fallback_carries_reply_only_when_scam() {
        let scam = classify_locally("Your KYC expired, verify now at https://bit.ly/x");
        assert!(scam.reply.is_some());
        let clean = classify_locally("see you at the station at nine");
        assert!(clean.reply.is_none());
    }

    #[test]
    fn fallback_list_is_superset_of_gate() {
        let text = "loan emi helpline problem"; // fallback-only terms
        let v = classify_locally(text);
        assert!(v.matched_keywords.contains(&"loan".to_string()));
        assert!(v.matched_keywords.contains(&"emi".to_string()));
    }
}
