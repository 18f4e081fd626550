// Hivetrap Engine — Threat Intelligence Extractor
//
// Pulls reusable artifacts out of scam traffic: phone numbers, links,
// UPI payment handles, and keyword sightings. Extraction is decoupled
// from detection — it runs on every message that reaches the engage
// branch regardless of which detection path produced the verdict, so
// intelligence keeps accumulating even while the remote classifier is
// down.
//
// All rules are plain regex / substring matches; there is no model here.

use log::debug;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ── Patterns ───────────────────────────────────────────────────────────

/// Indian mobile numbers: optional +91 prefix with an optional
/// space/hyphen separator, then 10 digits with leading digit 6–9.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+91[-\s]?[6-9]\d{9}\b|\b[6-9]\d{9}\b").expect("phone regex"));

/// URLs, captured verbatim up to the next whitespace.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url regex"));

/// UPI handles against the known mobile-payment provider suffixes.
static UPI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\w.\-]+@(?:paytm|phonepe|googlepay|ybl|okaxis|oksbi|okhdfcbank|okicici|upi)\b")
        .expect("upi regex")
});

/// Keyword sightings tracked as intelligence. Deliberately smaller than
/// the detection gate's list — these are the terms worth reporting, one
/// entry per distinct keyword ever observed.
const INTEL_KEYWORDS: &[&str] = &[
    "kyc", "otp", "verify", "blocked", "urgent", "prize", "won", "bank", "account",
];

// ── Per-message extraction ─────────────────────────────────────────────

/// Artifacts found in a single message. Same shape as the store's
/// report, scoped to one message.
#[derive(Debug, Clone, Default)]
pub struct ExtractedEntities {
    pub phone_numbers: Vec<String>,
    pub phishing_links: Vec<String>,
    pub upi_ids: Vec<String>,
    pub keywords: Vec<String>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.phone_numbers.is_empty()
            && self.phishing_links.is_empty()
            && self.upi_ids.is_empty()
            && self.keywords.is_empty()
    }
}

/// Extract all artifacts from one message.
pub fn extract(text: &str) -> ExtractedEntities {
    let phone_numbers = PHONE_RE
        .find_iter(text)
        // Normalize: strip separator whitespace/hyphens, keep any +91
        .map(|m| m.as_str().replace([' ', '-'], ""))
        .collect();

    let phishing_links = URL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();

    let upi_ids = UPI_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();

    let lower = text.to_lowercase();
    let keywords = INTEL_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(**kw))
        .map(|kw| kw.to_string())
        .collect();

    ExtractedEntities {
        phone_numbers,
        phishing_links,
        upi_ids,
        keywords,
    }
}

// ── Accumulation store ─────────────────────────────────────────────────

/// Duplicate-free, insertion-ordered accumulation of intelligence for
/// the process lifetime. Reset only by an explicit clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceReport {
    pub phone_numbers: Vec<String>,
    pub phishing_links: Vec<String>,
    pub upi_ids: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Default)]
pub struct IntelligenceStore {
    inner: Mutex<IntelligenceReport>,
}

fn push_unique(target: &mut Vec<String>, items: Vec<String>) -> usize {
    let mut added = 0;
    for item in items {
        if !target.contains(&item) {
            target.push(item);
            added += 1;
        }
    }
    added
}

impl IntelligenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one message's entities with set-union semantics.
    /// Returns how many entries were actually new.
    pub fn merge(&self, entities: ExtractedEntities) -> usize {
        let mut report = self.inner.lock();
        let mut added = 0;
        added += push_unique(&mut report.phone_numbers, entities.phone_numbers);
        added += push_unique(&mut report.phishing_links, entities.phishing_links);
        added += push_unique(&mut report.upi_ids, entities.upi_ids);
        added += push_unique(&mut report.keywords, entities.keywords);
        if added > 0 {
            debug!("[intel] {} new artifact(s) recorded", added);
        }
        added
    }

    /// Current accumulated report (cloned).
    pub fn report(&self) -> IntelligenceReport {
        self.inner.lock().clone()
    }

    /// Replace the whole report (snapshot restore).
    pub fn restore(&self, report: IntelligenceReport) {
        *self.inner.lock() = report;
    }

    /// Drop everything.
    pub fn clear(&self) {
        *self.inner.lock() = IntelligenceReport::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kyc_roundtrip() {
        let e = extract("Your KYC is blocked, call 9876543210");
        assert!(e.phone_numbers.contains(&"9876543210".to_string()));
        assert!(e.keywords.contains(&"kyc".to_string()));
        assert!(e.keywords.contains(&"blocked".to_string()));
    }

    #[test]
    fn plus_prefix_phone_is_normalized() {
        let e = extract("reach me on +91-9123456780 or +91 9876543210");
        assert!(e.phone_numbers.contains(&"+919123456780".to_string()));
        assert!(e.phone_numbers.contains(&"+919876543210".to_string()));
    }

    #[test]
    fn urls_stored_verbatim() {
        let e = extract("update at https://secure-bank.example/verify?x=1 now");
        assert_eq!(
            e.phishing_links,
            vec!["https://secure-bank.example/verify?x=1".to_string()]
        );
    }

    #[test]
    fn upi_handles_matched_case_insensitively() {
        let e = extract("send fee to winner2026@Paytm or backup@okicici today");
        assert_eq!(e.upi_ids.len(), 2);
        assert!(e.upi_ids.contains(&"winner2026@Paytm".to_string()));
    }

    #[test]
    fn plain_email_is_not_a_upi_handle() {
        let e = extract("contact support@example.com for help");
        assert!(e.upi_ids.is_empty());
    }

    #[test]
    fn store_rejects_duplicates_across_messages() {
        let store = IntelligenceStore::new();
        store.merge(extract("call 9876543210 about your kyc"));
        store.merge(extract("again: 9876543210, kyc pending"));
        let report = store.report();
        assert_eq!(report.phone_numbers, vec!["9876543210".to_string()]);
        assert_eq!(
            report.keywords.iter().filter(|k| *k == "kyc").count(),
            1
        );
    }

    #[test]
    fn insertion_order_is_preserved() {
        let store = IntelligenceStore::new();
        store.merge(extract("first 9876543210"));
        store.merge(extract("then 9123456780"));
        assert_eq!(
            store.report().phone_numbers,
            vec!["9876543210".to_string(), "9123456780".to_string()]
        );
    }

    #[test]
    fn clear_empties_everything() {
        let store = IntelligenceStore::new();
        store.merge(extract("otp 9876543210 https://x.example"));
        store.clear();
        let report = store.report();
        assert!(report.phone_numbers.is_empty());
        assert!(report.phishing_links.is_empty());
        assert!(report.keywords.is_empty());
    }
}
